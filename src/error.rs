use thiserror::Error;

pub type Result<T> = core::result::Result<T, HeapError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeapError {
  #[error("invalid pointer {0:#x}")]
  InvalidPointer(usize),

  #[error("double free or corrupted heap at {0:#x}")]
  DoubleFree(usize),

  #[error("heap used before anything was allocated")]
  UninitializedHeap,

  #[error("{count} elements of size {elem_size} overflow the address space")]
  IntegerOverflow { count: usize, elem_size: usize },

  #[error("cannot grow the program break by {requested} bytes")]
  OutOfMemory { requested: usize },

  #[error("failed to return {released} bytes to the OS, {total} bytes still allocated")]
  HeapCorruption { released: usize, total: usize },
}

impl HeapError {
  /// Fatal errors abort the process unless robust mode is on. The rest are
  /// reported to the caller as a null pointer.
  pub fn is_fatal(&self) -> bool {
    matches!(
      self,
      HeapError::InvalidPointer(_)
        | HeapError::DoubleFree(_)
        | HeapError::UninitializedHeap
        | HeapError::HeapCorruption { .. }
    )
  }
}
