use crate::{
  chunk::{Chunk, HEADER_SIZE},
  traversal::{self, Cursor},
};

/// Which free chunk `allocate` reuses before growing the break.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
  #[default]
  FirstFit,
  BestFit,
}

impl SearchMode {
  /// # Safety
  ///
  /// See [`traversal::Chunks::new`].
  pub unsafe fn find_free(
    self,
    head: *mut Chunk,
    size: usize,
  ) -> Option<Cursor> {
    unsafe {
      match self {
        SearchMode::FirstFit => find_first_fit_free_chunk(head, size),
        SearchMode::BestFit => find_best_fit_free_chunk(head, size),
      }
    }
  }
}

/// Chunk whose user region starts at `addr`.
///
/// # Safety
///
/// See [`traversal::Chunks::new`].
pub unsafe fn find_chunk_by_user_address(
  head: *mut Chunk,
  addr: *const u8,
) -> Option<Cursor> {
  unsafe { traversal::find(head, |chunk| chunk.start as *const u8 == addr) }
}

/// First free chunk, in list order, able to hold `size` bytes.
///
/// # Safety
///
/// See [`traversal::Chunks::new`].
pub unsafe fn find_first_fit_free_chunk(
  head: *mut Chunk,
  size: usize,
) -> Option<Cursor> {
  unsafe { traversal::find(head, |chunk| !chunk.in_use && chunk.size >= size) }
}

/// Free chunk whose size is closest to, but not below, `size`.
///
/// # Safety
///
/// See [`traversal::Chunks::new`].
pub unsafe fn find_best_fit_free_chunk(
  head: *mut Chunk,
  size: usize,
) -> Option<Cursor> {
  unsafe { traversal::min(head, |chunk| size_difference(chunk, size)) }
}

fn size_difference(
  chunk: &Chunk,
  size: usize,
) -> isize {
  if chunk.in_use {
    return -1;
  }
  match chunk.size.checked_sub(size) {
    Some(slack) => isize::try_from(slack).unwrap_or(isize::MAX),
    None => -1,
  }
}

/// Bytes claimed from the break by every chunk, headers included.
///
/// # Safety
///
/// See [`traversal::Chunks::new`].
pub unsafe fn total_allocated_bytes(head: *mut Chunk) -> usize {
  unsafe { traversal::sum(head, |chunk| chunk.size + HEADER_SIZE) }
}

/// Whether `y`'s header begins exactly where `x`'s user region ends.
pub fn is_physically_contiguous(
  x: &Chunk,
  y: *const Chunk,
) -> bool {
  x.end() as *const u8 == y as *const u8
}
