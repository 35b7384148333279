//! The process-wide heap and the allocator entry points built on it.
//!
//! Heap operations report failures as [`HeapError`] values. This is the only
//! layer that turns them into allocator behaviour: recoverable errors become
//! a null pointer, fatal ones go through [`logging::panic`]. Logging happens
//! after the heap lock is dropped.

use core::{
  alloc::{GlobalAlloc, Layout},
  fmt, ptr,
};

use log::Level;
use spin::Mutex;

use crate::{
  align::ALIGNMENT,
  brk::{ProgramBreak, Sbrk},
  config,
  error::{HeapError, Result},
  heap::Heap,
  logging,
  search::SearchMode,
};

static HEAP: Mutex<Heap<Sbrk>> = Mutex::new(Heap::new(Sbrk));

/// `malloc`: null for `size == 0` or when the break cannot grow.
///
/// # Safety
///
/// No other code in the process may move the break while the heap is
/// populated.
pub unsafe fn allocate(size: usize) -> *mut u8 {
  config::init();
  let result = unsafe { HEAP.lock().allocate(size) };
  settle("malloc", result)
}

/// `free`: null is ignored. Unknown pointers and double frees are fatal.
///
/// # Safety
///
/// `addr` must not be used after this call.
pub unsafe fn release(addr: *mut u8) {
  if addr.is_null() {
    return;
  }

  config::init();
  let result = unsafe { HEAP.lock().release(addr) };
  if let Err(err) = result {
    report("free", &err);
  }
}

/// `calloc`: null when `count * elem_size` overflows.
///
/// # Safety
///
/// See [`allocate`].
pub unsafe fn zero_allocate(
  count: usize,
  elem_size: usize,
) -> *mut u8 {
  config::init();
  let result = unsafe { HEAP.lock().zero_allocate(count, elem_size) };
  settle("calloc", result)
}

/// `realloc`: null `addr` allocates, zero `size` releases.
///
/// # Safety
///
/// If the returned pointer is non-null and differs from `addr`, `addr` is
/// no longer valid.
pub unsafe fn resize(
  addr: *mut u8,
  size: usize,
) -> *mut u8 {
  config::init();
  let result = unsafe { HEAP.lock().resize(addr, size) };
  settle("realloc", result)
}

/// `reallocarray`: null when `count * elem_size` overflows.
///
/// # Safety
///
/// See [`resize`].
pub unsafe fn resize_array(
  addr: *mut u8,
  count: usize,
  elem_size: usize,
) -> *mut u8 {
  config::init();
  let result = unsafe { HEAP.lock().resize_array(addr, count, elem_size) };
  settle("reallocarray", result)
}

/// Current process break.
pub fn program_break() -> *mut u8 {
  Sbrk.current()
}

/// Bytes the process heap holds, headers included.
pub fn total_allocated() -> usize {
  HEAP.lock().total_allocated()
}

pub fn set_search_mode(mode: SearchMode) {
  HEAP.lock().set_search_mode(mode);
}

fn settle(
  op: &str,
  result: Result<*mut u8>,
) -> *mut u8 {
  match result {
    Ok(addr) => addr,
    Err(err) => {
      report(op, &err);
      ptr::null_mut()
    }
  }
}

fn report(
  op: &str,
  err: &HeapError,
) {
  diagnose(op, err, |level, message| log::log!(level, "{message}"));

  if err.is_fatal() {
    logging::panic(format_args!("{op}(): {err}"));
  }
}

/// Lines logged for `err` ahead of the fatal-error path.
fn diagnose<E>(
  op: &str,
  err: &HeapError,
  mut emit: E,
) where
  E: FnMut(Level, fmt::Arguments),
{
  match err {
    HeapError::IntegerOverflow { .. } => emit(Level::Warn, format_args!("{op}(): {err}")),
    HeapError::OutOfMemory { .. } => emit(Level::Trace, format_args!("{op}(): {err}")),
    HeapError::HeapCorruption { released, total } => {
      emit(
        Level::Warn,
        format_args!("{op}(): failed to release memory, likely an allocator bug"),
      );
      emit(
        Level::Debug,
        format_args!("attempted to release {released} bytes, total allocated = {total}"),
      );
    }
    HeapError::InvalidPointer(_) | HeapError::DoubleFree(_) | HeapError::UninitializedHeap => {}
  }
}

/// [`GlobalAlloc`] over the process heap.
///
/// ```rust,ignore
/// #[global_allocator]
/// static GLOBAL: brkalloc::BrkAlloc = brkalloc::BrkAlloc;
/// ```
///
/// Regions are aligned to [`ALIGNMENT`]; larger alignments are refused with
/// null.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrkAlloc;

unsafe impl GlobalAlloc for BrkAlloc {
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if layout.align() > ALIGNMENT {
      return ptr::null_mut();
    }
    unsafe { allocate(layout.size()) }
  }

  unsafe fn dealloc(
    &self,
    ptr: *mut u8,
    _layout: Layout,
  ) {
    unsafe { release(ptr) }
  }

  unsafe fn alloc_zeroed(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if layout.align() > ALIGNMENT {
      return ptr::null_mut();
    }
    unsafe { zero_allocate(1, layout.size()) }
  }

  unsafe fn realloc(
    &self,
    ptr: *mut u8,
    layout: Layout,
    new_size: usize,
  ) -> *mut u8 {
    if layout.align() > ALIGNMENT {
      return ptr::null_mut();
    }
    unsafe { resize(ptr, new_size) }
  }
}
