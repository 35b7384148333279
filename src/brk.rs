use core::ptr;

use libc::{c_void, intptr_t, sbrk};

/// The end of the heap's address range, moved up or down on demand.
pub trait ProgramBreak {
  /// Current break address.
  fn current(&self) -> *mut u8;

  /// Moves the break by `delta` bytes and returns the break as it was before
  /// the move, i.e. the start of the newly available region when growing.
  /// `None` means the move was refused and nothing changed.
  ///
  /// # Safety
  ///
  /// Shrinking hands the top `-delta` bytes back; nothing may still use them.
  unsafe fn adjust(
    &mut self,
    delta: isize,
  ) -> Option<*mut u8>;
}

/// The process data segment, moved with `sbrk(2)`.
///
/// Assumes nothing else in the process moves the break while a heap built
/// on it is populated.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sbrk;

impl ProgramBreak for Sbrk {
  fn current(&self) -> *mut u8 {
    unsafe { sbrk(0) as *mut u8 }
  }

  unsafe fn adjust(
    &mut self,
    delta: isize,
  ) -> Option<*mut u8> {
    let previous = unsafe { sbrk(delta as intptr_t) };

    if previous == usize::MAX as *mut c_void {
      return None;
    }

    Some(previous as *mut u8)
  }
}

/// A private, fixed-capacity break over an anonymous mapping. Heaps built on
/// it behave exactly like the process heap but cannot disturb it.
#[derive(Debug)]
pub struct Arena {
  base: *mut u8,
  capacity: usize,
  used: usize,
}

impl Arena {
  /// Maps `capacity` bytes (rounded up by the kernel to whole pages).
  /// Returns `None` if the mapping fails.
  pub fn new(capacity: usize) -> Option<Self> {
    let base = unsafe {
      libc::mmap(
        ptr::null_mut(),
        capacity.max(1),
        libc::PROT_READ | libc::PROT_WRITE,
        libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
        -1,
        0,
      )
    };

    if base == libc::MAP_FAILED {
      return None;
    }

    Some(Self {
      base: base as *mut u8,
      capacity,
      used: 0,
    })
  }

  pub fn base(&self) -> *mut u8 {
    self.base
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Bytes currently below the break.
  pub fn used(&self) -> usize {
    self.used
  }
}

// The mapping is owned exclusively by the arena.
unsafe impl Send for Arena {}

impl ProgramBreak for Arena {
  fn current(&self) -> *mut u8 {
    self.base.wrapping_add(self.used)
  }

  unsafe fn adjust(
    &mut self,
    delta: isize,
  ) -> Option<*mut u8> {
    let previous = self.current();

    let used = self.used.checked_add_signed(delta)?;
    if used > self.capacity {
      return None;
    }

    self.used = used;
    Some(previous)
  }
}

impl Drop for Arena {
  fn drop(&mut self) {
    unsafe {
      libc::munmap(self.base as *mut c_void, self.capacity.max(1));
    }
  }
}
