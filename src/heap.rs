use core::ptr;

use crate::{
  align::checked_align,
  brk::ProgramBreak,
  chunk::{self, Chunk, HEADER_SIZE},
  error::{HeapError, Result},
  search::{self, SearchMode},
  traversal::{Chunks, Cursor},
};

/// A heap laid out between a fixed base and a movable break.
///
/// Chunks sit back to back in address order and the list follows the same
/// order, so the tail always ends exactly at the break.
pub struct Heap<B> {
  start: *mut Chunk,
  tail: *mut Chunk,
  mode: SearchMode,
  brk: B,
}

// The chunk list lives inside memory owned through `brk`.
unsafe impl<B: Send> Send for Heap<B> {}

impl<B> Heap<B> {
  pub const fn new(brk: B) -> Self {
    Self {
      start: ptr::null_mut(),
      tail: ptr::null_mut(),
      mode: SearchMode::FirstFit,
      brk,
    }
  }

  pub fn with_search_mode(
    mut self,
    mode: SearchMode,
  ) -> Self {
    self.mode = mode;
    self
  }

  pub fn search_mode(&self) -> SearchMode {
    self.mode
  }

  pub fn set_search_mode(
    &mut self,
    mode: SearchMode,
  ) {
    self.mode = mode;
  }

  pub fn brk(&self) -> &B {
    &self.brk
  }

  pub fn is_empty(&self) -> bool {
    self.start.is_null()
  }

  pub fn start(&self) -> *mut Chunk {
    self.start
  }

  pub fn tail(&self) -> *mut Chunk {
    self.tail
  }

  /// Every chunk, used and free, in address order.
  pub fn chunks(&self) -> Chunks {
    unsafe { Chunks::new(self.start) }
  }

  /// Bytes taken from the break, headers included.
  pub fn total_allocated(&self) -> usize {
    unsafe { search::total_allocated_bytes(self.start) }
  }
}

impl<B: ProgramBreak> Heap<B> {
  /// Returns a region of at least `size` bytes, or null for `size == 0`.
  ///
  /// A free chunk found by the search mode is reused as is; otherwise the
  /// break grows by one header plus the word-rounded size.
  ///
  /// # Safety
  ///
  /// Nothing else may move the break underneath this heap.
  pub unsafe fn allocate(
    &mut self,
    size: usize,
  ) -> Result<*mut u8> {
    if size == 0 {
      return Ok(ptr::null_mut());
    }

    let size = checked_align(size).ok_or(HeapError::OutOfMemory { requested: size })?;

    unsafe {
      if let Some(found) = self.mode.find_free(self.start, size) {
        (*found.chunk).in_use = true;
        return Ok((*found.chunk).start);
      }

      let total = size
        .checked_add(HEADER_SIZE)
        .and_then(|total| isize::try_from(total).ok())
        .ok_or(HeapError::OutOfMemory { requested: size })?;

      let header = self
        .brk
        .adjust(total)
        .ok_or(HeapError::OutOfMemory { requested: size })?;

      let chunk = chunk::emplace(header, size, true);
      self.push_tail(chunk);

      Ok((*chunk).start)
    }
  }

  /// Marks the chunk at `addr` free, then hands every free chunk at the top
  /// of the heap back to the break.
  ///
  /// A refused shrink ends the walk with [`HeapError::HeapCorruption`]. The
  /// chunk being returned is already detached by then, and the free chunks
  /// below it stay listed.
  ///
  /// # Safety
  ///
  /// The caller gives up `addr`; nothing may touch it afterwards.
  pub unsafe fn release(
    &mut self,
    addr: *mut u8,
  ) -> Result<()> {
    let found = self.lookup(addr)?;

    unsafe {
      (*found.chunk).in_use = false;
      self.trim()
    }
  }

  /// `count * elem_size` zeroed bytes.
  ///
  /// # Safety
  ///
  /// See [`Heap::allocate`].
  pub unsafe fn zero_allocate(
    &mut self,
    count: usize,
    elem_size: usize,
  ) -> Result<*mut u8> {
    let total = array_size(count, elem_size)?;

    let addr = unsafe { self.allocate(total)? };
    if !addr.is_null() {
      unsafe { ptr::write_bytes(addr, 0, total) };
    }

    Ok(addr)
  }

  /// Resizes the region at `addr` following `realloc` rules: null `addr`
  /// allocates, zero `new_size` releases.
  ///
  /// Growing always moves the data to a fresh region. Shrinking stays in
  /// place and splits the leftover into a free chunk when it can hold a
  /// header of its own.
  ///
  /// # Safety
  ///
  /// When the returned pointer differs from `addr`, `addr` is released.
  pub unsafe fn resize(
    &mut self,
    addr: *mut u8,
    new_size: usize,
  ) -> Result<*mut u8> {
    if addr.is_null() {
      return unsafe { self.allocate(new_size) };
    }

    if new_size == 0 {
      unsafe { self.release(addr)? };
      return Ok(ptr::null_mut());
    }

    let found = self.lookup(addr)?;
    let chunk = found.chunk;
    let new_size = checked_align(new_size).ok_or(HeapError::OutOfMemory { requested: new_size })?;

    unsafe {
      let current = (*chunk).size;

      if new_size == current {
        return Ok(addr);
      }

      if new_size > current {
        let moved = self.allocate(new_size)?;
        ptr::copy_nonoverlapping(addr, moved, current);
        self.release(addr)?;
        return Ok(moved);
      }

      let leftover = current - new_size;
      if leftover <= HEADER_SIZE {
        return Ok(addr);
      }

      (*chunk).size = new_size;
      let split = chunk::emplace((*chunk).end(), leftover - HEADER_SIZE, false);
      chunk::append(found.prev, chunk, split);
      if chunk == self.tail {
        self.tail = split;
      }

      Ok(addr)
    }
  }

  /// [`Heap::resize`] to `count * elem_size` bytes.
  ///
  /// # Safety
  ///
  /// See [`Heap::resize`].
  pub unsafe fn resize_array(
    &mut self,
    addr: *mut u8,
    count: usize,
    elem_size: usize,
  ) -> Result<*mut u8> {
    let total = array_size(count, elem_size)?;
    unsafe { self.resize(addr, total) }
  }

  /// Checks the layout invariants: headers back to back in list order, each
  /// followed by its own user region, and the tail ending at the break.
  pub fn is_consistent(&self) -> bool {
    let mut last: *mut Chunk = ptr::null_mut();

    for Cursor { chunk, .. } in self.chunks() {
      let header = unsafe { &*chunk };
      if header.start != (chunk as *mut u8).wrapping_add(HEADER_SIZE) {
        return false;
      }
      if !last.is_null() && !search::is_physically_contiguous(unsafe { &*last }, chunk) {
        return false;
      }
      last = chunk;
    }

    if last != self.tail {
      return false;
    }

    last.is_null() || unsafe { (*last).end() } == self.brk.current()
  }

  fn lookup(
    &self,
    addr: *mut u8,
  ) -> Result<Cursor> {
    if self.start.is_null() {
      return Err(HeapError::UninitializedHeap);
    }

    let found = unsafe { search::find_chunk_by_user_address(self.start, addr) }
      .ok_or(HeapError::InvalidPointer(addr as usize))?;

    if !unsafe { (*found.chunk).in_use } {
      return Err(HeapError::DoubleFree(addr as usize));
    }

    Ok(found)
  }

  unsafe fn push_tail(
    &mut self,
    chunk: *mut Chunk,
  ) {
    unsafe {
      if self.start.is_null() {
        self.start = chunk;
      } else {
        chunk::append(chunk::prev(self.tail, ptr::null_mut()), self.tail, chunk);
      }
      self.tail = chunk;
    }
  }

  unsafe fn trim(&mut self) -> Result<()> {
    unsafe {
      while !self.tail.is_null() && !(*self.tail).in_use {
        let freed = self.tail;

        if freed == self.start {
          self.start = ptr::null_mut();
          self.tail = ptr::null_mut();
        } else {
          let previous = chunk::prev(freed, ptr::null_mut());
          chunk::remove_after(previous, freed);
          self.tail = previous;
        }

        let released = HEADER_SIZE + (*freed).size;
        if self.brk.adjust(-(released as isize)).is_none() {
          return Err(HeapError::HeapCorruption {
            released,
            total: self.total_allocated(),
          });
        }
      }
    }

    Ok(())
  }
}

fn array_size(
  count: usize,
  elem_size: usize,
) -> Result<usize> {
  count
    .checked_mul(elem_size)
    .ok_or(HeapError::IntegerOverflow { count, elem_size })
}
