//! Chunk headers and the XOR-linked list that strings them together.
//!
//! Each header keeps a single `link` word holding `addr(prev) ^ addr(next)`,
//! with an absent neighbour contributing zero. Walking the list therefore
//! always needs one known neighbour. The functions in this module are the
//! only code that reads or writes `link`.

use core::{mem, ptr};

use crate::align::ALIGNMENT;

/// Metadata placed immediately before the user bytes it describes.
#[repr(C)]
#[derive(Debug)]
pub struct Chunk {
  /// First user-writable byte.
  pub start: *mut u8,
  /// Usable length of the user region, header excluded.
  pub size: usize,
  link: usize,
  pub in_use: bool,
}

pub const HEADER_SIZE: usize = mem::size_of::<Chunk>();

// User regions start right after their header.
const _: () = assert!(HEADER_SIZE % ALIGNMENT == 0);

impl Chunk {
  /// A detached header. It only joins a list through [`append`].
  pub const fn new(
    start: *mut u8,
    size: usize,
    in_use: bool,
  ) -> Self {
    Self {
      start,
      size,
      link: 0,
      in_use,
    }
  }

  /// One past the last user byte.
  pub fn end(&self) -> *mut u8 {
    self.start.wrapping_add(self.size)
  }
}

/// Writes a detached header at `header` describing the `size` bytes after it.
///
/// # Safety
///
/// `header` must be aligned to [`ALIGNMENT`] and valid for writes of
/// `HEADER_SIZE + size` bytes.
pub unsafe fn emplace(
  header: *mut u8,
  size: usize,
  in_use: bool,
) -> *mut Chunk {
  let chunk = header as *mut Chunk;
  unsafe {
    ptr::write(chunk, Chunk::new(header.add(HEADER_SIZE), size, in_use));
  }
  chunk
}

#[inline]
fn addr(chunk: *mut Chunk) -> usize {
  chunk as usize
}

#[inline]
fn chunk_at(addr: usize) -> *mut Chunk {
  addr as *mut Chunk
}

/// Returns the chunk after `chunk`, given the chunk before it (null when
/// `chunk` is the head).
///
/// # Safety
///
/// `chunk` must be a live list member and `prev` its real predecessor.
pub unsafe fn next(
  chunk: *mut Chunk,
  prev: *mut Chunk,
) -> *mut Chunk {
  unsafe { chunk_at((*chunk).link ^ addr(prev)) }
}

/// Returns the chunk before `chunk`, given the chunk after it (null when
/// `chunk` is the tail).
///
/// # Safety
///
/// `chunk` must be a live list member and `next` its real successor.
pub unsafe fn prev(
  chunk: *mut Chunk,
  next: *mut Chunk,
) -> *mut Chunk {
  unsafe { chunk_at((*chunk).link ^ addr(next)) }
}

/// Inserts `appendee` directly after `chunk`.
///
/// # Safety
///
/// `prv` must be the real predecessor of `chunk` (null for the head) and
/// `appendee` must be a valid header not currently in any list.
pub unsafe fn append(
  prv: *mut Chunk,
  chunk: *mut Chunk,
  appendee: *mut Chunk,
) {
  unsafe {
    if prv.is_null() {
      let nxt = next(chunk, ptr::null_mut());
      if !nxt.is_null() {
        let third = next(nxt, chunk);

        (*chunk).link = addr(appendee);
        (*appendee).link = addr(chunk) ^ addr(nxt);
        (*nxt).link = addr(appendee) ^ addr(third);
      } else {
        (*chunk).link = addr(appendee);
        (*appendee).link = addr(chunk);
      }
    } else if (*chunk).link == addr(prv) {
      // Tail: only its own link and the appendee change.
      (*chunk).link = addr(prv) ^ addr(appendee);
      (*appendee).link = addr(chunk);
    } else {
      let nxt = next(chunk, prv);
      let next_next = next(nxt, chunk);

      (*appendee).link = addr(chunk) ^ addr(nxt);
      (*chunk).link = addr(prv) ^ addr(appendee);
      (*nxt).link = addr(next_next) ^ addr(appendee);
    }
  }
}

/// Detaches `chunk` from the list, given its predecessor (null for the head).
///
/// Removing the only element is a no-op; the owner of the list has to reset
/// its own head/tail instead.
///
/// # Safety
///
/// `prv` must be the real predecessor of `chunk`.
pub unsafe fn remove_after(
  prv: *mut Chunk,
  chunk: *mut Chunk,
) {
  unsafe {
    if prv.is_null() {
      let nxt = next(chunk, ptr::null_mut());
      if nxt.is_null() {
        return;
      }
      let third = next(nxt, chunk);

      (*nxt).link = addr(third);
      (*chunk).link = 0;
    } else if (*chunk).link == addr(prv) {
      (*prv).link ^= addr(chunk);
      (*chunk).link = 0;
    } else {
      let prev_prev = prev(prv, chunk);
      let nxt = next(chunk, prv);
      let next_next = next(nxt, chunk);

      (*prv).link = addr(prev_prev) ^ addr(nxt);
      (*nxt).link = addr(next_next) ^ addr(prv);
      (*chunk).link = 0;
    }
  }
}

/// Detaches `chunk` from the list, given its successor (null for the tail).
///
/// # Safety
///
/// `nxt` must be the real successor of `chunk`.
pub unsafe fn remove_before(
  nxt: *mut Chunk,
  chunk: *mut Chunk,
) {
  unsafe {
    // With no successor the list is read back to front: the tail becomes a
    // head whose single neighbour is its predecessor.
    let prv = if nxt.is_null() {
      ptr::null_mut()
    } else {
      prev(chunk, nxt)
    };
    remove_after(prv, chunk);
  }
}
