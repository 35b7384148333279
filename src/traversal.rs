//! Generic head-to-tail walks over the chunk list.
//!
//! The walk carries the running predecessor that [`chunk::next`] needs, so
//! every result also reports the chunk sitting before it.

use core::{iter::FusedIterator, ptr};

use crate::chunk::{self, Chunk};

/// A chunk together with its predecessor in list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
  /// Null when `chunk` is the head.
  pub prev: *mut Chunk,
  pub chunk: *mut Chunk,
}

/// Iterator over every chunk reachable from a head.
pub struct Chunks {
  prev: *mut Chunk,
  current: *mut Chunk,
}

impl Chunks {
  /// # Safety
  ///
  /// `head` must be null or the first member of a well-formed list, and the
  /// list must not change while the iterator is alive.
  pub unsafe fn new(head: *mut Chunk) -> Self {
    Self {
      prev: ptr::null_mut(),
      current: head,
    }
  }
}

impl Iterator for Chunks {
  type Item = Cursor;

  fn next(&mut self) -> Option<Cursor> {
    if self.current.is_null() {
      return None;
    }

    let cursor = Cursor {
      prev: self.prev,
      chunk: self.current,
    };
    // Upheld by the contract of `Chunks::new`.
    self.current = unsafe { chunk::next(self.current, self.prev) };
    self.prev = cursor.chunk;

    Some(cursor)
  }
}

impl FusedIterator for Chunks {}

/// First chunk matching `predicate`, with its predecessor.
///
/// # Safety
///
/// See [`Chunks::new`].
pub unsafe fn find<P>(
  head: *mut Chunk,
  mut predicate: P,
) -> Option<Cursor>
where
  P: FnMut(&Chunk) -> bool,
{
  unsafe { Chunks::new(head) }.find(|cursor| predicate(unsafe { &*cursor.chunk }))
}

/// Sum of `extractor` over every chunk; zero for an empty list.
///
/// # Safety
///
/// See [`Chunks::new`].
pub unsafe fn sum<E>(
  head: *mut Chunk,
  mut extractor: E,
) -> usize
where
  E: FnMut(&Chunk) -> usize,
{
  unsafe { Chunks::new(head) }
    .map(|cursor| extractor(unsafe { &*cursor.chunk }))
    .sum()
}

/// Chunk with the lowest non-negative `weight`. Negative weights exclude a
/// chunk; ties go to the earliest chunk.
///
/// # Safety
///
/// See [`Chunks::new`].
pub unsafe fn min<W>(
  head: *mut Chunk,
  weight: W,
) -> Option<Cursor>
where
  W: FnMut(&Chunk) -> isize,
{
  unsafe { best_by(head, weight, |candidate, best| candidate < best) }
}

/// Chunk with the highest non-negative `weight`. Negative weights exclude a
/// chunk; ties go to the earliest chunk.
///
/// # Safety
///
/// See [`Chunks::new`].
pub unsafe fn max<W>(
  head: *mut Chunk,
  weight: W,
) -> Option<Cursor>
where
  W: FnMut(&Chunk) -> isize,
{
  unsafe { best_by(head, weight, |candidate, best| candidate > best) }
}

unsafe fn best_by<W, B>(
  head: *mut Chunk,
  mut weight: W,
  beats: B,
) -> Option<Cursor>
where
  W: FnMut(&Chunk) -> isize,
  B: Fn(isize, isize) -> bool,
{
  let mut best: Option<(Cursor, isize)> = None;

  for cursor in unsafe { Chunks::new(head) } {
    let score = weight(unsafe { &*cursor.chunk });
    if score < 0 {
      continue;
    }
    match best {
      Some((_, best_score)) if !beats(score, best_score) => {}
      _ => best = Some((cursor, score)),
    }
  }

  best.map(|(cursor, _)| cursor)
}
