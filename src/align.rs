use core::mem;

/// Size of a machine word.
pub const WORD: usize = mem::size_of::<usize>();

/// Every chunk header and every user region handed out by the heap starts on
/// a multiple of this. The `malloc` build matches the C ABI's
/// `alignof(max_align_t)`.
#[cfg(feature = "malloc")]
pub const ALIGNMENT: usize = 16;
#[cfg(not(feature = "malloc"))]
pub const ALIGNMENT: usize = WORD;

/// Rounds a byte count up to [`ALIGNMENT`].
///
/// # Examples
///
/// ```rust
/// use brkalloc::align;
/// use brkalloc::align::ALIGNMENT;
///
/// assert_eq!(align!(1), ALIGNMENT);
/// assert_eq!(align!(ALIGNMENT), ALIGNMENT);
/// assert_eq!(align!(ALIGNMENT + 1), 2 * ALIGNMENT);
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    ($value + $crate::align::ALIGNMENT - 1) & !($crate::align::ALIGNMENT - 1)
  };
}

/// Same rounding as [`align!`], but reports overflow instead of wrapping.
pub const fn checked_align(size: usize) -> Option<usize> {
  if size > usize::MAX - (ALIGNMENT - 1) {
    return None;
  }
  Some(align!(size))
}
