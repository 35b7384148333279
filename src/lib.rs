//! # brkalloc - A Break-Driven Heap Allocator
//!
//! This crate implements `malloc`/`free`/`calloc`/`realloc`/`reallocarray`
//! on top of the program break, the same way a classic Unix allocator grows
//! its heap with `sbrk(2)`.
//!
//! ## Overview
//!
//! The heap is one contiguous run of chunks between the first chunk ever
//! handed out and the current program break:
//!
//! ```text
//!   Heap Layout:
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         HEAP MEMORY                                  │
//!   │                                                                      │
//!   │   ┌────┬──────┬────┬────┬────┬──────────┬────┬─────┐                 │
//!   │   │ H  │  A   │ H  │ B  │ H  │    C     │ H  │  D  │                 │
//!   │   └────┴──────┴────┴────┴────┴──────────┴────┴─────┘                 │
//!   │     used        free      used             used    ▲                 │
//!   │                                                    │                 │
//!   │                                                 Program              │
//!   │                                                  Break               │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Chunks are only ever appended at the top or split in place, so list
//!   order is address order and the last chunk ends at the break.
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   brkalloc
//!   ├── align      - Size rounding (align!, checked_align)
//!   ├── chunk      - Chunk header and XOR link primitives
//!   ├── traversal  - find / sum / min / max over the chunk list
//!   ├── search     - First-fit, best-fit and bookkeeping queries
//!   ├── brk        - ProgramBreak trait, Sbrk and Arena breaks
//!   ├── heap       - Heap engine: allocate, release, resize
//!   ├── error      - HeapError
//!   ├── config     - Robust mode and log level
//!   ├── logging    - Leveled logger and the fatal-error path
//!   └── api        - Process heap, entry points, GlobalAlloc
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use brkalloc::{Heap, brk::Arena};
//!
//! fn main() {
//!     let mut heap = Heap::new(Arena::new(1 << 20).unwrap());
//!
//!     unsafe {
//!         let ptr = heap.allocate(8).unwrap() as *mut u64;
//!         *ptr = 42;
//!         heap.release(ptr as *mut u8).unwrap();
//!     }
//! }
//! ```
//!
//! ## Chunk Headers
//!
//! Each header stores one link word instead of two pointers:
//!
//! ```text
//!   Single Chunk:
//!   ┌───────────────────────────┬────────────────────────────────┐
//!   │    Chunk Header           │         User Data              │
//!   │  ┌─────────────────────┐  │                                │
//!   │  │ start: user ptr     │  │  ┌──────────────────────────┐  │
//!   │  │ size: N             │  │  │                          │  │
//!   │  │ link: prev ^ next   │  │  │     N bytes usable       │  │
//!   │  │ in_use: bool        │  │  │                          │  │
//!   │  └─────────────────────┘  │  └──────────────────────────┘  │
//!   │      32 bytes (64 bit)    │                                │
//!   └───────────────────────────┴────────────────────────────────┘
//!                               ▲
//!                               └── Pointer returned to user
//! ```
//!
//! Walking the list needs one known neighbour: `next = link ^ prev`.
//!
//! ## Behaviour
//!
//! - **Reuse**: a free chunk that is large enough is handed out again
//!   (first-fit by default, best-fit on request).
//! - **Release**: freeing a chunk at the top of the heap lowers the break,
//!   together with every free chunk below it.
//! - **Shrink**: `resize` to a smaller size splits the leftover into a free
//!   chunk when it can hold a header.
//! - **No coalescing**: adjacent free chunks are not merged.
//!
//! ## Limitations
//!
//! - **One break owner**: nothing else may move the break while the process
//!   heap is populated.
//! - **Fixed alignment**: regions are word aligned (16 bytes with the
//!   `malloc` feature); `BrkAlloc` refuses larger alignments.
//! - **Unix-only**: requires `libc` and `sbrk`.
//!
//! ## Safety
//!
//! This crate is inherently unsafe as it deals with raw memory management.
//! All allocation and deallocation operations require `unsafe` blocks.

pub mod align;
pub mod api;
pub mod brk;
pub mod chunk;
pub mod config;
pub mod error;
#[cfg(feature = "malloc")]
mod exports;
pub mod heap;
pub mod logging;
pub mod search;
pub mod traversal;

pub use api::{BrkAlloc, allocate, release, resize, resize_array, zero_allocate};
pub use error::{HeapError, Result};
pub use heap::Heap;
pub use search::SearchMode;
