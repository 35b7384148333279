//! Scenarios against the real process break.
//!
//! Every test leaves the process heap empty and they run one at a time, so
//! each can compare the break before and after.

use std::{
  alloc::{GlobalAlloc, Layout},
  ptr,
};

use brkalloc::{
  BrkAlloc, SearchMode, allocate, api, chunk::HEADER_SIZE, config, release, resize, resize_array,
  zero_allocate,
};
use log::LevelFilter;
use serial_test::serial;

fn quiet() {
  config::set_log_level(LevelFilter::Off);
  config::set_robust_mode(false);
}

fn fill(
  addr: *mut u8,
  size: usize,
) {
  for i in 0..size {
    unsafe { *addr.add(i) = (i % 0xff) as u8 };
  }
}

fn contents(
  addr: *const u8,
  size: usize,
) -> Vec<u8> {
  unsafe { std::slice::from_raw_parts(addr, size) }.to_vec()
}

#[test]
#[serial]
fn single_chunk_is_released() {
  quiet();
  for size in 1..=32 {
    let brk0 = api::program_break();
    unsafe {
      let addr = allocate(size);
      assert!(!addr.is_null());
      fill(addr, size);
      assert_ne!(brk0, api::program_break());

      release(addr);
    }
    assert_eq!(brk0, api::program_break());
  }
}

#[test]
#[serial]
fn greedy_release() {
  quiet();
  let initial = api::program_break();
  unsafe {
    let a = allocate(8);
    let b = allocate(8);
    let top = api::program_break();

    release(a);
    assert_eq!(top, api::program_break());

    release(b);
  }
  assert_eq!(initial, api::program_break());
  assert_eq!(0, api::total_allocated());
}

#[test]
#[serial]
fn reuse_without_growth() {
  quiet();
  let initial = api::program_break();
  unsafe {
    let a = allocate(8);
    let b = allocate(16);
    release(a);
    let top = api::program_break();

    for size in 1..=8 {
      let reused = allocate(size);
      assert_eq!(a, reused);
      assert_eq!(top, api::program_break());
      release(reused);
    }

    release(b);
  }
  assert_eq!(initial, api::program_break());
}

#[test]
#[serial]
fn malloc_zero_is_null() {
  quiet();
  assert!(unsafe { allocate(0) }.is_null());
}

#[test]
#[serial]
fn calloc_zeroes_memory() {
  quiet();
  for n in 1..=1024 {
    unsafe {
      let addr = zero_allocate(n, 8);
      assert!(!addr.is_null());
      assert!(contents(addr, n * 8).iter().all(|&b| b == 0));
      release(addr);
    }
  }
}

#[test]
#[serial]
fn calloc_overflow_is_null() {
  quiet();
  let initial = api::program_break();
  assert!(unsafe { zero_allocate(usize::MAX, 4) }.is_null());
  assert_eq!(initial, api::program_break());
}

#[test]
#[serial]
fn realloc_same_size() {
  quiet();
  for i in 0..10 {
    let size = 1 << i;
    unsafe {
      let p0 = allocate(size);
      fill(p0, size);
      let before = contents(p0, size);

      let p1 = resize(p0, size);
      assert_eq!(p0, p1);
      assert_eq!(before, contents(p1, size));

      release(p1);
    }
  }
}

#[test]
#[serial]
fn realloc_larger_copies_payload() {
  quiet();
  let initial = api::program_break();
  unsafe {
    let p0 = allocate(512);
    let p1 = allocate(512);
    fill(p0, 512);
    fill(p1, 512);

    let p2 = resize(p0, 1024);
    assert!(!p2.is_null());
    assert_eq!(contents(p1, 512), contents(p2, 512));
    fill(p2, 1024);

    release(p1);
    release(p2);
  }
  assert_eq!(initial, api::program_break());
}

#[test]
#[serial]
fn realloc_slightly_smaller_allocates_past_break() {
  quiet();
  unsafe {
    let p0 = allocate(16);
    fill(p0, 16);
    let p1 = resize(p0, 8);
    assert_eq!(p0, p1);

    let brk = api::program_break();
    let p2 = allocate(2);
    assert_eq!(brk.wrapping_add(HEADER_SIZE), p2);

    release(p0);
    release(p2);
  }
}

#[test]
#[serial]
fn realloc_null_and_zero() {
  quiet();
  let initial = api::program_break();
  unsafe {
    let p = resize(ptr::null_mut(), 64);
    assert!(!p.is_null());
    fill(p, 64);
    assert!(resize(p, 0).is_null());
  }
  assert_eq!(initial, api::program_break());
}

#[test]
#[serial]
fn reallocarray_grows_and_rejects_overflow() {
  quiet();
  unsafe {
    let p0 = allocate(256);
    let p1 = allocate(256);
    fill(p0, 256);
    fill(p1, 256);

    assert!(resize_array(p0, usize::MAX, 4).is_null());

    let p2 = resize_array(p0, 256, 4);
    assert!(!p2.is_null());
    assert_eq!(contents(p1, 256), contents(p2, 256));

    release(p2);
    release(p1);
  }
}

#[test]
#[serial]
fn free_null_is_ignored() {
  quiet();
  let initial = api::program_break();
  unsafe { release(ptr::null_mut()) };
  assert_eq!(initial, api::program_break());
}

#[test]
#[serial]
fn robust_mode_survives_fatal_errors() {
  quiet();
  config::set_robust_mode(true);

  let mut x = 0u64;
  let bogus = &raw mut x as *mut u8;
  unsafe {
    // Nothing allocated yet.
    release(bogus);
    assert!(resize(bogus, 4).is_null());

    let a = allocate(8);
    let b = allocate(8);

    release(bogus);
    assert!(resize(bogus, 4).is_null());

    release(a);
    release(a);
    assert!(resize(a, 16).is_null());

    release(b);
  }

  config::set_robust_mode(false);
  assert_eq!(0, api::total_allocated());
}

#[test]
#[serial]
fn best_fit_mode_picks_tightest_chunk() {
  quiet();
  api::set_search_mode(SearchMode::BestFit);
  unsafe {
    let large = allocate(64);
    let guard0 = allocate(8);
    let small = allocate(16);
    let guard1 = allocate(8);
    release(large);
    release(small);

    let got = allocate(16);
    assert_eq!(small, got);

    release(got);
    release(guard0);
    release(guard1);
  }
  api::set_search_mode(SearchMode::FirstFit);
  assert_eq!(0, api::total_allocated());
}

#[test]
#[serial]
fn global_alloc_adapter() {
  quiet();
  let initial = api::program_break();
  unsafe {
    let layout = Layout::array::<u64>(4).unwrap();
    let p = BrkAlloc.alloc_zeroed(layout) as *mut u64;
    assert!(!p.is_null());
    assert_eq!(0, *p.add(3));
    *p.add(3) = 7;

    let grown = BrkAlloc.realloc(p as *mut u8, layout, 128) as *mut u64;
    assert_eq!(7, *grown.add(3));

    assert!(BrkAlloc.alloc(Layout::from_size_align(64, 64).unwrap()).is_null());

    BrkAlloc.dealloc(grown as *mut u8, Layout::array::<u64>(16).unwrap());
  }
  assert_eq!(initial, api::program_break());
}
