use std::{env, io::Read, ptr};

use brkalloc::{allocate, api, config, release, resize, zero_allocate};

/// Waits until the user presses ENTER when running with `--step`.
/// Useful when you want to inspect memory state with tools like `pmap`,
/// `gdb`, or just visually track how allocations move the program break.
fn pause(step: bool) {
  if !step {
    return;
  }
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break = {:?}, heap holds {} bytes",
    label,
    std::process::id(),
    api::program_break(),
    api::total_allocated(),
  );
}

fn print_alloc(
  size: usize,
  addr: *mut u8,
) {
  println!(
    "Allocated {} bytes, address = {:?}, program break = {:?}",
    size,
    addr,
    api::program_break()
  );
}

fn main() {
  let step = env::args().any(|arg| arg == "--step");
  config::set_log_level(log::LevelFilter::Debug);

  unsafe {
    print_program_break("start");
    pause(step);

    // --------------------------------------------------------------------
    // 1) Two small chunks, back to back at the top of the heap.
    // --------------------------------------------------------------------
    let first = allocate(4);
    print_alloc(4, first);
    (first as *mut u32).write(0xDEADBEEF);

    let second = allocate(12);
    print_alloc(12, second);
    ptr::write_bytes(second, 0xAB, 12);
    pause(step);

    // --------------------------------------------------------------------
    // 2) Freeing the lower chunk keeps the break where it is: `second`
    //    still sits between it and the break.
    // --------------------------------------------------------------------
    release(first);
    print_program_break("after releasing first");

    // --------------------------------------------------------------------
    // 3) A small request reuses the freed chunk instead of growing.
    // --------------------------------------------------------------------
    let third = allocate(2);
    print_alloc(2, third);
    println!(
      "[3] third == first? {}",
      if third == first {
        "Yes, it reused the freed chunk"
      } else {
        "No, it allocated somewhere else"
      }
    );
    pause(step);

    // --------------------------------------------------------------------
    // 4) Shrinking a large chunk splits off a free chunk in place.
    // --------------------------------------------------------------------
    let big = zero_allocate(1024, 1);
    print_alloc(1024, big);
    let big = resize(big, 512);
    print_program_break("after shrinking to 512");
    pause(step);

    // --------------------------------------------------------------------
    // 5) Releasing everything walks the break back down.
    // --------------------------------------------------------------------
    release(big);
    release(third);
    release(second);
    print_program_break("end");
  }
}
