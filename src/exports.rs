//! C entry points for `LD_PRELOAD=libbrkalloc.so`.

use libc::{c_void, size_t};

use crate::api;

#[unsafe(no_mangle)]
pub unsafe extern "C" fn malloc(size: size_t) -> *mut c_void {
  unsafe { api::allocate(size) }.cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn free(ptr: *mut c_void) {
  unsafe { api::release(ptr.cast()) }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn calloc(
  nmemb: size_t,
  size: size_t,
) -> *mut c_void {
  unsafe { api::zero_allocate(nmemb, size) }.cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn realloc(
  ptr: *mut c_void,
  size: size_t,
) -> *mut c_void {
  unsafe { api::resize(ptr.cast(), size) }.cast()
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn reallocarray(
  ptr: *mut c_void,
  nmemb: size_t,
  size: size_t,
) -> *mut c_void {
  unsafe { api::resize_array(ptr.cast(), nmemb, size) }.cast()
}
