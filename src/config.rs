//! Process configuration: robust mode and the minimum log level.
//!
//! Both are read from the environment once, through `libc::getenv` so that
//! reading them never touches the heap being configured.

use core::{
  ffi::{CStr, c_char},
  sync::atomic::{AtomicBool, Ordering},
};
use std::sync::Once;

use log::LevelFilter;

use crate::logging;

pub const ROBUST_ENV: &CStr = c"BRKALLOC_ROBUST";
pub const LOG_LEVEL_ENV: &CStr = c"BRKALLOC_LOG";

static ROBUST: AtomicBool = AtomicBool::new(false);
static INIT: Once = Once::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
  /// Fatal errors are logged and control returns to the caller instead of
  /// aborting.
  pub robust: bool,
  pub log_level: LevelFilter,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      robust: false,
      log_level: LevelFilter::Warn,
    }
  }
}

impl Config {
  pub fn from_env() -> Self {
    let mut config = Self::default();

    if let Some(value) = getenv(ROBUST_ENV) {
      config.robust = parse_flag(value);
    }
    if let Some(level) = getenv(LOG_LEVEL_ENV).and_then(parse_level) {
      config.log_level = level;
    }

    config
  }

  pub fn apply(self) {
    ROBUST.store(self.robust, Ordering::Relaxed);
    log::set_max_level(self.log_level);
  }
}

/// Installs the logger and applies the environment. Runs once per process;
/// later calls return immediately. The setters below run it first, so their
/// values are never overwritten by the environment afterwards.
pub fn init() {
  INIT.call_once(|| {
    logging::install();
    Config::from_env().apply();
  });
}

pub fn robust_mode() -> bool {
  ROBUST.load(Ordering::Relaxed)
}

pub fn set_robust_mode(robust: bool) {
  init();
  ROBUST.store(robust, Ordering::Relaxed);
}

pub fn set_log_level(level: LevelFilter) {
  init();
  log::set_max_level(level);
}

fn getenv(name: &CStr) -> Option<&'static [u8]> {
  let value: *const c_char = unsafe { libc::getenv(name.as_ptr()) };
  if value.is_null() {
    return None;
  }
  Some(unsafe { CStr::from_ptr(value) }.to_bytes())
}

fn parse_flag(value: &[u8]) -> bool {
  let accepted: [&[u8]; 4] = [b"1", b"true", b"yes", b"on"];
  accepted
    .iter()
    .any(|accepted| value.eq_ignore_ascii_case(accepted))
}

/// Accepts the allocator's own level names next to the `log` ones.
pub fn parse_level(value: &[u8]) -> Option<LevelFilter> {
  let levels: [(&[u8], LevelFilter); 9] = [
    (b"none", LevelFilter::Off),
    (b"off", LevelFilter::Off),
    (b"error", LevelFilter::Error),
    (b"warning", LevelFilter::Warn),
    (b"warn", LevelFilter::Warn),
    (b"info", LevelFilter::Info),
    (b"diagnostic", LevelFilter::Debug),
    (b"debug", LevelFilter::Trace),
    (b"trace", LevelFilter::Trace),
  ];

  levels
    .iter()
    .find(|(name, _)| value.eq_ignore_ascii_case(name))
    .map(|&(_, level)| level)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default() {
    let config = Config::default();
    assert!(!config.robust);
    assert_eq!(LevelFilter::Warn, config.log_level);
  }

  #[test]
  fn test_parse_flag() {
    for accepted in ["1", "true", "TRUE", "yes", "on"] {
      assert!(parse_flag(accepted.as_bytes()), "{accepted}");
    }
    for rejected in ["0", "false", "", "robust"] {
      assert!(!parse_flag(rejected.as_bytes()), "{rejected}");
    }
  }

  #[test]
  fn test_parse_level() {
    assert_eq!(Some(LevelFilter::Off), parse_level(b"none"));
    assert_eq!(Some(LevelFilter::Error), parse_level(b"ERROR"));
    assert_eq!(Some(LevelFilter::Warn), parse_level(b"warning"));
    assert_eq!(Some(LevelFilter::Info), parse_level(b"info"));
    assert_eq!(Some(LevelFilter::Debug), parse_level(b"diagnostic"));
    assert_eq!(Some(LevelFilter::Trace), parse_level(b"debug"));
    assert_eq!(None, parse_level(b"loud"));
  }
}
