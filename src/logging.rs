//! Leveled logging for the allocator.
//!
//! Lines look like `brkalloc 2024-01-31 10:30:00 ERROR: <message>`. Errors
//! go to stderr, everything else to stdout. A line is rendered into a fixed
//! stack buffer and written with a single `write(2)`, so logging never
//! allocates from the heap it is reporting on.

use core::{fmt, mem, ptr};

use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::config;

pub const NAME: &str = "brkalloc";

const LINE_CAPACITY: usize = 512;

static LOGGER: Logger = Logger;

pub struct Logger;

/// Registers [`Logger`] with the `log` facade. Does nothing if the host
/// program already installed its own logger.
pub fn install() {
  let _ = log::set_logger(&LOGGER);
}

impl Log for Logger {
  fn enabled(
    &self,
    metadata: &Metadata,
  ) -> bool {
    metadata.level() <= log::max_level()
  }

  fn log(
    &self,
    record: &Record,
  ) {
    let mut line = LineBuffer::new();
    if !render(record, log::max_level(), Timestamp::now(), &mut line) {
      return;
    }

    let fd = match record.level() {
      Level::Error => libc::STDERR_FILENO,
      _ => libc::STDOUT_FILENO,
    };
    line.write_to(fd);
  }

  fn flush(&self) {}
}

/// Writes `record` as one line into `out` unless its level is below `max`.
/// Returns whether anything was written.
pub fn render<W, T>(
  record: &Record,
  max: LevelFilter,
  timestamp: T,
  out: &mut W,
) -> bool
where
  W: fmt::Write,
  T: fmt::Display,
{
  if record.level() > max {
    return false;
  }
  let _ = write_line(out, record.level(), timestamp, *record.args());
  true
}

/// The allocator's own names for the `log` levels.
pub fn level_name(level: Level) -> &'static str {
  match level {
    Level::Error => "ERROR",
    Level::Warn => "WARNING",
    Level::Info => "INFO",
    Level::Debug => "DIAGNOSTIC",
    Level::Trace => "DEBUG",
  }
}

pub fn write_line<W, T>(
  out: &mut W,
  level: Level,
  timestamp: T,
  message: fmt::Arguments,
) -> fmt::Result
where
  W: fmt::Write,
  T: fmt::Display,
{
  writeln!(out, "{NAME} {timestamp} {}: {message}", level_name(level))
}

/// Logs `message` as an error, then kills the process with `SIGILL` unless
/// robust mode is on. In robust mode control returns to the caller.
pub fn panic(message: fmt::Arguments) {
  log::error!("{message}");

  if !config::robust_mode() {
    unsafe {
      libc::raise(libc::SIGILL);
    }
    std::process::abort();
  }
}

/// Local wall-clock time, rendered as `YYYY-MM-DD hh:mm:ss`.
pub struct Timestamp {
  tm: libc::tm,
}

impl Timestamp {
  pub fn now() -> Self {
    unsafe {
      let raw = libc::time(ptr::null_mut());
      let mut tm: libc::tm = mem::zeroed();
      libc::localtime_r(&raw, &mut tm);
      Self { tm }
    }
  }
}

impl fmt::Display for Timestamp {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(
      f,
      "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
      self.tm.tm_year + 1900,
      self.tm.tm_mon + 1,
      self.tm.tm_mday,
      self.tm.tm_hour,
      self.tm.tm_min,
      self.tm.tm_sec,
    )
  }
}

/// Fixed-size line. Text past the capacity is dropped at a char boundary, and
/// the last byte is kept free for the newline that ends a truncated line.
pub struct LineBuffer {
  bytes: [u8; LINE_CAPACITY],
  len: usize,
  truncated: bool,
}

impl LineBuffer {
  pub const fn new() -> Self {
    Self {
      bytes: [0; LINE_CAPACITY],
      len: 0,
      truncated: false,
    }
  }

  pub fn as_str(&self) -> &str {
    // Only whole chars are ever copied in.
    core::str::from_utf8(&self.bytes[..self.len]).unwrap_or_default()
  }

  pub fn is_truncated(&self) -> bool {
    self.truncated
  }

  /// Ends a truncated line with the newline its cut dropped.
  pub fn terminate(&mut self) {
    if self.truncated && self.len < LINE_CAPACITY && !self.as_str().ends_with('\n') {
      self.bytes[self.len] = b'\n';
      self.len += 1;
    }
  }

  fn write_to(
    &mut self,
    fd: libc::c_int,
  ) {
    self.terminate();

    let mut written = 0;
    while written < self.len {
      let rest = &self.bytes[written..self.len];
      let n = unsafe { libc::write(fd, rest.as_ptr().cast(), rest.len()) };
      if n <= 0 {
        return;
      }
      written += n as usize;
    }
  }
}

impl Default for LineBuffer {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Write for LineBuffer {
  fn write_str(
    &mut self,
    s: &str,
  ) -> fmt::Result {
    let room = (LINE_CAPACITY - 1).saturating_sub(self.len);
    let mut take = s.len().min(room);
    if take < s.len() {
      self.truncated = true;
      while !s.is_char_boundary(take) {
        take -= 1;
      }
    }

    self.bytes[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
    self.len += take;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use core::fmt::Write;

  fn is_timestamp(s: &str) -> bool {
    let shape = b"dddd-dd-dd dd:dd:dd";
    s.len() == shape.len()
      && s.bytes().zip(shape.iter()).all(|(c, &p)| match p {
        b'd' => c.is_ascii_digit(),
        _ => c == p,
      })
  }

  #[test]
  fn test_error_line_format() {
    let mut line = LineBuffer::new();
    write_line(&mut line, Level::Error, Timestamp::now(), format_args!("short error message")).unwrap();

    let text = line.as_str();
    let rest = text.strip_prefix("brkalloc ").unwrap();
    let (timestamp, rest) = rest.split_at(19);
    assert!(is_timestamp(timestamp), "{timestamp}");
    assert_eq!(" ERROR: short error message\n", rest);
  }

  #[test]
  fn test_level_names() {
    assert_eq!("ERROR", level_name(Level::Error));
    assert_eq!("WARNING", level_name(Level::Warn));
    assert_eq!("INFO", level_name(Level::Info));
    assert_eq!("DIAGNOSTIC", level_name(Level::Debug));
    assert_eq!("DEBUG", level_name(Level::Trace));
  }

  #[test]
  fn test_fixed_timestamp() {
    let mut tm: libc::tm = unsafe { mem::zeroed() };
    tm.tm_year = 122;
    tm.tm_mon = 0;
    tm.tm_mday = 31;
    tm.tm_hour = 10;
    tm.tm_min = 30;
    tm.tm_sec = 5;

    let mut line = LineBuffer::new();
    write_line(&mut line, Level::Debug, Timestamp { tm }, format_args!("{} bytes", 40)).unwrap();
    assert_eq!("brkalloc 2022-01-31 10:30:05 DIAGNOSTIC: 40 bytes\n", line.as_str());
  }

  #[test]
  fn test_line_buffer_truncates() {
    let mut line = LineBuffer::new();
    for _ in 0..LINE_CAPACITY {
      line.write_str("é").unwrap();
    }
    assert!(line.is_truncated());
    assert_eq!(LINE_CAPACITY - 2, line.as_str().len());

    line.terminate();
    let text = line.as_str();
    assert_eq!(LINE_CAPACITY - 1, text.len());
    assert!(text.ends_with('\n'));
    assert!(text.trim_end_matches('\n').chars().all(|c| c == 'é'));
  }

  #[test]
  fn test_truncated_line_keeps_newline() {
    let mut line = LineBuffer::new();
    let long = "x".repeat(2 * LINE_CAPACITY);
    write_line(&mut line, Level::Warn, "now", format_args!("{long}")).unwrap();
    line.terminate();

    let text = line.as_str();
    assert!(text.starts_with("brkalloc now WARNING: xxx"));
    assert!(text.ends_with("x\n"));
    assert_eq!(LINE_CAPACITY, text.len());
  }

  #[test]
  fn test_untruncated_line_is_left_alone() {
    let mut line = LineBuffer::new();
    write_line(&mut line, Level::Info, "now", format_args!("short")).unwrap();
    line.terminate();
    assert_eq!("brkalloc now INFO: short\n", line.as_str());
  }

  fn rendered(
    level: Level,
    max: LevelFilter,
  ) -> Option<String> {
    let mut line = LineBuffer::new();
    let written = render(
      &Record::builder().level(level).args(format_args!("{} bytes", 40)).build(),
      max,
      "now",
      &mut line,
    );
    written.then(|| line.as_str().to_owned())
  }

  #[test]
  fn test_level_filter_suppresses_lower_levels() {
    assert_eq!(None, rendered(Level::Info, LevelFilter::Warn));
    assert_eq!(None, rendered(Level::Debug, LevelFilter::Warn));
    assert_eq!(None, rendered(Level::Trace, LevelFilter::Debug));
    assert_eq!(None, rendered(Level::Error, LevelFilter::Off));
  }

  #[test]
  fn test_level_filter_passes_configured_level_and_above() {
    assert_eq!(
      Some("brkalloc now WARNING: 40 bytes\n".to_owned()),
      rendered(Level::Warn, LevelFilter::Warn)
    );
    assert_eq!(
      Some("brkalloc now ERROR: 40 bytes\n".to_owned()),
      rendered(Level::Error, LevelFilter::Warn)
    );
    assert_eq!(
      Some("brkalloc now DIAGNOSTIC: 40 bytes\n".to_owned()),
      rendered(Level::Debug, LevelFilter::Debug)
    );
  }
}
