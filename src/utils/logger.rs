// src/utils/logger.rs

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::sync::OnceLock;

static MAX_LEVEL: OnceLock<LevelFilter> = OnceLock::new();
static LOGGER: StderrLogger = StderrLogger;

struct StderrLogger;

/// Install the stderr logger. `verbose` lowers the threshold from Info to Debug.
pub fn init(verbose: bool) -> Result<(), SetLoggerError> {
  let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
  let _ = MAX_LEVEL.set(level);
  log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

fn prefix(level: Level) -> &'static str {
  match level {
    Level::Error => "[E]",
    Level::Warn => "[W]",
    Level::Info => "[I]",
    Level::Debug => "[D]",
    Level::Trace => "[T]",
  }
}

impl log::Log for StderrLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= *MAX_LEVEL.get().unwrap_or(&LevelFilter::Info)
  }

  fn log(&self, record: &Record) {
    if self.enabled(record.metadata()) {
      // Format: "[W] nanogen::model::atoms: ids are not unique"
      let mut err = std::io::stderr().lock();
      let _ = writeln!(err, "{} {}: {}", prefix(record.level()), record.target(), record.args());
    }
  }

  fn flush(&self) {
    let _ = std::io::stderr().flush();
  }
}
