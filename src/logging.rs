use env_logger::{Builder, Target};
use log::LevelFilter;
use std::fs::{self, OpenOptions};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot open log file: {0}")]
    Io(#[from] std::io::Error),
    #[error("logger already installed")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

/// Install the global logger, appending to `path`. The terminal belongs to
/// the game, so nothing is ever written to stdout or stderr.
///
/// `RUST_LOG`, when set, replaces `level`.
pub fn init(path: &Path, level: LevelFilter) -> Result<(), LoggingError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut builder = Builder::new();
    builder
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_millis()
        .filter_level(level);
    if std::env::var("RUST_LOG").is_ok() {
        builder.parse_default_env();
    }
    builder.try_init()?;
    Ok(())
}
