//! Logging bootstrap
//!
//! The library only emits through the `log` facade. Hosts that have no
//! logger of their own can call [`init_logging`] to get a rolling file log
//! under a directory of their choice. Initialization happens once per
//! process; repeating it with the same directory and level is a no-op.

use std::io;
use std::path::{Path, PathBuf};
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;
use crate::error::{InventoryError, Result};

const LOG_FILE_BASENAME: &str = "invcore";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    log_dir: PathBuf,
    _handle: LoggerHandle,
}

/// Start file logging at `level` under `log_dir`
///
/// # Errors
/// - `InvalidArgument` for an unknown level, a relative directory, or when
///   logging is already running with another level or directory
/// - `IoError` when the directory cannot be created or the backend fails
pub fn init_logging(level: &str, log_dir: &Path) -> Result<()> {
    let level = normalize_level(level)?;
    if !log_dir.is_absolute() {
        return Err(InventoryError::InvalidArgument(format!(
            "log directory must be absolute: {}",
            log_dir.display()
        )));
    }

    let state = LOGGING_STATE.get_or_try_init(|| start_logger(level, log_dir))?;
    if state.log_dir != log_dir || state.level != level {
        return Err(InventoryError::InvalidArgument(format!(
            "logging already initialized at {} with level {}",
            state.log_dir.display(),
            state.level
        )));
    }
    Ok(())
}

/// Active `(level, directory)`, if [`init_logging`] has succeeded
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    LOGGING_STATE.get().map(|state| (state.level, state.log_dir.clone()))
}

fn start_logger(level: &'static str, log_dir: &Path) -> Result<LoggingState> {
    std::fs::create_dir_all(log_dir)?;

    let handle = Logger::try_with_str(level)
        .map_err(|e| InventoryError::InvalidArgument(format!("invalid log level {}: {}", level, e)))?
        .log_to_file(FileSpec::default().directory(log_dir).basename(LOG_FILE_BASENAME))
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|e| InventoryError::IoError(io::Error::other(format!("failed to start logger: {}", e))))?;

    info!(
        "event=logging_init module=logging status=ok level={} log_dir={} version={}",
        level,
        log_dir.display(),
        env!("CARGO_PKG_VERSION")
    );

    Ok(LoggingState {
        level,
        log_dir: log_dir.to_path_buf(),
        _handle: handle,
    })
}

fn normalize_level(level: &str) -> Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(InventoryError::InvalidArgument(format!("unsupported log level: {}", other))),
    }
}
