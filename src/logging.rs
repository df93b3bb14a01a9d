//! Process-wide logging bootstrap.
//!
//! # Invariants
//! - Initialization happens at most once per process and never panics.
//! - Re-initialization with a different level or destination is rejected.
//! - Log lines carry dates and ids only, never free-text user notes.

use std::path::{Path, PathBuf};

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use once_cell::sync::OnceCell;

use crate::settings::CalculatorSettings;

const LOG_FILE_BASENAME: &str = "fitfemme-cycle";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    level: &'static str,
    log_dir: Option<PathBuf>,
    _logger: LoggerHandle,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("unsupported log level `{0}`; expected trace|debug|info|warn|error")]
    UnsupportedLevel(String),
    #[error("log_dir must be an absolute path, got `{0}`")]
    RelativeDir(PathBuf),
    #[error("failed to create log directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to start logger: {0}")]
    Backend(#[from] flexi_logger::FlexiLoggerError),
    #[error("logging already initialized with {current}; refusing to switch to {requested}")]
    AlreadyInitialized { current: String, requested: String },
}

/// Starts the logger: rotating files under `log_dir`, or stderr when `None`.
///
/// Repeating the call with the same arguments is a no-op.
pub fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<(), LoggingError> {
    let level = normalize_level(level)?;
    let log_dir = match log_dir {
        Some(dir) if !dir.is_absolute() => return Err(LoggingError::RelativeDir(dir.into())),
        other => other.map(Path::to_path_buf),
    };

    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState, LoggingError> {
        let logger = Logger::try_with_str(level)?;
        let logger = match &log_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                logger
                    .log_to_file(FileSpec::default().directory(dir).basename(LOG_FILE_BASENAME))
                    .rotate(
                        Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                        Naming::Numbers,
                        Cleanup::KeepLogFiles(MAX_LOG_FILES),
                    )
                    .write_mode(WriteMode::BufferAndFlush)
                    .append()
                    .format_for_files(flexi_logger::detailed_format)
                    .start()?
            }
            None => logger.log_to_stderr().start()?,
        };

        log::info!(
            "event=logging_init module=logging status=ok level={} version={}",
            level,
            env!("CARGO_PKG_VERSION")
        );

        Ok(LoggingState {
            level,
            log_dir: log_dir.clone(),
            _logger: logger,
        })
    })?;

    if state.level != level || state.log_dir != log_dir {
        return Err(LoggingError::AlreadyInitialized {
            current: describe(state.level, state.log_dir.as_deref()),
            requested: describe(level, log_dir.as_deref()),
        });
    }
    Ok(())
}

/// Starts the logger at the level named in `settings`.
pub fn init_from_settings(
    settings: &CalculatorSettings,
    log_dir: Option<&Path>,
) -> Result<(), LoggingError> {
    init_logging(&settings.log_level, log_dir)
}

/// `(level, log_dir)` of the active logger, `None` before initialization.
pub fn logging_status() -> Option<(&'static str, Option<PathBuf>)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.log_dir.clone()))
}

/// Log directory under the platform data dir, if one exists.
pub fn default_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("fitfemme").join("logs"))
}

fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(LoggingError::UnsupportedLevel(other.to_string())),
    }
}

fn describe(level: &str, dir: Option<&Path>) -> String {
    match dir {
        Some(dir) => format!("level `{level}` at `{}`", dir.display()),
        None => format!("level `{level}` on stderr"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_known_levels() {
        assert_eq!(normalize_level(" INFO ").unwrap(), "info");
        assert_eq!(normalize_level("warning").unwrap(), "warn");
        assert!(matches!(
            normalize_level("verbose"),
            Err(LoggingError::UnsupportedLevel(_))
        ));
    }

    #[test]
    fn settings_with_unknown_level_fail_before_touching_state() {
        let settings = CalculatorSettings {
            log_level: "chatty".into(),
            ..CalculatorSettings::default()
        };
        let err = init_from_settings(&settings, None).unwrap_err();
        assert!(matches!(err, LoggingError::UnsupportedLevel(level) if level == "chatty"));
    }

    #[test]
    fn rejects_relative_dir_before_touching_state() {
        let err = init_logging("info", Some(Path::new("logs"))).unwrap_err();
        assert!(matches!(err, LoggingError::RelativeDir(_)));
    }

    #[test]
    fn init_is_idempotent_and_rejects_switching() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();

        init_logging("debug", Some(path.as_path())).unwrap();
        let settings = CalculatorSettings {
            log_level: "DEBUG".into(),
            ..CalculatorSettings::default()
        };
        init_from_settings(&settings, Some(path.as_path())).unwrap();
        assert_eq!(logging_status(), Some(("debug", Some(path.clone()))));

        let err = init_logging("error", Some(path.as_path())).unwrap_err();
        assert!(matches!(err, LoggingError::AlreadyInitialized { .. }));
    }
}
