//! Generic logger utility functions
//!
//! Log lines are stamped with the session time. Lines at debug level and below also name the
//! module and, for worker threads, the thread they were logged from. Individual modules can be
//! given their own level, so that a chatty module can be quietened without losing the rest.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use fern;
use log::{self, info};
use std::collections::BTreeMap;
use std::thread;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level less than `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),

    #[error("Invalid log level `{level}` for module `{module}`")]
    InvalidModuleLevel { module: String, level: String },
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// # Notes
///
/// - `min_level` must be greater than `log::Level::Info`.
///
/// # Safety
///
/// - This function must only be called once to prevent corrupting logs.
pub fn logger_init(
    min_level: self::LevelFilter,
    module_levels: &[(String, LevelFilter)],
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    if min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file =
        fern::log_file(session.log_file_path.clone()).map_err(LoggerInitError::LogFileInitError)?;

    // Setup the logger using fern's builder pattern
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            // If debug or trace include the target, otherwise don't include it
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{:10.6} {}] {}{}: {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    record.target(),
                    thread_tag(),
                    message
                ))
            } else {
                out.finish(format_args!(
                    "[{:10.6} {}] {}",
                    session::get_elapsed_seconds(),
                    level_to_str(record.level()),
                    message
                ))
            }
        })
        .level(min_level);

    for (module, level) in module_levels {
        dispatch = dispatch.level_for(module.clone(), *level);
    }

    dispatch
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    if let Ok(epoch) = session::get_epoch() {
        info!("    Session epoch: {}", epoch);
    }
    info!("    Log level: {:?}", min_level);
    for (module, level) in module_levels {
        info!("    Log level for {}: {:?}", module, level);
    }
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

/// Parse per-module log levels, given as level names (`"warn"`, `"trace"`, ...) keyed by module
/// path.
pub fn parse_module_levels(
    levels: &BTreeMap<String, String>,
) -> Result<Vec<(String, LevelFilter)>, LoggerInitError> {
    levels
        .iter()
        .map(|(module, level)| {
            level
                .parse::<LevelFilter>()
                .map(|l| (module.clone(), l))
                .map_err(|_| LoggerInitError::InvalidModuleLevel {
                    module: module.clone(),
                    level: level.clone(),
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Name of the current thread in brackets, empty for the main thread and unnamed threads.
fn thread_tag() -> String {
    match thread::current().name() {
        Some("main") | None => String::new(),
        Some(name) => format!(" ({})", name),
    }
}

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info => "INF".normal(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold(),
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_module_levels() {
        let mut levels = BTreeMap::new();
        levels.insert("track_lib::sim".to_string(), "info".to_string());
        levels.insert("track_lib::mission_ctrl".to_string(), "TRACE".to_string());

        assert_eq!(
            parse_module_levels(&levels).unwrap(),
            vec![
                ("track_lib::mission_ctrl".to_string(), LevelFilter::Trace),
                ("track_lib::sim".to_string(), LevelFilter::Info),
            ]
        );

        levels.insert("track_lib::pacer".to_string(), "loud".to_string());
        match parse_module_levels(&levels) {
            Err(LoggerInitError::InvalidModuleLevel { module, level }) => {
                assert_eq!(module, "track_lib::pacer");
                assert_eq!(level, "loud");
            }
            r => panic!("Expected an invalid level, got {:?}", r),
        }
    }

    #[test]
    fn test_thread_tag() {
        let tag = thread::Builder::new()
            .name("ctrl_loop".into())
            .spawn(thread_tag)
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(tag, " (ctrl_loop)");

        let tag = thread::spawn(thread_tag).join().unwrap();
        assert_eq!(tag, "");
    }
}
