//! logger setup for the solver drivers: terminal output plus an optional log file
use crate::error::{LinAlgError, Result};
use chrono::Local;
use simplelog::*;
use std::fs::File;

/// Map a textual level ("debug" | "info" | "warn" | "error" | "off" | "none") to a filter.
pub fn parse_loglevel(level: &str) -> Result<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "debug" => Ok(LevelFilter::Debug),
        "info" => Ok(LevelFilter::Info),
        "warn" => Ok(LevelFilter::Warn),
        "error" => Ok(LevelFilter::Error),
        "off" | "none" => Ok(LevelFilter::Off),
        other => Err(LinAlgError::ConfigError(format!(
            "loglevel must be debug, info, warn, error or off, got '{}'",
            other
        ))),
    }
}

/// log file name stamped with the local date and time
pub fn default_log_file_name() -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("linsolve_log_{}.txt", date_and_time)
}

/// Install the global logger once. Returns `Ok(false)` when logging is switched off or a
/// logger was already installed by an earlier call.
pub fn init_logger(loglevel: &str, log_file: Option<&str>) -> Result<bool> {
    let level = parse_loglevel(loglevel)?;
    if level == LevelFilter::Off {
        return Ok(false);
    }
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(name) = log_file {
        let file = File::create(name).map_err(|e| {
            LinAlgError::ConfigError(format!("cannot create log file {}: {}", name, e))
        })?;
        loggers.push(WriteLogger::new(level, Config::default(), file));
    }
    Ok(CombinedLogger::init(loggers).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_loglevel() {
        assert_eq!(parse_loglevel("debug").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_loglevel(" WARN ").unwrap(), LevelFilter::Warn);
        assert_eq!(parse_loglevel("none").unwrap(), LevelFilter::Off);
        assert!(matches!(
            parse_loglevel("verbose"),
            Err(LinAlgError::ConfigError(_))
        ));
    }

    #[test]
    fn test_off_installs_nothing() {
        assert!(!init_logger("off", None).unwrap());
    }

    #[test]
    fn test_log_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(default_log_file_name());
        let path_str = path.to_str().unwrap();
        // the global logger may already be set by another test; the file is created anyway
        let _ = init_logger("info", Some(path_str)).unwrap();
        assert!(path.exists());
        assert!(default_log_file_name().starts_with("linsolve_log_"));
    }
}
