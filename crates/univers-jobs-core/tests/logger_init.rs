//! The global subscriber can only be installed once per process.

use univers_jobs_core::observability::LoggerError;
use univers_jobs_core::{LoggerConfig, LoggerFormat, logger_init};

#[test]
fn second_initialization_is_reported() {
    let cfg = LoggerConfig {
        format: LoggerFormat::Json,
        level: "univers_jobs_core=debug".to_string(),
        ..LoggerConfig::default()
    };

    assert!(logger_init(&cfg).is_ok());
    assert!(matches!(
        logger_init(&LoggerConfig::default()),
        Err(LoggerError::AlreadyInitialized)
    ));
}
