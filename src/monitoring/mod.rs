use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::error::{Result, SwapError};

/// Initializes logging to console and a rolling JSON file. The returned
/// guard must be kept alive for file logging to flush.
pub fn init_logging(log_dir: &str, file_level: &str, console_level: &str) -> Result<WorkerGuard> {
    let log_path = Path::new(log_dir);
    if !log_path.exists() {
        std::fs::create_dir_all(log_path).map_err(SwapError::Io)?;
    }

    let file_appender = rolling::daily(log_dir, "wagus-swap.log");
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter = EnvFilter::try_new(file_level).map_err(|e| {
        SwapError::ConfigError(format!("Invalid file log level filter '{}': {}", file_level, e))
    })?;
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_appender)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .json()
        .with_filter(file_filter);

    let console_filter = EnvFilter::try_new(console_level).map_err(|e| {
        SwapError::ConfigError(format!(
            "Invalid console log level filter '{}': {}",
            console_level, e
        ))
    })?;
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_span_events(FmtSpan::CLOSE)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| {
            SwapError::InternalError(format!("Failed to initialize tracing subscriber: {}", e))
        })?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;
    use std::time::Duration;
    use tracing::info;

    const TEST_LOG_DIR: &str = "./tmp_test_logs";

    fn cleanup_logs() {
        let _ = fs::remove_dir_all(TEST_LOG_DIR);
    }

    #[test]
    fn test_logging_initialization() {
        cleanup_logs();
        let guard = init_logging(TEST_LOG_DIR, "debug", "info");
        assert!(guard.is_ok());

        let _guard = guard.unwrap();
        info!("Info level message for console and file");
        tracing::debug!("Debug level message for file only");

        drop(_guard);
        thread::sleep(Duration::from_millis(200));

        let entries = fs::read_dir(TEST_LOG_DIR).expect("log dir should exist");
        assert!(entries.count() > 0);

        cleanup_logs();
    }

    #[test]
    fn test_invalid_filter_is_rejected() {
        let dir = "./tmp_test_logs_invalid";
        let result = init_logging(dir, "not a filter!!!", "info");
        assert!(result.is_err());
        let _ = fs::remove_dir_all(dir);
    }
}
