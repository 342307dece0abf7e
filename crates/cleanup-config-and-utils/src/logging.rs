//! Logging initialization for the handler.
//!
//! Thin wrapper over the observability crate so the binary only needs the
//! configured level and format.

use observability::{LogConfig, LogFormat};

/// Initialize the logging system.
///
/// `RUST_LOG` still wins over `level` when set.
pub fn init_logging(level: &str, format: &str) {
    observability::init_with_config(LogConfig {
        service_name: "b1-cleanup".into(),
        default_level: parse_level(level).as_str().to_ascii_lowercase(),
        format: LogFormat::parse(format),
    });
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
