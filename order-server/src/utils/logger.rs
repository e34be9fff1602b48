//! Logging Infrastructure
//!
//! tracing-subscriber setup: filter from `LOG_LEVEL`, optional JSON output and
//! optional daily-rolling file output.

use std::path::Path;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

/// Initialize the logger with optional JSON and file output
///
/// `log_level` accepts anything `EnvFilter` does (`debug`,
/// `order_server=debug,tower_http=info`, ...). An invalid filter falls back to
/// `info`. Calling this twice is harmless; the second call is ignored.
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let writer = match log_dir {
        Some(dir) if std::fs::create_dir_all(Path::new(dir)).is_ok() => {
            BoxMakeWriter::new(tracing_appender::rolling::daily(dir, "order-server"))
        }
        _ => BoxMakeWriter::new(std::io::stdout),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    let result = if json.unwrap_or(false) {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = result {
        eprintln!("Logger already initialized: {}", e);
    }
}
