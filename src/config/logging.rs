use std::env;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

pub const DEFAULT_MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Deletes the log file if it has grown past `max_bytes`. Returns whether a
/// rotation happened. Only checked at startup.
pub fn rotate_log_file(path: &Path, max_bytes: u64) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.len() > max_bytes => {
            fs::remove_file(path)?;
            Ok(true)
        }
        Ok(_) => Ok(false),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Initialize the logging system with tracing: console output on stderr and,
/// when a path is given, an append-only log file.
pub fn init_logging(log_file: Option<&Path>, max_bytes: u64) {
    // Get log level from environment or default to INFO
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let mut rotated = false;
    let file_layer = log_file.and_then(|path| {
        match rotate_log_file(path, max_bytes) {
            Ok(did_rotate) => rotated = did_rotate,
            Err(e) => eprintln!("Failed to rotate log file {}: {}", path.display(), e),
        }
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(
                fmt::layer()
                    .with_timer(fmt::time::UtcTime::rfc_3339())
                    .with_ansi(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(Mutex::new(file)),
            ),
            Err(e) => {
                eprintln!("Failed to open log file {}: {}", path.display(), e);
                None
            }
        }
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_file(true)
                .with_line_number(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_writer(io::stderr),
        )
        .with(file_layer);

    match subscriber.try_init() {
        Ok(_) => {}
        Err(e) => eprintln!("Failed to initialize tracing subscriber: {}", e),
    }

    if rotated {
        tracing::info!(event = "log_rotated", max_bytes, "Log file exceeded size cap and was reset");
    }
}
