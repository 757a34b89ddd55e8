use folder_scanner_core::config::LoggingConfig;
use std::env;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the stderr and file layers described by `settings`.
///
/// `TRACING_LEVEL` and `LOG_FILE_PATH` override the configured level and
/// file. The returned guard flushes the file writer on drop and must be
/// held for the life of `main`.
pub fn init_logger(settings: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| settings.level.clone());
    let filter_layer = EnvFilter::new(filter);

    let log_file = env::var("LOG_FILE_PATH")
        .map(PathBuf::from)
        .ok()
        .or_else(|| settings.file.clone());

    let (file_layer, guard) = match log_file.as_deref().and_then(split_log_path) {
        Some((directory, file_name)) => {
            let file_appender = tracing_appender::rolling::never(directory, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_layer = settings.console.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .pretty()
            .with_file(false)
            .without_time()
            .with_ansi(true)
    });

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(filter_layer)
        .init();

    match &log_file {
        Some(path) => info!("Logging to {}", path.display()),
        None => info!("File logging disabled"),
    }

    guard
}

fn split_log_path(path: &Path) -> Option<(PathBuf, PathBuf)> {
    let file_name = PathBuf::from(path.file_name()?);
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Some((directory, file_name))
}
