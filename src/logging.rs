//! Tracing setup: file log under the data directory, optional stderr mirror

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Environment variable holding the log filter directive
pub const LOG_ENV: &str = "EXTENSION_CATALOG_LOG";

const DEFAULT_DIRECTIVE: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber.
///
/// Logs go to `log_file` as JSON lines. With `verbose`, human readable output
/// is mirrored to stderr. The returned guard flushes the file writer on drop
/// and must be kept alive for the lifetime of the program.
pub fn init(log_file: &Path, verbose: bool) -> anyhow::Result<WorkerGuard> {
    let dir = log_file.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;

    let file_name = log_file
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "extension-catalog.log".into());

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .json()
        .with_writer(writer)
        .with_filter(env_filter());

    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .with_filter(env_filter())
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()?;

    Ok(guard)
}
