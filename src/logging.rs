use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_NAME: &str = "todolist.log";
const DEFAULT_FILTER: &str = "todolist=info";

/// Send tracing output to `todolist.log` in `log_dir`.
///
/// The CLI prints results on stdout and the TUI owns the terminal, so logs
/// never go to the console. `RUST_LOG` overrides the default filter.
/// The returned guard flushes the log when dropped; keep it alive for the
/// whole run. Returns `None` if the directory is unusable or a subscriber
/// is already installed.
pub fn init(log_dir: &Path) -> Option<WorkerGuard> {
    std::fs::create_dir_all(log_dir).ok()?;

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;

    Some(guard)
}
