use once_cell::sync::OnceCell;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Initialise logging. The default level is `info`; with `debug` enabled it
/// is `debug` and may be overridden via `RUST_LOG`.
///
/// When `log_file` is set, output goes to that file instead of stderr.
/// Calling this more than once keeps the first subscriber.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    // Without debug logging `RUST_LOG` is ignored so a stray variable in the
    // user's environment does not turn on verbose output.
    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let Some(path) = log_file else {
        let _ = builder.try_init();
        return;
    };

    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let Some(file_name) = path.file_name() else {
        let _ = builder.try_init();
        return;
    };

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    if builder.with_writer(writer).with_ansi(false).try_init().is_ok() {
        let _ = FILE_GUARD.set(guard);
    }
}
