//! Tracing setup: stderr plus a daily-rotated file under the data directory.

use std::env;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const ENV_DEBUG_LOG: &str = "FROMSCRATCH_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "fromscratch.log";

/// Installs the global subscriber.
///
/// Keep the returned guard alive for the life of the process; dropping it
/// flushes and stops the file writer. Returns `None` when only stderr logging
/// could be set up.
pub fn init(log_dir: &Path) -> Option<WorkerGuard> {
    let filter = build_filter(env::var(ENV_DEBUG_LOG).ok().as_deref());
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    if let Err(err) = fs_err::create_dir_all(log_dir) {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer)
            .try_init();
        tracing::warn!(error = %err, "Log directory unavailable; logging to stderr only");
        return None;
    }

    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer);

    if tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_err()
    {
        // A subscriber is already installed (tests, embedding hosts).
        return None;
    }
    Some(guard)
}

fn build_filter(debug_flag: Option<&str>) -> EnvFilter {
    if debug_enabled(debug_flag) {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

fn debug_enabled(flag: Option<&str>) -> bool {
    matches!(flag, Some("1" | "true" | "TRUE" | "yes" | "YES"))
}
