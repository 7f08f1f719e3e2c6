//! Tracing subscriber setup for binaries.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `INNKEEPER_LOG` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "info,innkeeper=debug,sqlx=warn";

/// Installs the global `fmt` subscriber.
///
/// `INNKEEPER_LOG` wins over `RUST_LOG`; `fallback` (usually the config
/// file's `logging.filter`) is used when neither is set.
pub fn init_tracing(fallback: Option<&str>) {
    let filter = std::env::var("INNKEEPER_LOG")
        .ok()
        .and_then(|f| EnvFilter::try_new(f).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(fallback.unwrap_or(DEFAULT_LOG_FILTER)));

    // A second init (tests, embedding apps) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
