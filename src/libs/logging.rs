use crate::libs::messages::macros::is_debug_mode;
use tracing_subscriber::EnvFilter;

/// Installs the `tracing` subscriber when debug output was requested.
///
/// `RUST_LOG` wins when set; `BILLABLE_DEBUG` alone enables `debug` for
/// this crate only. Without either, nothing is installed and the message
/// macros print plain lines.
pub fn init_logging() {
    if !is_debug_mode() {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}=debug", env!("CARGO_PKG_NAME").replace('-', "_"))));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}
