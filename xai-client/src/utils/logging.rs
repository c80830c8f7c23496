use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Default filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "xai_client=debug,warn";

/// Initialize logging with tracing
///
/// This function sets up the tracing subscriber with the following configuration:
/// - Reads filter from RUST_LOG environment variable if available
/// - Falls back to "xai_client=debug,warn" if RUST_LOG is not set
/// - Uses a formatted output layer
///
/// Repeated calls are no-ops.
///
/// # Returns
/// `true` if this call installed the subscriber
///
/// # Example
///
/// ```no_run
/// use xai_client::utils::logging::init_logging;
///
/// init_logging();
/// ```
pub fn init_logging() -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let installed = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("xai-client logging initialized");
    }
    installed
}
