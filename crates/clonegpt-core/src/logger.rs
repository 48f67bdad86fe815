//! Logging setup.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Install the global fmt subscriber. `RUST_LOG` overrides `default_level`.
/// Later calls are no-ops.
pub fn init_logger(default_level: &str) {
    INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default_level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        // Another subscriber may already be installed by the host.
        if tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init().is_err()
        {
            tracing::debug!("[Logger] Global subscriber already set");
            return;
        }
        tracing::info!("[Logger] Initialized (default level: {})", default_level);
    });
}

pub fn is_initialized() -> bool {
    INITIALIZED.get().is_some()
}
