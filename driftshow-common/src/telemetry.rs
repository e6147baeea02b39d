//! Tracing initialization helper
//!
//! Embedding binaries and integration tests call `init_tracing()` once at
//! startup; repeated calls are ignored so test processes can call it freely.

use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Initialize the global tracing subscriber
///
/// Filter defaults to `driftshow=debug` and can be overridden with the
/// standard `RUST_LOG` environment variable.
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "driftshow=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}
