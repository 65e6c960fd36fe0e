//! Tracing setup
//!
//! `RUST_LOG` overrides the default filter. Production uses JSON lines,
//! anything else the human-readable formatter.

use overworked_core::TransferConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "overworked=debug";

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed, so callers embedding the
/// client in a larger application can keep their own.
pub fn init_telemetry(config: &TransferConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let json = use_json_output(config);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .try_init()?;

    tracing::info!(environment = %config.environment, json = json, "Tracing initialized");
    Ok(())
}

fn use_json_output(config: &TransferConfig) -> bool {
    config.is_production()
}

pub async fn shutdown_telemetry() {
    tracing::debug!("Telemetry shutdown");
}
