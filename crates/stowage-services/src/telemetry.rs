//! Tracing initialisation

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str =
    "stowage_core=info,stowage_storage=info,stowage_processing=info,stowage_services=info";

/// Install a global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG` when set. `json` switches the formatter to
/// one JSON object per line. Fails if a global subscriber is already installed.
pub fn init_tracing(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }

    tracing::debug!(json, "Tracing initialised");
    Ok(())
}
