//! Tracing subscriber bootstrap for Stacks.
//!
//! Installed once per process as the first core module so every later
//! lifecycle step is logged with the configured format.

use std::sync::Arc;

use async_trait::async_trait;
use stacks_kernel::settings::{LogFormat, TelemetrySettings};
use stacks_kernel::{InitCtx, Module};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Build the filter: `RUST_LOG` when present, else the configured directive.
pub fn env_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.filter).map_err(|e| {
            anyhow::anyhow!("invalid telemetry filter '{}': {}", settings.filter, e)
        }),
    }
}

/// Install the global subscriber.
///
/// Returns `Ok(false)` when a subscriber was already installed, which happens
/// in tests and when the CLI and server share a process.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<bool> {
    let filter = env_filter(settings)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match settings.log_format {
        LogFormat::Pretty => registry.with(fmt::layer()).try_init().is_ok(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init()
            .is_ok(),
    };

    Ok(installed)
}

/// Core module wrapping [`init`].
pub struct TelemetryModule;

#[async_trait]
impl Module for TelemetryModule {
    fn name(&self) -> &'static str {
        "telemetry"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let installed = init(&ctx.settings.telemetry)?;
        tracing::info!(
            target: "stacks-telemetry",
            format = ?ctx.settings.telemetry.log_format,
            installed,
            "telemetry ready"
        );
        Ok(())
    }
}

/// Create a new instance of the telemetry module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(TelemetryModule)
}
