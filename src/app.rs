//! Process bootstrap shared by the server binary and the CLI.

use anyhow::Context;
use stacks_kernel::settings::Settings;
use stacks_kernel::{InitCtx, ModuleRegistry};

/// Registry with telemetry as the core module and every project module.
pub fn build_registry() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry.register_core(stacks_telemetry::create_module());
    crate::modules::register_all(&mut registry);
    registry
}

/// Boot every module, serve HTTP until Ctrl-C, then shut modules down.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let registry = build_registry();
    let ctx = InitCtx {
        settings: &settings,
    };

    registry
        .boot(&ctx)
        .await
        .context("failed to boot modules")?;

    tracing::info!(
        env = ?settings.environment,
        modules = registry.modules().len(),
        "stacks bootstrap complete"
    );

    let served = stacks_http::start_server(&registry, &settings, shutdown_signal()).await;

    registry
        .shutdown()
        .await
        .context("failed to stop modules")?;

    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
