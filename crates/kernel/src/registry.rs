use anyhow::Context;
use std::sync::Arc;

use crate::module::{InitCtx, Module};

/// Core module initialization order (excluding HTTP server)
const CORE_MODULE_ORDER: &[&str] = &[
    "telemetry", // Logging must be up before anything else reports
                 // Note: HTTP server is started separately after all modules are initialized
];

/// Module registry for managing module lifecycle with core/custom separation
pub struct ModuleRegistry {
    core_modules: Vec<Arc<dyn Module>>,
    custom_modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            core_modules: Vec::new(),
            custom_modules: Vec::new(),
        }
    }

    /// Register a core module with the registry
    pub fn register_core(&mut self, module: Arc<dyn Module>) {
        self.core_modules.push(module);
    }

    /// Register a custom module with the registry
    pub fn register_custom(&mut self, module: Arc<dyn Module>) {
        self.custom_modules.push(module);
    }

    /// Get all registered modules (core + custom)
    pub fn modules(&self) -> Vec<&Arc<dyn Module>> {
        let mut all_modules = Vec::new();
        all_modules.extend(self.core_modules.iter());
        all_modules.extend(self.custom_modules.iter());
        all_modules
    }

    /// Get a module by name (searches both core and custom modules)
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.core_modules
            .iter()
            .find(|module| module.name() == name)
            .or_else(|| {
                self.custom_modules
                    .iter()
                    .find(|module| module.name() == name)
            })
    }

    /// Get the number of core modules
    pub fn core_module_count(&self) -> usize {
        self.core_modules.len()
    }

    /// Get the number of custom modules
    pub fn custom_module_count(&self) -> usize {
        self.custom_modules.len()
    }

    /// Core modules in `CORE_MODULE_ORDER`; unknown core modules are skipped.
    fn ordered_core(&self) -> impl DoubleEndedIterator<Item = &Arc<dyn Module>> {
        CORE_MODULE_ORDER.iter().filter_map(move |&module_name| {
            self.core_modules.iter().find(|m| m.name() == module_name)
        })
    }

    /// Initialize core modules in the correct order
    pub async fn init_core_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        for module in self.ordered_core() {
            module.init(ctx).await.with_context(|| {
                format!("failed to initialize core module '{}'", module.name())
            })?;

            tracing::info!(module = module.name(), "initialized core module");
        }

        Ok(())
    }

    /// Initialize custom modules
    pub async fn init_custom_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} custom modules", self.custom_modules.len());

        for module in &self.custom_modules {
            tracing::info!(module = module.name(), "initializing custom module");

            module.init(ctx).await.with_context(|| {
                format!("failed to initialize custom module '{}'", module.name())
            })?;
        }

        Ok(())
    }

    /// Start core modules in the correct order
    pub async fn start_core_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("starting core modules in order: {:?}", CORE_MODULE_ORDER);

        for module in self.ordered_core() {
            tracing::info!(module = module.name(), "starting core module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start core module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Start custom modules
    pub async fn start_custom_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("starting {} custom modules", self.custom_modules.len());

        for module in &self.custom_modules {
            tracing::info!(module = module.name(), "starting custom module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start custom module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop custom modules first (reverse order)
    pub async fn stop_custom_modules(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} custom modules", self.custom_modules.len());

        for module in self.custom_modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping custom module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop custom module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop core modules in reverse order
    pub async fn stop_core_modules(&self) -> anyhow::Result<()> {
        tracing::info!("stopping core modules in reverse order");

        for module in self.ordered_core().rev() {
            tracing::info!(module = module.name(), "stopping core module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop core module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Run init and start for every module, core modules first.
    pub async fn boot(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        self.init_core_modules(ctx).await?;
        self.init_custom_modules(ctx).await?;
        self.start_core_modules(ctx).await?;
        self.start_custom_modules(ctx).await
    }

    /// Stop every module, custom modules first.
    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.stop_custom_modules().await?;
        self.stop_core_modules().await
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::sync::Mutex;

    struct TestModule {
        name: &'static str,
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl TestModule {
        fn record(&self, event: &str) {
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:{}", event, self.name));
        }
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.record("init");
            Ok(())
        }

        async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.record("start");
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.record("stop");
            Ok(())
        }
    }

    struct FailingModule;

    #[async_trait::async_trait]
    impl Module for FailingModule {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            anyhow::bail!("no seed data")
        }
    }

    fn module(name: &'static str, journal: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Module> {
        Arc::new(TestModule {
            name,
            journal: Arc::clone(journal),
        })
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert!(registry.modules().is_empty());
    }

    #[test]
    fn test_get_module_searches_core_and_custom() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register_core(module("telemetry", &journal));
        registry.register_custom(module("library", &journal));

        assert_eq!(registry.core_module_count(), 1);
        assert_eq!(registry.custom_module_count(), 1);
        assert!(registry.get_module("telemetry").is_some());
        assert!(registry.get_module("library").is_some());
        assert!(registry.get_module("catalog").is_none());
    }

    #[tokio::test]
    async fn test_module_lifecycle_order() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register_core(module("telemetry", &journal));
        registry.register_custom(module("library", &journal));
        registry.register_custom(module("catalog", &journal));

        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };

        registry.boot(&ctx).await.unwrap();
        registry.shutdown().await.unwrap();

        let events = journal.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                "init:telemetry",
                "init:library",
                "init:catalog",
                "start:telemetry",
                "start:library",
                "start:catalog",
                "stop:catalog",
                "stop:library",
                "stop:telemetry",
            ]
        );
    }

    #[tokio::test]
    async fn test_core_modules_outside_order_are_skipped() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ModuleRegistry::new();
        registry.register_core(module("unlisted", &journal));

        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };
        registry.init_core_modules(&ctx).await.unwrap();

        assert!(journal.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_init_failure_names_the_module() {
        let mut registry = ModuleRegistry::new();
        registry.register_custom(Arc::new(FailingModule));

        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };
        let err = registry.init_custom_modules(&ctx).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "failed to initialize custom module 'broken'"
        );
    }
}
