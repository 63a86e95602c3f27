use anyhow::Context;
use std::sync::Arc;

use catalog_db::DocumentStore;

use crate::module::{InitCtx, Module};

/// Module registry driving the init → collections → start → stop lifecycle
pub struct ModuleRegistry {
    modules: Vec<Arc<dyn Module>>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Register a module with the registry
    pub fn register(&mut self, module: Arc<dyn Module>) {
        self.modules.push(module);
    }

    /// Get all registered modules in registration order
    pub fn modules(&self) -> impl Iterator<Item = &Arc<dyn Module>> {
        self.modules.iter()
    }

    /// Get a module by name
    #[cfg(test)]
    pub fn get_module(&self, name: &str) -> Option<&Arc<dyn Module>> {
        self.modules.iter().find(|module| module.name() == name)
    }

    /// Get the number of registered modules
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// Initialize modules in registration order
    pub async fn init_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("initializing {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "initializing module");

            module
                .init(ctx)
                .await
                .with_context(|| format!("failed to initialize module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Start modules in registration order
    pub async fn start_modules(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!("starting {} modules", self.modules.len());

        for module in &self.modules {
            tracing::info!(module = module.name(), "starting module");

            module
                .start(ctx)
                .await
                .with_context(|| format!("failed to start module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Stop modules in reverse registration order
    pub async fn stop_modules(&self) -> anyhow::Result<()> {
        tracing::info!("stopping {} modules", self.modules.len());

        for module in self.modules.iter().rev() {
            tracing::info!(module = module.name(), "stopping module");

            module
                .stop()
                .await
                .with_context(|| format!("failed to stop module '{}'", module.name()))?;
        }

        Ok(())
    }

    /// Collect the collections declared by all modules as `(module, collection)`
    pub fn collect_collections(&self) -> Vec<(String, &'static str)> {
        let mut collections: Vec<(String, &'static str)> = self
            .modules
            .iter()
            .flat_map(|module| {
                module
                    .collections()
                    .into_iter()
                    .map(move |collection| (module.name().to_string(), collection))
            })
            .collect();

        // Sort by module name and collection for deterministic ordering
        collections.sort();
        collections.dedup();
        collections
    }

    /// Make sure every declared collection exists in the store
    pub async fn ensure_collections(&self, store: &Arc<dyn DocumentStore>) -> anyhow::Result<()> {
        for (module, collection) in self.collect_collections() {
            store
                .ensure_collection(collection)
                .await
                .with_context(|| {
                    format!("failed to ensure collection '{collection}' for module '{module}'")
                })?;
            tracing::debug!(module = %module, collection, "collection ready");
        }

        Ok(())
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
    use catalog_db::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct TestModule {
        name: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Module for TestModule {
        fn name(&self) -> &'static str {
            self.name
        }

        fn collections(&self) -> Vec<&'static str> {
            vec!["things", "widgets"]
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingModule;

    #[async_trait::async_trait]
    impl Module for FailingModule {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
            anyhow::bail!("boom")
        }
    }

    fn test_module(name: &'static str) -> Arc<TestModule> {
        Arc::new(TestModule {
            name,
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_module_registry_creation() {
        let registry = ModuleRegistry::new();
        assert_eq!(registry.module_count(), 0);
        assert!(registry.collect_collections().is_empty());
    }

    #[test]
    fn test_collection_collection() {
        let mut registry = ModuleRegistry::new();
        registry.register(test_module("b"));
        registry.register(test_module("a"));

        let collections = registry.collect_collections();
        assert_eq!(collections.len(), 4);
        assert_eq!(collections[0], ("a".to_string(), "things"));
        assert!(registry.get_module("b").is_some());
        assert!(registry.get_module("c").is_none());
    }

    #[tokio::test]
    async fn test_module_lifecycle() {
        let mut registry = ModuleRegistry::new();
        let settings = Settings::default();
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let ctx = InitCtx {
            settings: &settings,
            store: &store,
        };

        let module = test_module("test");
        registry.register(module.clone());

        registry.init_modules(&ctx).await.unwrap();
        registry.ensure_collections(&store).await.unwrap();
        registry.start_modules(&ctx).await.unwrap();
        registry.stop_modules().await.unwrap();

        assert_eq!(module.calls.load(Ordering::SeqCst), 2);
        assert_eq!(
            store.collections().await.unwrap(),
            vec!["things", "widgets"]
        );
    }

    #[tokio::test]
    async fn test_init_failure_names_module() {
        let mut registry = ModuleRegistry::new();
        registry.register(Arc::new(FailingModule));
        let settings = Settings::default();
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let ctx = InitCtx {
            settings: &settings,
            store: &store,
        };

        let err = registry.init_modules(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("'failing'"));
    }
}
