//! Application startup: store, modules, and the HTTP server.

use std::sync::Arc;

use anyhow::Context;
use catalog_db::{DocumentStore, MemoryStore};
use catalog_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;

/// Open the document store, loading the configured seed file if any
pub async fn build_store(settings: &Settings) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store = MemoryStore::new();

    if let Some(path) = &settings.database.seed_path {
        let counts = store
            .load_seed(path)
            .await
            .with_context(|| format!("failed to load seed file '{}'", path.display()))?;
        for (collection, documents) in counts {
            tracing::debug!(collection = %collection, documents, "seeded collection");
        }
    }

    Ok(Arc::new(store))
}

/// Build the registry holding every application module
pub fn build_registry(store: &Arc<dyn DocumentStore>) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store).context("failed to register modules")?;
    Ok(registry)
}

/// Run the application until shutdown
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    catalog_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        database = %settings.database.name,
        "catalog-app bootstrap starting"
    );

    let store = build_store(&settings).await?;
    let registry = build_registry(&store)?;
    let ctx = InitCtx {
        settings: &settings,
        store: &store,
    };

    registry.init_modules(&ctx).await?;
    registry.ensure_collections(&store).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!(modules = registry.module_count(), "catalog-app bootstrap complete");

    let served = catalog_http::start_server(&registry, &settings).await;
    registry.stop_modules().await?;
    served
}
