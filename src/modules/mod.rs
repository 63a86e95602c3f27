pub mod catalog;

use std::sync::Arc;

use catalog_db::DocumentStore;
use catalog_kernel::ModuleRegistry;

/// Register every application module with the registry
pub fn register_all(
    registry: &mut ModuleRegistry,
    store: &Arc<dyn DocumentStore>,
) -> anyhow::Result<()> {
    registry.register(catalog::create_module(Arc::clone(store))?);
    Ok(())
}
