//! The library catalog: authors, genres, books, and their physical copies.

pub mod models;
pub mod repository;
mod routes;


use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use catalog_db::{DocumentStore, Entity};
use catalog_kernel::{InitCtx, Module};

use crate::views::Views;
use models::{Author, Book, BookInstance, Genre};
use repository::Catalog;

pub use routes::ROUTES;

/// Shared state injected into every catalog handler
#[derive(Clone)]
pub struct CatalogState {
    pub catalog: Catalog,
    pub views: Arc<Views>,
}

pub struct CatalogModule {
    state: CatalogState,
}

impl CatalogModule {
    pub fn new(store: Arc<dyn DocumentStore>, views: Arc<Views>) -> Self {
        Self {
            state: CatalogState {
                catalog: Catalog::new(store),
                views,
            },
        }
    }
}

#[async_trait]
impl Module for CatalogModule {
    fn name(&self) -> &'static str {
        "catalog"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            database = %ctx.settings.database.name,
            "catalog module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router().with_state(self.state.clone())
    }

    fn collections(&self) -> Vec<&'static str> {
        vec![
            Author::COLLECTION,
            Genre::COLLECTION,
            Book::COLLECTION,
            BookInstance::COLLECTION,
        ]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let counts = self.state.catalog.counts().await?;
        tracing::info!(
            module = self.name(),
            books = counts.books,
            copies = counts.copies,
            authors = counts.authors,
            genres = counts.genres,
            "catalog module started"
        );
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "catalog module stopped");
        Ok(())
    }
}

/// Create the catalog module over `store`
pub fn create_module(store: Arc<dyn DocumentStore>) -> anyhow::Result<Arc<dyn Module>> {
    let views = Views::new()?;
    Ok(Arc::new(CatalogModule::new(store, Arc::new(views))))
}
