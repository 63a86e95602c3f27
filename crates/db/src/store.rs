use async_trait::async_trait;

use crate::document::{Document, DocumentId, Filter, Projection};
use crate::error::Result;

/// Operations the catalog needs from a document store.
///
/// Every call is a single atomic document operation; there are no
/// transactions spanning calls.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Register a collection so it shows up before the first insert
    async fn ensure_collection(&self, collection: &str) -> Result<()>;

    /// Names of all known collections
    async fn collections(&self) -> Result<Vec<String>>;

    /// Fetch one document by identity. Returns `None` if it does not exist.
    async fn find_by_id(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>>;

    /// Fetch every document matching `filter`, optionally projected
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Vec<Document>>;

    /// Insert a document and return its identity.
    ///
    /// A document already carrying an `_id` keeps it; otherwise one is assigned.
    async fn insert(&self, collection: &str, doc: Document) -> Result<DocumentId>;

    /// Replace the document with the given identity.
    /// Returns `true` if a document was replaced.
    async fn update_by_id(&self, collection: &str, id: &DocumentId, doc: Document)
        -> Result<bool>;

    /// Delete the document with the given identity.
    /// Returns `true` if the document existed and was removed.
    async fn delete_by_id(&self, collection: &str, id: &DocumentId) -> Result<bool>;
}
