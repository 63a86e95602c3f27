//! In-process document store backend

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::document::{Document, DocumentId, Filter, Projection, ID_FIELD};
use crate::error::{DbError, Result};
use crate::seed::Seed;
use crate::store::DocumentStore;

type Table = BTreeMap<DocumentId, Document>;

/// Document store keeping every collection in memory.
///
/// Documents are ordered by identity, which is time-ordered, so a full scan
/// returns documents roughly in insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<BTreeMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert every document of a seed file, keeping the identities it carries
    pub async fn load_seed(&self, path: impl AsRef<Path>) -> Result<Vec<(String, usize)>> {
        let path = path.as_ref();
        let seed = Seed::from_path(path)?;
        let counts = seed.counts();

        for (collection, docs) in seed.into_collections() {
            self.ensure_collection(&collection).await?;
            for doc in docs {
                self.insert(&collection, doc).await?;
            }
        }

        tracing::info!(
            target: "catalog-db",
            path = %path.display(),
            collections = counts.len(),
            "seed data loaded"
        );
        Ok(counts)
    }
}

fn assigned_id(doc: &Document) -> Result<Option<DocumentId>> {
    match doc.get(ID_FIELD) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => raw.parse().map(Some),
        Some(other) => Err(DbError::MalformedId(other.to_string())),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ensure_collection(&self, collection: &str) -> Result<()> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default();
        Ok(())
    }

    async fn collections(&self) -> Result<Vec<String>> {
        Ok(self.collections.read().await.keys().cloned().collect())
    }

    async fn find_by_id(&self, collection: &str, id: &DocumentId) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|table| table.get(id))
            .cloned())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(table) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(table
            .values()
            .filter(|doc| filter.matches(doc))
            .map(|doc| match projection {
                Some(projection) => projection.apply(doc),
                None => doc.clone(),
            })
            .collect())
    }

    async fn insert(&self, collection: &str, mut doc: Document) -> Result<DocumentId> {
        let id = assigned_id(&doc)?.unwrap_or_default();
        doc.insert(ID_FIELD.to_string(), id.into());

        let mut collections = self.collections.write().await;
        let table = collections.entry(collection.to_string()).or_default();
        if table.contains_key(&id) {
            return Err(DbError::DuplicateId {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }
        table.insert(id, doc);

        tracing::debug!(target: "catalog-db", collection, %id, "document inserted");
        Ok(id)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
        mut doc: Document,
    ) -> Result<bool> {
        doc.insert(ID_FIELD.to_string(), (*id).into());

        let mut collections = self.collections.write().await;
        let Some(slot) = collections
            .get_mut(collection)
            .and_then(|table| table.get_mut(id))
        else {
            return Ok(false);
        };
        *slot = doc;

        tracing::debug!(target: "catalog-db", collection, %id, "document replaced");
        Ok(true)
    }

    async fn delete_by_id(&self, collection: &str, id: &DocumentId) -> Result<bool> {
        let removed = self
            .collections
            .write()
            .await
            .get_mut(collection)
            .and_then(|table| table.remove(id))
            .is_some();

        tracing::debug!(target: "catalog-db", collection, %id, removed, "document delete");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_identity() {
        let store = MemoryStore::new();
        let id = store
            .insert("genres", doc(json!({"name": "Fantasy"})))
            .await
            .unwrap();

        let found = store.find_by_id("genres", &id).await.unwrap().unwrap();
        assert_eq!(found["_id"], json!(id.to_string()));
        assert_eq!(found["name"], json!("Fantasy"));
    }

    #[tokio::test]
    async fn test_insert_keeps_existing_identity() {
        let store = MemoryStore::new();
        let id = DocumentId::new();
        let returned = store
            .insert("genres", doc(json!({"_id": id.to_string(), "name": "Poetry"})))
            .await
            .unwrap();
        assert_eq!(returned, id);

        let err = store
            .insert("genres", doc(json!({"_id": id.to_string(), "name": "Again"})))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::DuplicateId { .. }));
    }

    #[tokio::test]
    async fn test_find_on_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        let docs = store.find("nothing", &Filter::all(), None).await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_find_with_filter_and_projection() {
        let store = MemoryStore::new();
        store
            .insert("books", doc(json!({"title": "Dune", "author": "a1"})))
            .await
            .unwrap();
        store
            .insert("books", doc(json!({"title": "Emma", "author": "a2"})))
            .await
            .unwrap();

        let docs = store
            .find(
                "books",
                &Filter::all().eq("author", "a2"),
                Some(&Projection::fields(["title"])),
            )
            .await
            .unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["title"], json!("Emma"));
        assert!(docs[0].get("author").is_none());
        assert!(docs[0].get("_id").is_some());
    }

    #[tokio::test]
    async fn test_update_replaces_and_preserves_identity() {
        let store = MemoryStore::new();
        let id = store
            .insert("authors", doc(json!({"first_name": "Jane", "family_name": "Austen"})))
            .await
            .unwrap();

        let replaced = store
            .update_by_id("authors", &id, doc(json!({"first_name": "J."})))
            .await
            .unwrap();
        assert!(replaced);

        let found = store.find_by_id("authors", &id).await.unwrap().unwrap();
        assert_eq!(found["_id"], json!(id.to_string()));
        assert_eq!(found["first_name"], json!("J."));
        assert!(found.get("family_name").is_none());
    }

    #[tokio::test]
    async fn test_update_missing_document() {
        let store = MemoryStore::new();
        let replaced = store
            .update_by_id("authors", &DocumentId::new(), Document::new())
            .await
            .unwrap();
        assert!(!replaced);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let id = store.insert("genres", Document::new()).await.unwrap();

        assert!(store.delete_by_id("genres", &id).await.unwrap());
        assert!(!store.delete_by_id("genres", &id).await.unwrap());
        assert!(store.find_by_id("genres", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ensure_collection_lists_names() {
        let store = MemoryStore::new();
        store.ensure_collection("books").await.unwrap();
        store.ensure_collection("authors").await.unwrap();
        store.ensure_collection("books").await.unwrap();

        assert_eq!(store.collections().await.unwrap(), vec!["authors", "books"]);
    }
}
