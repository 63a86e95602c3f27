//! Typed access to a single collection

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{Document, DocumentId, Filter, Projection, ID_FIELD};
use crate::error::{DbError, Result};
use crate::store::DocumentStore;

/// A persisted record type
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Name of the collection holding this entity
    const COLLECTION: &'static str;
}

/// An entity together with the identity the store assigned to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<T> {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(flatten)]
    pub data: T,
}

/// Typed view over one collection of a [`DocumentStore`]
pub struct Collection<T> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub async fn find_by_id(&self, id: &DocumentId) -> Result<Option<Record<T>>> {
        self.store
            .find_by_id(T::COLLECTION, id)
            .await?
            .map(|doc| decode(T::COLLECTION, doc))
            .transpose()
    }

    pub async fn find(&self, filter: &Filter) -> Result<Vec<Record<T>>> {
        self.store
            .find(T::COLLECTION, filter, None)
            .await?
            .into_iter()
            .map(|doc| decode(T::COLLECTION, doc))
            .collect()
    }

    /// Fetch a projection of every matching document into a summary type
    pub async fn find_projected<P: DeserializeOwned>(
        &self,
        filter: &Filter,
        projection: &Projection,
    ) -> Result<Vec<P>> {
        self.store
            .find(T::COLLECTION, filter, Some(projection))
            .await?
            .into_iter()
            .map(|doc| decode(T::COLLECTION, doc))
            .collect()
    }

    /// Fetch the records with the given identities, keyed by identity.
    /// Identities without a record are absent from the map.
    pub async fn find_many<I>(&self, ids: I) -> Result<HashMap<DocumentId, Record<T>>>
    where
        I: IntoIterator<Item = DocumentId>,
    {
        let mut ids: Vec<DocumentId> = ids.into_iter().collect();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let records = self.find(&Filter::all().is_in(ID_FIELD, ids)).await?;
        Ok(records
            .into_iter()
            .map(|record| (record.id, record))
            .collect())
    }

    pub async fn count(&self, filter: &Filter) -> Result<usize> {
        let projection = Projection::fields(std::iter::empty::<String>());
        Ok(self
            .store
            .find(T::COLLECTION, filter, Some(&projection))
            .await?
            .len())
    }

    pub async fn insert(&self, data: T) -> Result<Record<T>> {
        let id = self.store.insert(T::COLLECTION, encode(&data)?).await?;
        Ok(Record { id, data })
    }

    /// Replace every stored field of the record; the identity is preserved
    pub async fn replace(&self, id: &DocumentId, data: &T) -> Result<bool> {
        self.store
            .update_by_id(T::COLLECTION, id, encode(data)?)
            .await
    }

    pub async fn delete(&self, id: &DocumentId) -> Result<bool> {
        self.store.delete_by_id(T::COLLECTION, id).await
    }
}

fn encode<T: Entity>(data: &T) -> Result<Document> {
    let value = serde_json::to_value(data).map_err(|source| DbError::Encode {
        collection: T::COLLECTION.to_string(),
        source,
    })?;
    match value {
        Value::Object(mut doc) => {
            doc.remove(ID_FIELD);
            Ok(doc)
        }
        other => Err(DbError::Encode {
            collection: T::COLLECTION.to_string(),
            source: serde::ser::Error::custom(format!("expected an object, got {other}")),
        }),
    }
}

fn decode<P: DeserializeOwned>(collection: &str, doc: Document) -> Result<P> {
    serde_json::from_value(Value::Object(doc)).map_err(|source| DbError::Decode {
        collection: collection.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Genre {
        name: String,
    }

    impl Entity for Genre {
        const COLLECTION: &'static str = "genres";
    }

    #[derive(Debug, Deserialize)]
    struct GenreName {
        #[serde(rename = "_id")]
        id: DocumentId,
        name: String,
    }

    fn genres() -> Collection<Genre> {
        Collection::new(Arc::new(MemoryStore::new()))
    }

    fn genre(name: &str) -> Genre {
        Genre {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find_by_id() {
        let genres = genres();
        let created = genres.insert(genre("Fantasy")).await.unwrap();

        let found = genres.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_find_by_unknown_id() {
        let found = genres().find_by_id(&DocumentId::new()).await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_replace_preserves_identity() {
        let genres = genres();
        let created = genres.insert(genre("Fantsy")).await.unwrap();

        assert!(genres.replace(&created.id, &genre("Fantasy")).await.unwrap());

        let found = genres.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.data.name, "Fantasy");
    }

    #[tokio::test]
    async fn test_find_many_skips_missing() {
        let genres = genres();
        let a = genres.insert(genre("A")).await.unwrap();
        let b = genres.insert(genre("B")).await.unwrap();

        let found = genres
            .find_many([a.id, b.id, a.id, DocumentId::new()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[&b.id].data.name, "B");
    }

    #[tokio::test]
    async fn test_find_projected_and_count() {
        let genres = genres();
        genres.insert(genre("Poetry")).await.unwrap();
        genres.insert(genre("Drama")).await.unwrap();

        let names: Vec<GenreName> = genres
            .find_projected(&Filter::all(), &Projection::fields(["name"]))
            .await
            .unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.iter().any(|n| n.name == "Drama"));
        assert!(names.iter().all(|n| !n.id.to_string().is_empty()));

        let count = genres
            .count(&Filter::all().eq("name", "Poetry"))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let genres = genres();
        let created = genres.insert(genre("Gone")).await.unwrap();
        assert!(genres.delete(&created.id).await.unwrap());
        assert!(genres.find_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_decode_error_names_collection() {
        let store = Arc::new(MemoryStore::new());
        let mut doc = Document::new();
        doc.insert("name".to_string(), serde_json::json!(42));
        let id = store.insert("genres", doc).await.unwrap();

        let genres: Collection<Genre> = Collection::new(store);
        let err = genres.find_by_id(&id).await.unwrap_err();
        assert!(matches!(&err, DbError::Decode { collection, .. } if collection == "genres"));
        assert!(err
            .to_string()
            .starts_with("failed to decode document from 'genres'"));
    }
}
