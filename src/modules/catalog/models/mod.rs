//! Catalog entities and their derived display fields.
//!
//! Derived fields (`name`, `url`, `lifespan`, ...) are computed from the
//! stored fields every time a record is presented and are never persisted.

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;

pub use author::{Author, AuthorForm};
pub use book::{Book, BookForm};
pub use book_instance::{BookInstance, BookInstanceForm, Status};
pub use genre::{Genre, GenreForm};

use catalog_db::{DocumentId, Record};
use serde::Serialize;
use serde_json::Value;

/// Entities with a canonical address under the catalog
pub trait Linked {
    /// Path segment naming the entity, e.g. `author`
    const PATH: &'static str;
}

/// Canonical address of the record with identity `id`
pub fn url<T: Linked>(id: &DocumentId) -> String {
    format!("/catalog/{}/{}", T::PATH, id)
}

/// Address of the list view for an entity
pub fn list_url<T: Linked>() -> String {
    format!("/catalog/{}s", T::PATH)
}

/// Render-time representation of a record, derived fields included
pub trait View {
    fn view(&self) -> Value;
}

/// One entry of a choice set: identity plus display label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: DocumentId,
    pub label: String,
}

/// A record with one resolved reference. `reference` is `None` when the
/// referenced record no longer exists.
#[derive(Debug, Clone)]
pub struct Populated<T, R> {
    pub record: Record<T>,
    pub reference: Option<Record<R>>,
}

impl<T, R> Populated<T, R>
where
    Record<T>: View,
    Record<R>: View,
{
    /// Present the record with the resolved reference stored under `key`
    pub fn view_with(&self, key: &str) -> Value {
        let mut view = self.record.view();
        if let Value::Object(fields) = &mut view {
            fields.insert(
                key.to_string(),
                self.reference.as_ref().map(View::view).unwrap_or(Value::Null),
            );
        }
        view
    }
}

/// Present every item of a slice
pub fn views<V: View>(items: &[V]) -> Vec<Value> {
    items.iter().map(View::view).collect()
}
