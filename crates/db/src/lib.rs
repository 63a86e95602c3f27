//! Document store abstraction for the catalog.
//!
//! Handlers never talk to a backend directly: they go through the
//! [`DocumentStore`] trait (five operation shapes plus collection
//! registration) or the typed [`Collection`] wrapper built on top of it.

pub mod collection;
pub mod document;
pub mod error;
pub mod memory;
pub mod seed;
pub mod store;

pub use collection::{Collection, Entity, Record};
pub use document::{Document, DocumentId, Filter, Projection, ID_FIELD};
pub use error::{DbError, Result};
pub use memory::MemoryStore;
pub use store::DocumentStore;
