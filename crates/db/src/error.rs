//! Error type shared by every store backend

use thiserror::Error;

/// Failures raised by the document store and the typed collection layer
#[derive(Error, Debug)]
pub enum DbError {
    #[error("malformed document id '{0}'")]
    MalformedId(String),

    #[error("document '{id}' already exists in '{collection}'")]
    DuplicateId { collection: String, id: String },

    #[error("failed to encode document for '{collection}': {source}")]
    Encode {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode document from '{collection}': {source}")]
    Decode {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid seed data: {0}")]
    Seed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;
