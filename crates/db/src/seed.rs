//! Seed files: a JSON object mapping collection names to document arrays.
//!
//! Documents that reference each other must carry their own `_id`.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::document::{Document, DocumentId, ID_FIELD};
use crate::error::{DbError, Result};

#[derive(Debug, Default)]
pub struct Seed {
    collections: BTreeMap<String, Vec<Document>>,
}

impl Seed {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let collections: BTreeMap<String, Vec<Document>> =
            serde_json::from_str(raw).map_err(|e| DbError::Seed(e.to_string()))?;

        for (collection, docs) in &collections {
            for doc in docs {
                match doc.get(ID_FIELD) {
                    None => {}
                    Some(Value::String(raw)) => {
                        raw.parse::<DocumentId>().map_err(|_| {
                            DbError::Seed(format!("malformed _id '{raw}' in '{collection}'"))
                        })?;
                    }
                    Some(other) => {
                        return Err(DbError::Seed(format!(
                            "_id must be a string in '{collection}', got {other}"
                        )));
                    }
                }
            }
        }

        Ok(Self { collections })
    }

    /// Document count per collection, ordered by collection name
    pub fn counts(&self) -> Vec<(String, usize)> {
        self.collections
            .iter()
            .map(|(name, docs)| (name.clone(), docs.len()))
            .collect()
    }

    pub fn into_collections(self) -> BTreeMap<String, Vec<Document>> {
        self.collections
    }
}
