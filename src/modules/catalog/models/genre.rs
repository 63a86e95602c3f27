use catalog_db::{DocumentId, Entity, Record};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{url, Linked, View};
use crate::validation::{field, FieldRule, FormData};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub name: String,
}

impl Entity for Genre {
    const COLLECTION: &'static str = "genres";
}

impl Linked for Genre {
    const PATH: &'static str = "genre";
}

impl View for Record<Genre> {
    fn view(&self) -> Value {
        json!({
            "id": self.id,
            "url": url::<Genre>(&self.id),
            "name": self.data.name,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenreForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    pub name: String,
}

impl GenreForm {
    pub fn rules() -> Vec<FieldRule> {
        vec![field("name")
            .trim()
            .required(3, "Genre name must contain at least 3 characters")
            .max_length(100, "Genre name must be at most 100 characters")
            .escape()]
    }

    pub fn from_values(id: Option<DocumentId>, values: &FormData) -> Self {
        Self {
            id,
            name: values.get("name").to_string(),
        }
    }

    pub fn from_record(record: &Record<Genre>) -> Self {
        Self {
            id: Some(record.id),
            name: record.data.name.clone(),
        }
    }

    pub fn to_entity(&self) -> Genre {
        Genre {
            name: self.name.clone(),
        }
    }
}
