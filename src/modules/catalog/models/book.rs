use catalog_db::{DbError, DocumentId, Entity, Record};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{url, Linked, View};
use crate::validation::{field, FieldRule, FormData};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: DocumentId,
    pub summary: String,
    pub isbn: String,
    #[serde(default)]
    pub genre: Vec<DocumentId>,
}

impl Entity for Book {
    const COLLECTION: &'static str = "books";
}

impl Linked for Book {
    const PATH: &'static str = "book";
}

impl View for Record<Book> {
    fn view(&self) -> Value {
        let book = &self.data;
        json!({
            "id": self.id,
            "url": url::<Book>(&self.id),
            "title": book.title,
            "summary": book.summary,
            "isbn": book.isbn,
            "author_id": book.author,
            "genre_ids": book.genre,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    pub title: String,
    pub author: String,
    pub summary: String,
    pub isbn: String,
    pub genre: Vec<String>,
}

impl BookForm {
    pub fn rules() -> Vec<FieldRule> {
        vec![
            field("title")
                .trim()
                .required(1, "Title must not be empty.")
                .escape(),
            field("author")
                .trim()
                .required(1, "Author must not be empty.")
                .escape(),
            field("summary")
                .trim()
                .required(1, "Summary must not be empty.")
                .escape(),
            field("isbn")
                .trim()
                .required(1, "ISBN must not be empty.")
                .escape(),
            field("genre").trim().escape(),
        ]
    }

    pub fn from_values(id: Option<DocumentId>, values: &FormData) -> Self {
        Self {
            id,
            title: values.get("title").to_string(),
            author: values.get("author").to_string(),
            summary: values.get("summary").to_string(),
            isbn: values.get("isbn").to_string(),
            genre: values.get_all("genre"),
        }
    }

    pub fn from_record(record: &Record<Book>) -> Self {
        let book = &record.data;
        Self {
            id: Some(record.id),
            title: book.title.clone(),
            author: book.author.to_string(),
            summary: book.summary.clone(),
            isbn: book.isbn.clone(),
            genre: book.genre.iter().map(ToString::to_string).collect(),
        }
    }

    /// Build the entity; references that are not valid identities are a
    /// store failure, same as any other malformed id.
    pub fn to_entity(&self) -> Result<Book, DbError> {
        Ok(Book {
            title: self.title.clone(),
            author: self.author.parse()?,
            summary: self.summary.clone(),
            isbn: self.isbn.clone(),
            genre: self
                .genre
                .iter()
                .map(|id| id.parse())
                .collect::<Result<_, _>>()?,
        })
    }
}
