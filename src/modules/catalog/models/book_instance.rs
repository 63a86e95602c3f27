use std::fmt;
use std::str::FromStr;

use catalog_db::{DbError, DocumentId, Entity, Record};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{url, Linked, View};
use crate::utils;
use crate::validation::{field, FieldRule, FormData};

/// Availability of a physical copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    Available,
    #[default]
    Maintenance,
    Loaned,
    Reserved,
}

impl Status {
    pub const NAMES: &'static [&'static str] = &["Available", "Maintenance", "Loaned", "Reserved"];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Available => "Available",
            Status::Maintenance => "Maintenance",
            Status::Loaned => "Loaned",
            Status::Reserved => "Reserved",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(Status::Available),
            "Maintenance" => Ok(Status::Maintenance),
            "Loaned" => Ok(Status::Loaned),
            "Reserved" => Ok(Status::Reserved),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// A physical copy of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookInstance {
    pub book: DocumentId,
    pub imprint: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_back: Option<NaiveDate>,
}

impl Entity for BookInstance {
    const COLLECTION: &'static str = "bookinstances";
}

impl Linked for BookInstance {
    const PATH: &'static str = "bookinstance";
}

impl View for Record<BookInstance> {
    fn view(&self) -> Value {
        let copy = &self.data;
        json!({
            "id": self.id,
            "url": url::<BookInstance>(&self.id),
            "book_id": copy.book,
            "imprint": copy.imprint,
            "status": copy.status,
            "due_back": utils::form_date(copy.due_back),
            "due_back_formatted": copy.due_back.map(utils::format_short_date).unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BookInstanceForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    pub book: String,
    pub imprint: String,
    pub status: String,
    pub due_back: String,
}

impl BookInstanceForm {
    pub fn rules() -> Vec<FieldRule> {
        vec![
            field("book")
                .trim()
                .required(1, "Book must be specified")
                .escape(),
            field("imprint")
                .trim()
                .required(1, "Imprint must be specified")
                .escape(),
            field("status")
                .trim()
                .required(1, "Status must be specified")
                .one_of(Status::NAMES, "Status must be one of the listed values")
                .escape(),
            field("due_back")
                .optional()
                .is_date("Invalid date")
                .to_date(),
        ]
    }

    pub fn from_values(id: Option<DocumentId>, values: &FormData) -> Self {
        Self {
            id,
            book: values.get("book").to_string(),
            imprint: values.get("imprint").to_string(),
            status: values.get("status").to_string(),
            due_back: values.get("due_back").to_string(),
        }
    }

    pub fn from_record(record: &Record<BookInstance>) -> Self {
        let copy = &record.data;
        Self {
            id: Some(record.id),
            book: copy.book.to_string(),
            imprint: copy.imprint.clone(),
            status: copy.status.to_string(),
            due_back: utils::form_date(copy.due_back),
        }
    }

    /// Build the entity from validated values
    pub fn to_entity(&self) -> Result<BookInstance, DbError> {
        Ok(BookInstance {
            book: self.book.parse()?,
            imprint: self.imprint.clone(),
            status: self.status.parse().unwrap_or_default(),
            due_back: utils::parse_date(&self.due_back),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation;

    #[test]
    fn test_status_names_match_variants() {
        for name in Status::NAMES {
            let status: Status = name.parse().unwrap();
            assert_eq!(status.as_str(), *name);
        }
        assert!("Lost".parse::<Status>().is_err());
    }

    #[test]
    fn test_status_serializes_as_name() {
        assert_eq!(serde_json::to_value(Status::Loaned).unwrap(), json!("Loaned"));
    }

    #[test]
    fn test_view_formats_due_date() {
        let record = Record {
            id: DocumentId::new(),
            data: BookInstance {
                book: DocumentId::new(),
                imprint: "Penguin".to_string(),
                status: Status::Loaned,
                due_back: NaiveDate::from_ymd_opt(2020, 10, 6),
            },
        };
        let view = record.view();
        assert_eq!(view["due_back_formatted"], "Oct 6th, 2020");
        assert_eq!(view["due_back"], "2020-10-06");
        assert_eq!(view["status"], "Loaned");
        assert_eq!(view["url"], format!("/catalog/bookinstance/{}", record.id));
    }

    #[test]
    fn test_rules_and_sanitized_entity() {
        let book = DocumentId::new();
        let form: FormData = [
            ("book", book.to_string().as_str()),
            ("imprint", "  Gollancz <2005>  "),
            ("status", "Available"),
            ("due_back", ""),
        ]
        .into_iter()
        .collect();

        let outcome = validation::run(&BookInstanceForm::rules(), form);
        assert!(outcome.is_valid());

        let copy = BookInstanceForm::from_values(None, &outcome.values)
            .to_entity()
            .unwrap();
        assert_eq!(copy.book, book);
        assert_eq!(copy.imprint, "Gollancz &lt;2005&gt;");
        assert_eq!(copy.status, Status::Available);
        assert_eq!(copy.due_back, None);
    }

    #[test]
    fn test_rules_report_each_failure() {
        let form: FormData = [("status", "Lost"), ("due_back", "soon")]
            .into_iter()
            .collect();
        let outcome = validation::run(&BookInstanceForm::rules(), form);

        let messages: Vec<&str> = outcome.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Book must be specified",
                "Imprint must be specified",
                "Status must be one of the listed values",
                "Invalid date",
            ]
        );
    }
}
