use catalog_db::{DocumentId, Entity, Record};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{url, Linked, View};
use crate::utils;
use crate::validation::{field, FieldRule, FormData};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub first_name: String,
    pub family_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_death: Option<NaiveDate>,
}

impl Entity for Author {
    const COLLECTION: &'static str = "authors";
}

impl Linked for Author {
    const PATH: &'static str = "author";
}

impl Author {
    /// Display name, `family_name, first_name`
    pub fn name(&self) -> String {
        format!("{}, {}", self.family_name, self.first_name)
    }

    /// Human readable range of the author's dates.
    ///
    /// A birth date without a death date yields the birth date alone, while
    /// a death date without a birth date yields `(?) - death`. A birth-only
    /// range deliberately renders without a dangling `" - "` separator.
    pub fn lifespan(&self) -> String {
        let birth = self.date_of_birth.map(utils::format_long_date);
        let death = self.date_of_death.map(utils::format_long_date);

        match (birth, death) {
            (Some(birth), Some(death)) => format!("{birth} - {death}"),
            (Some(birth), None) => birth,
            (None, Some(death)) => format!("(?) - {death}"),
            (None, None) => String::new(),
        }
    }
}

impl View for Record<Author> {
    fn view(&self) -> Value {
        let author = &self.data;
        json!({
            "id": self.id,
            "url": url::<Author>(&self.id),
            "name": author.name(),
            "lifespan": author.lifespan(),
            "first_name": author.first_name,
            "family_name": author.family_name,
            "date_of_birth": author.date_of_birth.map(utils::format_long_date),
            "date_of_death": author.date_of_death.map(utils::format_long_date),
        })
    }
}

/// Values shown in the author form: either a stored record or a submission
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AuthorForm {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<DocumentId>,
    pub first_name: String,
    pub family_name: String,
    pub date_of_birth: String,
    pub date_of_death: String,
}

impl AuthorForm {
    /// Sanitization and validation applied to submitted author forms
    pub fn rules() -> Vec<FieldRule> {
        vec![
            field("first_name")
                .trim()
                .required(1, "First name must be specified.")
                .max_length(100, "First name must be at most 100 characters.")
                .alphanumeric("First name has non-alphanumeric characters.")
                .escape(),
            field("family_name")
                .trim()
                .required(1, "Family name must be specified.")
                .max_length(100, "Family name must be at most 100 characters.")
                .alphanumeric("Family name has non-alphanumeric characters.")
                .escape(),
            field("date_of_birth")
                .optional()
                .is_date("Invalid date of birth")
                .to_date(),
            field("date_of_death")
                .optional()
                .is_date("Invalid date of death")
                .to_date(),
        ]
    }

    pub fn from_values(id: Option<DocumentId>, values: &FormData) -> Self {
        Self {
            id,
            first_name: values.get("first_name").to_string(),
            family_name: values.get("family_name").to_string(),
            date_of_birth: values.get("date_of_birth").to_string(),
            date_of_death: values.get("date_of_death").to_string(),
        }
    }

    pub fn from_record(record: &Record<Author>) -> Self {
        let author = &record.data;
        Self {
            id: Some(record.id),
            first_name: author.first_name.clone(),
            family_name: author.family_name.clone(),
            date_of_birth: utils::form_date(author.date_of_birth),
            date_of_death: utils::form_date(author.date_of_death),
        }
    }

    pub fn to_entity(&self) -> Author {
        Author {
            first_name: self.first_name.clone(),
            family_name: self.family_name.clone(),
            date_of_birth: utils::parse_date(&self.date_of_birth),
            date_of_death: utils::parse_date(&self.date_of_death),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation;

    fn author(birth: Option<(i32, u32, u32)>, death: Option<(i32, u32, u32)>) -> Author {
        let date = |(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        Author {
            first_name: "Charles".to_string(),
            family_name: "Dickens".to_string(),
            date_of_birth: birth.map(date),
            date_of_death: death.map(date),
        }
    }

    #[test]
    fn test_name() {
        assert_eq!(author(None, None).name(), "Dickens, Charles");
    }

    #[test]
    fn test_lifespan_both_dates() {
        let dickens = author(Some((1812, 2, 7)), Some((1870, 6, 9)));
        assert_eq!(dickens.lifespan(), "February 7th, 1812 - June 9th, 1870");
    }

    #[test]
    fn test_lifespan_death_only() {
        let dickens = author(None, Some((1870, 6, 9)));
        assert_eq!(dickens.lifespan(), "(?) - June 9th, 1870");
    }

    #[test]
    fn test_lifespan_no_dates() {
        assert_eq!(author(None, None).lifespan(), "");
    }

    #[test]
    fn test_lifespan_birth_only_has_no_range_marker() {
        let dickens = author(Some((1812, 2, 7)), None);
        assert_eq!(dickens.lifespan(), "February 7th, 1812");
    }

    #[test]
    fn test_derived_fields_are_not_persisted() {
        let stored = serde_json::to_value(author(Some((1812, 2, 7)), None)).unwrap();
        assert_eq!(
            stored,
            json!({
                "first_name": "Charles",
                "family_name": "Dickens",
                "date_of_birth": "1812-02-07",
            })
        );
    }

    #[test]
    fn test_view_includes_derived_fields() {
        let record = Record {
            id: DocumentId::new(),
            data: author(None, Some((1870, 6, 9))),
        };
        let view = record.view();
        assert_eq!(view["name"], "Dickens, Charles");
        assert_eq!(view["lifespan"], "(?) - June 9th, 1870");
        assert_eq!(view["url"], format!("/catalog/author/{}", record.id));
    }

    #[test]
    fn test_form_roundtrip_through_rules() {
        let form: FormData = [
            ("first_name", " Charles "),
            ("family_name", "Dickens"),
            ("date_of_birth", "1812-02-07"),
            ("date_of_death", ""),
        ]
        .into_iter()
        .collect();

        let outcome = validation::run(&AuthorForm::rules(), form);
        assert!(outcome.is_valid());

        let entity = AuthorForm::from_values(None, &outcome.values).to_entity();
        assert_eq!(entity, author(Some((1812, 2, 7)), None));
    }

    #[test]
    fn test_rules_reject_bad_names_and_dates() {
        let form: FormData = [
            ("first_name", ""),
            ("family_name", "O'Brien"),
            ("date_of_birth", "not a date"),
        ]
        .into_iter()
        .collect();

        let outcome = validation::run(&AuthorForm::rules(), form);
        let fields: Vec<&str> = outcome.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["first_name", "family_name", "date_of_birth"]);
    }
}
