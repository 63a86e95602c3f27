//! Form validation and sanitization.
//!
//! A form is checked by an ordered list of [`FieldRule`] chains. Each chain
//! targets one field and runs its steps in order: sanitizers rewrite the
//! field's values in place, validators record a [`FieldError`] when their
//! predicate fails. Sanitizers always run, so a rejected form can be echoed
//! back with cleaned values. Nothing here touches storage.

use serde::{Deserialize, Serialize};

use crate::utils;

/// Submitted form fields in submission order. A field may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<(String, String)>")]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl From<Vec<(String, String)>> for FormData {
    fn from(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl FormData {
    /// First value of `name`, or the empty string when absent
    pub fn get(&self, name: &str) -> &str {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    /// Every non-empty value of `name`, in submission order
    pub fn get_all(&self, name: &str) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.clone())
            .collect()
    }

    fn values_mut<'a>(&'a mut self, name: &'a str) -> impl Iterator<Item = &'a mut String> + 'a {
        self.fields
            .iter_mut()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value)
    }

    fn values<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        let values: Vec<&str> = self
            .fields
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect();
        if values.is_empty() {
            vec![""]
        } else {
            values
        }
    }
}

/// A failed validation, scoped to one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone)]
enum Step {
    Trim,
    Escape,
    ToDate,
    Required { min: usize, message: String },
    MaxLength { max: usize, message: String },
    Alphanumeric { message: String },
    IsDate { message: String },
    OneOf { allowed: &'static [&'static str], message: String },
}

/// Ordered sanitizers and validators for a single field
#[derive(Debug, Clone)]
pub struct FieldRule {
    field: &'static str,
    optional: bool,
    steps: Vec<Step>,
}

/// Start a rule chain for `field`
pub fn field(field: &'static str) -> FieldRule {
    FieldRule {
        field,
        optional: false,
        steps: Vec::new(),
    }
}

impl FieldRule {
    fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Skip this chain's validators when the value is empty
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Strip leading and trailing whitespace
    pub fn trim(self) -> Self {
        self.step(Step::Trim)
    }

    /// Replace `& < > " ' /` with HTML entities
    pub fn escape(self) -> Self {
        self.step(Step::Escape)
    }

    /// Normalize a date to `YYYY-MM-DD`; values that do not parse are cleared
    pub fn to_date(self) -> Self {
        self.step(Step::ToDate)
    }

    /// Require at least `min` characters
    pub fn required(self, min: usize, message: impl Into<String>) -> Self {
        self.step(Step::Required {
            min,
            message: message.into(),
        })
    }

    pub fn max_length(self, max: usize, message: impl Into<String>) -> Self {
        self.step(Step::MaxLength {
            max,
            message: message.into(),
        })
    }

    pub fn alphanumeric(self, message: impl Into<String>) -> Self {
        self.step(Step::Alphanumeric {
            message: message.into(),
        })
    }

    /// Require an ISO-8601 date or date-time
    pub fn is_date(self, message: impl Into<String>) -> Self {
        self.step(Step::IsDate {
            message: message.into(),
        })
    }

    pub fn one_of(self, allowed: &'static [&'static str], message: impl Into<String>) -> Self {
        self.step(Step::OneOf {
            allowed,
            message: message.into(),
        })
    }

    /// Apply this chain to `form`, returning the sanitized form and any errors
    pub fn apply(&self, mut form: FormData) -> (FormData, Vec<FieldError>) {
        let mut errors = Vec::new();
        let skip_validators = self.optional && form.values(self.field).iter().all(|v| v.is_empty());

        for step in &self.steps {
            match step {
                Step::Trim => form
                    .values_mut(self.field)
                    .for_each(|value| *value = value.trim().to_string()),
                Step::Escape => form.values_mut(self.field).for_each(|value| {
                    *value = html_escape::encode_safe(value.as_str()).into_owned()
                }),
                Step::ToDate => form.values_mut(self.field).for_each(|value| {
                    *value = utils::form_date(utils::parse_date(value));
                }),
                validator if !skip_validators => {
                    let failed = form
                        .values(self.field)
                        .iter()
                        .find_map(|value| check(validator, value));
                    if let Some(message) = failed {
                        errors.push(FieldError {
                            field: self.field.to_string(),
                            message: message.to_string(),
                        });
                    }
                }
                _ => {}
            }
        }

        (form, errors)
    }
}

/// Evaluate a validator step, returning its message on failure.
///
/// Content checks pass on empty values; presence is `required`'s job.
fn check<'a>(step: &'a Step, value: &str) -> Option<&'a str> {
    let passed = match step {
        Step::Required { min, .. } => value.chars().count() >= (*min).max(1),
        Step::MaxLength { max, .. } => value.chars().count() <= *max,
        Step::Alphanumeric { .. } => value.chars().all(char::is_alphanumeric),
        Step::IsDate { .. } => value.is_empty() || utils::parse_date(value).is_some(),
        Step::OneOf { allowed, .. } => value.is_empty() || allowed.contains(&value),
        Step::Trim | Step::Escape | Step::ToDate => true,
    };

    if passed {
        return None;
    }

    match step {
        Step::Required { message, .. }
        | Step::MaxLength { message, .. }
        | Step::Alphanumeric { message }
        | Step::IsDate { message }
        | Step::OneOf { message, .. } => Some(message.as_str()),
        Step::Trim | Step::Escape | Step::ToDate => None,
    }
}

/// Result of running the pipeline over a submitted form
#[derive(Debug, Clone)]
pub struct Outcome {
    pub values: FormData,
    pub errors: Vec<FieldError>,
}

impl Outcome {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Run every rule chain in order over `form`
pub fn run(rules: &[FieldRule], form: FormData) -> Outcome {
    let (values, errors) = rules.iter().fold(
        (form, Vec::new()),
        |(form, mut errors), rule| {
            let (form, rule_errors) = rule.apply(form);
            errors.extend(rule_errors);
            (form, errors)
        },
    );

    if !errors.is_empty() {
        tracing::debug!(
            errors = errors.len(),
            fields = ?errors.iter().map(|e| e.field.as_str()).collect::<Vec<_>>(),
            "form rejected"
        );
    }

    Outcome { values, errors }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_sanitizers_run_even_when_invalid() {
        let rules = [
            field("imprint")
                .trim()
                .required(1, "Imprint must be specified")
                .escape(),
            field("book").trim().required(1, "Book must be specified"),
        ];
        let outcome = run(&rules, form(&[("imprint", "  Tor & Sons <ltd>  ")]));

        assert!(!outcome.is_valid());
        assert_eq!(outcome.values.get("imprint"), "Tor &amp; Sons &lt;ltd&gt;");
        assert_eq!(
            outcome.errors,
            vec![FieldError {
                field: "book".to_string(),
                message: "Book must be specified".to_string(),
            }]
        );
    }

    #[test]
    fn test_whitespace_only_fails_required_after_trim() {
        let rules = [field("name").trim().required(1, "Name required")];
        let outcome = run(&rules, form(&[("name", "   ")]));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.values.get("name"), "");
    }

    #[test]
    fn test_required_min_length() {
        let rules = [field("name").required(3, "Too short")];
        assert!(!run(&rules, form(&[("name", "ab")])).is_valid());
        assert!(run(&rules, form(&[("name", "abc")])).is_valid());
    }

    #[test]
    fn test_escape_replaces_html_characters() {
        let rules = [field("summary").escape()];
        let outcome = run(&rules, form(&[("summary", r#"<a href="/x">'hi'</a>"#)]));
        assert_eq!(
            outcome.values.get("summary"),
            "&lt;a href=&quot;&#x2F;x&quot;&gt;&#x27;hi&#x27;&lt;&#x2F;a&gt;"
        );
    }

    #[test]
    fn test_optional_skips_validators_but_not_sanitizers() {
        let rules = [field("due_back")
            .optional()
            .is_date("Invalid date")
            .to_date()];

        let outcome = run(&rules, form(&[("due_back", "")]));
        assert!(outcome.is_valid());

        let outcome = run(&rules, form(&[]));
        assert!(outcome.is_valid());

        let outcome = run(&rules, form(&[("due_back", "2020-10-06T09:00:00Z")]));
        assert!(outcome.is_valid());
        assert_eq!(outcome.values.get("due_back"), "2020-10-06");
    }

    #[test]
    fn test_invalid_date_is_reported_and_cleared() {
        let rules = [field("due_back")
            .optional()
            .is_date("Invalid date")
            .to_date()];
        let outcome = run(&rules, form(&[("due_back", "someday")]));

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].message, "Invalid date");
        assert_eq!(outcome.values.get("due_back"), "");
    }

    #[test]
    fn test_each_failing_validator_is_reported() {
        let rules = [field("first_name")
            .trim()
            .required(1, "First name must be specified.")
            .max_length(5, "First name is too long.")
            .alphanumeric("First name has non-alphanumeric characters.")];
        let outcome = run(&rules, form(&[("first_name", "Jean-Baptiste")]));

        let messages: Vec<&str> = outcome.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "First name is too long.",
                "First name has non-alphanumeric characters."
            ]
        );
    }

    #[test]
    fn test_empty_value_only_fails_required() {
        let rules = [field("first_name")
            .trim()
            .required(1, "First name must be specified.")
            .alphanumeric("First name has non-alphanumeric characters.")];
        let outcome = run(&rules, form(&[]));
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].message, "First name must be specified.");
    }

    #[test]
    fn test_one_of() {
        const STATUSES: &[&str] = &["Available", "Loaned"];
        let rules = [field("status").trim().one_of(STATUSES, "Unknown status")];
        assert!(run(&rules, form(&[("status", " Loaned ")])).is_valid());
        assert!(!run(&rules, form(&[("status", "Lost")])).is_valid());
    }

    #[test]
    fn test_multi_valued_fields() {
        let rules = [field("genre").escape()];
        let outcome = run(&rules, form(&[("genre", "a&b"), ("title", "x"), ("genre", "c")]));
        assert_eq!(outcome.values.get_all("genre"), vec!["a&amp;b", "c"]);
        assert_eq!(outcome.values.get("title"), "x");
    }

    #[test]
    fn test_form_data_deserializes_from_urlencoded_pairs() {
        let pairs: Vec<(String, String)> = vec![
            ("genre".to_string(), "1".to_string()),
            ("genre".to_string(), "2".to_string()),
        ];
        let form = FormData::from(pairs);
        assert_eq!(form.get_all("genre").len(), 2);
        assert_eq!(form.get("missing"), "");
    }
}
