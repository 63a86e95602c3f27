//! Server-side rendering with Liquid templates.
//!
//! Every page template renders into the shared layout. Templates are compiled
//! into the binary and parsed once at startup.

use std::collections::HashMap;

use axum::response::Html;
use catalog_http::error::AppError;
use serde_json::{json, Value};
use thiserror::Error;

const LAYOUT: &str = "layout";

const TEMPLATES: &[(&str, &str)] = &[
    (LAYOUT, include_str!("../../templates/layout.liquid")),
    ("index", include_str!("../../templates/index.liquid")),
    ("author_list", include_str!("../../templates/author_list.liquid")),
    ("author_detail", include_str!("../../templates/author_detail.liquid")),
    ("author_form", include_str!("../../templates/author_form.liquid")),
    ("author_delete", include_str!("../../templates/author_delete.liquid")),
    ("genre_list", include_str!("../../templates/genre_list.liquid")),
    ("genre_detail", include_str!("../../templates/genre_detail.liquid")),
    ("genre_form", include_str!("../../templates/genre_form.liquid")),
    ("genre_delete", include_str!("../../templates/genre_delete.liquid")),
    ("book_list", include_str!("../../templates/book_list.liquid")),
    ("book_detail", include_str!("../../templates/book_detail.liquid")),
    ("book_form", include_str!("../../templates/book_form.liquid")),
    ("book_delete", include_str!("../../templates/book_delete.liquid")),
    (
        "bookinstance_list",
        include_str!("../../templates/bookinstance_list.liquid"),
    ),
    (
        "bookinstance_detail",
        include_str!("../../templates/bookinstance_detail.liquid"),
    ),
    (
        "bookinstance_form",
        include_str!("../../templates/bookinstance_form.liquid"),
    ),
    (
        "bookinstance_delete",
        include_str!("../../templates/bookinstance_delete.liquid"),
    ),
];

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("failed to build template parser: {0}")]
    Parser(#[source] liquid::Error),

    #[error("template '{name}' failed to parse: {source}")]
    Parse {
        name: &'static str,
        #[source]
        source: liquid::Error,
    },

    #[error("unknown template '{0}'")]
    Unknown(String),

    #[error("render context for '{0}' must be an object")]
    Context(String),

    #[error("template '{name}' failed to render: {source}")]
    Render {
        name: String,
        #[source]
        source: liquid::Error,
    },
}

impl From<ViewError> for AppError {
    fn from(err: ViewError) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

/// Parsed templates, shared by every request
pub struct Views {
    templates: HashMap<&'static str, liquid::Template>,
}

impl Views {
    pub fn new() -> Result<Self, ViewError> {
        let parser = liquid::ParserBuilder::with_stdlib()
            .build()
            .map_err(ViewError::Parser)?;

        let templates = TEMPLATES
            .iter()
            .map(|&(name, source)| {
                parser
                    .parse(source)
                    .map(|template| (name, template))
                    .map_err(|source| ViewError::Parse { name, source })
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        tracing::debug!(templates = templates.len(), "templates parsed");
        Ok(Self { templates })
    }

    /// Names of every page template, layout excluded
    #[cfg(test)]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self
            .templates
            .keys()
            .copied()
            .filter(|name| *name != LAYOUT)
            .collect();
        names.sort_unstable();
        names
    }

    /// Render a single template with `context` as its globals
    pub fn render(&self, name: &str, context: &Value) -> Result<String, ViewError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| ViewError::Unknown(name.to_string()))?;

        let liquid::model::Value::Object(globals) = to_liquid(context) else {
            return Err(ViewError::Context(name.to_string()));
        };

        template
            .render(&globals)
            .map_err(|source| ViewError::Render {
                name: name.to_string(),
                source,
            })
    }

    /// Render a page template inside the layout. `context.title` becomes the
    /// document title.
    ///
    /// Text in `context` may carry the entities added when a form was
    /// sanitized; it is decoded so each template escapes it exactly once.
    pub fn page(&self, name: &str, mut context: Value) -> Result<Html<String>, ViewError> {
        unescape(&mut context);
        let content = self.render(name, &context)?;
        let title = context.get("title").cloned().unwrap_or(Value::Null);
        let html = self.render(LAYOUT, &json!({ "title": title, "content": content }))?;
        Ok(Html(html))
    }
}

fn unescape(value: &mut Value) {
    match value {
        Value::String(text) if text.contains('&') => {
            let decoded = html_escape::decode_html_entities(text.as_str()).into_owned();
            *text = decoded;
        }
        Value::Array(items) => items.iter_mut().for_each(unescape),
        Value::Object(fields) => fields.values_mut().for_each(unescape),
        _ => {}
    }
}

fn to_liquid(value: &Value) -> liquid::model::Value {
    use liquid::model::Value as Liquid;

    match value {
        Value::Null => Liquid::Nil,
        Value::Bool(b) => Liquid::scalar(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Liquid::scalar(i),
            None => Liquid::scalar(n.as_f64().unwrap_or_default()),
        },
        Value::String(s) => Liquid::scalar(s.clone()),
        Value::Array(items) => Liquid::Array(items.iter().map(to_liquid).collect()),
        Value::Object(fields) => {
            let mut object = liquid::Object::new();
            for (key, value) in fields {
                object.insert(key.clone().into(), to_liquid(value));
            }
            Liquid::Object(object)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_template_parses() {
        let views = Views::new().unwrap();
        assert_eq!(views.names().len(), TEMPLATES.len() - 1);
    }

    #[test]
    fn test_page_wraps_content_in_layout() {
        let views = Views::new().unwrap();
        let html = views
            .page(
                "genre_list",
                json!({
                    "title": "Genre List",
                    "genres": [{"name": "Poetry", "url": "/catalog/genre/1"}],
                }),
            )
            .unwrap()
            .0;

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Genre List</title>"));
        assert!(html.contains(r#"<a href="/catalog/genre/1">Poetry</a>"#));
    }

    #[test]
    fn test_data_is_escaped_once() {
        let views = Views::new().unwrap();
        let html = views
            .page(
                "genre_list",
                json!({
                    "title": "Children&#x27;s &#x2F; Teen",
                    "genres": [
                        {"name": "<b>", "url": "/x"},
                        {"name": "Sci &amp; Fi", "url": "/y"},
                        {"name": "Children&#x27;s &#x2F; Teen", "url": "/z"},
                    ],
                }),
            )
            .unwrap()
            .0;

        assert!(html.contains("&lt;b&gt;"));
        assert!(html.contains(">Sci &amp; Fi</a>"));
        assert!(html.contains(">Children&#39;s / Teen</a>"));
        assert!(html.contains("<title>Children&#39;s / Teen</title>"));
        assert!(!html.contains("&amp;amp;"));
        assert!(!html.contains("&amp;#x27;"));
    }

    #[test]
    fn test_unescape_leaves_plain_text() {
        let mut context = json!({"a": ["Tom & Jerry", "&lt;i&gt;"], "n": 3});
        unescape(&mut context);
        assert_eq!(context, json!({"a": ["Tom & Jerry", "<i>"], "n": 3}));
    }

    #[test]
    fn test_unknown_template() {
        let views = Views::new().unwrap();
        assert!(matches!(
            views.render("missing", &json!({})),
            Err(ViewError::Unknown(_))
        ));
    }

    #[test]
    fn test_context_must_be_an_object() {
        let views = Views::new().unwrap();
        assert!(matches!(
            views.render("index", &json!([])),
            Err(ViewError::Context(_))
        ));
    }
}
