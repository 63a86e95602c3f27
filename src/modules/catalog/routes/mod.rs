//! HTTP handlers for the catalog, one submodule per entity.
//!
//! Every entity exposes the same handler set: list, detail, create, update,
//! and delete, the last three as a GET form plus a POST submission.

mod authors;
mod book_instances;
mod books;
mod genres;
mod index;

use axum::{
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use catalog_db::DocumentId;
use catalog_http::error::AppError;
use serde::Serialize;
use serde_json::{json, Map, Value};

use super::CatalogState;
use crate::validation::FieldError;

/// Result type shared by every catalog handler
pub(crate) type Page = Result<Response, AppError>;

/// Routes relative to the catalog mount point
pub(crate) fn router() -> Router<CatalogState> {
    Router::new()
        .route("/", get(index::index))
        .route("/authors", get(authors::list))
        .route("/author/create", get(authors::create_form).post(authors::create))
        .route("/author/{id}", get(authors::detail))
        .route("/author/{id}/delete", get(authors::delete_form).post(authors::delete))
        .route("/author/{id}/update", get(authors::update_form).post(authors::update))
        .route("/genres", get(genres::list))
        .route("/genre/create", get(genres::create_form).post(genres::create))
        .route("/genre/{id}", get(genres::detail))
        .route("/genre/{id}/delete", get(genres::delete_form).post(genres::delete))
        .route("/genre/{id}/update", get(genres::update_form).post(genres::update))
        .route("/books", get(books::list))
        .route("/book/create", get(books::create_form).post(books::create))
        .route("/book/{id}", get(books::detail))
        .route("/book/{id}/delete", get(books::delete_form).post(books::delete))
        .route("/book/{id}/update", get(books::update_form).post(books::update))
        .route("/bookinstances", get(book_instances::list))
        .route(
            "/bookinstance/create",
            get(book_instances::create_form).post(book_instances::create),
        )
        .route("/bookinstance/{id}", get(book_instances::detail))
        .route(
            "/bookinstance/{id}/delete",
            get(book_instances::delete_form).post(book_instances::delete),
        )
        .route(
            "/bookinstance/{id}/update",
            get(book_instances::update_form).post(book_instances::update),
        )
}

/// Method and path of every catalog route, relative to the mount point
pub const ROUTES: &[(&str, &str)] = &[
    ("GET", "/"),
    ("GET", "/authors"),
    ("GET|POST", "/author/create"),
    ("GET", "/author/{id}"),
    ("GET|POST", "/author/{id}/delete"),
    ("GET|POST", "/author/{id}/update"),
    ("GET", "/genres"),
    ("GET|POST", "/genre/create"),
    ("GET", "/genre/{id}"),
    ("GET|POST", "/genre/{id}/delete"),
    ("GET|POST", "/genre/{id}/update"),
    ("GET", "/books"),
    ("GET|POST", "/book/create"),
    ("GET", "/book/{id}"),
    ("GET|POST", "/book/{id}/delete"),
    ("GET|POST", "/book/{id}/update"),
    ("GET", "/bookinstances"),
    ("GET|POST", "/bookinstance/create"),
    ("GET", "/bookinstance/{id}"),
    ("GET|POST", "/bookinstance/{id}/delete"),
    ("GET|POST", "/bookinstance/{id}/update"),
];

/// Identity from a path segment. A malformed identity is a store failure,
/// not a missing record.
fn parse_id(raw: &str) -> Result<DocumentId, AppError> {
    Ok(raw.parse()?)
}

fn render(state: &CatalogState, view: &str, context: Value) -> Page {
    Ok(state.views.page(view, context)?.into_response())
}

fn redirect(location: &str) -> Page {
    Ok(Redirect::to(location).into_response())
}

/// Render an entity form: the submitted or stored values under `key`,
/// validation errors, and any choice sets in `extra`
fn render_form<F: Serialize>(
    state: &CatalogState,
    view: &str,
    title: &str,
    key: &str,
    form: &F,
    errors: &[FieldError],
    extra: Value,
) -> Page {
    let mut context = Map::new();
    context.insert("title".to_string(), json!(title));
    context.insert(key.to_string(), json!(form));
    context.insert("errors".to_string(), json!(errors));
    context.insert("has_errors".to_string(), json!(!errors.is_empty()));
    if let Value::Object(extra) = extra {
        context.extend(extra);
    }
    render(state, view, Value::Object(context))
}
