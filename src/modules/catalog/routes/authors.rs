use axum::extract::{Form, Path, State};
use catalog_http::error::AppError;
use serde_json::json;

use super::{parse_id, redirect, render, render_form, Page};
use crate::modules::catalog::models::{list_url, url, views, Author, AuthorForm, View};
use crate::modules::catalog::CatalogState;
use crate::validation::{self, FieldError, FormData};

fn form_page(state: &CatalogState, title: &str, form: &AuthorForm, errors: &[FieldError]) -> Page {
    render_form(state, "author_form", title, "author", form, errors, json!({}))
}

pub async fn list(State(state): State<CatalogState>) -> Page {
    let authors = state.catalog.all_authors().await?;
    render(
        &state,
        "author_list",
        json!({ "title": "Author List", "authors": views(&authors) }),
    )
}

pub async fn detail(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    let id = parse_id(&id)?;
    let (author, books) = tokio::try_join!(
        state.catalog.authors.find_by_id(&id),
        state.catalog.books_by_author(&id),
    )?;
    let author = author.ok_or_else(|| AppError::not_found("Author not found"))?;

    render(
        &state,
        "author_detail",
        json!({
            "title": format!("Author: {}", author.data.name()),
            "author": author.view(),
            "books": views(&books),
        }),
    )
}

pub async fn create_form(State(state): State<CatalogState>) -> Page {
    form_page(&state, "Create Author", &AuthorForm::default(), &[])
}

pub async fn create(State(state): State<CatalogState>, Form(form): Form<FormData>) -> Page {
    let outcome = validation::run(&AuthorForm::rules(), form);
    let candidate = AuthorForm::from_values(None, &outcome.values);
    if !outcome.is_valid() {
        return form_page(&state, "Create Author", &candidate, &outcome.errors);
    }

    let author = state.catalog.authors.insert(candidate.to_entity()).await?;
    tracing::info!(author = %author.id, "author created");
    redirect(&url::<Author>(&author.id))
}

pub async fn delete_form(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    let id = parse_id(&id)?;
    let (author, books) = tokio::try_join!(
        state.catalog.authors.find_by_id(&id),
        state.catalog.books_by_author(&id),
    )?;
    let Some(author) = author else {
        return redirect(&list_url::<Author>());
    };

    render(
        &state,
        "author_delete",
        json!({
            "title": "Delete Author",
            "author": author.view(),
            "books": views(&books),
            "has_books": !books.is_empty(),
        }),
    )
}

pub async fn delete(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    let id = parse_id(&id)?;
    let deleted = state.catalog.authors.delete(&id).await?;
    tracing::info!(author = %id, deleted, "author delete requested");
    redirect(&list_url::<Author>())
}

pub async fn update_form(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    let id = parse_id(&id)?;
    let author = state
        .catalog
        .authors
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Author not found"))?;

    form_page(&state, "Update Author", &AuthorForm::from_record(&author), &[])
}

pub async fn update(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
    Form(form): Form<FormData>,
) -> Page {
    let id = parse_id(&id)?;
    let outcome = validation::run(&AuthorForm::rules(), form);
    let candidate = AuthorForm::from_values(Some(id), &outcome.values);
    if !outcome.is_valid() {
        return form_page(&state, "Update Author", &candidate, &outcome.errors);
    }

    if state.catalog.authors.replace(&id, &candidate.to_entity()).await? {
        tracing::info!(author = %id, "author updated");
    } else {
        tracing::warn!(author = %id, "update for missing author");
    }
    redirect(&url::<Author>(&id))
}
