use axum::extract::{Form, Path, State};
use catalog_http::error::AppError;
use serde_json::{json, Value};

use super::{parse_id, redirect, render, render_form, Page};
use crate::modules::catalog::models::{
    list_url, url, BookInstance, BookInstanceForm, Choice, Status,
};
use crate::modules::catalog::CatalogState;
use crate::validation::{self, FieldError, FormData};

fn form_page(
    state: &CatalogState,
    title: &str,
    form: &BookInstanceForm,
    errors: &[FieldError],
    books: Vec<Choice>,
) -> Page {
    render_form(
        state,
        "bookinstance_form",
        title,
        "copy",
        form,
        errors,
        json!({ "books": books, "statuses": Status::NAMES }),
    )
}

pub async fn list(State(state): State<CatalogState>) -> Page {
    let copies = state.catalog.instances_with_books().await?;
    let copies: Vec<Value> = copies.iter().map(|c| c.view_with("book")).collect();
    render(
        &state,
        "bookinstance_list",
        json!({ "title": "Book Instance List", "copies": copies }),
    )
}

pub async fn detail(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    let id = parse_id(&id)?;
    let copy = state
        .catalog
        .instance_with_book(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Book copy not found"))?;

    let title = match &copy.reference {
        Some(book) => format!("Copy: {}", book.data.title),
        None => "Copy: unknown book".to_string(),
    };
    render(
        &state,
        "bookinstance_detail",
        json!({ "title": title, "copy": copy.view_with("book") }),
    )
}

pub async fn create_form(State(state): State<CatalogState>) -> Page {
    let books = state.catalog.book_choices().await?;
    form_page(
        &state,
        "Create BookInstance",
        &BookInstanceForm::default(),
        &[],
        books,
    )
}

pub async fn create(State(state): State<CatalogState>, Form(form): Form<FormData>) -> Page {
    let outcome = validation::run(&BookInstanceForm::rules(), form);
    let candidate = BookInstanceForm::from_values(None, &outcome.values);
    if !outcome.is_valid() {
        let books = state.catalog.book_choices().await?;
        return form_page(
            &state,
            "Create BookInstance",
            &candidate,
            &outcome.errors,
            books,
        );
    }

    let copy = state
        .catalog
        .instances
        .insert(candidate.to_entity()?)
        .await?;
    tracing::info!(copy = %copy.id, book = %copy.data.book, "book copy created");
    redirect(&url::<BookInstance>(&copy.id))
}

pub async fn delete_form(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    let id = parse_id(&id)?;
    let Some(copy) = state.catalog.instance_with_book(&id).await? else {
        return redirect(&list_url::<BookInstance>());
    };

    render(
        &state,
        "bookinstance_delete",
        json!({ "title": "Delete Book Instance", "copy": copy.view_with("book") }),
    )
}

pub async fn delete(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    let id = parse_id(&id)?;
    let deleted = state.catalog.instances.delete(&id).await?;
    tracing::info!(copy = %id, deleted, "book copy delete requested");
    redirect(&list_url::<BookInstance>())
}

pub async fn update_form(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    let id = parse_id(&id)?;
    let (copy, books) = tokio::try_join!(
        state.catalog.instances.find_by_id(&id),
        state.catalog.book_choices(),
    )?;
    let copy = copy.ok_or_else(|| AppError::not_found("Book copy not found"))?;

    form_page(
        &state,
        "Update Book Instance",
        &BookInstanceForm::from_record(&copy),
        &[],
        books,
    )
}

pub async fn update(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
    Form(form): Form<FormData>,
) -> Page {
    let id = parse_id(&id)?;
    let outcome = validation::run(&BookInstanceForm::rules(), form);
    let candidate = BookInstanceForm::from_values(Some(id), &outcome.values);
    if !outcome.is_valid() {
        let books = state.catalog.book_choices().await?;
        return form_page(
            &state,
            "Update Book Instance",
            &candidate,
            &outcome.errors,
            books,
        );
    }

    if state
        .catalog
        .instances
        .replace(&id, &candidate.to_entity()?)
        .await?
    {
        tracing::info!(copy = %id, "book copy updated");
    } else {
        tracing::warn!(copy = %id, "update for missing book copy");
    }
    redirect(&url::<BookInstance>(&id))
}
