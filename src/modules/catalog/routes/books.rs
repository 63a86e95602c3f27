use axum::extract::{Form, Path, State};
use catalog_http::error::AppError;
use serde_json::{json, Value};

use super::{parse_id, redirect, render, render_form, Page};
use crate::modules::catalog::models::{list_url, url, views, Book, BookForm, Choice, View};
use crate::modules::catalog::repository::BookDetail;
use crate::modules::catalog::CatalogState;
use crate::validation::{self, FieldError, FormData};

fn form_page(
    state: &CatalogState,
    title: &str,
    form: &BookForm,
    errors: &[FieldError],
    (authors, genres): (Vec<Choice>, Vec<Choice>),
) -> Page {
    render_form(
        state,
        "book_form",
        title,
        "book",
        form,
        errors,
        json!({ "authors": authors, "genres": genres }),
    )
}

/// Detail context shared by the detail and delete pages
fn detail_context(title: &str, detail: &BookDetail) -> Value {
    json!({
        "title": title,
        "book": detail.book.view(),
        "author": detail.author.as_ref().map(View::view),
        "genres": views(&detail.genres),
        "copies": views(&detail.copies),
        "has_copies": !detail.copies.is_empty(),
    })
}

pub async fn list(State(state): State<CatalogState>) -> Page {
    let books = state.catalog.books_with_authors().await?;
    let books: Vec<Value> = books.iter().map(|b| b.view_with("author")).collect();
    render(
        &state,
        "book_list",
        json!({ "title": "Book List", "books": books }),
    )
}

pub async fn detail(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    let id = parse_id(&id)?;
    let detail = state
        .catalog
        .book_detail(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Book not found"))?;

    let title = detail.book.data.title.clone();
    render(&state, "book_detail", detail_context(&title, &detail))
}

pub async fn create_form(State(state): State<CatalogState>) -> Page {
    let choices = tokio::try_join!(
        state.catalog.author_choices(),
        state.catalog.genre_choices()
    )?;
    form_page(&state, "Create Book", &BookForm::default(), &[], choices)
}

pub async fn create(State(state): State<CatalogState>, Form(form): Form<FormData>) -> Page {
    let outcome = validation::run(&BookForm::rules(), form);
    let candidate = BookForm::from_values(None, &outcome.values);
    if !outcome.is_valid() {
        let choices = tokio::try_join!(
            state.catalog.author_choices(),
            state.catalog.genre_choices()
        )?;
        return form_page(&state, "Create Book", &candidate, &outcome.errors, choices);
    }

    let book = state.catalog.books.insert(candidate.to_entity()?).await?;
    tracing::info!(book = %book.id, "book created");
    redirect(&url::<Book>(&book.id))
}

pub async fn delete_form(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    let id = parse_id(&id)?;
    let Some(detail) = state.catalog.book_detail(&id).await? else {
        return redirect(&list_url::<Book>());
    };
    render(&state, "book_delete", detail_context("Delete Book", &detail))
}

pub async fn delete(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    let id = parse_id(&id)?;
    let deleted = state.catalog.books.delete(&id).await?;
    tracing::info!(book = %id, deleted, "book delete requested");
    redirect(&list_url::<Book>())
}

pub async fn update_form(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    let id = parse_id(&id)?;
    let (book, authors, genres) = tokio::try_join!(
        state.catalog.books.find_by_id(&id),
        state.catalog.author_choices(),
        state.catalog.genre_choices(),
    )?;
    let book = book.ok_or_else(|| AppError::not_found("Book not found"))?;

    form_page(
        &state,
        "Update Book",
        &BookForm::from_record(&book),
        &[],
        (authors, genres),
    )
}

pub async fn update(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
    Form(form): Form<FormData>,
) -> Page {
    let id = parse_id(&id)?;
    let outcome = validation::run(&BookForm::rules(), form);
    let candidate = BookForm::from_values(Some(id), &outcome.values);
    if !outcome.is_valid() {
        let choices = tokio::try_join!(
            state.catalog.author_choices(),
            state.catalog.genre_choices()
        )?;
        return form_page(&state, "Update Book", &candidate, &outcome.errors, choices);
    }

    if state.catalog.books.replace(&id, &candidate.to_entity()?).await? {
        tracing::info!(book = %id, "book updated");
    } else {
        tracing::warn!(book = %id, "update for missing book");
    }
    redirect(&url::<Book>(&id))
}
