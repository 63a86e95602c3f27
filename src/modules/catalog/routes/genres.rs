use axum::extract::{Form, Path, State};
use catalog_http::error::AppError;
use serde_json::json;

use super::{parse_id, redirect, render, render_form, Page};
use crate::modules::catalog::models::{list_url, url, views, Genre, GenreForm, View};
use crate::modules::catalog::CatalogState;
use crate::validation::{self, FieldError, FormData};

fn form_page(state: &CatalogState, title: &str, form: &GenreForm, errors: &[FieldError]) -> Page {
    render_form(state, "genre_form", title, "genre", form, errors, json!({}))
}

pub async fn list(State(state): State<CatalogState>) -> Page {
    let genres = state.catalog.all_genres().await?;
    render(
        &state,
        "genre_list",
        json!({ "title": "Genre List", "genres": views(&genres) }),
    )
}

pub async fn detail(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    let id = parse_id(&id)?;
    let (genre, books) = tokio::try_join!(
        state.catalog.genres.find_by_id(&id),
        state.catalog.books_in_genre(&id),
    )?;
    let genre = genre.ok_or_else(|| AppError::not_found("Genre not found"))?;

    render(
        &state,
        "genre_detail",
        json!({
            "title": format!("Genre: {}", genre.data.name),
            "genre": genre.view(),
            "books": views(&books),
        }),
    )
}

pub async fn create_form(State(state): State<CatalogState>) -> Page {
    form_page(&state, "Create Genre", &GenreForm::default(), &[])
}

/// Submitting a name that already exists leads to the existing genre
pub async fn create(State(state): State<CatalogState>, Form(form): Form<FormData>) -> Page {
    let outcome = validation::run(&GenreForm::rules(), form);
    let candidate = GenreForm::from_values(None, &outcome.values);
    if !outcome.is_valid() {
        return form_page(&state, "Create Genre", &candidate, &outcome.errors);
    }

    if let Some(existing) = state.catalog.genre_named(&candidate.name).await? {
        tracing::debug!(genre = %existing.id, "genre already exists");
        return redirect(&url::<Genre>(&existing.id));
    }

    let genre = state.catalog.genres.insert(candidate.to_entity()).await?;
    tracing::info!(genre = %genre.id, "genre created");
    redirect(&url::<Genre>(&genre.id))
}

pub async fn delete_form(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    let id = parse_id(&id)?;
    let (genre, books) = tokio::try_join!(
        state.catalog.genres.find_by_id(&id),
        state.catalog.books_in_genre(&id),
    )?;
    let Some(genre) = genre else {
        return redirect(&list_url::<Genre>());
    };

    render(
        &state,
        "genre_delete",
        json!({
            "title": "Delete Genre",
            "genre": genre.view(),
            "books": views(&books),
            "has_books": !books.is_empty(),
        }),
    )
}

pub async fn delete(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    let id = parse_id(&id)?;
    let deleted = state.catalog.genres.delete(&id).await?;
    tracing::info!(genre = %id, deleted, "genre delete requested");
    redirect(&list_url::<Genre>())
}

pub async fn update_form(State(state): State<CatalogState>, Path(id): Path<String>) -> Page {
    let id = parse_id(&id)?;
    let genre = state
        .catalog
        .genres
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Genre not found"))?;

    form_page(&state, "Update Genre", &GenreForm::from_record(&genre), &[])
}

pub async fn update(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
    Form(form): Form<FormData>,
) -> Page {
    let id = parse_id(&id)?;
    let outcome = validation::run(&GenreForm::rules(), form);
    let candidate = GenreForm::from_values(Some(id), &outcome.values);
    if !outcome.is_valid() {
        return form_page(&state, "Update Genre", &candidate, &outcome.errors);
    }

    if state.catalog.genres.replace(&id, &candidate.to_entity()).await? {
        tracing::info!(genre = %id, "genre updated");
    } else {
        tracing::warn!(genre = %id, "update for missing genre");
    }
    redirect(&url::<Genre>(&id))
}
