use axum::extract::State;
use serde_json::json;

use super::{render, Page};
use crate::modules::catalog::CatalogState;

/// Catalog home page with record counts
pub async fn index(State(state): State<CatalogState>) -> Page {
    let counts = state.catalog.counts().await?;
    render(
        &state,
        "index",
        json!({
            "title": "Local Library Home",
            "counts": {
                "books": counts.books,
                "copies": counts.copies,
                "copies_available": counts.copies_available,
                "authors": counts.authors,
                "genres": counts.genres,
            },
        }),
    )
}
