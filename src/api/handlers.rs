use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::error::{AppError, Result};
use crate::models::{ContentItem, ContentUpdate, CountEntry, NewContent, SearchRequest};

use super::{AppState, SERVICE_NAME};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": SERVICE_NAME }))
}

/// Scrapes the page, then stores the new item. Scrape failures only degrade the metadata.
pub async fn create_content(
    State(state): State<AppState>,
    body: std::result::Result<Json<NewContent>, JsonRejection>,
) -> Result<Json<ContentItem>> {
    let Json(new) = body?;
    if new.url.trim().is_empty() {
        return Err(AppError::Validation("url must not be empty".to_string()));
    }

    let metadata = state.extractor.extract(&new.url).await;
    let item = ContentItem::create(new, metadata);
    state.repository.insert(&item).await?;

    tracing::info!("Saved {} as {}", item.url, item.id);
    Ok(Json(item))
}

pub async fn list_content(State(state): State<AppState>) -> Result<Json<Vec<ContentItem>>> {
    let items = state.repository.list_all().await?;
    Ok(Json(items))
}

pub async fn search_content(
    State(state): State<AppState>,
    body: std::result::Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<Vec<ContentItem>>> {
    let Json(request) = body?;
    let items = state.repository.search(&request.query).await?;
    tracing::debug!("Search {:?} matched {} items", request.query, items.len());
    Ok(Json(items))
}

pub async fn update_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: std::result::Result<Json<ContentUpdate>, JsonRejection>,
) -> Result<Json<ContentItem>> {
    let Json(update) = body?;
    let item = state
        .repository
        .update(&id, update.tags, update.category)
        .await?;
    Ok(Json(item))
}

pub async fn delete_content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state.repository.delete(&id).await?;
    tracing::info!("Deleted {}", id);
    Ok(Json(json!({ "message": "Content deleted successfully" })))
}

pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CountEntry>>> {
    Ok(Json(state.repository.aggregate_categories().await?))
}

pub async fn tags(State(state): State<AppState>) -> Result<Json<Vec<CountEntry>>> {
    Ok(Json(state.repository.aggregate_tags().await?))
}
