mod handlers;
mod routes;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::Repository;
use crate::error::AppError;
use crate::services::MetadataExtractor;

pub use routes::create_app;

pub const SERVICE_NAME: &str = "Neurodivergent Content Organizer";

/// Shared handles passed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<Repository>,
    pub extractor: Arc<MetadataExtractor>,
}

impl AppState {
    pub fn new(repository: Arc<Repository>, extractor: Arc<MetadataExtractor>) -> Self {
        Self {
            repository,
            extractor,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            _ => {
                tracing::error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
