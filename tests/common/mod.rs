//! Shared helpers: an app wired to an in-memory store, and a local web server
//! that stands in for the pages being bookmarked.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::{Html, IntoResponse, Redirect};
use axum::routing::get;
use axum::Router;
use content_organizer::api::{create_app, AppState};
use content_organizer::db::Repository;
use content_organizer::services::MetadataExtractor;
use serde_json::Value;
use tower::util::ServiceExt;

pub const ARTICLE_HTML: &str = r#"<!doctype html>
<html>
<head>
  <title>Focus Techniques That Work</title>
  <meta name="description" content="Practical tips for staying on task">
  <meta property="og:image" content="https://cdn.example.com/focus.png">
</head>
<body><p>Hello</p></body>
</html>"#;

/// Builds the application over a fresh in-memory store.
pub async fn test_app() -> Router {
    let repository = Arc::new(Repository::open_in_memory().await.unwrap());
    let extractor = Arc::new(MetadataExtractor::new(Duration::from_secs(5)).unwrap());
    create_app(AppState::new(repository, extractor))
}

/// Sends a request through the router and decodes the JSON body (Null if empty or not JSON).
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Serves a handful of fixed pages on an ephemeral port and returns the base URL.
pub async fn spawn_page_server() -> String {
    let pages = Router::new()
        .route("/article", get(|| async { Html(ARTICLE_HTML) }))
        .route("/bare", get(|| async { Html("<html><body>nothing here</body></html>") }))
        .route("/moved", get(|| async { Redirect::permanent("/article") }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Html(ARTICLE_HTML)
            }),
        )
        .route(
            "/gone",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Html("<html><head><title>Page Not Found</title></head></html>"),
                )
                    .into_response()
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, pages).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A URL on a local port that nothing listens on.
pub fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/page", port)
}
