//! HTTP API over the JSON file store.
//!
//! Routes:
//! - `GET /` serves the editor page with the current plan filled in
//! - `GET /editor.js` serves the page's editing script
//! - `GET /api/data` returns the whole document
//! - `POST /api/data` replaces the whole document

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::document::Document;
use crate::error::Result;
use crate::page::{render_page, EDITOR_JS, PAGE_HTML};
use crate::store::JsonFileStore;

/// Shared state handed to every request.
#[derive(Clone)]
pub struct AppState {
    /// Requests are serialised through this lock. Writers still overwrite
    /// each other without conflict detection.
    pub store: Arc<Mutex<JsonFileStore>>,
    pub page: Option<PathBuf>,
}

impl AppState {
    pub fn new(store: JsonFileStore, page: Option<PathBuf>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            page,
        }
    }

    /// Run a store operation on the blocking pool while holding the lock.
    async fn with_store<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&JsonFileStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone().lock_owned().await;
        tokio::task::spawn_blocking(move || op(&*store)).await?
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/editor.js", get(script_handler))
        .route("/api/data", get(read_handler).post(write_handler))
        .with_state(state)
}

async fn page_handler(State(state): State<AppState>) -> Response {
    let markup = match &state.page {
        None => PAGE_HTML.to_string(),
        Some(path) => match tokio::fs::read_to_string(path).await {
            Ok(html) => html,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read page, serving built-in page");
                PAGE_HTML.to_string()
            }
        },
    };

    match state.with_store(|store| store.read()).await {
        Ok(doc) => Html(render_page(&markup, &doc)).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to read data, serving page without it");
            Html(markup).into_response()
        }
    }
}

async fn script_handler() -> Response {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        EDITOR_JS,
    )
        .into_response()
}

async fn read_handler(State(state): State<AppState>) -> Response {
    match state.with_store(|store| store.read()).await {
        Ok(doc) => Json(doc).into_response(),
        Err(e) => {
            error!(error = %e, "Error reading data");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to read data" })),
            )
                .into_response()
        }
    }
}

async fn write_handler(State(state): State<AppState>, Json(doc): Json<Document>) -> Response {
    match state.with_store(move |store| store.write(&doc)).await {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(e) => {
            error!(error = %e, "Error writing data");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to save data" })),
            )
                .into_response()
        }
    }
}

/// Seed the data file if needed, then serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let store = JsonFileStore::open_or_init(&config.data_file)?;
    let state = AppState::new(store, config.page.clone());

    let listener = TcpListener::bind(config.address()).await?;
    let addr = listener.local_addr()?;
    info!("Server running at http://{addr}");
    info!("Open your browser to start editing the meal plan!");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
