use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use super::docs::render_docs;
use super::models::{ErrorResponse, OverlayRequest};
use super::overlay::overlay_request;
use super::state::ServerState;
use crate::label::SvgTextMeasurer;
use crate::overlay::load_font_database;
use crate::settings;

pub async fn run_server(settings: settings::Settings, addr: String) -> Result<()> {
    let state = Arc::new(build_state(settings)?);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| "failed to bind server address")?;
    info!("credit overlay service listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_state(settings: settings::Settings) -> Result<ServerState> {
    let fontdb = load_font_database(
        settings.font_path.as_deref().map(Path::new),
        settings.font_family.as_deref(),
    )?;
    let docs = render_docs(settings.canvas())?;
    if settings.api_keys.is_empty() {
        warn!("no API keys configured; every overlay request will be rejected");
    }
    Ok(ServerState {
        measurer: SvgTextMeasurer::new(fontdb.clone()),
        fontdb,
        http: reqwest::Client::new(),
        docs,
        settings,
    })
}

fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(docs))
        .route("/health", get(health))
        .route("/credit-overlay", post(credit_overlay))
        .fallback(not_found)
        .with_state(state)
}

async fn docs(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.docs.clone(),
    )
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

async fn credit_overlay(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<OverlayRequest>,
) -> Response {
    match overlay_request(state.as_ref(), payload).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/jpeg")], bytes).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Path not found".to_string(),
            details: None,
        }),
    )
}
