use anyhow::{Result, anyhow};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{error, info};
use usvg::fontdb;

use super::models::{ErrorResponse, OverlayRequest};
use super::state::ServerState;
use crate::label::{Canvas, StyleConfig, TextMeasurer, compose_label};
use crate::overlay::{composite_label, fetch_image};
use crate::settings::Settings;

pub(crate) const MAX_TEXT_LEN: usize = 254;

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
    pub(crate) details: Option<String>,
}

impl ServerError {
    fn unauthorized() -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: "Unauthorized".to_string(),
            details: None,
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            details: None,
        }
    }

    fn processing(details: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Processing failed".to_string(),
            details: Some(details.into()),
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::processing(format!("{:#}", err))
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, PartialEq, Eq)]
struct ValidatedRequest<'a> {
    caller: &'a str,
    url: &'a str,
    text: &'a str,
}

pub(crate) async fn overlay_request(
    state: &ServerState,
    request: OverlayRequest,
) -> Result<Vec<u8>, ServerError> {
    let validated = validate_request(&state.settings, &request)?;
    let css = request.css.as_ref();
    log_request(&validated, css);

    let image = fetch_image(&state.http, validated.url).await;
    let result = match image {
        Ok(image) => {
            render_overlay(
                image,
                validated.text,
                css,
                state.settings.canvas(),
                &state.measurer,
                state.fontdb.clone(),
            )
            .await
        }
        Err(err) => Err(err),
    };
    result.map_err(|err| {
        error!("credit overlay failed for caller {}: {:#}", validated.caller, err);
        ServerError::from(err)
    })
}

/// Composes the label for `text` and layers it over `image`, returning JPEG
/// bytes.
pub(crate) async fn render_overlay<M>(
    image: Vec<u8>,
    text: &str,
    css: Option<&StyleConfig>,
    canvas: Canvas,
    measurer: &M,
    fontdb: Arc<fontdb::Database>,
) -> Result<Vec<u8>>
where
    M: TextMeasurer + ?Sized,
{
    let label = compose_label(text, css, canvas, measurer).await?;
    let svg = label.to_svg();
    tokio::task::spawn_blocking(move || composite_label(&image, &svg, canvas, fontdb))
        .await
        .map_err(|err| anyhow!("compositing task failed: {}", err))?
}

fn validate_request<'a>(
    settings: &'a Settings,
    request: &'a OverlayRequest,
) -> Result<ValidatedRequest<'a>, ServerError> {
    let caller = request
        .api_key
        .as_deref()
        .and_then(|key| settings.caller_for_key(key))
        .ok_or_else(ServerError::unauthorized)?;

    let url = request.url.as_deref().filter(|value| !value.is_empty());
    let text = request.text.as_deref().filter(|value| !value.is_empty());
    let (Some(url), Some(text)) = (url, text) else {
        return Err(ServerError::bad_request("Missing url or text"));
    };
    if reqwest::Url::parse(url).is_err() {
        return Err(ServerError::bad_request("Invalid URL format"));
    }
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(ServerError::bad_request(format!(
            "Text length exceeds maximum limit of {} characters",
            MAX_TEXT_LEN
        )));
    }
    Ok(ValidatedRequest { caller, url, text })
}

fn log_request(request: &ValidatedRequest<'_>, css: Option<&StyleConfig>) {
    let received_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());
    let css = css
        .and_then(|css| serde_json::to_string(css).ok())
        .unwrap_or_else(|| "null".to_string());
    info!(
        "credit-overlay request at {}: caller={} url={} text={:?} css={}",
        received_at, request.caller, request.url, request.text, css
    );
}
