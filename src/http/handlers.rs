//! HTTP request handlers
//!
//! Implements handlers for the subtitle endpoint plus health and debug.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ExtractionError;
use crate::extract::parse_language_list;
use crate::state::AppState;

/// HTTP error type
#[derive(Debug)]
pub enum HttpError {
    BadRequest(String),
    Busy,
    InternalError(String),
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HttpError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            HttpError::Busy => (
                StatusCode::SERVICE_UNAVAILABLE,
                "too many concurrent extractions".to_string(),
            ),
            HttpError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ExtractionError> for HttpError {
    fn from(err: ExtractionError) -> Self {
        if err.is_client_error() {
            HttpError::BadRequest(err.user_message())
        } else {
            HttpError::InternalError(err.user_message())
        }
    }
}

/// Query string of `GET /api/get-subtitle`
#[derive(Debug, Deserialize)]
pub struct SubtitleQuery {
    pub url: Option<String>,
    /// Comma separated language tags, e.g. `zh-Hans,en`
    pub lang: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubtitleResponse {
    pub subtitle: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> &'static str {
    concat!("subtitle-server v", env!("CARGO_PKG_VERSION"))
}

/// Subtitle extraction endpoint
/// GET /api/get-subtitle?url=...&lang=...
pub async fn get_subtitle(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SubtitleQuery>,
) -> Result<Json<SubtitleResponse>, HttpError> {
    let url = query
        .url
        .ok_or_else(|| HttpError::BadRequest("missing `url` query parameter".to_string()))?;

    let languages = if state.config.extractor.allow_language_override {
        query.lang.as_deref().map(parse_language_list)
    } else {
        None
    };

    // Held until the extraction returns, or dropped with this future.
    let _slot = state.try_acquire_slot().map_err(|_| {
        tracing::warn!("extraction limit reached, rejecting request");
        HttpError::Busy
    })?;

    let request = state.orchestrator.request_for(url, languages);
    let result = state.orchestrator.extract(&request).await?;

    Ok(Json(SubtitleResponse {
        subtitle: result.raw_text,
    }))
}

/// Debug endpoint - extraction slots
pub async fn extraction_stats(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "in_flight": state.extractions_in_flight(),
        "limit": state.config.max_concurrent_extractions,
        "program": state.orchestrator.config().program,
        "timeout_ms": state.orchestrator.config().timeout_ms,
    }))
}
