//! HTTP front end for the translation engine.

use crate::i18n::{LanguageInfo, LanguageSet, TranslationMetrics};
use crate::mango::{Mango, MangoError, TranslateOptions};
use crate::security;
use crate::value::Value;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AppState {
    pub mango: Mango,
    /// Required key for `/translate`; `None` disables the check
    pub api_key: Option<String>,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    Internal(String),
}

impl From<MangoError> for ApiError {
    fn from(e: MangoError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "missing or invalid API key".to_string(),
            ),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateBody {
    pub value: Value,
    #[serde(default)]
    pub exclude_paths: Vec<String>,
    pub languages: Option<Vec<String>>,
    pub source_language: Option<String>,
    #[serde(default)]
    pub fast: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguagesResponse {
    pub source_language: String,
    pub languages: Vec<LanguageInfo>,
    pub provider: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/languages", get(languages))
        .route("/metrics", get(metrics))
        .route("/translate", post(translate))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Serve `router` until the process is stopped.
pub async fn serve(listener: tokio::net::TcpListener, router: Router) -> anyhow::Result<()> {
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn languages(State(state): State<Arc<AppState>>) -> Json<LanguagesResponse> {
    let languages = state.mango.languages();
    Json(LanguagesResponse {
        source_language: languages.source().to_string(),
        languages: languages.describe(),
        provider: state.mango.provider_name().to_string(),
    })
}

async fn metrics() -> Json<crate::i18n::MetricsReport> {
    Json(TranslationMetrics::global().report())
}

async fn translate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TranslateBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !security::verify_api_key(state.api_key.as_deref(), &headers) {
        warn!("Rejected /translate request with missing or invalid API key");
        return Err(ApiError::Unauthorized);
    }

    let mut options = TranslateOptions::new()
        .exclude(body.exclude_paths)
        .fast(body.fast);
    if let Some(languages) = request_languages(
        state.mango.languages(),
        body.languages,
        body.source_language,
    )? {
        options = options.languages(languages);
    }

    let translated = state.mango.translate(&body.value, options).await?;
    let json = translated
        .to_json()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(json))
}

/// Per-request language override, if the body asks for one.
///
/// Without an explicit source, the configured source is kept when it is in
/// the requested list, otherwise the first requested language is used.
fn request_languages(
    configured: &LanguageSet,
    languages: Option<Vec<String>>,
    source: Option<String>,
) -> Result<Option<LanguageSet>, ApiError> {
    let set = match (languages, source) {
        (None, None) => return Ok(None),
        (None, Some(source)) => LanguageSet::new(configured.languages().iter().cloned(), &source),
        (Some(languages), Some(source)) => LanguageSet::new(languages, &source),
        (Some(languages), None) => {
            let source = if languages.iter().any(|l| l.trim() == configured.source()) {
                configured.source().to_string()
            } else {
                languages.first().cloned().unwrap_or_default()
            };
            LanguageSet::new(languages, &source)
        }
    };
    set.map(Some).map_err(|e| ApiError::BadRequest(e.to_string()))
}
