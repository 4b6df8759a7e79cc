//! HTTP API for the task pane

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::errors::TranslationError;
use crate::core::models::{TranslationRequest, LANGUAGES};
use crate::core::usage::UsageStats;
use crate::processors::selection::DocumentTranslator;
use crate::server::static_files;

/// Application state
#[derive(Clone)]
pub struct AppState {
    translator: DocumentTranslator,
}

impl AppState {
    pub fn new(translator: DocumentTranslator) -> Self {
        Self { translator }
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    service: String,
    version: String,
    model: String,
}

#[derive(Serialize)]
struct LanguageInfo {
    code: &'static str,
    name: &'static str,
}

/// Translation response
#[derive(Serialize)]
pub struct TranslateResponse {
    pub translation: String,
    pub detected_language: Option<String>,
    pub model: String,
    pub usage: Usage,
    pub stats: UsageStats,
}

#[derive(Serialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub code: String,
}

/// Translation error rendered as an HTTP response
pub struct ApiFailure(TranslationError);

impl From<TranslationError> for ApiFailure {
    fn from(err: TranslationError) -> Self {
        ApiFailure(err)
    }
}

fn status_for(err: &TranslationError) -> StatusCode {
    match err {
        e if e.is_input_error() => StatusCode::BAD_REQUEST,
        TranslationError::Busy => StatusCode::CONFLICT,
        TranslationError::Authentication { .. } => StatusCode::UNAUTHORIZED,
        TranslationError::QuotaExceeded { .. } | TranslationError::RateLimited { .. } => {
            StatusCode::TOO_MANY_REQUESTS
        }
        TranslationError::ApiError { .. }
        | TranslationError::NetworkError { .. }
        | TranslationError::InvalidResponseError { .. }
        | TranslationError::HttpError(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = ErrorResponse {
            error: ErrorDetail {
                message: self.0.to_string(),
                code: self.0.code().to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}

/// Health check handler
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model: state.translator.client().default_model().to_string(),
    })
}

async fn languages() -> Json<Vec<LanguageInfo>> {
    Json(
        LANGUAGES
            .iter()
            .map(|&(code, name)| LanguageInfo { code, name })
            .collect(),
    )
}

/// Translate one piece of text
async fn translate(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TranslationRequest>,
) -> Result<Json<TranslateResponse>, ApiFailure> {
    let result = state
        .translator
        .translate_string(&payload)
        .await
        .map_err(|e| {
            warn!("Translation failed: {}", e);
            ApiFailure(e)
        })?;

    let stats = state.translator.usage().get_stats().await;

    Ok(Json(TranslateResponse {
        translation: result.translation,
        detected_language: result.detected_source_lang,
        model: result.model_used,
        usage: Usage {
            prompt_tokens: result.tokens.input_tokens,
            completion_tokens: result.tokens.output_tokens,
            total_tokens: result.tokens.total(),
        },
        stats,
    }))
}

async fn usage(State(state): State<Arc<AppState>>) -> Json<UsageStats> {
    Json(state.translator.usage().get_stats().await)
}

async fn reset_usage(State(state): State<Arc<AppState>>) -> Result<Json<UsageStats>, ApiFailure> {
    Ok(Json(state.translator.usage().reset().await?))
}

/// API routes plus static files from `root`
pub fn build_router(state: AppState, root: PathBuf) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/languages", get(languages))
        .route("/api/translate", post(translate))
        .route("/api/usage", get(usage))
        .route("/api/usage/reset", post(reset_usage))
        .with_state(Arc::new(state))
        .merge(static_files::router(root))
}

/// Run the HTTP server
pub async fn run_server(
    translator: DocumentTranslator,
    host: String,
    port: u16,
    root: PathBuf,
) -> anyhow::Result<()> {
    let app = build_router(AppState::new(translator), root.clone());

    // Bind address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Starting server on {} serving {}", addr, root.display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::client::ChatClient;
    use crate::core::config::TranslatorConfig;
    use crate::core::store::MemoryStore;
    use crate::core::usage::UsageTracker;
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app(endpoint: String, root: PathBuf) -> Router {
        let client = ChatClient::new(TranslatorConfig {
            api_key: "sk-test".to_string(),
            api_endpoint: endpoint,
            ..Default::default()
        })
        .unwrap();
        let usage = UsageTracker::load(Arc::new(MemoryStore::new())).unwrap();
        build_router(AppState::new(DocumentTranslator::new(client, usage)), root)
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_translate_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Hola mundo\nDETECTED: English"}}],
                "usage": {"prompt_tokens": 30, "completion_tokens": 5}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let app = app(server.uri(), dir.path().to_path_buf());
        let (status, body) = post_json(
            app,
            "/api/translate",
            json!({"text": "Hello world", "target_lang": "es", "domain": "legal"}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["translation"], "Hola mundo");
        assert_eq!(body["detected_language"], "English");
        assert_eq!(body["usage"]["total_tokens"], 35);
        assert_eq!(body["stats"]["totalTranslations"], 1);
        assert_eq!(body["stats"]["totalWords"], 2);
    }

    #[tokio::test]
    async fn test_input_errors_are_bad_requests() {
        let dir = tempfile::tempdir().unwrap();
        let app = app("http://127.0.0.1:9".to_string(), dir.path().to_path_buf());

        let (status, body) = post_json(
            app.clone(),
            "/api/translate",
            json!({"text": "Hello", "source_lang": "fr", "target_lang": "fr"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "same_language");

        let (status, body) = post_json(
            app,
            "/api/translate",
            json!({"text": "  ", "target_lang": "de"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "no_selection");
    }

    #[tokio::test]
    async fn test_auth_failure_maps_to_401() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Incorrect API key provided", "code": "invalid_api_key"}
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let (status, body) = post_json(
            app(server.uri(), dir.path().to_path_buf()),
            "/api/translate",
            json!({"text": "Hello", "target_lang": "es"}),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "authentication");
    }

    #[tokio::test]
    async fn test_reset_and_static_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("taskpane.js"), "// pane").unwrap();
        let app = app("http://127.0.0.1:9".to_string(), dir.path().to_path_buf());

        let (status, body) = post_json(app.clone(), "/api/usage/reset", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalCost"], 0.0);

        let response = app
            .oneshot(Request::get("/taskpane.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/javascript");
    }
}
