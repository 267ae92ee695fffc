//! HTTP API for the review service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/` | Service banner |
//! | `POST` | `/rag/code-input` | Chunk and index code snippets |
//! | `POST` | `/rag/analyze-code` | Issue list for the retrieved code |
//! | `POST` | `/rag/code-metrics` | Quality metrics for the retrieved code |
//! | `POST` | `/rag/inject-bugs` | Retrieved code with injected bugs |
//! | `POST` | `/rag/reset` | Drop every indexed chunk |
//!
//! The credential for a query comes from the body's `api_key`, else the
//! `api-key` header, else the configured default.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `configuration_error` (400),
//! `upstream_error` (502), `internal` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser front-ends
//! can call the API directly.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use rag_review_core::models::{InjectedBug, Issue, IssueDistribution, SummaryMetrics};
use rag_review_core::prompt::BugInjectionParams;
use rag_review_core::ReviewError;

use crate::config::Config;
use crate::service::{usable_credential, ReviewService};

/// Header carrying a per-request credential.
pub const API_KEY_HEADER: &str = "api-key";

/// Starts the HTTP server on `[server].bind` and runs until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let service = Arc::new(ReviewService::from_config(config)?);
    let bind_addr = config.server.bind.clone();

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "rag-review server listening");
    axum::serve(listener, router(service)).await?;

    Ok(())
}

/// Build the router around an existing service.
pub fn router(service: Arc<ReviewService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .route("/rag/code-input", post(handle_code_input))
        .route("/rag/analyze-code", post(handle_analyze))
        .route("/rag/code-metrics", post(handle_metrics))
        .route("/rag/inject-bugs", post(handle_inject_bugs))
        .route("/rag/reset", post(handle_reset))
        .layer(cors)
        .with_state(service)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<ReviewError> for AppError {
    fn from(err: ReviewError) -> Self {
        let (status, code) = match &err {
            ReviewError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ReviewError::Configuration(_) => (StatusCode::BAD_REQUEST, "configuration_error"),
            ReviewError::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            ReviewError::Index(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        if status.is_server_error() {
            error!(%err, "request failed");
        }
        AppError {
            status,
            code,
            message: err.to_string(),
        }
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

/// Body `api_key` first, then the `api-key` header.
fn request_credential(body_key: Option<&str>, headers: &HeaderMap) -> Option<String> {
    body_key.and_then(usable_credential).or_else(|| {
        headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(usable_credential)
    })
}

// ============ GET /health, GET / ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct RootResponse {
    message: String,
}

async fn handle_root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "RAG code review API is running".to_string(),
    })
}

// ============ POST /rag/code-input ============

#[derive(Deserialize)]
struct CodeInputRequest {
    code_snippets: Vec<String>,
    #[serde(default)]
    api_key: Option<String>,
}

#[derive(Serialize)]
struct CodeInputResponse {
    status: &'static str,
    message: String,
    snippets_loaded: usize,
    chunks_indexed: usize,
}

async fn handle_code_input(
    State(service): State<Arc<ReviewService>>,
    headers: HeaderMap,
    Json(req): Json<CodeInputRequest>,
) -> Result<Json<CodeInputResponse>, AppError> {
    let credential = request_credential(req.api_key.as_deref(), &headers);
    let report = service
        .ingest(&req.code_snippets, credential.as_deref())
        .await?;
    Ok(Json(CodeInputResponse {
        status: "success",
        message: "Code snippets loaded and indexed".to_string(),
        snippets_loaded: report.documents,
        chunks_indexed: report.chunks,
    }))
}

// ============ POST /rag/analyze-code ============

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
    #[serde(default)]
    api_key: Option<String>,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    status: &'static str,
    issues: Vec<Issue>,
    total_issues: usize,
}

async fn handle_analyze(
    State(service): State<Arc<ReviewService>>,
    headers: HeaderMap,
    Json(req): Json<QueryRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let credential = request_credential(req.api_key.as_deref(), &headers);
    let list = service.analyze(&req.query, credential.as_deref()).await?;
    Ok(Json(AnalyzeResponse {
        status: "success",
        total_issues: list.issues.len(),
        issues: list.issues,
    }))
}

// ============ POST /rag/code-metrics ============

#[derive(Serialize)]
struct MetricsResponse {
    status: &'static str,
    summary_metrics: SummaryMetrics,
    issue_distribution: IssueDistribution,
}

async fn handle_metrics(
    State(service): State<Arc<ReviewService>>,
    headers: HeaderMap,
    Json(req): Json<QueryRequest>,
) -> Result<Json<MetricsResponse>, AppError> {
    let credential = request_credential(req.api_key.as_deref(), &headers);
    let report = service.metrics(&req.query, credential.as_deref()).await?;
    Ok(Json(MetricsResponse {
        status: "success",
        summary_metrics: report.summary_metrics,
        issue_distribution: report.issue_distribution,
    }))
}

// ============ POST /rag/inject-bugs ============

#[derive(Deserialize)]
struct InjectBugsRequest {
    query: String,
    #[serde(default = "default_bug_type")]
    bug_type: String,
    #[serde(default = "default_severity_level")]
    severity_level: i64,
    #[serde(default = "default_num_bugs")]
    num_bugs: i64,
    #[serde(default)]
    api_key: Option<String>,
}

fn default_bug_type() -> String {
    "Security Vulnerability".to_string()
}
fn default_severity_level() -> i64 {
    5
}
fn default_num_bugs() -> i64 {
    2
}

#[derive(Serialize)]
struct InjectBugsResponse {
    status: &'static str,
    buggy_code: String,
    bugs_injected: Vec<InjectedBug>,
    total_bugs_injected: usize,
}

async fn handle_inject_bugs(
    State(service): State<Arc<ReviewService>>,
    headers: HeaderMap,
    Json(req): Json<InjectBugsRequest>,
) -> Result<Json<InjectBugsResponse>, AppError> {
    let severity_level = u8::try_from(req.severity_level).map_err(|_| {
        bad_request(format!(
            "severity_level must be between 1 and 5, got {}",
            req.severity_level
        ))
    })?;
    let num_bugs = u8::try_from(req.num_bugs).map_err(|_| {
        bad_request(format!("num_bugs must be between 1 and 10, got {}", req.num_bugs))
    })?;
    let params = BugInjectionParams {
        bug_type: req.bug_type,
        severity_level,
        num_bugs,
    };

    let credential = request_credential(req.api_key.as_deref(), &headers);
    let result = service
        .inject_bugs(&req.query, params, credential.as_deref())
        .await?;
    Ok(Json(InjectBugsResponse {
        status: "success",
        total_bugs_injected: result.bugs_injected.len(),
        buggy_code: result.buggy_code,
        bugs_injected: result.bugs_injected,
    }))
}

// ============ POST /rag/reset ============

#[derive(Serialize)]
struct ResetResponse {
    status: &'static str,
    message: String,
}

async fn handle_reset(
    State(service): State<Arc<ReviewService>>,
) -> Result<Json<ResetResponse>, AppError> {
    service.reset().await?;
    Ok(Json(ResetResponse {
        status: "success",
        message: "Index cleared".to_string(),
    }))
}
