//! HTTP API server.
//!
//! Exposes RAG management and question answering as a JSON API.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `POST`   | `/api/rag` | Create a RAG from a folder |
//! | `GET`    | `/api/rag` | List RAG summaries |
//! | `GET`    | `/api/rag/{name}` | RAG metadata and documents |
//! | `DELETE` | `/api/rag/{name}` | Delete a RAG |
//! | `POST`   | `/api/query/{name}` | Answer a question |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "RAG 'docs' not found" } }
//! ```
//!
//! | Code | Status |
//! |------|--------|
//! | `bad_request`, `invalid_name`, `no_documents`, `folder_unreadable`, `dimension_mismatch` | 400 |
//! | `not_found` | 404 |
//! | `already_exists` | 409 |
//! | `backend_error` | 502 |
//! | `internal` | 500 |
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the API can back a
//! browser frontend served from another port.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use ragbase_core::{
    CompletionProvider, EmbeddingProvider, IngestionPipeline, QueryPipeline, RagError,
    RagSummary, RagSystem, Repository, TextExtractor,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::extract::FileExtractor;
use crate::ollama::OllamaClient;

/// Shared state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    repository: Arc<Repository>,
    extractor: Arc<dyn TextExtractor>,
    embedder: Arc<dyn EmbeddingProvider>,
    completer: Arc<dyn CompletionProvider>,
}

impl AppState {
    pub fn new(
        repository: Repository,
        extractor: Arc<dyn TextExtractor>,
        embedder: Arc<dyn EmbeddingProvider>,
        completer: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            repository: Arc::new(repository),
            extractor,
            embedder,
            completer,
        }
    }

    /// State backed by the configured Ollama server and data directory.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let ollama = Arc::new(OllamaClient::new(&config.ollama, &config.generation)?);
        Ok(Self::new(
            Repository::new(&config.storage.data_dir),
            Arc::new(FileExtractor::new(&config.extraction)),
            ollama.clone(),
            ollama,
        ))
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/rag", post(handle_create_rag).get(handle_list_rags))
        .route("/api/rag/{name}", get(handle_get_rag).delete(handle_delete_rag))
        .route("/api/query/{name}", post(handle_query))
        .layer(cors)
        .with_state(state)
}

/// Serve the API on `[server].bind` until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(
        "API listening on http://{} (data dir {}, ollama {})",
        config.server.bind,
        config.storage.data_dir.display(),
        config.ollama.url
    );
    println!("ragbase API listening on http://{}", config.server.bind);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

/// Error type that converts into a JSON error response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

impl From<RagError> for AppError {
    fn from(err: RagError) -> Self {
        let (status, code) = match &err {
            RagError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            RagError::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),
            RagError::InvalidName { .. } => (StatusCode::BAD_REQUEST, "invalid_name"),
            RagError::NoDocumentsFound(_) => (StatusCode::BAD_REQUEST, "no_documents"),
            RagError::FolderUnreadable { .. } => (StatusCode::BAD_REQUEST, "folder_unreadable"),
            RagError::DimensionMismatch { .. } => (StatusCode::BAD_REQUEST, "dimension_mismatch"),
            RagError::Embedding { .. } | RagError::Generation(_) => {
                (StatusCode::BAD_GATEWAY, "backend_error")
            }
            RagError::Extraction { .. }
            | RagError::Worker(_)
            | RagError::Io { .. }
            | RagError::Serialization { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        if status.is_server_error() {
            warn!("request failed: {}", err);
        }
        AppError {
            status,
            code,
            message: err.to_string(),
        }
    }
}

// ============ GET /health ============

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

// ============ POST /api/rag ============

#[derive(Deserialize)]
struct CreateRagRequest {
    model: String,
    name: String,
    folder_path: PathBuf,
}

async fn handle_create_rag(
    State(state): State<AppState>,
    Json(req): Json<CreateRagRequest>,
) -> Result<(StatusCode, Json<RagSummary>), AppError> {
    if req.model.trim().is_empty() {
        return Err(bad_request("model must not be empty"));
    }
    if req.folder_path.as_os_str().is_empty() {
        return Err(bad_request("folder_path must not be empty"));
    }

    let rag = IngestionPipeline::new(
        &state.repository,
        Arc::clone(&state.extractor),
        state.embedder.as_ref(),
    )
    .create(&req.model, &req.name, &req.folder_path)
    .await?;

    Ok((StatusCode::CREATED, Json(rag.summary())))
}

// ============ GET /api/rag ============

async fn handle_list_rags(
    State(state): State<AppState>,
) -> Result<Json<Vec<RagSummary>>, AppError> {
    let mut summaries = Vec::new();
    for name in state.repository.list()? {
        match state.repository.load(&name) {
            Ok(rag) => summaries.push(rag.summary()),
            Err(e) => warn!("skipping unreadable RAG '{}': {}", name, e),
        }
    }
    Ok(Json(summaries))
}

// ============ GET /api/rag/{name} ============

async fn handle_get_rag(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<RagSystem>, AppError> {
    Ok(Json(state.repository.load(&name)?))
}

// ============ DELETE /api/rag/{name} ============

async fn handle_delete_rag(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    state.repository.delete(&name)?;
    info!("deleted RAG '{}'", name);
    Ok(StatusCode::NO_CONTENT)
}

// ============ POST /api/query/{name} ============

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
}

#[derive(Serialize)]
struct QueryResponse {
    response: String,
    sources: Vec<SourceRef>,
}

#[derive(Serialize)]
struct SourceRef {
    id: String,
    name: String,
    path: PathBuf,
    score: f64,
}

async fn handle_query(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, AppError> {
    if req.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let rag = state.repository.load(&name)?;
    let answer = QueryPipeline::new(state.embedder.as_ref(), state.completer.as_ref())
        .answer_with_sources(&rag, &req.query)
        .await?;

    let sources = answer
        .sources
        .iter()
        .map(|s| SourceRef {
            id: s.document.id.clone(),
            name: s.document.name.clone(),
            path: s.document.path.clone(),
            score: s.score,
        })
        .collect();

    Ok(Json(QueryResponse {
        response: answer.response,
        sources,
    }))
}
