//! HTTP servers for the storage and analysis services.
//!
//! The storage service and the analysis service can run as separate
//! processes (the analysis side then reads content through
//! `[analysis].storage_url`) or merged into one process with `serve all`.
//!
//! # Endpoints
//!
//! | Service | Method | Path | Description |
//! |---------|--------|------|-------------|
//! | storage | `POST` | `/files/upload` | Store a file (multipart field `file`); `201` new, `200` existing |
//! | storage | `GET`  | `/files/{id}` | Raw content with `Content-Disposition` |
//! | storage | `GET`  | `/files/plagiarism/{id}` | `{ "plagiarismFileId": id \| null }` |
//! | analysis | `GET` | `/analysis/{id}` | Cached or freshly computed analysis |
//! | analysis | `GET` | `/analysis/wordcloud/{filename}` | Word-cloud PNG |
//! | both | `GET` | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "not_found", "message": "document not found: 7" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `payload_too_large` (413), `internal` (500). Internal failures are
//! logged with the operation, the id and the cause.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use antiplag_core::error::ErrorClass;
use antiplag_core::{AnalysisRecord, DocumentId, Error};

use crate::analysis::AnalysisEngine;
use crate::config::Config;
use crate::services::Services;
use crate::storage::{validate_upload, StorageEngine};

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Which services a server process exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeMode {
    Storage,
    Analysis,
    All,
}

/// State for the storage routes.
#[derive(Clone)]
pub struct StorageState {
    pub engine: Arc<StorageEngine>,
    pub accepted_extension: String,
    pub max_upload_bytes: usize,
}

/// State for the analysis routes.
#[derive(Clone)]
pub struct AnalysisState {
    pub engine: Arc<AnalysisEngine>,
    pub wordcloud_dir: PathBuf,
}

/// Starts the HTTP server for `mode` on `[server].bind`.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config, mode: ServeMode) -> anyhow::Result<()> {
    let services = Services::build(config).await?;
    let app = router(config, &services, mode);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, ?mode, "server listening");
    println!("antiplag {:?} server listening on http://{}", mode, config.server.bind);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Router for `mode`, with `/health` and CORS applied once at the top.
pub fn router(config: &Config, services: &Services, mode: ServeMode) -> Router {
    let storage = || {
        storage_router(StorageState {
            engine: services.storage.clone(),
            accepted_extension: config.storage.accepted_extension.clone(),
            max_upload_bytes: config.storage.max_upload_bytes,
        })
    };
    let analysis = || {
        analysis_router(AnalysisState {
            engine: services.analysis.clone(),
            wordcloud_dir: services.analysis.wordclouds().dir().to_path_buf(),
        })
    };

    let app = match mode {
        ServeMode::Storage => storage(),
        ServeMode::Analysis => analysis(),
        ServeMode::All => storage().merge(analysis()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    app.route("/health", get(handle_health)).layer(cors)
}

pub fn storage_router(state: StorageState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route(
            "/files/upload",
            post(handle_upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/files/{id}", get(handle_get_file))
        .route("/files/plagiarism/{id}", get(handle_plagiarism))
        .with_state(state)
}

pub fn analysis_router(state: AnalysisState) -> Router {
    Router::new()
        .route("/analysis/{id}", get(handle_analysis))
        .route("/analysis/wordcloud/{filename}", get(handle_wordcloud))
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
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
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
    }
}

/// Maps an engine error to a response. Internal failures are logged here,
/// once, with the operation and id that hit them.
fn engine_error(operation: &str, id: Option<DocumentId>, err: Error) -> AppError {
    match err.class() {
        ErrorClass::NotFound => not_found(err.to_string()),
        ErrorClass::InvalidInput => bad_request(err.to_string()),
        ErrorClass::Internal => {
            error!(operation, file_id = ?id, error = %err, "request failed");
            internal(err.to_string())
        }
    }
}

fn parse_id(raw: &str) -> Result<DocumentId, AppError> {
    raw.trim()
        .parse::<DocumentId>()
        .map_err(|_| bad_request(format!("invalid file id: '{}'", raw)))
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

// ============ POST /files/upload ============

#[derive(Serialize)]
struct UploadResponse {
    id: DocumentId,
}

/// Handler for `POST /files/upload`.
///
/// Reads the multipart field `file`, checks the upload policy, and stores
/// the content. Other fields are ignored.
async fn handle_upload(
    State(state): State<StorageState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let content = field.bytes().await.map_err(multipart_error)?;
        upload = Some((name, content.to_vec()));
        break;
    }

    let (name, content) = upload.ok_or_else(|| bad_request("missing multipart field 'file'"))?;
    if content.len() > state.max_upload_bytes {
        return Err(AppError {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            code: "payload_too_large".to_string(),
            message: format!("file exceeds {} bytes", state.max_upload_bytes),
        });
    }
    validate_upload(&name, &content, &state.accepted_extension)
        .map_err(|e| engine_error("upload", None, e))?;

    let outcome = state
        .engine
        .store(&content, &name)
        .await
        .map_err(|e| engine_error("upload", None, e))?;

    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(UploadResponse {
            id: outcome.record.id,
        }),
    ))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> AppError {
    let status = err.status();
    let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
        "payload_too_large"
    } else {
        "bad_request"
    };
    AppError {
        status,
        code: code.to_string(),
        message: err.body_text(),
    }
}

// ============ GET /files/{id} ============

/// Handler for `GET /files/{id}`: the stored bytes as an attachment named
/// after the original upload.
async fn handle_get_file(
    State(state): State<StorageState>,
    Path(raw_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_id(&raw_id)?;
    let file = state
        .engine
        .fetch(id)
        .await
        .map_err(|e| engine_error("get file", Some(id), e))?;

    let disposition = content_disposition(&file.record.name);
    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.content,
    )
        .into_response())
}

fn content_disposition(name: &str) -> HeaderValue {
    let quoted: String = name
        .chars()
        .map(|c| if c == '"' || c == '\\' { '_' } else { c })
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{}\"", quoted))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

// ============ GET /files/plagiarism/{id} ============

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlagiarismResponse {
    plagiarism_file_id: Option<DocumentId>,
}

async fn handle_plagiarism(
    State(state): State<StorageState>,
    Path(raw_id): Path<String>,
) -> Result<Json<PlagiarismResponse>, AppError> {
    let id = parse_id(&raw_id)?;
    let duplicate = state
        .engine
        .find_duplicate(id)
        .await
        .map_err(|e| engine_error("duplicate query", Some(id), e))?;

    Ok(Json(PlagiarismResponse {
        plagiarism_file_id: duplicate.map(|r| r.id),
    }))
}

// ============ GET /analysis/{id} ============

async fn handle_analysis(
    State(state): State<AnalysisState>,
    Path(raw_id): Path<String>,
) -> Result<Json<AnalysisRecord>, AppError> {
    let id = parse_id(&raw_id)?;
    let record = state
        .engine
        .analyze(id)
        .await
        .map_err(|e| engine_error("analyze", Some(id), e))?;
    Ok(Json(record))
}

// ============ GET /analysis/wordcloud/{filename} ============

/// Handler for `GET /analysis/wordcloud/{filename}`.
///
/// Only bare file names inside the artifact directory are served.
async fn handle_wordcloud(
    State(state): State<AnalysisState>,
    Path(filename): Path<String>,
) -> Result<Response, AppError> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return Err(bad_request(format!("invalid word cloud name: '{}'", filename)));
    }

    let path = state.wordcloud_dir.join(&filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok((
            [(header::CONTENT_TYPE, HeaderValue::from_static("image/png"))],
            bytes,
        )
            .into_response()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(not_found(format!("word cloud not found: {}", filename)))
        }
        Err(e) => {
            error!(path = %path.display(), error = %e, "reading word cloud failed");
            Err(internal(format!("reading word cloud: {}", e)))
        }
    }
}
