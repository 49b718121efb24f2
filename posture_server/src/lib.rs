// THEORY:
// This crate is the web front door for the posture engine. It owns everything
// HTTP: staging uploaded workout videos, serving the compiled web client, and
// exposing the core evaluator to clients that already have a landmark trace.
// The engine itself stays pure; this layer translates requests into session
// calls and session output into JSON.
//
// Every failure is caught at the request boundary and surfaced as a status
// code with an `{error}` body. A bad request can never take the process down.

pub mod config;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State},
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use posture_vision::pipeline::{
    FrameReport, HistoryEntry, Landmark, LandmarkFrame, Mode, PostureSession, SessionConfig,
    SessionError,
};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub use config::ServerConfig;

const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;
/// Synthetic frame spacing for uploaded traces, matching a 30 fps capture.
const TRACE_FRAME_INTERVAL_MS: u64 = 33;

pub struct AppState {
    pub upload_dir: PathBuf,
    pub client_dir: PathBuf,
    pub session: SessionConfig,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            upload_dir: PathBuf::from(&config.upload_dir),
            client_dir: PathBuf::from(&config.client_dir),
            session: config.session.clone(),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/upload-video", post(upload_video))
        .route("/api/cleanup", delete(cleanup))
        .route("/api/analyze", post(analyze))
        .fallback(get(serve_client))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Request-boundary error: a status code plus the `{error}` JSON body the web
/// client expects.
pub struct ApiError {
    status: StatusCode,
    message: &'static str,
}

impl ApiError {
    fn bad_request(message: &'static str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }

    fn internal(message: &'static str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        log::error!("session error during trace analysis: {err}");
        ApiError::internal("Error analyzing landmark trace")
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Posture detection server is running",
    })
}

#[derive(Serialize)]
struct UploadedFile {
    originalname: String,
    mimetype: String,
    size: usize,
    path: String,
}

#[derive(Serialize)]
struct UploadResponse {
    message: &'static str,
    file: UploadedFile,
}

async fn upload_video(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|err| {
        log::warn!("malformed multipart upload: {err}");
        ApiError::bad_request("No video file uploaded")
    })? {
        if field.name() != Some("video") {
            continue;
        }

        let originalname = field.file_name().unwrap_or("upload.bin").to_string();
        let mimetype = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data: Bytes = field.bytes().await.map_err(|err| {
            log::error!("failed reading upload body: {err}");
            ApiError::internal("Error processing video upload")
        })?;

        let stored_path = state.upload_dir.join(staged_name(&originalname));
        stage_file(&state.upload_dir, &stored_path, &data)
            .await
            .map_err(|err| {
                log::error!("failed staging upload to {}: {err}", stored_path.display());
                ApiError::internal("Error processing video upload")
            })?;

        log::info!(
            "staged upload {originalname} ({} bytes) at {}",
            data.len(),
            stored_path.display()
        );
        return Ok(Json(UploadResponse {
            message: "Video uploaded successfully",
            file: UploadedFile {
                originalname,
                mimetype,
                size: data.len(),
                path: stored_path.display().to_string(),
            },
        }));
    }

    Err(ApiError::bad_request("No video file uploaded"))
}

async fn stage_file(dir: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(path, data).await
}

fn staged_name(originalname: &str) -> String {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    match Path::new(originalname).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("video-{now_ms}.{ext}"),
        None => format!("video-{now_ms}"),
    }
}

#[derive(Serialize)]
struct CleanupResponse {
    message: &'static str,
}

async fn cleanup(State(state): State<Arc<AppState>>) -> Result<Json<CleanupResponse>, ApiError> {
    let cleaned = Json(CleanupResponse {
        message: "Upload directory cleaned successfully",
    });

    let mut entries = match tokio::fs::read_dir(&state.upload_dir).await {
        Ok(entries) => entries,
        // Nothing staged yet counts as already clean.
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(cleaned),
        Err(err) => {
            log::error!("failed listing upload directory: {err}");
            return Err(ApiError::internal("Error cleaning upload directory"));
        }
    };

    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                if let Err(err) = tokio::fs::remove_file(entry.path()).await {
                    log::error!("failed removing {}: {err}", entry.path().display());
                    return Err(ApiError::internal("Error cleaning upload directory"));
                }
            }
            Ok(None) => break,
            Err(err) => {
                log::error!("failed walking upload directory: {err}");
                return Err(ApiError::internal("Error cleaning upload directory"));
            }
        }
    }

    Ok(cleaned)
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    mode: Mode,
    /// One entry per video frame; `null` marks frames with no detection.
    frames: Vec<Option<Vec<Landmark>>>,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    frames: Vec<FrameReport>,
    history: Vec<HistoryEntry>,
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let mut session = PostureSession::new(request.mode, state.session.clone());
    session.load_file()?;
    session.begin_analysis()?;

    let mut reports = Vec::with_capacity(request.frames.len());
    for (index, landmarks) in request.frames.into_iter().enumerate() {
        let frame = landmarks.and_then(LandmarkFrame::new);
        let now_ms = index as u64 * TRACE_FRAME_INTERVAL_MS;
        reports.push(session.process_frame(frame.as_ref(), now_ms)?);
    }
    session.finish_analysis()?;

    Ok(Json(AnalyzeResponse {
        frames: reports,
        history: session.history().iter().copied().collect(),
    }))
}

/// Serves the compiled web client, falling back to `index.html` so client-side
/// routes deep-link correctly.
async fn serve_client(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let relative = sanitize_path(uri.path());
    let file_path = if relative.is_empty() {
        state.client_dir.join("index.html")
    } else {
        state.client_dir.join(&relative)
    };

    match tokio::fs::read(&file_path).await {
        Ok(bytes) => {
            ([(header::CONTENT_TYPE, content_type_for(&file_path))], bytes).into_response()
        }
        Err(_) => match tokio::fs::read(state.client_dir.join("index.html")).await {
            Ok(bytes) => {
                ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], bytes).into_response()
            }
            Err(err) => {
                log::warn!("no client build at {}: {err}", state.client_dir.display());
                StatusCode::NOT_FOUND.into_response()
            }
        },
    }
}

fn sanitize_path(raw: &str) -> String {
    raw.split('/')
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .collect::<Vec<_>>()
        .join("/")
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "text/javascript",
        Some("css") => "text/css",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}
