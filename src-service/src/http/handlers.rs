//! HTTP request handlers.
//!
//! Response bodies and error shapes mirror the API the frontend already
//! speaks: JSON everywhere, errors as `{"message": "..."}`.

use std::io;
use std::path::Path;

use axum::body::Body;
use axum::extract::{Path as PathParam, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use picast_common::api::{
    ApiMessage, HealthResponse, LoginRequest, LoginResponse, RecordingControl, RecordingList,
};
use picast_common::security::validation::validate_fps;
use picast_common::{CameraInfo, RecorderStatus};
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};

use super::{auth, multipart, AppState};
use crate::{camera, recordings};

/// Transcode frame rate when a stop request does not name one.
const DEFAULT_TRANSCODE_FPS: u32 = 60;

/// Read size for streaming recording downloads from disk.
const DOWNLOAD_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Deserialize)]
pub struct TokenParam {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StreamParams {
    fps: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StopParams {
    fps: Option<String>,
    token: Option<String>,
}

/// Liveness probe; the one route outside the token gate besides login.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "online".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Exchange credentials for a session token.
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Response {
    let accepted = auth::verify_credentials(
        &state.config.username,
        state.config.password.as_deref(),
        &request.username,
        &request.password,
    );

    if accepted {
        info!(username = %request.username, "login succeeded");
        let token = state.tokens.issue().await;
        Json(LoginResponse { token }).into_response()
    } else {
        warn!(username = %request.username, "login failed");
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiMessage::new("Invalid credentials")),
        )
            .into_response()
    }
}

/// Live MJPEG stream as `multipart/x-mixed-replace`.
pub async fn stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<StreamParams>,
) -> Response {
    if let Err(rejection) = require_token(&state, &headers, params.token.as_deref()).await {
        return rejection;
    }

    let fps = fps_or_default(params.fps.as_deref(), state.config.camera.framerate);
    if let Err(err) = validate_fps(fps) {
        return (StatusCode::BAD_REQUEST, Json(ApiMessage::new(err.to_string())))
            .into_response();
    }

    let (tx, rx) = mpsc::channel(camera::PART_CHANNEL_CAPACITY);
    tokio::spawn(camera::run_session(
        state.recorder.clone(),
        state.config.camera_command.clone(),
        state.config.camera,
        fps,
        tx,
    ));

    (
        multipart::STREAM_HEADERS,
        Body::from_stream(ReceiverStream::new(rx)),
    )
        .into_response()
}

/// Capture geometry plus recording status.
pub async fn camera_info(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<TokenParam>,
) -> Response {
    if let Err(rejection) = require_token(&state, &headers, params.token.as_deref()).await {
        return rejection;
    }

    let snapshot = state.recorder.snapshot().await;
    Json(CameraInfo {
        resolution: [state.config.camera.width, state.config.camera.height],
        fps: state.config.camera.framerate,
        recording: snapshot.status == RecorderStatus::Active,
        current_file: snapshot.current_file.as_deref().and_then(basename),
    })
    .into_response()
}

pub async fn start_recording(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<TokenParam>,
) -> Response {
    if let Err(rejection) = require_token(&state, &headers, params.token.as_deref()).await {
        return rejection;
    }

    info!("StartRecording");
    let path = state.recorder.start().await;
    Json(RecordingControl::started(
        basename(&path).unwrap_or_default(),
    ))
    .into_response()
}

pub async fn stop_recording(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<StopParams>,
) -> Response {
    if let Err(rejection) = require_token(&state, &headers, params.token.as_deref()).await {
        return rejection;
    }

    let fps = fps_or_default(params.fps.as_deref(), DEFAULT_TRANSCODE_FPS);
    if let Err(err) = validate_fps(fps) {
        return (StatusCode::BAD_REQUEST, Json(ApiMessage::new(err.to_string())))
            .into_response();
    }

    info!(fps, "StopRecording");
    match state.recorder.stop(fps).await {
        Some(path) => Json(RecordingControl::stopped(
            basename(&path).unwrap_or_default(),
        ))
        .into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(ApiMessage::new("No active recording")),
        )
            .into_response(),
    }
}

/// Transcoded recordings, newest first.
pub async fn list_recordings(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<TokenParam>,
) -> Response {
    if let Err(rejection) = require_token(&state, &headers, params.token.as_deref()).await {
        return rejection;
    }

    match recordings::list_recordings(&state.config.recordings_dir).await {
        Ok(entries) => Json(RecordingList {
            recordings: entries,
        })
        .into_response(),
        Err(err) => {
            error!("failed to list recordings: {err}");
            read_failed()
        }
    }
}

/// Download one recording by exact filename.
pub async fn download_recording(
    State(state): State<AppState>,
    PathParam(filename): PathParam<String>,
    headers: HeaderMap,
    Query(params): Query<TokenParam>,
) -> Response {
    if let Err(rejection) = require_token(&state, &headers, params.token.as_deref()).await {
        return rejection;
    }

    // Invalid names get the same answer as missing files.
    let path = match recordings::resolve_download(&state.config.recordings_dir, &filename) {
        Some(path) => path,
        None => return file_not_found(),
    };

    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return file_not_found(),
        Err(err) => {
            error!(filename = %filename, "failed to open recording: {err}");
            return read_failed();
        }
    };

    let size = match file.metadata().await {
        Ok(metadata) => metadata.len(),
        Err(err) => {
            error!(filename = %filename, "failed to stat recording: {err}");
            return read_failed();
        }
    };

    info!(filename = %filename, size, "serving recording download");
    (
        [
            (
                header::CONTENT_TYPE,
                recordings::download_content_type(&filename).to_string(),
            ),
            (header::CONTENT_LENGTH, size.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        file_body(file),
    )
        .into_response()
}

/// Body that streams a file in fixed-size chunks. The reader task ends at
/// end of file or once the client stops pulling (channel closed).
fn file_body(mut file: File) -> Body {
    let (tx, rx) = mpsc::channel::<Result<Bytes, io::Error>>(4);
    tokio::spawn(async move {
        let mut buf = vec![0u8; DOWNLOAD_CHUNK_SIZE];
        loop {
            match file.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    let chunk = Bytes::copy_from_slice(&buf[..n]);
                    if tx.send(Ok(chunk)).await.is_err() {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx.send(Err(err)).await;
                    break;
                }
            }
        }
    });
    Body::from_stream(ReceiverStream::new(rx))
}

fn file_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiMessage::new("File not found")),
    )
        .into_response()
}

fn read_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiMessage::new("Error reading recordings")),
    )
        .into_response()
}

/// Gate a protected route; `Err` carries the ready-to-send rejection.
async fn require_token(
    state: &AppState,
    headers: &HeaderMap,
    query_token: Option<&str>,
) -> Result<(), Response> {
    let token = match presented_token(headers, query_token) {
        Some(token) => token,
        None => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ApiMessage::new("Token required")),
            )
                .into_response())
        }
    };

    if state.tokens.validate(token).await {
        Ok(())
    } else {
        warn!("rejected invalid or expired token");
        Err((
            StatusCode::FORBIDDEN,
            Json(ApiMessage::new("Invalid token")),
        )
            .into_response())
    }
}

/// Token from the `Authorization: Bearer` header or the `token` query
/// parameter. The query form exists because stream URLs end up in `<img>`
/// tags, which cannot set headers.
fn presented_token<'a>(headers: &'a HeaderMap, query_token: Option<&'a str>) -> Option<&'a str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .or(query_token)
}

/// Parse an fps query value the permissive way the API always has: absent,
/// unparseable, or zero select the default. Range checking happens
/// separately so oversized values still get a 400.
fn fps_or_default(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|raw| raw.parse::<u32>().ok())
        .filter(|fps| *fps != 0)
        .unwrap_or(default)
}

fn basename(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}
