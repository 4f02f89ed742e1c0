//! HTTP API server.
//!
//! All routes live under `/api`. Everything except `health` and `login`
//! sits behind the session token gate in [`auth`].

pub mod auth;
pub mod handlers;
pub mod multipart;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::config::ServiceConfig;
use crate::state::Recorder;
use auth::SessionTokens;

/// Shared state passed to all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub recorder: Arc<Recorder>,
    pub tokens: Arc<SessionTokens>,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        let default_fps = config.camera.framerate;
        let recordings_dir = config.recordings_dir.clone();
        Self {
            config: Arc::new(config),
            recorder: Arc::new(Recorder::new(recordings_dir, default_fps)),
            tokens: Arc::new(SessionTokens::new()),
        }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/login", post(handlers::login))
        .route("/api/stream", get(handlers::stream))
        .route("/api/camera/info", get(handlers::camera_info))
        .route("/api/camera/start-recording", post(handlers::start_recording))
        .route("/api/camera/stop-recording", post(handlers::stop_recording))
        .route("/api/recordings", get(handlers::list_recordings))
        .route("/api/recordings/:filename", get(handlers::download_recording))
        .with_state(state)
}
