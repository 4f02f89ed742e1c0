//! picast camera service.
//!
//! Streams a live MJPEG camera feed over HTTP, tees the raw stream to disk
//! while a recording is active, and transcodes finished recordings to MP4
//! in the background. Clients talk JSON over the `/api` routes.

mod camera;
mod config;
mod http;
mod recordings;
mod state;
mod transcode;

use std::future::IntoFuture;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    // Initialize logging with RUST_LOG env var support
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("picast service starting (pid: {})...", std::process::id());

    let config = config::ServiceConfig::from_env();

    // Initialize FFmpeg (download if needed)
    match transcode::ensure_ffmpeg_blocking() {
        Ok(()) => info!("FFmpeg ready"),
        Err(e) => {
            // Streaming and recording still work without it; transcodes
            // fail until FFmpeg is installed.
            warn!("FFmpeg initialization failed: {}", e);
        }
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    runtime.block_on(async {
        if let Err(e) = run(config).await {
            error!("Service error: {}", e);
            std::process::exit(1);
        }
    });

    info!("picast service stopped");
}

async fn run(config: config::ServiceConfig) -> std::io::Result<()> {
    tokio::fs::create_dir_all(&config.recordings_dir).await?;
    info!("Recordings directory: {}", config.recordings_dir.display());

    if config.password.is_none() {
        warn!("PICAST_PASSWORD is not set; login is disabled");
    }

    let state = http::AppState::new(config);
    let app = http::router(state.clone());

    let listener = tokio::net::TcpListener::bind(state.config.bind).await?;
    info!("Listening on http://{}", state.config.bind);

    // No connection draining on shutdown: stream responses are unbounded,
    // so waiting for them would wait forever.
    tokio::select! {
        result = axum::serve(listener, app).into_future() => result?,
        _ = shutdown_signal() => {}
    }

    // A recording left active by a vanished client is finalized at the
    // default capture rate.
    if let Some(path) = state.recorder.stop(state.config.camera.framerate).await {
        info!("Stopped active recording before shutdown: {}", path.display());
    }

    Ok(())
}

/// Resolves when a termination signal arrives.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        let mut sigint = signal(SignalKind::interrupt()).expect("install SIGINT handler");
        let mut sighup = signal(SignalKind::hangup()).expect("install SIGHUP handler");

        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM"),
            _ = sigint.recv() => info!("Received SIGINT"),
            _ = sighup.recv() => info!("Received SIGHUP"),
        }
    }

    #[cfg(not(unix))]
    {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C"),
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    }
}
