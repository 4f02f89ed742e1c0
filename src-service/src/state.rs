//! Recording state management.
//!
//! One [`Recorder`] lives for the life of the service and owns the full
//! recording lifecycle: naming the output file, lazily opening it when the
//! first capture bytes arrive, appending the raw MJPEG tee, and handing the
//! finished file to the transcoder on stop.

use std::path::PathBuf;

use chrono::Utc;
use picast_common::RecorderStatus;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::transcode;

/// Point-in-time view of the recorder for status reporting.
#[derive(Debug, Clone)]
pub struct RecorderSnapshot {
    pub status: RecorderStatus,
    pub current_file: Option<PathBuf>,
}

struct RecorderState {
    status: RecorderStatus,
    /// Target file of the active recording, set at start even though the
    /// file itself is created lazily.
    path: Option<PathBuf>,
    /// Open handle, present only once capture bytes have arrived.
    file: Option<File>,
}

/// Hands a finished raw recording to the transcoder.
type TranscodeLauncher = Box<dyn Fn(PathBuf, u32) + Send + Sync>;

/// Recording lifecycle shared across HTTP handlers and stream sessions.
///
/// A single async mutex serializes start, stop, and every appended chunk,
/// so a stop never interleaves with a half-written chunk and the file is
/// closed before the transcoder sees it.
pub struct Recorder {
    dir: PathBuf,
    /// Frame rate assumed when a restart implicitly finalizes the previous
    /// recording and no explicit rate was given.
    default_fps: u32,
    launcher: TranscodeLauncher,
    state: Mutex<RecorderState>,
}

impl Recorder {
    pub fn new(dir: PathBuf, default_fps: u32) -> Self {
        Self::with_launcher(dir, default_fps, Box::new(transcode::spawn))
    }

    /// Construct with a custom transcode launcher. The seam exists so tests
    /// can observe job creation without an encoder binary.
    fn with_launcher(dir: PathBuf, default_fps: u32, launcher: TranscodeLauncher) -> Self {
        Self {
            dir,
            default_fps,
            launcher,
            state: Mutex::new(RecorderState {
                status: RecorderStatus::Idle,
                path: None,
                file: None,
            }),
        }
    }

    /// Begin a new recording and return its target path.
    ///
    /// Starting while a recording is active finalizes the current one first,
    /// exactly as an explicit stop at the default frame rate would.
    pub async fn start(&self) -> PathBuf {
        let mut state = self.state.lock().await;

        if state.status == RecorderStatus::Active {
            warn!("recording already active, finalizing it before restart");
            self.finish(&mut state, self.default_fps).await;
        }

        let filename = format!("recording_{}.mjpeg", Utc::now().timestamp_millis());
        let path = self.dir.join(filename);

        state.status = RecorderStatus::Active;
        state.path = Some(path.clone());
        state.file = None;

        info!(path = %path.display(), "recording started");
        path
    }

    /// Stop the active recording and return its path.
    ///
    /// Returns `None` when no recording is active. When the recording
    /// produced a file on disk, transcoding to MP4 at `fps` is enqueued in
    /// the background; a recording stopped before any capture bytes arrived
    /// has no file and nothing to transcode.
    pub async fn stop(&self, fps: u32) -> Option<PathBuf> {
        let mut state = self.state.lock().await;
        self.finish(&mut state, fps).await
    }

    /// Append raw capture bytes to the active recording.
    ///
    /// Opens the output file in append mode on first use, so a recording
    /// with no viewer session produces no empty file and a session that
    /// reconnects continues the same file.
    pub async fn append(&self, chunk: &[u8]) -> std::io::Result<()> {
        let mut state = self.state.lock().await;

        if state.status != RecorderStatus::Active {
            return Ok(());
        }

        if state.file.is_none() {
            let path = match &state.path {
                Some(path) => path.clone(),
                None => return Ok(()),
            };
            let file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(&path)
                .await?;
            info!(path = %path.display(), "recording file opened");
            state.file = Some(file);
        }

        if let Some(file) = state.file.as_mut() {
            file.write_all(chunk).await?;
        }
        Ok(())
    }

    /// Close the open file handle without ending the recording.
    ///
    /// Called when a stream session disconnects; the recording stays active
    /// and the next session reopens the same file in append mode.
    pub async fn close_writer(&self) {
        let mut state = self.state.lock().await;
        if let Some(mut file) = state.file.take() {
            if let Err(err) = file.flush().await {
                warn!("failed to flush recording file: {err}");
            }
            info!("recording file closed, recording still active");
        }
    }

    pub async fn snapshot(&self) -> RecorderSnapshot {
        let state = self.state.lock().await;
        RecorderSnapshot {
            status: state.status,
            current_file: state.path.clone(),
        }
    }

    async fn finish(&self, state: &mut RecorderState, fps: u32) -> Option<PathBuf> {
        if state.status != RecorderStatus::Active {
            return None;
        }

        state.status = RecorderStatus::Idle;
        let path = state.path.take()?;

        if let Some(mut file) = state.file.take() {
            if let Err(err) = file.flush().await {
                warn!("failed to flush recording file: {err}");
            }
        }

        // The file exists only if capture bytes arrived at some point, in
        // this session or an earlier one.
        match tokio::fs::try_exists(&path).await {
            Ok(true) => {
                info!(path = %path.display(), fps, "recording stopped, transcoding");
                (self.launcher)(path.clone(), fps);
            }
            Ok(false) => {
                info!(path = %path.display(), "recording stopped before any data arrived");
            }
            Err(err) => {
                warn!(path = %path.display(), "could not check recording file: {err}");
            }
        }

        Some(path)
    }
}
