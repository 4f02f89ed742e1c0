//! Live camera streaming.
//!
//! A stream session owns one capture process. Its stdout is read in chunks;
//! every chunk is teed verbatim into the recorder, then scanned for complete
//! JPEG frames, which leave as multipart parts toward the client. The
//! session ends when the capture stream ends or the client stops reading,
//! and either way it stops the capture process and releases the recorder's
//! file handle.

pub mod frames;
pub mod process;

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use picast_common::CameraConfig;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::http::multipart;
use crate::state::Recorder;
use frames::FrameExtractor;

/// Encoded parts buffered toward a slow client before reading stalls.
///
/// Beyond this the pump stops draining the capture pipe, which in turn
/// throttles the capture process. That is intentional backpressure, not a
/// frame-drop policy.
pub const PART_CHANNEL_CAPACITY: usize = 16;

/// Read buffer size for the capture pipe.
const READ_BUFFER_BYTES: usize = 16 * 1024;

/// Channel carrying encoded multipart parts to the HTTP response body.
pub type PartSender = mpsc::Sender<Result<Bytes, io::Error>>;

#[derive(Debug, PartialEq, Eq)]
enum PumpEnd {
    /// The capture stream reached end of file.
    CaptureEof,
    /// The client stopped reading.
    ClientGone,
}

/// Run one stream session to completion.
///
/// Spawns the capture process at the requested frame rate and pumps its
/// output until either side goes away. Cleanup always runs: the capture
/// process is stopped and the recorder's file handle is closed, while the
/// recording itself stays active for a later session to continue.
pub async fn run_session(
    recorder: Arc<Recorder>,
    command: String,
    config: CameraConfig,
    fps: u32,
    tx: PartSender,
) {
    info!(fps, "stream client connected");

    let mut capture = match process::CaptureProcess::spawn(&command, &config, fps) {
        Ok(capture) => capture,
        Err(err) => {
            error!("failed to start capture process: {err}");
            let _ = tx.send(Err(err)).await;
            return;
        }
    };

    let stdout = match capture.take_stdout() {
        Some(stdout) => stdout,
        None => {
            error!("capture process has no stdout pipe");
            capture.shutdown().await;
            return;
        }
    };

    let end = pump_stream(stdout, &recorder, &tx).await;

    capture.shutdown().await;
    recorder.close_writer().await;

    match end {
        Ok(PumpEnd::ClientGone) => info!("stream client disconnected"),
        Ok(PumpEnd::CaptureEof) => warn!("capture stream ended"),
        Err(err) => {
            error!("error reading capture stream: {err}");
            let _ = tx.send(Err(err)).await;
        }
    }
}

/// Pump capture bytes until EOF, a read error, or client disconnect.
///
/// The raw chunk is appended to the recorder before frame extraction, so
/// the recording is the unmodified capture stream even when frame
/// extraction resynchronizes or drops data.
async fn pump_stream<R>(mut reader: R, recorder: &Recorder, tx: &PartSender) -> io::Result<PumpEnd>
where
    R: AsyncRead + Unpin,
{
    let mut extractor = FrameExtractor::new();
    let mut buf = vec![0u8; READ_BUFFER_BYTES];

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(PumpEnd::CaptureEof);
        }
        let chunk = &buf[..n];

        if let Err(err) = recorder.append(chunk).await {
            warn!("failed to append to recording: {err}");
        }

        for frame in extractor.feed(chunk) {
            if tx.send(Ok(multipart::encode_part(&frame))).await.is_err() {
                return Ok(PumpEnd::ClientGone);
            }
        }
    }
}
