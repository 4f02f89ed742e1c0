//! Raw recording to MP4 conversion using FFmpeg via ffmpeg-sidecar.
//!
//! Recordings land on disk as raw MJPEG. FFmpeg turns them into H.264 MP4
//! in the background after a stop; the service never blocks on it. There is
//! no watchdog on the encoder, a hung FFmpeg holds its task until the
//! process exits.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use ffmpeg_sidecar::command::FfmpegCommand;
use tracing::{error, info, warn};

/// Result of one completed encoder run.
#[derive(Debug, PartialEq, Eq)]
pub enum TranscodeOutcome {
    /// MP4 written; the raw source was removed.
    Completed { output: PathBuf },
    /// FFmpeg exited nonzero; the raw source is retained for inspection.
    Failed { code: Option<i32> },
}

/// Resolve the FFmpeg binary.
///
/// The system FFmpeg from PATH is expected; it ships as a package
/// dependency on the target platform.
fn resolve_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn new_ffmpeg_command() -> FfmpegCommand {
    FfmpegCommand::new_with_path(resolve_ffmpeg_path())
}

/// Ensure FFmpeg is available. Called once at service startup.
///
/// Falls back to runtime auto-download when no system FFmpeg responds
/// (development environments may not have the package installed).
pub fn ensure_ffmpeg_blocking() -> Result<(), String> {
    let ffmpeg = resolve_ffmpeg_path();

    match std::process::Command::new(&ffmpeg)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) if status.success() => Ok(()),
        Ok(status) => Err(format!(
            "FFmpeg binary at {} exited with status: {}",
            ffmpeg.display(),
            status
        )),
        Err(err) => {
            warn!("FFmpeg not found at {}: {err}", ffmpeg.display());
            info!("attempting FFmpeg auto-download");
            ffmpeg_sidecar::download::auto_download()
                .map_err(|e| format!("FFmpeg not found and auto-download failed: {}", e))
        }
    }
}

/// Output path for a raw recording: same stem, `.mp4` extension.
fn mp4_path(source: &Path) -> PathBuf {
    source.with_extension("mp4")
}

/// Encoder argument vector for a raw MJPEG source.
///
/// `image2pipe` reads the concatenated JPEGs directly; `-framerate` on the
/// input and `-r` on the output pin both sides to the capture rate so the
/// MP4 plays at real speed.
fn encoder_args(source: &Path, output: &Path, fps: u32) -> Vec<String> {
    let fps = fps.to_string();
    vec![
        "-y".into(),
        "-f".into(),
        "image2pipe".into(),
        "-framerate".into(),
        fps.clone(),
        "-i".into(),
        source.to_string_lossy().into_owned(),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "ultrafast".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-crf".into(),
        "23".into(),
        "-r".into(),
        fps,
        output.to_string_lossy().into_owned(),
    ]
}

/// Convert a raw recording to MP4 at the given frame rate.
///
/// Blocks until FFmpeg exits; run it on a blocking task. On success the raw
/// source is deleted, on encoder failure it is kept.
pub fn transcode_recording(source: &Path, fps: u32) -> Result<TranscodeOutcome, String> {
    let output = mp4_path(source);
    info!(
        source = %source.display(),
        output = %output.display(),
        fps,
        "transcoding recording"
    );

    let mut command = new_ffmpeg_command();
    command.args(encoder_args(source, &output, fps));

    let inner = command.as_inner_mut();
    inner.stdout(Stdio::null());
    inner.stderr(Stdio::piped());

    run_encoder(inner, source, output)
}

/// Run a configured encoder process and apply the source retention policy.
fn run_encoder(
    command: &mut std::process::Command,
    source: &Path,
    output: PathBuf,
) -> Result<TranscodeOutcome, String> {
    let mut child = command
        .spawn()
        .map_err(|e| format!("failed to start FFmpeg: {}", e))?;

    // Drain stderr before waiting so the encoder cannot block on a full pipe.
    let stderr_output = if let Some(mut stderr) = child.stderr.take() {
        use std::io::Read;
        let mut buf = String::new();
        let _ = stderr.read_to_string(&mut buf);
        buf
    } else {
        String::new()
    };

    let status = child
        .wait()
        .map_err(|e| format!("failed to wait for FFmpeg: {}", e))?;

    if status.success() {
        if let Err(err) = std::fs::remove_file(source) {
            warn!(source = %source.display(), "failed to delete raw recording: {err}");
        }
        Ok(TranscodeOutcome::Completed { output })
    } else {
        if let Some(line) = stderr_output.lines().last() {
            error!("FFmpeg: {line}");
        }
        Ok(TranscodeOutcome::Failed {
            code: status.code(),
        })
    }
}

/// Transcode `source` in the background.
pub fn spawn(source: PathBuf, fps: u32) {
    tokio::spawn(async move {
        let result =
            tokio::task::spawn_blocking(move || transcode_recording(&source, fps)).await;
        match result {
            Ok(Ok(TranscodeOutcome::Completed { output })) => {
                info!(output = %output.display(), "transcode finished");
            }
            Ok(Ok(TranscodeOutcome::Failed { code })) => {
                error!(?code, "FFmpeg exited with an error, raw recording retained");
            }
            Ok(Err(err)) => error!("transcode did not run: {err}"),
            Err(err) => error!("transcode task failed: {err}"),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test the exact encoder command line; FFmpeg's CLI is an external
    /// contract.
    #[test]
    fn encoder_args_match_ffmpeg_cli() {
        let source = Path::new("/tmp/recording_1700000000000.mjpeg");
        let output = mp4_path(source);
        let args = encoder_args(source, &output, 30);
        assert_eq!(
            args,
            vec![
                "-y",
                "-f",
                "image2pipe",
                "-framerate",
                "30",
                "-i",
                "/tmp/recording_1700000000000.mjpeg",
                "-c:v",
                "libx264",
                "-preset",
                "ultrafast",
                "-pix_fmt",
                "yuv420p",
                "-crf",
                "23",
                "-r",
                "30",
                "/tmp/recording_1700000000000.mp4",
            ]
        );
    }

    #[test]
    fn mp4_path_swaps_extension() {
        assert_eq!(
            mp4_path(Path::new("/videos/recording_42.mjpeg")),
            PathBuf::from("/videos/recording_42.mp4")
        );
    }

    /// Test that a successful encoder run deletes the raw source.
    #[test]
    fn success_removes_raw_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("recording_1.mjpeg");
        std::fs::write(&source, b"raw").expect("write source");

        let mut command = std::process::Command::new("sh");
        command.args(["-c", "exit 0"]);

        let outcome = run_encoder(&mut command, &source, mp4_path(&source)).expect("run");
        assert_eq!(
            outcome,
            TranscodeOutcome::Completed {
                output: mp4_path(&source)
            }
        );
        assert!(!source.exists());
    }

    /// Test that an encoder failure keeps the raw source and reports the
    /// exit code.
    #[test]
    fn failure_retains_raw_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("recording_2.mjpeg");
        std::fs::write(&source, b"raw").expect("write source");

        let mut command = std::process::Command::new("sh");
        command.args(["-c", "exit 3"]);

        let outcome = run_encoder(&mut command, &source, mp4_path(&source)).expect("run");
        assert_eq!(outcome, TranscodeOutcome::Failed { code: Some(3) });
        assert!(source.exists());
    }

    /// Test that a missing encoder binary is an error, not an outcome.
    #[test]
    fn missing_encoder_is_an_error() {
        let source = Path::new("/tmp/recording_3.mjpeg");
        let mut command = std::process::Command::new("picast-no-such-encoder");
        assert!(run_encoder(&mut command, source, mp4_path(source)).is_err());
    }
}
