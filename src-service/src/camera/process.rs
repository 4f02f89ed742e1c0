//! Capture process management.
//!
//! Each stream session runs its own capture process (`rpicam-vid` by
//! default) writing MJPEG to stdout. The camera hardware admits one client
//! at a time; a second concurrent capture fails inside the capture binary
//! and surfaces here as an immediate end of stream.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use picast_common::CameraConfig;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, warn};

/// How long a capture process gets to exit after SIGINT before SIGKILL.
const INTERRUPT_GRACE: Duration = Duration::from_secs(2);

/// Build the capture argument vector for the given geometry and rate.
///
/// `-t 0` runs until signalled, `--inline` repeats JPEG headers on every
/// frame so a stream joined mid-capture still decodes, and `-o -` selects
/// stdout.
pub fn capture_args(config: &CameraConfig, fps: u32) -> Vec<String> {
    vec![
        "-t".into(),
        "0".into(),
        "--width".into(),
        config.width.to_string(),
        "--height".into(),
        config.height.to_string(),
        "--framerate".into(),
        fps.to_string(),
        "--codec".into(),
        "mjpeg".into(),
        "--inline".into(),
        "-o".into(),
        "-".into(),
    ]
}

/// A running capture process with its stdout pipe.
pub struct CaptureProcess {
    child: Child,
}

impl CaptureProcess {
    /// Spawn `command` with MJPEG capture arguments.
    ///
    /// Stdout is piped for the caller to read; stderr is piped and drained
    /// to the debug log so the capture binary never blocks on a full pipe.
    pub fn spawn(command: &str, config: &CameraConfig, fps: u32) -> io::Result<Self> {
        let mut child = Command::new(command)
            .args(capture_args(config, fps))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("capture: {line}");
                }
            });
        }

        debug!(
            command,
            width = config.width,
            height = config.height,
            fps,
            pid = child.id(),
            "capture process started"
        );

        Ok(Self { child })
    }

    /// Take ownership of the stdout pipe. Returns `None` after the first call.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Stop the process: SIGINT first so the camera pipeline flushes and
    /// releases the device, SIGKILL if it does not exit in time.
    pub async fn shutdown(&mut self) {
        if self.interrupt() {
            match tokio::time::timeout(INTERRUPT_GRACE, self.child.wait()).await {
                Ok(Ok(status)) => {
                    debug!(%status, "capture process exited");
                    return;
                }
                Ok(Err(err)) => warn!("failed to reap capture process: {err}"),
                Err(_) => warn!("capture process ignored SIGINT, killing"),
            }
        }

        if let Err(err) = self.child.kill().await {
            warn!("failed to kill capture process: {err}");
        }
    }

    #[cfg(unix)]
    fn interrupt(&self) -> bool {
        match self.child.id() {
            Some(pid) => unsafe { libc::kill(pid as libc::pid_t, libc::SIGINT) == 0 },
            None => false,
        }
    }

    #[cfg(not(unix))]
    fn interrupt(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test the exact capture command line; the capture binary's CLI is an
    /// external contract.
    #[test]
    fn capture_args_match_camera_cli() {
        let config = CameraConfig {
            width: 1536,
            height: 864,
            framerate: 60,
        };
        let args = capture_args(&config, 30);
        assert_eq!(
            args,
            vec![
                "-t", "0", "--width", "1536", "--height", "864", "--framerate", "30", "--codec",
                "mjpeg", "--inline", "-o", "-",
            ]
        );
    }

    /// Test that a missing capture binary reports an error at spawn time
    /// rather than an empty stream.
    #[tokio::test]
    async fn spawn_missing_binary_fails() {
        let config = CameraConfig::default();
        let result = CaptureProcess::spawn("picast-no-such-capture-binary", &config, 30);
        assert!(result.is_err());
    }

    /// Test that shutdown reaps a process that already exited on its own.
    #[tokio::test]
    async fn shutdown_reaps_exited_process() {
        let config = CameraConfig::default();
        let mut process =
            CaptureProcess::spawn("true", &config, 30).expect("spawn test process");
        let _ = process.take_stdout();
        process.shutdown().await;
    }
}
