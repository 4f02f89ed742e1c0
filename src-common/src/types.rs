//! Shared types for camera streaming and recording.

use serde::{Deserialize, Serialize};

/// Capture configuration for the camera process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Capture width in pixels
    pub width: u32,
    /// Capture height in pixels
    pub height: u32,
    /// Default capture frame rate
    pub framerate: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: 1536,
            height: 864,
            framerate: 60,
        }
    }
}

/// Recorder state enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderStatus {
    /// Not recording, ready to start
    Idle,
    /// A recording file path is designated and the tee is armed
    Active,
}

/// Camera status reported by the info endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraInfo {
    /// Capture resolution as `[width, height]`
    pub resolution: [u32; 2],
    /// Default capture frame rate
    pub fps: u32,
    /// Whether a recording is currently active
    pub recording: bool,
    /// Basename of the file being recorded, or null when idle
    pub current_file: Option<String>,
}

/// One recording in the catalog listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingEntry {
    /// File basename (e.g. `recording_1737295200000.mp4`)
    pub filename: String,
    /// File size in bytes
    pub size: u64,
    /// File size in megabytes, two decimals
    pub size_mb: String,
    /// API path the file can be fetched from
    pub download_url: String,
}

impl RecordingEntry {
    /// Build an entry from a basename and its on-disk size.
    pub fn new(filename: String, size: u64) -> Self {
        let size_mb = format!("{:.2}", size as f64 / (1024.0 * 1024.0));
        let download_url = format!("/api/recordings/{}", filename);
        Self {
            filename,
            size,
            size_mb,
            download_url,
        }
    }

    /// Millisecond timestamp embedded in the filename, if present.
    ///
    /// Filenames follow `recording_<unixMillis>.<ext>`; listings sort
    /// newest-first on this value.
    pub fn timestamp_millis(&self) -> Option<u64> {
        let stem = self.filename.strip_prefix("recording_")?;
        let digits: String = stem.chars().take_while(|c| c.is_ascii_digit()).collect();
        digits.parse().ok()
    }
}
