//! HTTP API payloads exchanged between the service and its clients.

use serde::{Deserialize, Serialize};

use crate::types::RecordingEntry;

/// Generic message body used for errors and simple confirmations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    /// Create a message payload.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Opaque session token, valid 24 hours
    pub token: String,
}

/// Health endpoint response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"online"` when the service can answer
    pub status: String,
    /// RFC 3339 timestamp of the probe
    pub timestamp: String,
}

/// Response to a start/stop recording request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingControl {
    pub message: String,
    /// Basename of the recording file involved
    pub filename: String,
}

impl RecordingControl {
    /// Confirmation that a recording was started.
    pub fn started(filename: impl Into<String>) -> Self {
        Self {
            message: "Recording started".to_string(),
            filename: filename.into(),
        }
    }

    /// Confirmation that a recording was stopped.
    pub fn stopped(filename: impl Into<String>) -> Self {
        Self {
            message: "Recording stopped".to_string(),
            filename: filename.into(),
        }
    }
}

/// Recording catalog listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingList {
    pub recordings: Vec<RecordingEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_shape() {
        let json = serde_json::to_string(&ApiMessage::new("No active recording")).unwrap();
        assert_eq!(json, "{\"message\":\"No active recording\"}");
    }

    #[test]
    fn test_recording_control_shapes() {
        let started = RecordingControl::started("recording_17.mjpeg");
        assert_eq!(started.message, "Recording started");
        assert_eq!(started.filename, "recording_17.mjpeg");

        let stopped = RecordingControl::stopped("recording_17.mjpeg");
        assert_eq!(stopped.message, "Recording stopped");
    }

    #[test]
    fn test_login_roundtrip() {
        let req: LoginRequest =
            serde_json::from_str("{\"username\":\"admin\",\"password\":\"pw\"}").unwrap();
        assert_eq!(req.username, "admin");
        assert_eq!(req.password, "pw");
    }
}
