//! HTTP client for communicating with picast-service.

use picast_common::api::{
    ApiMessage, HealthResponse, LoginRequest, LoginResponse, RecordingControl, RecordingList,
};
use picast_common::CameraInfo;
use reqwest::StatusCode;
use std::time::Duration;

use crate::exit_codes::ExitCode;

/// Error type for service client operations.
#[derive(Debug, Clone)]
pub enum ServiceError {
    /// Connection to service failed
    ConnectionFailed(String),
    /// Request rejected because no valid token was presented
    Unauthorized(String),
    /// Token was presented but rejected
    Forbidden(String),
    /// Requested resource does not exist
    NotFound(String),
    /// Service answered with an unexpected status
    RemoteError { status: u16, message: String },
    /// Failed to receive or decode a response
    ReceiveFailed(String),
    /// Service did not become ready in time
    Timeout,
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            ServiceError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ServiceError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ServiceError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ServiceError::RemoteError { status, message } => {
                write!(f, "Service error ({}): {}", status, message)
            }
            ServiceError::ReceiveFailed(msg) => write!(f, "Receive failed: {}", msg),
            ServiceError::Timeout => write!(f, "Service did not become ready in time"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    /// Convert to an appropriate exit code.
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            ServiceError::ConnectionFailed(_) | ServiceError::Timeout => {
                ExitCode::ServiceConnectionFailed
            }
            ServiceError::Unauthorized(_) | ServiceError::Forbidden(_) => ExitCode::Unauthorized,
            ServiceError::NotFound(_) => ExitCode::NotFound,
            ServiceError::RemoteError { .. } | ServiceError::ReceiveFailed(_) => {
                ExitCode::GeneralError
            }
        }
    }
}

/// Client for the picast service HTTP API.
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ServiceClient {
    /// Create a new service client for the given base URL.
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Probe the health endpoint.
    pub async fn health(&self) -> Result<HealthResponse, ServiceError> {
        let response = self.get("/api/health").send().await.map_err(send_error)?;
        decode(response).await
    }

    /// Exchange credentials for a session token.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginResponse, ServiceError> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self
            .post("/api/login")
            .json(&body)
            .send()
            .await
            .map_err(send_error)?;
        decode(response).await
    }

    /// Fetch camera configuration and recorder state.
    pub async fn camera_info(&self) -> Result<CameraInfo, ServiceError> {
        let response = self
            .get("/api/camera/info")
            .send()
            .await
            .map_err(send_error)?;
        decode(response).await
    }

    /// Start a recording.
    pub async fn start_recording(&self) -> Result<RecordingControl, ServiceError> {
        let response = self
            .post("/api/camera/start-recording")
            .send()
            .await
            .map_err(send_error)?;
        decode(response).await
    }

    /// Stop the active recording, transcoding at the given frame rate.
    pub async fn stop_recording(
        &self,
        fps: Option<u32>,
    ) -> Result<RecordingControl, ServiceError> {
        let mut request = self.post("/api/camera/stop-recording");
        if let Some(fps) = fps {
            request = request.query(&[("fps", fps)]);
        }
        let response = request.send().await.map_err(send_error)?;
        decode(response).await
    }

    /// Fetch the recordings catalog.
    pub async fn recordings(&self) -> Result<RecordingList, ServiceError> {
        let response = self
            .get("/api/recordings")
            .send()
            .await
            .map_err(send_error)?;
        decode(response).await
    }

    /// Download a recording by filename.
    pub async fn download(&self, filename: &str) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .get(&format!("/api/recordings/{}", filename))
            .send()
            .await
            .map_err(send_error)?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ServiceError::ReceiveFailed(format!("Failed to read body: {}", e)))?;
        Ok(body.to_vec())
    }

    /// Wait for the service to answer its health endpoint.
    pub async fn wait_for_service(&self, timeout: Duration) -> Result<(), ServiceError> {
        let start = std::time::Instant::now();
        let poll_interval = Duration::from_millis(100);

        while start.elapsed() < timeout {
            if self.health().await.is_ok() {
                return Ok(());
            }
            tokio::time::sleep(poll_interval).await;
        }

        Err(ServiceError::Timeout)
    }

    /// Probe the service, spawning it if necessary.
    ///
    /// Spawning only makes sense when the URL points at this machine; for
    /// remote URLs the probe error is returned as-is.
    pub async fn connect_or_spawn(&self) -> Result<(), ServiceError> {
        let probe = match self.health().await {
            Ok(_) => return Ok(()),
            Err(e @ ServiceError::ConnectionFailed(_)) => e,
            Err(e) => return Err(e),
        };

        if !is_local_url(&self.base_url) {
            return Err(probe);
        }

        let service_path = Self::find_service_binary().map_err(|e| {
            ServiceError::ConnectionFailed(format!("Cannot find service binary: {}", e))
        })?;

        std::process::Command::new(&service_path)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| {
                ServiceError::ConnectionFailed(format!("Failed to spawn service: {}", e))
            })?;

        // Wait for service to be ready
        self.wait_for_service(Duration::from_secs(10)).await
    }

    /// Find the service binary path.
    fn find_service_binary() -> Result<std::path::PathBuf, String> {
        const SERVICE_BINARY: &str = "picast-service";

        // 1. Sibling binary (development or bundled)
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(dir) = exe_path.parent() {
                let path = dir.join(SERVICE_BINARY);
                if path.exists() {
                    return Ok(path);
                }
            }
        }

        // 2. In PATH
        if let Ok(path) = which::which(SERVICE_BINARY) {
            return Ok(path);
        }

        // 3. Common installation paths
        let common_paths = ["/usr/bin/picast-service", "/usr/local/bin/picast-service"];

        for path in &common_paths {
            let path = std::path::PathBuf::from(path);
            if path.exists() {
                return Ok(path);
            }
        }

        Err(format!("{} binary not found", SERVICE_BINARY))
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.get(format!("{}{}", self.base_url, path)))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.authorize(self.http.post(format!("{}{}", self.base_url, path)))
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Whether a base URL points at this machine.
fn is_local_url(url: &str) -> bool {
    match reqwest::Url::parse(url) {
        Ok(parsed) => matches!(
            parsed.host_str(),
            Some("127.0.0.1" | "localhost" | "[::1]" | "::1")
        ),
        Err(_) => false,
    }
}

fn send_error(e: reqwest::Error) -> ServiceError {
    ServiceError::ConnectionFailed(e.to_string())
}

/// Decode a JSON response body, or map a non-success status to an error.
async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ServiceError> {
    if !response.status().is_success() {
        return Err(error_from_response(response).await);
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ServiceError::ReceiveFailed(format!("Failed to decode response: {}", e)))
}

/// Build a ServiceError from a non-success response.
///
/// The service reports errors as an ApiMessage body; fall back to the
/// status text when the body is something else.
async fn error_from_response(response: reqwest::Response) -> ServiceError {
    let status = response.status();
    let message = match response.json::<ApiMessage>().await {
        Ok(body) => body.message,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };

    match status {
        StatusCode::UNAUTHORIZED => ServiceError::Unauthorized(message),
        StatusCode::FORBIDDEN => ServiceError::Forbidden(message),
        StatusCode::NOT_FOUND => ServiceError::NotFound(message),
        _ => ServiceError::RemoteError {
            status: status.as_u16(),
            message,
        },
    }
}
