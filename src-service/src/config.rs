//! Service configuration from the environment.
//!
//! Everything is optional: an unset variable takes its default and an
//! unparseable one is warned about and ignored, so a bare `picast-service`
//! always starts. The one deliberate exception is `PICAST_PASSWORD`, which
//! has no default; without it login stays disabled.

use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use directories::UserDirs;
use picast_common::security::validation::{validate_dimensions, validate_fps};
use picast_common::CameraConfig;
use tracing::warn;

/// Default HTTP port.
const SERVER_PORT: u16 = 3000;

/// Default capture binary, expected on PATH.
const DEFAULT_CAMERA_COMMAND: &str = "rpicam-vid";

/// Runtime configuration resolved once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address the HTTP server binds.
    pub bind: SocketAddr,
    /// Directory holding raw and transcoded recordings.
    pub recordings_dir: PathBuf,
    /// Capture geometry and default frame rate.
    pub camera: CameraConfig,
    /// Capture binary invoked per stream session.
    pub camera_command: String,
    /// Login username.
    pub username: String,
    /// Login password; `None` disables login.
    pub password: Option<String>,
}

impl ServiceConfig {
    /// Read configuration from `PICAST_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = CameraConfig::default();
        let mut camera = CameraConfig {
            width: parse_or("PICAST_WIDTH", env_var("PICAST_WIDTH"), defaults.width),
            height: parse_or("PICAST_HEIGHT", env_var("PICAST_HEIGHT"), defaults.height),
            framerate: parse_or(
                "PICAST_FRAMERATE",
                env_var("PICAST_FRAMERATE"),
                defaults.framerate,
            ),
        };

        if let Err(err) = validate_dimensions(camera.width, camera.height) {
            warn!("{err}, using default capture geometry");
            camera.width = defaults.width;
            camera.height = defaults.height;
        }
        if let Err(err) = validate_fps(camera.framerate) {
            warn!("{err}, using default frame rate");
            camera.framerate = defaults.framerate;
        }

        Self {
            bind: parse_or(
                "PICAST_BIND",
                env_var("PICAST_BIND"),
                SocketAddr::from(([0, 0, 0, 0], SERVER_PORT)),
            ),
            recordings_dir: env_var("PICAST_RECORDINGS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_recordings_dir),
            camera,
            camera_command: env_var("PICAST_CAMERA_CMD")
                .unwrap_or_else(|| DEFAULT_CAMERA_COMMAND.to_string()),
            username: env_var("PICAST_USERNAME").unwrap_or_else(|| "admin".to_string()),
            password: env_var("PICAST_PASSWORD"),
        }
    }
}

/// Read an environment variable, treating empty as unset.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Parse a raw value, keeping the default when parsing fails.
fn parse_or<T>(name: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Display,
{
    match raw {
        Some(value) => match value.parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!("ignoring invalid {name}={value:?}, using {default}");
                default
            }
        },
        None => default,
    }
}

/// Default recordings directory: a `picast` folder under the system Videos
/// directory, falling back to `~/Videos`, then `/tmp`.
fn default_recordings_dir() -> PathBuf {
    let base = match UserDirs::new() {
        Some(dirs) => dirs
            .video_dir()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| dirs.home_dir().join("Videos")),
        None => PathBuf::from("/tmp"),
    };
    base.join("picast")
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are not exercised directly; mutating them races with
    // parallel tests. The parsing seam is tested instead.

    #[test]
    fn parse_or_accepts_valid_values() {
        assert_eq!(parse_or("W", Some("1920".into()), 1536u32), 1920);
        assert_eq!(
            parse_or(
                "B",
                Some("127.0.0.1:8080".into()),
                SocketAddr::from(([0, 0, 0, 0], SERVER_PORT)),
            ),
            "127.0.0.1:8080".parse::<SocketAddr>().expect("addr")
        );
    }

    #[test]
    fn parse_or_falls_back_on_garbage() {
        assert_eq!(parse_or("W", Some("wide".into()), 1536u32), 1536);
        assert_eq!(parse_or("W", Some("-5".into()), 1536u32), 1536);
        assert_eq!(parse_or("W", None, 1536u32), 1536);
    }

    #[test]
    fn default_dir_ends_with_picast() {
        assert!(default_recordings_dir().ends_with("picast"));
    }
}
