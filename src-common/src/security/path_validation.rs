//! Filename validation for recording downloads.
//!
//! Download requests carry a client-supplied basename that is joined to the
//! recordings directory; everything that could escape that directory must be
//! rejected before the join.

use once_cell::sync::Lazy;
use regex::Regex;

/// Recording filenames as the service creates them: `recording_<millis>` with
/// either the raw or the transcoded extension.
static RECORDING_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^recording_\d{1,20}\.(mp4|mjpeg)$").unwrap());

/// Maximum filename length in bytes.
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Filename validation error types.
#[derive(Debug, Clone)]
pub enum FilenameError {
    /// Name contains a path separator or traversal sequence
    ContainsSeparator,
    /// Name contains null bytes
    ContainsNullByte,
    /// Name is too long
    TooLong(usize),
    /// Name does not match the recording filename pattern
    NotARecording(String),
}

impl std::fmt::Display for FilenameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilenameError::ContainsSeparator => write!(f, "Filename contains a path separator"),
            FilenameError::ContainsNullByte => write!(f, "Filename contains null byte"),
            FilenameError::TooLong(len) => write!(f, "Filename too long: {} bytes", len),
            FilenameError::NotARecording(name) => {
                write!(f, "Not a recording filename: {}", name)
            }
        }
    }
}

impl std::error::Error for FilenameError {}

/// Validate a client-supplied recording filename.
///
/// Accepts only basenames the service itself would have produced; rejects
/// separators, traversal, null bytes, and over-long names.
pub fn validate_recording_filename(name: &str) -> Result<(), FilenameError> {
    if name.contains('\0') {
        return Err(FilenameError::ContainsNullByte);
    }
    if name.len() > MAX_FILENAME_LENGTH {
        return Err(FilenameError::TooLong(name.len()));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(FilenameError::ContainsSeparator);
    }
    if !RECORDING_NAME_PATTERN.is_match(name) {
        return Err(FilenameError::NotARecording(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_service_names() {
        assert!(validate_recording_filename("recording_1737295200000.mp4").is_ok());
        assert!(validate_recording_filename("recording_1737295200000.mjpeg").is_ok());
        assert!(validate_recording_filename("recording_1.mp4").is_ok());
    }

    #[test]
    fn test_rejects_traversal() {
        assert!(matches!(
            validate_recording_filename("../etc/passwd"),
            Err(FilenameError::ContainsSeparator)
        ));
        assert!(matches!(
            validate_recording_filename("recordings/recording_1.mp4"),
            Err(FilenameError::ContainsSeparator)
        ));
        assert!(matches!(
            validate_recording_filename("recording_..1.mp4"),
            Err(FilenameError::ContainsSeparator)
        ));
    }

    #[test]
    fn test_rejects_null_byte() {
        assert!(matches!(
            validate_recording_filename("recording_1.mp4\0"),
            Err(FilenameError::ContainsNullByte)
        ));
    }

    #[test]
    fn test_rejects_foreign_names() {
        assert!(validate_recording_filename("").is_err());
        assert!(validate_recording_filename("clip.mp4").is_err());
        assert!(validate_recording_filename("recording_.mp4").is_err());
        assert!(validate_recording_filename("recording_17.avi").is_err());
        assert!(validate_recording_filename("recording_17.mp4.sh").is_err());
    }

    #[test]
    fn test_rejects_too_long() {
        let name = format!("recording_{}.mp4", "9".repeat(300));
        assert!(matches!(
            validate_recording_filename(&name),
            Err(FilenameError::TooLong(_))
        ));
    }
}
