//! Input validation for API request parameters.

/// Maximum accepted capture frame rate
pub const MAX_FPS: u32 = 240;

/// Maximum capture dimension value (width or height)
pub const MAX_DIMENSION: u32 = 8192;

/// Validation error types.
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// Frame rate is zero or above MAX_FPS
    FpsOutOfRange { value: u32, max: u32 },
    /// Dimension (width/height) is out of valid range
    DimensionOutOfRange {
        field: &'static str,
        value: u32,
        max: u32,
    },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::FpsOutOfRange { value, max } => {
                write!(f, "fps out of range: {} (max {})", value, max)
            }
            ValidationError::DimensionOutOfRange { field, value, max } => {
                write!(f, "{} out of range: {} (max {})", field, value, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate a capture frame rate.
///
/// Frame rates must be positive and not exceed MAX_FPS (240).
pub fn validate_fps(fps: u32) -> Result<(), ValidationError> {
    if fps == 0 || fps > MAX_FPS {
        return Err(ValidationError::FpsOutOfRange {
            value: fps,
            max: MAX_FPS,
        });
    }
    Ok(())
}

/// Validate capture dimension values (width, height).
///
/// Dimensions must be positive and not exceed MAX_DIMENSION (8192).
pub fn validate_dimensions(width: u32, height: u32) -> Result<(), ValidationError> {
    if width == 0 || width > MAX_DIMENSION {
        return Err(ValidationError::DimensionOutOfRange {
            field: "width",
            value: width,
            max: MAX_DIMENSION,
        });
    }
    if height == 0 || height > MAX_DIMENSION {
        return Err(ValidationError::DimensionOutOfRange {
            field: "height",
            value: height,
            max: MAX_DIMENSION,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_fps() {
        assert!(validate_fps(1).is_ok());
        assert!(validate_fps(30).is_ok());
        assert!(validate_fps(60).is_ok());
        assert!(validate_fps(MAX_FPS).is_ok());
    }

    #[test]
    fn test_invalid_fps() {
        assert!(validate_fps(0).is_err());
        assert!(validate_fps(MAX_FPS + 1).is_err());
    }

    #[test]
    fn test_dimensions() {
        assert!(validate_dimensions(1536, 864).is_ok());
        assert!(validate_dimensions(1, 1).is_ok());
        assert!(validate_dimensions(MAX_DIMENSION, MAX_DIMENSION).is_ok());

        assert!(validate_dimensions(0, 864).is_err());
        assert!(validate_dimensions(1536, 0).is_err());
        assert!(validate_dimensions(MAX_DIMENSION + 1, 864).is_err());
    }
}
