//! Error types for the classification pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    /// Bytes are not a supported raster format, or are truncated/corrupt.
    #[error("Failed to decode image: {message}")]
    Decode {
        message: String,
        #[source]
        source: Option<image::ImageError>,
    },

    /// Image dimensions or allocation exceed the configured limits.
    #[error("Image exceeds decode limits: {message}")]
    ImageTooLarge { message: String },

    /// Catalog or options are inconsistent; detected at startup.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Failed to encode image: {message}")]
    Encode { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ScanError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            source: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

impl From<image::ImageError> for ScanError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Limits(limits) => Self::ImageTooLarge {
                message: limits.to_string(),
            },
            other => Self::Decode {
                message: other.to_string(),
                source: Some(other),
            },
        }
    }
}
