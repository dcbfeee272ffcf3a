use thiserror::Error;

#[derive(Error, Debug)]
pub enum TintcamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Camera error: {details}")]
    Camera { details: String },

    #[error("Face detector error: {details}")]
    Detector { details: String },

    #[error("Display error: {details}")]
    Display { details: String },

    #[error("Overlay error: {details}")]
    Overlay { details: String },

    #[error("Frame error: {details}")]
    Frame { details: String },
}

impl TintcamError {
    pub fn camera<S: Into<String>>(details: S) -> Self {
        Self::Camera {
            details: details.into(),
        }
    }

    pub fn detector<S: Into<String>>(details: S) -> Self {
        Self::Detector {
            details: details.into(),
        }
    }

    pub fn display<S: Into<String>>(details: S) -> Self {
        Self::Display {
            details: details.into(),
        }
    }

    pub fn overlay<S: Into<String>>(details: S) -> Self {
        Self::Overlay {
            details: details.into(),
        }
    }

    pub fn frame<S: Into<String>>(details: S) -> Self {
        Self::Frame {
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TintcamError>;
