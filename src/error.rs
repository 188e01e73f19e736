use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigitizerError {
    #[error("unsupported format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
    #[error("invalid image source: {0}")]
    InvalidSource(String),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("clipboard error: {0}")]
    Clipboard(String),
    #[error("rotation by {0} degrees is not a multiple of 90")]
    UnsupportedRotation(i32),
    #[error("invalid settings file: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<arboard::Error> for DigitizerError {
    fn from(e: arboard::Error) -> Self {
        DigitizerError::Clipboard(e.to_string())
    }
}

pub type Result<T, E = DigitizerError> = std::result::Result<T, E>;
