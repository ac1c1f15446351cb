use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentryError {
    #[error("Serial error: {0}")]
    Serial(String),

    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serial port error: {0}")]
    Port(#[from] serialport::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SentryError>;
