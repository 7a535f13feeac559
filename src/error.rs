use thiserror::Error;

use crate::upload::UploadError;

#[derive(Error, Debug)]
pub enum Error {
    #[cfg(feature = "web")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Backend { status: u16, body: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("Invalid configuration for {key}: {message}")]
    Config { key: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
