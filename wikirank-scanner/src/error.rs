use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{path} returned HTTP {status}")]
    StatusError { path: String, status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid Wikipedia article path: {0}")]
    InvalidPath(String),
}

impl ScanError {
    /// True when the failure happened on the wire rather than in our own input.
    pub fn is_transport(&self) -> bool {
        matches!(self, ScanError::HttpError(_) | ScanError::StatusError { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
