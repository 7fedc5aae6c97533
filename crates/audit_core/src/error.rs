use thiserror::Error;

/// Failures talking to a user directory. The display string is what ends up
/// in the table's collection error or a row's delete error.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("invalid directory url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("malformed directory response: {0}")]
    Decode(#[from] serde_json::Error),
}
