use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Credential error: {0}")]
    Credential(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Spotify API error: {0}")]
    SpotifyApi(#[from] rspotify::ClientError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Caller mistakes (bad input, missing playlist) are reported back as-is;
    /// everything else aborts a running conversion.
    pub fn is_fatal_in_pipeline(&self) -> bool {
        !matches!(self, AppError::Validation(_) | AppError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
