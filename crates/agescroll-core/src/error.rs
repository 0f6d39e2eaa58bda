use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Media store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Photo not found: {0}")]
    NotFound(String),

    #[error("No media available")]
    NoMediaAvailable,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Soft failures leave the current catalog and selection untouched
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            Error::StoreUnavailable(_) | Error::NotFound(_) | Error::NoMediaAvailable
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
