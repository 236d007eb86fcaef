use reqwest::StatusCode;

// Error type shared by report construction and transmission
#[derive(Debug, thiserror::Error)]
pub enum CmcdError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Collector returned status code {0}")]
    StatusCode(StatusCode),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("TLS configuration error: {0}")]
    TlsError(#[from] rustls::Error),

    #[error("No media element attached")]
    MissingMedia,

    #[error("No async runtime available: {0}")]
    RuntimeUnavailable(String),
}
