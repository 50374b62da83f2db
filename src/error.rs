use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// HTTP 429 from a venue. Carried separately from [`Error::Http`] so the
    /// fetch layer can retry with backoff instead of degrading to an empty book.
    #[error("Rate limited by {venue}")]
    RateLimited { venue: &'static str },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Stream desync on {ticker}: expected seq {expected}, got {received}")]
    StreamDesync {
        ticker: String,
        expected: u64,
        received: u64,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Scan timed out after {0} ms")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, Error>;
