//! Errors raised while talking to a container engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("invalid engine endpoint {0:?}")]
    InvalidEndpoint(String),

    #[error("cannot connect to engine at {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    #[error("engine request failed: {0}")]
    Http(#[from] hyper::Error),

    #[error("invalid engine request: {0}")]
    Request(#[from] hyper::http::Error),

    #[error("engine returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed engine response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("engine stream failed: {0}")]
    Io(#[from] std::io::Error),
}
