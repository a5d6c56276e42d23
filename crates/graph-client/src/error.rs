//! Graph client errors

use serde_json::{Value, json};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authentication provider failed: {0}")]
    Auth(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Graph answered with a non-success status. `body` is the response body
    /// as received (Graph error documents are JSON).
    #[error("Graph API returned {status}")]
    Api { status: u16, body: Value },
}

impl Error {
    /// JSON document describing this failure: Graph's own error body for
    /// `Api`, a Graph-shaped `{"error":{"code","message"}}` otherwise.
    pub fn payload(&self) -> Value {
        match self {
            Error::Api { body, .. } => body.clone(),
            Error::Auth(msg) => json!({
                "error": { "code": "authenticationProviderFailed", "message": msg }
            }),
            Error::Http(msg) => json!({
                "error": { "code": "transportError", "message": msg }
            }),
        }
    }

    /// HTTP status returned by Graph, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
