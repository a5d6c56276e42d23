//! Error types for Entra ID token operations

use serde_json::{Value, json};

/// Errors from authorization URL construction and token exchanges.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid authority: {0}")]
    InvalidAuthority(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The token endpoint answered with a non-success status. `payload` is
    /// the identity platform's error document as received.
    #[error("token endpoint returned {status}: {code}")]
    Provider {
        status: u16,
        code: String,
        payload: Value,
    },

    #[error("invalid token response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// JSON document describing this failure.
    ///
    /// Provider rejections return the provider's own body; every other
    /// variant is rendered in the same `{error, error_description}` shape.
    pub fn payload(&self) -> Value {
        match self {
            Error::Provider { payload, .. } => payload.clone(),
            Error::InvalidAuthority(msg) => json!({
                "error": "invalid_authority",
                "error_description": msg,
            }),
            Error::Http(msg) => json!({
                "error": "http_error",
                "error_description": msg,
            }),
            Error::InvalidResponse(msg) => json!({
                "error": "invalid_response",
                "error_description": msg,
            }),
        }
    }
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_payload_is_returned_unchanged() {
        let body = json!({
            "error": "invalid_grant",
            "error_description": "AADSTS70000: The provided authorization code is invalid.",
            "error_codes": [70000],
        });
        let err = Error::Provider {
            status: 400,
            code: "invalid_grant".into(),
            payload: body.clone(),
        };
        assert_eq!(err.payload(), body);
        assert_eq!(err.to_string(), "token endpoint returned 400: invalid_grant");
    }

    #[test]
    fn transport_errors_use_oauth_error_shape() {
        let err = Error::Http("connection refused".into());
        let payload = err.payload();
        assert_eq!(payload["error"], "http_error");
        assert_eq!(payload["error_description"], "connection refused");
    }
}
