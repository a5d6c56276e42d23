//! Request-level error types
//!
//! Every variant renders as `500 Internal Server Error` with a JSON body
//! carrying the upstream failure document. Missing session tokens are not
//! errors: handlers answer those with a redirect to `/`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("failed to build authorization URL: {0}")]
    AuthorizationUrl(#[source] entra_auth::Error),

    #[error("authorization denied: {error}")]
    AuthorizationDenied {
        error: String,
        error_description: Option<String>,
    },

    #[error("callback is missing the authorization code")]
    MissingCode,

    #[error("user token exchange failed: {0}")]
    UserTokenExchange(#[source] entra_auth::Error),

    #[error("application token exchange failed: {0}")]
    AppTokenExchange(#[source] entra_auth::Error),

    #[error("Graph request failed: {0}")]
    Graph(#[source] graph_client::Error),
}

impl AppError {
    fn payload(&self) -> serde_json::Value {
        match self {
            AppError::AuthorizationUrl(e)
            | AppError::UserTokenExchange(e)
            | AppError::AppTokenExchange(e) => e.payload(),
            AppError::AuthorizationDenied {
                error,
                error_description,
            } => json!({
                "error": error,
                "error_description": error_description,
            }),
            AppError::MissingCode => json!({
                "error": "invalid_request",
                "error_description": "authorization code missing from callback query",
            }),
            AppError::Graph(e) => e.payload(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            self.payload().to_string(),
        )
            .into_response()
    }
}
