//! Token endpoint interaction
//!
//! Both client applications POST a form to the tenant's v2.0 token endpoint
//! and get back either a `TokenResponse` or an OAuth error document. The
//! error document is preserved verbatim in `Error::Provider`.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Successful token endpoint response.
///
/// `expires_in` is a delta in seconds from the response time.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext_expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

/// POST `form` to `endpoint` and decode the result.
pub(crate) async fn request_token(
    client: &reqwest::Client,
    endpoint: Url,
    form: &[(&str, &str)],
) -> Result<TokenResponse> {
    let grant_type = form
        .iter()
        .find(|(k, _)| *k == "grant_type")
        .map(|(_, v)| *v)
        .unwrap_or("unknown");
    debug!(endpoint = %endpoint, grant_type, "requesting token");

    let response = client
        .post(endpoint)
        .form(form)
        .send()
        .await
        .map_err(|e| Error::Http(format!("token request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(provider_error(status.as_u16(), &body));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::InvalidResponse(e.to_string()))
}

/// Classify a non-success token endpoint body.
///
/// The identity platform answers with an OAuth error document
/// (`error`, `error_description`, `error_codes`, `trace_id`, ...). Anything
/// that isn't JSON is wrapped so callers always get a JSON payload.
fn provider_error(status: u16, body: &str) -> Error {
    match serde_json::from_str::<Value>(body) {
        Ok(payload) => {
            let code = payload
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown_error")
                .to_owned();
            Error::Provider {
                status,
                code,
                payload,
            }
        }
        Err(_) => Error::Provider {
            status,
            code: "unexpected_response".into(),
            payload: json!({
                "error": "unexpected_response",
                "error_description": body,
            }),
        },
    }
}
