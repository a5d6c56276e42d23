//! Graph request execution
//!
//! Requests are built with `client.api(path)` and executed with `.get()`.
//! Successful bodies are returned as raw bytes so callers can relay them
//! without a decode/re-encode round trip.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::AuthenticationProvider;
use crate::error::{Error, Result};

/// Graph resource listing the signed-in user's messages.
pub const MY_MESSAGES_PATH: &str = "/me/messages";

/// Graph client bound to one base URL and one authentication provider.
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<dyn AuthenticationProvider>,
}

/// Successful Graph response body, exactly as received.
#[derive(Debug, Clone)]
pub struct GraphResponse {
    pub body: Bytes,
}

/// One pending request against a Graph resource path.
pub struct GraphRequest<'a> {
    client: &'a GraphClient,
    path: String,
}

impl GraphClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        auth: Arc<dyn AuthenticationProvider>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            auth,
        }
    }

    /// Start a request for `path` (e.g. `/me/messages`), relative to the base URL.
    pub fn api(&self, path: &str) -> GraphRequest<'_> {
        GraphRequest {
            client: self,
            path: path.to_owned(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl GraphRequest<'_> {
    /// Issue a single authenticated GET.
    pub async fn get(self) -> Result<GraphResponse> {
        let token = self.client.auth.access_token().await?;
        let url = self.client.url_for(&self.path);
        debug!(url = %url, provider = self.client.auth.id(), "GET graph resource");

        let response = self
            .client
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Bearer {}", token.expose()))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| Error::Http(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Http(format!("reading response body failed: {e}")))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), path = %self.path, "graph request rejected");
            let body = serde_json::from_slice::<Value>(&body).unwrap_or_else(|_| {
                json!({
                    "error": {
                        "code": "unexpectedResponse",
                        "message": String::from_utf8_lossy(&body),
                    }
                })
            });
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(GraphResponse { body })
    }
}
