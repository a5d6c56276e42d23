//! Confidential client application: client-credential flow
//!
//! Authenticates as the app registration itself using the client secret.
//! No user is involved, so only the requested resource scopes are sent.

use common::Secret;
use tracing::{info, instrument};

use crate::authority::Authority;
use crate::error::Result;
use crate::request::{ClientCredentialRequest, application_scope};
use crate::token::{TokenResponse, request_token};

#[derive(Debug, Clone)]
pub struct ConfidentialClientApplication {
    client_id: String,
    client_secret: Secret<String>,
    authority: Authority,
    http: reqwest::Client,
}

impl ConfidentialClientApplication {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: Secret<String>,
        authority: Authority,
        http: reqwest::Client,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret,
            authority,
            http,
        }
    }

    /// Exchange the application credential for an application-scoped token.
    #[instrument(skip_all, fields(client_id = %self.client_id, tenant = %self.authority.tenant_id()))]
    pub async fn acquire_token_by_client_credential(
        &self,
        request: &ClientCredentialRequest,
    ) -> Result<TokenResponse> {
        let scope = application_scope(&request.scopes);
        let token = request_token(
            &self.http,
            self.authority.token_endpoint()?,
            &[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose().as_str()),
                ("scope", scope.as_str()),
                ("grant_type", "client_credentials"),
            ],
        )
        .await?;

        info!(expires_in = token.expires_in, "acquired application token");
        Ok(token)
    }
}
