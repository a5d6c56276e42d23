//! Public client application: delegated (authorization-code) flow
//!
//! The public client never presents the client secret. It builds the URL the
//! browser is sent to and, once the identity platform redirects back with a
//! `code`, redeems that code for a token acting on behalf of the user.

use tracing::{info, instrument};
use url::Url;

use crate::authority::Authority;
use crate::error::{Error, Result};
use crate::request::{AuthorizationCodeRequest, AuthorizationUrlRequest, interactive_scope};
use crate::token::{TokenResponse, request_token};

/// Client for the user-delegated flow of one app registration and tenant.
#[derive(Debug, Clone)]
pub struct PublicClientApplication {
    client_id: String,
    authority: Authority,
    http: reqwest::Client,
}

impl PublicClientApplication {
    pub fn new(client_id: impl Into<String>, authority: Authority, http: reqwest::Client) -> Self {
        Self {
            client_id: client_id.into(),
            authority,
            http,
        }
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Build the authorization endpoint URL the browser should be redirected to.
    pub fn authorization_url(&self, request: &AuthorizationUrlRequest) -> Result<Url> {
        if request.redirect_uri.is_empty() {
            return Err(Error::InvalidAuthority("redirect_uri must not be empty".into()));
        }

        let mut url = self.authority.authorize_endpoint()?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("scope", &interactive_scope(&request.scopes))
            .append_pair("redirect_uri", &request.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("response_mode", "query");
        Ok(url)
    }

    /// Redeem an authorization code for a user-delegated token.
    ///
    /// `scopes` and `redirect_uri` must match the values used to build the
    /// authorization URL or the identity platform rejects the exchange.
    #[instrument(skip_all, fields(client_id = %self.client_id, tenant = %self.authority.tenant_id()))]
    pub async fn acquire_token_by_code(
        &self,
        request: &AuthorizationCodeRequest,
    ) -> Result<TokenResponse> {
        let scope = interactive_scope(&request.scopes);
        let token = request_token(
            &self.http,
            self.authority.token_endpoint()?,
            &[
                ("client_id", self.client_id.as_str()),
                ("scope", scope.as_str()),
                ("code", request.code.as_str()),
                ("redirect_uri", request.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ],
        )
        .await?;

        info!(expires_in = token.expires_in, "acquired user-delegated token");
        Ok(token)
    }
}
