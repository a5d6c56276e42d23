//! Request descriptors for the authorization and token endpoints
//!
//! Each descriptor is built fresh for one exchange and dropped afterwards.

use crate::constants::OIDC_SCOPES;

/// Parameters for building the browser authorization URL.
#[derive(Debug, Clone)]
pub struct AuthorizationUrlRequest {
    pub scopes: Vec<String>,
    pub redirect_uri: String,
}

/// Parameters for redeeming an authorization code (public client).
#[derive(Debug, Clone)]
pub struct AuthorizationCodeRequest {
    pub code: String,
    pub scopes: Vec<String>,
    pub redirect_uri: String,
}

/// Parameters for the client-credential grant (confidential client).
#[derive(Debug, Clone)]
pub struct ClientCredentialRequest {
    pub scopes: Vec<String>,
}

/// Space-delimited scope parameter for interactive flows: the requested
/// scopes followed by the OIDC scopes, each appearing once.
pub(crate) fn interactive_scope(scopes: &[String]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(scopes.len() + OIDC_SCOPES.len());
    for scope in scopes.iter().map(String::as_str).chain(OIDC_SCOPES.iter().copied()) {
        if !scope.is_empty() && !out.contains(&scope) {
            out.push(scope);
        }
    }
    out.join(" ")
}

/// Space-delimited scope parameter for the client-credential grant. OIDC
/// scopes are meaningless without a user and are not added.
pub(crate) fn application_scope(scopes: &[String]) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(scopes.len());
    for scope in scopes.iter().map(String::as_str) {
        if !scope.is_empty() && !out.contains(&scope) {
            out.push(scope);
        }
    }
    out.join(" ")
}
