//! Microsoft identity platform constants
//!
//! Public endpoint and scope identifiers. None of these are secrets; the
//! client secret is supplied at runtime by the service configuration.

/// Public-cloud authority host. Sovereign clouds use a different host.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Default scope set of Microsoft Graph: every permission granted to the app
/// registration.
pub const GRAPH_DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// OpenID Connect scopes appended to every interactive authorization request
/// so the token endpoint also returns an id token and refresh token.
pub const OIDC_SCOPES: &[&str] = &["openid", "profile", "offline_access"];

/// Path of the v2.0 authorization endpoint below the authority.
pub const AUTHORIZE_PATH: &str = "oauth2/v2.0/authorize";

/// Path of the v2.0 token endpoint below the authority.
pub const TOKEN_PATH: &str = "oauth2/v2.0/token";
