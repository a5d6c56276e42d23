//! Microsoft identity platform (Entra ID) OAuth clients
//!
//! Provides the two client applications the mail relay needs, both bound to
//! a single tenant authority:
//!
//! 1. `PublicClientApplication` builds the browser authorization URL and
//!    redeems the returned authorization code for a user-delegated token.
//! 2. `ConfidentialClientApplication` authenticates as the application itself
//!    (client-credential grant) and returns an application-scoped token.
//!
//! Both POST to the tenant's v2.0 token endpoint. Provider rejections are
//! kept as the raw JSON document the identity platform returned so callers
//! can relay it unchanged.

pub mod authority;
pub mod confidential;
pub mod constants;
pub mod error;
pub mod public;
pub mod request;
pub mod token;

pub use authority::Authority;
pub use confidential::ConfidentialClientApplication;
pub use constants::*;
pub use error::{Error, Result};
pub use public::PublicClientApplication;
pub use request::{AuthorizationCodeRequest, AuthorizationUrlRequest, ClientCredentialRequest};
pub use token::TokenResponse;
