//! Minimal Microsoft Graph REST client
//!
//! Decouples "how do I get a bearer token" from "how do I call Graph":
//! `GraphClient` asks its `AuthenticationProvider` for a token before every
//! request, exactly like a credential-resolution callback. `BearerTokenProvider`
//! always answers with one fixed token, which is all the mail relay needs.

pub mod bearer;
pub mod client;
pub mod error;

pub use bearer::BearerTokenProvider;
pub use client::{GraphClient, GraphRequest, GraphResponse, MY_MESSAGES_PATH};
pub use error::{Error, Result};

use common::Secret;
use std::future::Future;
use std::pin::Pin;

/// Source of the bearer token attached to Graph requests.
///
/// Uses `Pin<Box<dyn Future>>` return types so providers can be held as
/// `Arc<dyn AuthenticationProvider>`.
pub trait AuthenticationProvider: Send + Sync {
    /// Identifier for logging (e.g. "bearer")
    fn id(&self) -> &str;

    /// Resolve the access token for the next request.
    fn access_token(&self) -> Pin<Box<dyn Future<Output = Result<Secret<String>>> + Send + '_>>;
}
