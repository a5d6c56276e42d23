//! Fixed bearer token provider

use crate::{AuthenticationProvider, Error};
use common::Secret;
use std::future::Future;
use std::pin::Pin;

/// Always supplies the same token: no caching, no refresh.
///
/// The mail relay builds one of these per request from the session's
/// user-delegated token.
pub struct BearerTokenProvider {
    token: Secret<String>,
}

impl BearerTokenProvider {
    pub fn new(token: Secret<String>) -> Self {
        Self { token }
    }
}

impl AuthenticationProvider for BearerTokenProvider {
    fn id(&self) -> &str {
        "bearer"
    }

    fn access_token(
        &self,
    ) -> Pin<Box<dyn Future<Output = crate::Result<Secret<String>>> + Send + '_>> {
        Box::pin(async move {
            if self.token.is_blank() {
                return Err(Error::Auth("bearer token is empty".into()));
            }
            Ok(self.token.clone())
        })
    }
}
