//! Tenant authority and the endpoints derived from it

use url::Url;

use crate::constants::{AUTHORIZE_PATH, TOKEN_PATH};
use crate::error::{Error, Result};

/// `{authority_host}/{tenant_id}/`, the base every v2.0 endpoint hangs off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authority {
    base: Url,
    tenant_id: String,
}

impl Authority {
    /// Build the authority for `tenant_id` under `host`.
    ///
    /// `host` must be an absolute http(s) URL. The tenant may be a GUID, a
    /// verified domain, or one of `common`/`organizations`/`consumers`, but
    /// must be a single path segment.
    pub fn new(host: &str, tenant_id: &str) -> Result<Self> {
        let tenant_id = tenant_id.trim();
        if tenant_id.is_empty() {
            return Err(Error::InvalidAuthority("tenant id must not be empty".into()));
        }
        if tenant_id
            .chars()
            .any(|c| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace())
        {
            return Err(Error::InvalidAuthority(format!(
                "tenant id must be a single path segment, got: {tenant_id}"
            )));
        }

        let raw = format!("{}/{}/", host.trim_end_matches('/'), tenant_id);
        let base = Url::parse(&raw)
            .map_err(|e| Error::InvalidAuthority(format!("{raw}: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::InvalidAuthority(format!(
                "authority host must use http or https, got: {host}"
            )));
        }

        Ok(Self {
            base,
            tenant_id: tenant_id.to_owned(),
        })
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn authorize_endpoint(&self) -> Result<Url> {
        self.endpoint(AUTHORIZE_PATH)
    }

    pub fn token_endpoint(&self) -> Result<Url> {
        self.endpoint(TOKEN_PATH)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| Error::InvalidAuthority(format!("joining {path}: {e}")))
    }
}
