//! Configuration types and loading
//!
//! Config precedence: environment variables > `.env` file > config file >
//! defaults.
//! The config file itself is optional; with no file the relay runs on the
//! defaults plus the `AZURE_AD_*` variables. Secrets (client secret, session
//! signing secret) never come from the TOML body: they are read from the
//! environment or from a referenced file.

use common::Secret;
use entra_auth::DEFAULT_AUTHORITY_HOST;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use url::Url;

pub const ENV_CLIENT_ID: &str = "AZURE_AD_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "AZURE_AD_CLIENT_SECRET";
pub const ENV_TENANT_ID: &str = "AZURE_AD_TENANT_ID";
pub const ENV_SESSION_SECRET: &str = "SESSION_SECRET";

/// Where the identity platform sends the browser back to.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/azure-callback";

/// Minimum session secret length accepted for cookie key derivation.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// Root configuration
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub azure: AzureConfig,
    pub graph: GraphConfig,
    pub http: HttpConfig,
    pub session: SessionConfig,
}

/// Listener settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub redirect_uri: String,
    pub max_connections: usize,
}

/// App registration and tenant
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    pub client_id: String,
    pub tenant_id: String,
    pub authority_host: String,
    /// Path to a file holding the client secret (alternative to AZURE_AD_CLIENT_SECRET)
    pub client_secret_file: Option<PathBuf>,
    #[serde(skip)]
    pub client_secret: Option<Secret<String>>,
}

/// Downstream Graph API
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub base_url: String,
}

/// Outbound HTTP client
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

/// Session cookie and store
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub idle_ttl_secs: u64,
    #[serde(skip)]
    pub secret: Option<Secret<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            max_connections: 1000,
        }
    }
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            tenant_id: String::new(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            client_secret_file: None,
            client_secret: None,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: "https://graph.microsoft.com/v1.0".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "mail_relay.sid".to_string(),
            idle_ttl_secs: 86_400,
            secret: None,
        }
    }
}

impl Config {
    /// Load configuration from an optional TOML file, then overlay
    /// environment variables and validate.
    ///
    /// Client secret resolution order:
    /// 1. AZURE_AD_CLIENT_SECRET env var
    /// 2. azure.client_secret_file path from config
    pub fn load(path: Option<&Path>) -> common::Result<Self> {
        let mut config: Config = match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                toml::from_str(&contents)?
            }
            None => Config::default(),
        };

        if let Some(id) = non_empty_env(ENV_CLIENT_ID) {
            config.azure.client_id = id;
        }
        if let Some(tenant) = non_empty_env(ENV_TENANT_ID) {
            config.azure.tenant_id = tenant;
        }

        if let Some(secret) = non_empty_env(ENV_CLIENT_SECRET) {
            config.azure.client_secret = Some(Secret::new(secret));
        } else if let Some(ref secret_file) = config.azure.client_secret_file {
            let secret = std::fs::read_to_string(secret_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read client_secret_file {}: {e}",
                    secret_file.display()
                ))
            })?;
            let secret = secret.trim().to_owned();
            if !secret.is_empty() {
                config.azure.client_secret = Some(Secret::new(secret));
            }
        }

        if let Some(secret) = non_empty_env(ENV_SESSION_SECRET) {
            config.session.secret = Some(Secret::new(secret));
        }

        config.validate()?;
        Ok(config)
    }

    /// Populate the process environment from a `.env` file: `path` when
    /// given, otherwise `.env` in the working directory or a parent.
    /// Variables already set in the environment are left untouched. A missing
    /// file is not an error; returns the file that was loaded.
    pub fn load_dotenv(path: Option<&Path>) -> common::Result<Option<PathBuf>> {
        let loaded = match path {
            Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
            None => dotenvy::dotenv(),
        };
        match loaded {
            Ok(path) => Ok(Some(path)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(common::Error::Config(format!("failed to load .env: {e}"))),
        }
    }

    /// Resolve the config file path from CLI arg or CONFIG_PATH env var.
    /// `None` means "run on defaults and environment only".
    pub fn resolve_path(cli_path: Option<&str>) -> Option<PathBuf> {
        if let Some(p) = cli_path {
            return Some(PathBuf::from(p));
        }
        std::env::var("CONFIG_PATH").ok().map(PathBuf::from)
    }

    fn validate(&self) -> common::Result<()> {
        if self.azure.client_id.trim().is_empty() {
            return Err(common::Error::Config(format!(
                "azure.client_id is required (set {ENV_CLIENT_ID})"
            )));
        }
        if self.azure.tenant_id.trim().is_empty() {
            return Err(common::Error::Config(format!(
                "azure.tenant_id is required (set {ENV_TENANT_ID})"
            )));
        }
        match &self.azure.client_secret {
            Some(secret) if !secret.is_blank() => {}
            _ => {
                return Err(common::Error::Config(format!(
                    "client secret is required (set {ENV_CLIENT_SECRET} or azure.client_secret_file)"
                )));
            }
        }

        require_http_url("azure.authority_host", &self.azure.authority_host)?;
        require_http_url("graph.base_url", &self.graph.base_url)?;
        require_http_url("server.redirect_uri", &self.server.redirect_uri)?;

        if self.http.timeout_secs == 0 {
            return Err(common::Error::Config(
                "http.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.server.max_connections == 0 {
            return Err(common::Error::Config(
                "server.max_connections must be greater than 0".into(),
            ));
        }
        if self.session.idle_ttl_secs == 0 {
            return Err(common::Error::Config(
                "session.idle_ttl_secs must be greater than 0".into(),
            ));
        }
        if self.session.cookie_name.is_empty()
            || !self
                .session
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        {
            return Err(common::Error::Config(format!(
                "session.cookie_name must be a non-empty token, got: {:?}",
                self.session.cookie_name
            )));
        }
        if let Some(secret) = &self.session.secret {
            if secret.expose().len() < MIN_SESSION_SECRET_LEN {
                return Err(common::Error::Config(format!(
                    "{ENV_SESSION_SECRET} must be at least {MIN_SESSION_SECRET_LEN} bytes"
                )));
            }
        }

        Ok(())
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn require_http_url(field: &str, value: &str) -> common::Result<()> {
    let url = Url::parse(value).map_err(|e| common::Error::url(value, e))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(common::Error::Config(format!(
            "{field} must start with http:// or https://, got: {value}"
        )));
    }
    Ok(())
}
