//! Configuration error types

use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid URL `{value}`: {source}")]
    Url {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

impl Error {
    /// Shorthand for a URL parse failure that keeps the offending input.
    pub fn url(value: impl Into<String>, source: url::ParseError) -> Self {
        Self::Url {
            value: value.into(),
            source,
        }
    }
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;
