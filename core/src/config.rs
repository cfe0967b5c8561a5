//! Base URLs and transport settings.
//!
//! # Design
//! A `Config` names the three API roots: `public` for unauthenticated
//! market data, `base` for authenticated live calls and `base_demo` for the
//! authenticated sandbox. The transport resolves one of them per request.
//! Timeouts and keep-alive are optional and fall back to the transport
//! defaults when absent.
//!
//! Configs are loaded from TOML, either from a string, a file, or the file
//! named by the `CURRENCY_SDK_CONFIG` environment variable.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable holding the path of the TOML config file.
pub const CONFIG_ENV_VAR: &str = "CURRENCY_SDK_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub public: String,
    pub base: String,
    #[serde(alias = "baseDemo")]
    pub base_demo: String,
    /// Overall per-call timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Connection-establish timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<bool>,
}

impl Config {
    pub fn new(public: &str, base: &str, base_demo: &str) -> Self {
        Self {
            public: trim_url(public),
            base: trim_url(base),
            base_demo: trim_url(base_demo),
            timeout_secs: None,
            connection_timeout_secs: None,
            keep_alive: None,
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::Config(format!("parse error: {e}")))?;
        config.validated()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Loads the file named by `CURRENCY_SDK_CONFIG`.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV_VAR)
            .map_err(|_| Error::Config(format!("{CONFIG_ENV_VAR} is not set")))?;
        Self::load(path)
    }

    fn validated(mut self) -> Result<Self> {
        for (name, url) in [
            ("public", &mut self.public),
            ("base", &mut self.base),
            ("base_demo", &mut self.base_demo),
        ] {
            *url = trim_url(url);
            if url.is_empty() {
                return Err(Error::Config(format!("`{name}` url is empty")));
            }
        }
        if self.timeout_secs == Some(0) || self.connection_timeout_secs == Some(0) {
            return Err(Error::Config("timeouts must be greater than zero".to_string()));
        }
        Ok(self)
    }
}

fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
