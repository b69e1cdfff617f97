// Settings layer: defaults < config file < environment < flags.
//
// The config file is optional JSON, looked up at `--config`, then
// `$GP_CONFIG`, then `<config dir>/gp/config.json`. Environment variables
// and flags are resolved by clap before they reach `merge`.

use crate::config::{Backend, ClientConfig};
use crate::transport::ReqwestTransport;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// User-tunable options. Every field is optional so layers can be merged.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub base_url: Option<String>,
    pub front_url: Option<String>,
    pub backend: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Location of the config file when `--config` is not given.
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os("GP_CONFIG") {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("gp").join("config.json"))
    }

    /// Load the config file. An explicit `path` must exist; the default
    /// location may be absent, which yields empty settings.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Settings::default()),
            },
        };

        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file");
                return Ok(Settings::default());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("cannot read config {}", path.display()))
            }
        };
        debug!(path = %path.display(), "loaded config file");
        serde_json::from_str(&data).with_context(|| format!("invalid config {}", path.display()))
    }

    /// Layer `overrides` on top of `self`.
    pub fn merge(self, overrides: Settings) -> Settings {
        Settings {
            base_url: overrides.base_url.or(self.base_url),
            front_url: overrides.front_url.or(self.front_url),
            backend: overrides.backend.or(self.backend),
            timeout_secs: overrides.timeout_secs.or(self.timeout_secs),
        }
    }

    pub fn backend(&self) -> Result<Backend> {
        match &self.backend {
            Some(name) => Ok(name.parse()?),
            None => Ok(Backend::Default),
        }
    }

    pub fn into_client_config(self) -> Result<ClientConfig> {
        let mut config = ClientConfig::new().with_backend(self.backend()?);
        if let Some(url) = &self.base_url {
            config = config.with_service_root(url).context("--base-url")?;
        }
        if let Some(url) = &self.front_url {
            config = config.with_frontend_root(url).context("--front-url")?;
        }
        if let Some(secs) = self.timeout_secs {
            let transport = ReqwestTransport::with_timeout(Duration::from_secs(secs))
                .context("Failed to build HTTP client")?;
            config = config.with_transport(transport);
        }
        Ok(config)
    }
}
