//! Relay configuration.
//!
//! Read from `<config_dir>/snippet-relay/config.toml` (or an explicit path),
//! then overridden by `RELAY_*` environment variables and finally by CLI
//! flags in `main`. Every field has a default, so an absent file is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use axum::http::HeaderValue;
use tracing::{debug, warn};
use wp_snippets::ClientConfig;
use wp_snippets::client::DEFAULT_TIMEOUT_SECS;
use wp_snippets::models::DEFAULT_PAGE_SIZE;

use crate::bridge::BridgeConfig;
use crate::coordinator::{CoordinatorConfig, DEFAULT_MAILBOX_CAPACITY};
use crate::credentials::FileCredentialStore;
use crate::error::{Error, Result};
use crate::logging::DEFAULT_LOG_FILTER;

/// Directory name under the platform config dir.
pub const APP_DIR_NAME: &str = "snippet-relay";

/// Config file name inside [`APP_DIR_NAME`].
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Remote client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub timeout_secs: u64,
    pub page_size: u32,
    /// Overrides the default `wp-snippets/<version>` user agent.
    pub user_agent: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_size: DEFAULT_PAGE_SIZE,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Credentials file; defaults to `<config_dir>/snippet-relay/credentials.json`.
    pub credentials_path: Option<PathBuf>,
    pub log_filter: String,
    pub json_logs: bool,
    pub mailbox_capacity: usize,
    pub bridge: BridgeConfig,
    pub remote: RemoteConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            credentials_path: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            json_logs: false,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            bridge: BridgeConfig::default(),
            remote: RemoteConfig::default(),
        }
    }
}

impl RelayConfig {
    /// Default config file location, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration and apply environment overrides.
    ///
    /// An explicit `path` must exist. The default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.bridge.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut client = ClientConfig {
            timeout: Duration::from_secs(self.remote.timeout_secs.max(1)),
            page_size: self.remote.page_size.max(1),
            ..ClientConfig::default()
        };
        if let Some(user_agent) = &self.remote.user_agent {
            if HeaderValue::from_str(user_agent).is_ok() {
                client.user_agent = user_agent.clone();
            } else {
                warn!(%user_agent, "Ignoring invalid user agent");
            }
        }
        client
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            mailbox_capacity: self.mailbox_capacity.max(1),
            ..CoordinatorConfig::default()
        }
    }

    /// Open the configured credential store, or the default one.
    pub fn credential_store(&self) -> Result<FileCredentialStore> {
        match &self.credentials_path {
            Some(path) => Ok(FileCredentialStore::new(path)),
            None => Ok(FileCredentialStore::default_location()?),
        }
    }
}
