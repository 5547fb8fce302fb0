//! Configuration types and loading
//!
//! Precedence: env vars > config file > defaults. The config file itself is
//! optional unless its path was given explicitly (`--config` or CONFIG_PATH).

use anisette::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, EndpointOverrides};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name, looked up in the working directory.
const DEFAULT_CONFIG_FILE: &str = "anisette-fetch.toml";

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub anisette: AnisetteConfig,
}

/// Provider selection and request settings
#[derive(Debug, Deserialize)]
pub struct AnisetteConfig {
    /// Delimited endpoint list; replaces the built-in defaults when non-empty
    #[serde(default)]
    pub servers: Option<String>,
    /// Single endpoint tried ahead of the local fallbacks
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for AnisetteConfig {
    fn default() -> Self {
        Self {
            servers: None,
            server: None,
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// A missing file yields defaults unless `required` is set.
    pub fn load(path: &Path, required: bool) -> common::Result<Self> {
        let mut config: Config = if required || path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str(&contents)?
        } else {
            Config::default()
        };

        if config.anisette.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if config.anisette.user_agent.trim().is_empty() {
            return Err(common::Error::Config("user_agent must not be empty".into()));
        }

        // Non-blank env overrides win over the file
        let env = EndpointOverrides::from_env();
        if let Some(servers) = env.servers {
            config.anisette.servers = Some(servers);
        }
        if let Some(server) = env.server {
            config.anisette.server = Some(server);
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    ///
    /// Returns the path and whether it was chosen explicitly.
    pub fn resolve_path(cli_path: Option<&str>) -> (PathBuf, bool) {
        if let Some(p) = cli_path {
            return (PathBuf::from(p), true);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return (PathBuf::from(p), true);
        }
        (PathBuf::from(DEFAULT_CONFIG_FILE), false)
    }

    pub fn overrides(&self) -> EndpointOverrides {
        EndpointOverrides {
            servers: self.anisette.servers.clone(),
            server: self.anisette.server.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.anisette.timeout_secs)
    }
}
