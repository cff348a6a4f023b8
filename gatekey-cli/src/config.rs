//! CLI configuration file.
//!
//! ```toml
//! app_id = "https://example.com"
//! trusted_facets = ["https://example.com", "https://login.example.com"]
//! challenge_timeout_secs = 300
//! trusted_issuers = ["CN=Yubico U2F Root CA Serial 457200631"]
//! store = "/var/lib/gatekey/devices.toml"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gatekey_auth::config::DEFAULT_CHALLENGE_TIMEOUT_SECS;
use gatekey_auth::{Config, SystemEnv, TrustedIssuers};
use serde::{Deserialize, Serialize};

/// Settings read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// App ID challenges are issued for.
    pub app_id: Option<String>,
    /// Accepted browser origins. Defaults to the app ID alone.
    pub trusted_facets: Vec<String>,
    /// Challenge lifetime in seconds; 0 disables expiry.
    pub challenge_timeout_secs: u64,
    /// Accepted attestation issuers; empty accepts any certificate.
    pub trusted_issuers: Vec<String>,
    /// Device store location.
    pub store: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            app_id: None,
            trusted_facets: Vec::new(),
            challenge_timeout_secs: DEFAULT_CHALLENGE_TIMEOUT_SECS.unsigned_abs(),
            trusted_issuers: Vec::new(),
            store: None,
        }
    }
}

impl CliConfig {
    /// Load the configuration.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// read if present and defaults are used otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (Self::default_path()?, false),
        };

        if !path.exists() {
            if required {
                anyhow::bail!("Config file {} does not exist", path.display());
            }
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        let config: CliConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config at {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Get the path to the default config file.
    fn default_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// The configured app ID.
    pub fn app_id(&self) -> Result<&str> {
        self.app_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .context("No app ID configured (set app_id in the config file or pass --app-id)")
    }

    /// Trusted facets, falling back to the app ID.
    pub fn facets(&self) -> Result<Vec<String>> {
        if self.trusted_facets.is_empty() {
            Ok(vec![self.app_id()?.to_string()])
        } else {
            Ok(self.trusted_facets.clone())
        }
    }

    /// Challenge lifetime, `None` when expiry is disabled.
    pub fn challenge_timeout(&self) -> Option<chrono::Duration> {
        if self.challenge_timeout_secs == 0 {
            return None;
        }
        i64::try_from(self.challenge_timeout_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
    }

    /// Device store location, falling back to the data directory.
    pub fn store_path(&self) -> Result<PathBuf> {
        match &self.store {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("devices.toml")),
        }
    }

    /// Verifier configuration for the library.
    pub fn verifier(&self) -> Config<SystemEnv> {
        let config = Config::new(SystemEnv).with_challenge_timeout(self.challenge_timeout());
        if self.trusted_issuers.is_empty() {
            config
        } else {
            config.with_attestation_policy(TrustedIssuers::new(self.trusted_issuers.iter().cloned()))
        }
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "gatekey", "gatekey")
        .context("Could not determine config directory")
}
