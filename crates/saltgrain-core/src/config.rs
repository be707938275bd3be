//! Saltgrain configuration
//!
//! Loaded from TOML once at startup. Secrets may come from the environment
//! instead of the file. After `validate()` the credentials are handed out as
//! immutable values and never change for the life of the process.

use crate::error::{Error, Result};
use crate::types::{Credentials, InventoryCredentials};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_SSH_PRIVATE_KEY: &str = "SALTGRAIN_SSH_PRIVATE_KEY";
pub const ENV_INVENTORY_PASSWORD: &str = "SALTGRAIN_INVENTORY_PASSWORD";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaltgrainConfig {
    /// Remote shell login used for every minion.
    pub ssh: SshConfig,
    /// Fleet-inventory service that decides whether a minion is accepted.
    pub inventory: InventoryConfig,
    /// Post-mutation `state.apply` behaviour.
    pub convergence: ConvergenceConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    pub username: String,
    /// Inline private key (PEM / OpenSSH format). Wins over `private_key_path`.
    pub private_key: String,
    pub private_key_path: Option<PathBuf>,
    /// Skip host-key verification. When false, keys are checked against
    /// the invoking user's `known_hosts`.
    pub accept_unknown_host_keys: bool,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    pub base_url: String,
    pub login: String,
    pub password: String,
    /// Skip TLS certificate validation against the inventory service.
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceConfig {
    /// Upper bound on busy probes before giving up. Unset or 0 waits forever
    /// for an in-flight `state.apply` to finish.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_busy_checks: Option<u32>,
    /// Pause between busy probes.
    pub busy_poll_secs: u64,
    /// Host-side file that accumulates `state.apply` output.
    pub log_path: String,
    /// Lines of that log returned to the caller after a run.
    pub log_tail_lines: usize,
}

// ============================================================
// Defaults
// ============================================================

impl Default for SaltgrainConfig {
    fn default() -> Self {
        Self {
            ssh: SshConfig::default(),
            inventory: InventoryConfig::default(),
            convergence: ConvergenceConfig::default(),
        }
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            username: "root".into(),
            private_key: String::new(),
            private_key_path: Some(PathBuf::from("~/.ssh/id_ed25519")),
            accept_unknown_host_keys: true,
        }
    }
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://uyuni.example.com/rhn/manager/api".into(),
            login: String::new(),
            password: String::new(),
            accept_invalid_certs: true,
        }
    }
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            max_busy_checks: None,
            busy_poll_secs: 1,
            log_path: crate::codec::STATE_APPLY_LOG.into(),
            log_tail_lines: 50,
        }
    }
}

impl std::fmt::Debug for SshConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshConfig")
            .field("username", &self.username)
            .field("private_key", &if self.private_key.is_empty() { "" } else { "<redacted>" })
            .field("private_key_path", &self.private_key_path)
            .field("accept_unknown_host_keys", &self.accept_unknown_host_keys)
            .finish()
    }
}

impl std::fmt::Debug for InventoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryConfig")
            .field("base_url", &self.base_url)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

// ============================================================
// Loading
// ============================================================

impl SaltgrainConfig {
    /// Load config from a TOML file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env();
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("invalid config: {}", e)))
    }

    /// Write the current config as TOML (for generating a starter file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Overlay secrets from `lookup` (the process environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(ENV_SSH_PRIVATE_KEY).filter(|v| !v.is_empty()) {
            self.ssh.private_key = key;
        }
        if let Some(password) = lookup(ENV_INVENTORY_PASSWORD).filter(|v| !v.is_empty()) {
            self.inventory.password = password;
        }
    }

    /// Check every required field and that the private key parses.
    pub fn validate(&self) -> Result<()> {
        if self.ssh.username.trim().is_empty() {
            return Err(Error::Config("ssh.username must be set".into()));
        }
        if self.inventory.base_url.trim().is_empty() {
            return Err(Error::Config("inventory.base_url must be set".into()));
        }
        if self.inventory.login.trim().is_empty() {
            return Err(Error::Config("inventory.login must be set".into()));
        }
        if self.inventory.password.is_empty() {
            return Err(Error::Config(format!(
                "inventory.password must be set (or {})",
                ENV_INVENTORY_PASSWORD
            )));
        }
        let key = self.private_key_material()?;
        parse_private_key(&key)?;
        Ok(())
    }

    /// SSH credentials, with key material resolved from file if needed.
    pub fn credentials(&self) -> Result<Credentials> {
        Ok(Credentials::new(
            self.ssh.username.clone(),
            self.private_key_material()?,
        ))
    }

    pub fn inventory_credentials(&self) -> InventoryCredentials {
        InventoryCredentials::new(
            self.inventory.base_url.clone(),
            self.inventory.login.clone(),
            self.inventory.password.clone(),
        )
    }

    fn private_key_material(&self) -> Result<String> {
        if !self.ssh.private_key.is_empty() {
            return Ok(self.ssh.private_key.clone());
        }
        match &self.ssh.private_key_path {
            Some(path) => {
                let path = expand_tilde(path);
                std::fs::read_to_string(&path).map_err(|e| {
                    Error::InvalidCredential(format!(
                        "cannot read private key {}: {}",
                        path.display(),
                        e
                    ))
                })
            }
            None => Err(Error::InvalidCredential(format!(
                "no private key: set ssh.private_key, ssh.private_key_path or {}",
                ENV_SSH_PRIVATE_KEY
            ))),
        }
    }
}

/// Parse private key material, mapping failures to `InvalidCredential`.
pub fn parse_private_key(material: &str) -> Result<russh_keys::key::KeyPair> {
    russh_keys::decode_secret_key(material, None)
        .map_err(|e| Error::InvalidCredential(format!("malformed private key: {}", e)))
}

pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
