use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::planner::DEFAULT_MAX_WORKERS;
use crate::store::BwCli;

/// Cross-platform configuration directory manager
pub struct ConfigManager;

impl ConfigManager {
    /// Get the configuration directory path following platform conventions:
    /// - Linux: $XDG_CONFIG_HOME/vault-sync or ~/.config/vault-sync
    /// - macOS: ~/Library/Application Support/vault-sync
    /// - elsewhere: ~/.vault-sync
    pub fn config_dir() -> Result<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
                Ok(PathBuf::from(xdg_config).join("vault-sync"))
            } else {
                let home = dirs::home_dir().context("Failed to get home directory")?;
                Ok(home.join(".config").join("vault-sync"))
            }
        }

        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home
                .join("Library")
                .join("Application Support")
                .join("vault-sync"))
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            let home = dirs::home_dir().context("Failed to get home directory")?;
            Ok(home.join(".vault-sync"))
        }
    }

    /// Get the config file path (config.toml)
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the log file path
    pub fn log_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("vault-sync.log"))
    }

    /// Ensure the configuration directory exists
    pub fn ensure_config_dir() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory: {}", config_dir.display())
        })?;
        Ok(config_dir)
    }
}

/// Top-level planner configuration: one store section per vault plus the
/// comparison worker pool width.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub source: StoreConfig,

    #[serde(default)]
    pub destination: StoreConfig,

    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            source: StoreConfig::default(),
            destination: StoreConfig::default(),
            max_workers: default_max_workers(),
        }
    }
}

/// Connection settings for one vault. Credentials may come from the config
/// file or from environment variables; the environment wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path or name of the bw CLI binary for this vault.
    #[serde(default = "default_bw_cmd")]
    pub bw_cmd: String,

    /// Optional server URL (Vaultwarden compatible).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Master password used to unlock the vault.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

fn default_bw_cmd() -> String {
    "bw".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            bw_cmd: default_bw_cmd(),
            server: None,
            client_id: None,
            client_secret: None,
            password: None,
        }
    }
}

impl SyncConfig {
    /// Load configuration from an explicit path or the default location,
    /// then apply environment variable overrides (`SRC_BW_*` / `DST_BW_*`).
    /// A missing file yields the defaults; credentials are validated at
    /// connect time, not here.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => ConfigManager::config_file_path()?,
        };

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;
            toml::from_str(&content).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })?
        } else {
            Self::default()
        };

        config.source.apply_env("SRC");
        config.destination.apply_env("DST");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        ConfigManager::ensure_config_dir()?;
        let config_path = ConfigManager::config_file_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        Ok(())
    }

    /// Render the effective configuration with secrets replaced, for
    /// `config --show` output.
    pub fn masked(&self) -> Result<String> {
        let mut shown = self.clone();
        shown.source.mask();
        shown.destination.mask();
        toml::to_string_pretty(&shown).context("Failed to render config")
    }
}

impl StoreConfig {
    /// Overlay values from `{prefix}_BW_CLIENT_ID`, `{prefix}_BW_CLIENT_SECRET`,
    /// `{prefix}_BW_PASSWORD`, and `{prefix}_BW_SERVER`.
    fn apply_env(&mut self, prefix: &str) {
        if let Ok(v) = std::env::var(format!("{prefix}_BW_CLIENT_ID")) {
            self.client_id = Some(v);
        }
        if let Ok(v) = std::env::var(format!("{prefix}_BW_CLIENT_SECRET")) {
            self.client_secret = Some(v);
        }
        if let Ok(v) = std::env::var(format!("{prefix}_BW_PASSWORD")) {
            self.password = Some(v);
        }
        if let Ok(v) = std::env::var(format!("{prefix}_BW_SERVER")) {
            self.server = Some(v);
        }
    }

    fn mask(&mut self) {
        for secret in [&mut self.client_secret, &mut self.password] {
            if secret.is_some() {
                *secret = Some("********".to_string());
            }
        }
    }

    /// Log in and unlock this vault, returning a ready client.
    /// `label` names the vault in error messages.
    pub fn connect(&self, label: &str) -> Result<BwCli> {
        let client_id = self.client_id.as_deref().with_context(|| {
            format!("Missing client_id for {label} vault (config file or *_BW_CLIENT_ID)")
        })?;
        let client_secret = self.client_secret.as_deref().with_context(|| {
            format!("Missing client_secret for {label} vault (config file or *_BW_CLIENT_SECRET)")
        })?;
        let password = self.password.as_deref().with_context(|| {
            format!("Missing password for {label} vault (config file or *_BW_PASSWORD)")
        })?;

        let mut client = match &self.server {
            Some(server) => BwCli::with_server(&self.bw_cmd, server)
                .with_context(|| format!("Failed to configure {label} vault server"))?,
            None => BwCli::new(&self.bw_cmd),
        };

        client
            .login_api_key(client_id, client_secret)
            .with_context(|| format!("Failed to log in to {label} vault"))?;
        client
            .unlock(password)
            .with_context(|| format!("Failed to unlock {label} vault"))?;
        Ok(client)
    }
}
