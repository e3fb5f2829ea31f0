use crate::errors::ConfigError;
use crate::utils::{expand_tilde, precog_dir};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `api.base_url`
pub const API_URL_ENV: &str = "API_URL";

/// Wallet settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Name of the wallet directory used to sign challenges
    #[serde(default)]
    pub name: Option<String>,

    /// Directory holding the wallets (default: ~/.bittensor/wallets)
    #[serde(default = "default_wallet_path")]
    pub path: String,
}

fn default_wallet_path() -> String {
    "~/.bittensor/wallets".to_string()
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            name: None,
            path: default_wallet_path(),
        }
    }
}

/// Remote API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Request timeout (seconds)
    #[serde(default = "default_timeout_sec")]
    pub timeout_sec: u64,
}

fn default_api_base_url() -> String {
    "https://precog-api.example.com".to_string()
}

fn default_timeout_sec() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_sec: default_timeout_sec(),
        }
    }
}

/// Token persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_file")]
    pub token_file: String,
}

fn default_token_file() -> String {
    "~/.precog/tokens.json".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
        }
    }
}

/// External signing command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignerConfig {
    #[serde(default)]
    pub command: Option<String>,

    #[serde(default)]
    pub args: Vec<String>,
}

/// Pagination pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Pause between page requests (milliseconds)
    #[serde(default = "default_page_delay_ms")]
    pub delay_ms: u64,

    /// Stop after this many pages. Unbounded when unset.
    #[serde(default)]
    pub max_pages: Option<u32>,
}

fn default_page_delay_ms() -> u64 {
    150
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_page_delay_ms(),
            max_pages: None,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log to this file instead of stderr
    #[serde(default)]
    pub file_path: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub wallet: WalletConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub signer: SignerConfig,

    #[serde(default)]
    pub pagination: PaginationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// True once a wallet has been chosen
    pub fn is_configured(&self) -> bool {
        self.wallet.name.as_deref().is_some_and(|n| !n.is_empty())
    }

    pub fn api_base_url(&self) -> &str {
        self.api.base_url.trim_end_matches('/')
    }

    pub fn token_file(&self) -> PathBuf {
        expand_tilde(&self.auth.token_file)
    }

    pub fn wallet_path(&self) -> PathBuf {
        expand_tilde(&self.wallet.path)
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }

    pub fn log_file_path(&self) -> &Option<String> {
        &self.logging.file_path
    }

    /// Checks values serde cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        url::Url::parse(&self.api.base_url).map_err(|e| ConfigError::ValidationError {
            reason: format!("invalid api.base_url '{}': {}", self.api.base_url, e),
        })?;

        if self.api.timeout_sec == 0 {
            return Err(ConfigError::ValidationError {
                reason: "api.timeout_sec must be greater than 0".to_string(),
            });
        }

        if self.auth.token_file.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                reason: "auth.token_file must not be empty".to_string(),
            });
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV)
            && !url.trim().is_empty()
        {
            tracing::debug!("Using API URL from {}", API_URL_ENV);
            self.api.base_url = url;
        }
    }
}

/// Default config file location (~/.precog/config.toml)
pub fn config_file_path() -> PathBuf {
    precog_dir().join("config.toml")
}

/// Loads the config file, falling back to defaults when it does not exist
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);

    let mut config = if config_path.exists() {
        let contents =
            fs::read_to_string(&config_path).map_err(|e| ConfigError::LoadError { source: e })?;
        toml::from_str(&contents)?
    } else {
        Config::default()
    };

    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Writes the config file, creating its directory if needed
pub fn save_config(config: &Config, path: Option<&Path>) -> Result<(), ConfigError> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);

    if let Some(parent_dir) = config_path.parent()
        && !parent_dir.as_os_str().is_empty()
        && !parent_dir.exists()
    {
        fs::create_dir_all(parent_dir).map_err(|e| ConfigError::WriteError { source: e })?;
    }

    let contents = toml::to_string_pretty(config)?;
    fs::write(config_path, contents).map_err(|e| ConfigError::WriteError { source: e })?;
    Ok(())
}
