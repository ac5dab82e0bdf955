//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$INLINEPGP_CONFIG` (environment variable)
//! 2. `~/.config/inlinepgp/config.toml` (Linux/macOS)
//!    `%APPDATA%\inlinepgp\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::message::{HashAlgorithm, Preferences};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Crypto backend settings.
    pub backend: BackendConfig,
    /// Received-message display settings.
    pub display: DisplayConfig,
    /// Send-time policy preferences.
    pub send: SendConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// UI language code ("en", "es"). Empty means system locale.
    pub lang: String,
}

/// Crypto backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Set to false to disable all PGP handling.
    pub enabled: bool,
    /// The gpg-compatible program to run.
    pub program: PathBuf,
    /// Optional `--homedir` for the keyring.
    pub homedir: Option<PathBuf>,
}

/// Received-message display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Charset assumed for message bodies when none is known.
    pub default_charset: String,
    /// Heads with more lines than this get a "shown partially" notice.
    pub over_long_head_threshold: usize,
}

/// Send-time policy preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SendConfig {
    /// Pass `always trust` to the backend when encrypting.
    pub always_trust_send: bool,
    /// Always add the sender's own key as a recipient.
    pub encrypt_to_self: bool,
    /// Ask for confirmation before sending a protected message.
    pub confirm_before_send: bool,
    /// Hash algorithm for PGP/MIME signatures: "default", "sha1", "sha256", ...
    pub mime_hash_algorithm: HashAlgorithm,
    /// Column width used to wrap sign-only inline messages.
    pub wrap_width: usize,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
            lang: String::new(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            program: PathBuf::from("gpg"),
            homedir: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_charset: "UTF-8".to_string(),
            over_long_head_threshold: 10,
        }
    }
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            always_trust_send: false,
            encrypt_to_self: true,
            confirm_before_send: false,
            mime_hash_algorithm: HashAlgorithm::Default,
            wrap_width: 72,
        }
    }
}

impl SendConfig {
    /// The resolver's view of these settings.
    pub fn preferences(&self) -> Preferences {
        Preferences {
            always_trust_send: self.always_trust_send,
            encrypt_to_self: self.encrypt_to_self,
            confirm_before_send: self.confirm_before_send,
            mime_hash_algorithm: self.mime_hash_algorithm,
            wrap_width: self.wrap_width,
        }
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    match config_file_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Config::default(),
    }
}

/// Load configuration from an explicit path, falling back to defaults.
pub fn load_config_from(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(cfg) => {
                tracing::info!(path = %path.display(), "Loaded config");
                cfg
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to parse config, using defaults"
                );
                Config::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to read config file, using defaults"
            );
            Config::default()
        }
    }
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("INLINEPGP_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("inlinepgp").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("inlinepgp")
}
