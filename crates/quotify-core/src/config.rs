use serde::Deserialize;
use std::path::Path;

use crate::content::Theme;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub duress: DuressConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Where the single local key-value store lives.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// `"file"` for a JSON file on disk, `"memory"` for a process-local store.
    #[serde(default = "default_storage_mode")]
    pub mode: String,
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_storage_mode() -> String {
    "file".into()
}
fn default_storage_path() -> String {
    "data/quotify.json".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: default_storage_mode(),
            path: default_storage_path(),
        }
    }
}

/// Credential rules and brute-force throttling.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_min_passphrase_len")]
    pub min_passphrase_len: usize,
    /// Consecutive failures before the first lockout.
    #[serde(default = "default_lockout_threshold")]
    pub lockout_threshold: u32,
    /// Upper bound on a single lockout window.
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    /// Pacing delay before a login attempt resolves (0 = none).
    #[serde(default = "default_login_delay_ms")]
    pub login_delay_ms: u64,
}

fn default_min_passphrase_len() -> usize {
    6
}
fn default_lockout_threshold() -> u32 {
    3
}
fn default_max_backoff_secs() -> u64 {
    86_400
}
fn default_login_delay_ms() -> u64 {
    1000
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_passphrase_len: default_min_passphrase_len(),
            lockout_threshold: default_lockout_threshold(),
            max_backoff_secs: default_max_backoff_secs(),
            login_delay_ms: default_login_delay_ms(),
        }
    }
}

/// Panic gesture and sentinel passphrases.
#[derive(Debug, Clone, Deserialize)]
pub struct DuressConfig {
    /// Key chord that wipes the session, e.g. `"ctrl+alt+q"`.
    #[serde(default = "default_chord")]
    pub chord: String,
    /// Passphrases that wipe instead of logging in.
    #[serde(default = "default_sentinels")]
    pub sentinels: Vec<String>,
    /// Optional phrase that wipes when typed anywhere.
    #[serde(default)]
    pub canary_phrase: Option<String>,
}

fn default_chord() -> String {
    "ctrl+alt+q".into()
}
fn default_sentinels() -> Vec<String> {
    vec!["panic".into(), "clear".into()]
}

impl Default for DuressConfig {
    fn default() -> Self {
        Self {
            chord: default_chord(),
            sentinels: default_sentinels(),
            canary_phrase: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_font_size")]
    pub font_size: u16,
}

fn default_font_size() -> u16 {
    16
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            font_size: default_font_size(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback chain: explicit path → ./config/default.toml → hardcoded defaults.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Self {
        if let Some(path) = explicit_path {
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {e}", path.display());
                }
            }
        }

        let default_path = Path::new("config/default.toml");
        if default_path.exists() {
            match Self::load(default_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load default config: {e}");
                }
            }
        }

        tracing::info!("Using hardcoded default configuration");
        Self::default()
    }
}
