//! Dispatcher configuration
//!
//! Process-level settings loaded from the environment: store connection,
//! settings document path, ledger directory, and the degraded-mode
//! fallback device id. Per-job knobs live in the settings document
//! instead (see [`crate::settings`]).

use std::path::PathBuf;

/// Dispatcher process configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Record store base URL (e.g., "https://store.example.com")
    pub store_url: String,

    /// Record store API key
    pub store_key: String,

    /// Path of the per-job settings JSON document
    pub settings_path: PathBuf,

    /// Directory holding the per-job execution ledgers
    pub ledger_dir: PathBuf,

    /// Device id used when the device query fails (degraded mode).
    /// An explicit, injected value rather than a buried constant, so
    /// deployments can point it at their own test device.
    pub fallback_device_id: String,
}

/// Default fallback device, a long-lived test device of the platform.
const DEFAULT_FALLBACK_DEVICE_ID: &str = "9f7d6e27-98c3-4c19-bdfb-f7fda58b9a93";

impl Config {
    /// Creates a configuration with defaults for everything but the store
    /// connection
    pub fn new(store_url: String, store_key: String) -> Self {
        Self {
            store_url,
            store_key,
            settings_path: PathBuf::from("/var/lib/junkai/settings.json"),
            ledger_dir: PathBuf::from("/var/log/junkai"),
            fallback_device_id: DEFAULT_FALLBACK_DEVICE_ID.to_string(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - STORE_URL (required)
    /// - STORE_KEY (required)
    /// - SETTINGS_PATH (optional, default: /var/lib/junkai/settings.json)
    /// - LEDGER_DIR (optional, default: /var/log/junkai)
    /// - FALLBACK_DEVICE_ID (optional)
    pub fn from_env() -> anyhow::Result<Self> {
        let store_url = std::env::var("STORE_URL")
            .map_err(|_| anyhow::anyhow!("STORE_URL environment variable not set"))?;

        let store_key = std::env::var("STORE_KEY")
            .map_err(|_| anyhow::anyhow!("STORE_KEY environment variable not set"))?;

        let mut config = Self::new(store_url, store_key);

        if let Ok(path) = std::env::var("SETTINGS_PATH") {
            config.settings_path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("LEDGER_DIR") {
            config.ledger_dir = PathBuf::from(dir);
        }
        if let Ok(device_id) = std::env::var("FALLBACK_DEVICE_ID") {
            config.fallback_device_id = device_id;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store_url.is_empty() {
            anyhow::bail!("store_url cannot be empty");
        }

        if !self.store_url.starts_with("http://") && !self.store_url.starts_with("https://") {
            anyhow::bail!("store_url must start with http:// or https://");
        }

        if self.store_key.is_empty() {
            anyhow::bail!("store_key cannot be empty");
        }

        if self.fallback_device_id.is_empty() {
            anyhow::bail!("fallback_device_id cannot be empty");
        }

        Ok(())
    }
}
