//! Settings document store
//!
//! Loads and saves the per-job settings JSON document. The document is
//! owned by the external admin surface; the dispatcher only reads it, once
//! per cycle. A missing document is not an error (nothing enabled yet), a
//! malformed one is: silently running with defaults would mask an operator
//! mistake.

use anyhow::{Context, Result};
use junkai_core::settings::DispatchSettings;
use std::path::{Path, PathBuf};
use tracing::warn;

/// File-backed settings document
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document, or defaults when it does not exist yet.
    pub fn load(&self) -> Result<DispatchSettings> {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "settings document missing, using defaults");
            return Ok(DispatchSettings::default());
        }

        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read settings from {}", self.path.display()))?;

        serde_json::from_str(&raw)
            .with_context(|| format!("malformed settings document at {}", self.path.display()))
    }

    /// Writes the document back, creating parent directories as needed.
    /// Used by the admin surface, not by the dispatch cycle.
    pub fn save(&self, settings: &DispatchSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create settings directory {}", parent.display())
            })?;
        }

        let raw = serde_json::to_string_pretty(settings).context("failed to encode settings")?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write settings to {}", self.path.display()))
    }
}
