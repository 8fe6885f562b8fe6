//! Configuration module for LabFlow
//!
//! This module handles:
//! - Application configuration (default import mode, preview size, logging)
//! - Import profiles (`.lfprofile`) holding a decoder kind and its settings
//!
//! # App Data Location
//!
//! Application data is stored in the platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.labflow.labflow-rs/`
//! - **macOS**: `~/Library/Application Support/dev.labflow.labflow-rs/`
//! - **Windows**: `%APPDATA%\dev.labflow.labflow-rs\`
//!
//! # Files
//!
//! - `config.toml` - Application configuration
//! - Import profiles (`.lfprofile`) - Saved wherever the user chooses
//!
//! # Example
//!
//! ```ignore
//! use labflow_rs::config::{AppConfig, ImportProfile};
//!
//! let config = AppConfig::load_or_default();
//! let profile = ImportProfile::load("int32.lfprofile")?;
//! let (mut filter, warnings) = profile.build_filter();
//! ```

use crate::error::{LabFlowError, Result, ResultExt};
use crate::import::{AttributeSet, FileFilter, FilterKind};
use crate::types::ImportMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.labflow.labflow-rs";

/// Configuration filename
pub const CONFIG_FILE: &str = "config.toml";

/// Import profile file extension
pub const PROFILE_FILE_EXTENSION: &str = "lfprofile";

/// Profiles with this extension are stored as JSON instead of TOML
pub const JSON_PROFILE_EXTENSION: &str = "json";

/// Default number of rows shown by a preview
pub const DEFAULT_PREVIEW_LINES: usize = 100;

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        LabFlowError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            LabFlowError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== App Config ====================

/// Persistent application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version for future migration support
    #[serde(default = "default_config_version")]
    pub version: u32,

    /// Mode used when an import does not specify one
    #[serde(default)]
    pub default_import_mode: ImportMode,

    /// Rows shown by `preview`
    #[serde(default = "default_preview_lines")]
    pub preview_lines: usize,

    /// `tracing` filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Also write logs to this file
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_config_version() -> u32 {
    1
}

fn default_preview_lines() -> usize {
    DEFAULT_PREVIEW_LINES
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            default_import_mode: ImportMode::Replace,
            preview_lines: DEFAULT_PREVIEW_LINES,
            log_filter: default_log_filter(),
            log_file: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let path = config_path().ok_or_else(|| {
            LabFlowError::Config("Could not determine config path".to_string())
        })?;

        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration, returning defaults on any error
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LabFlowError::Config(format!("Failed to read config {:?}: {}", path, e))
        })?;

        toml::from_str(&content).map_err(|e| {
            LabFlowError::Config(format!("Failed to parse config {:?}: {}", path, e))
        })
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        let dir = ensure_app_data_dir()?;
        self.save_to(dir.join(CONFIG_FILE))
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| {
            LabFlowError::Config(format!("Failed to write config {:?}: {}", path, e))
        })
    }
}

// ==================== Import Profile ====================

/// Saved decoder settings
///
/// A profile names the decoder kind and carries its settings in the same
/// flat attribute form the decoders persist themselves to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportProfile {
    /// Profile format version for future compatibility
    #[serde(default = "default_profile_version")]
    pub version: u32,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Decoder the attributes belong to
    pub kind: FilterKind,

    /// Decoder settings
    #[serde(default)]
    pub attributes: AttributeSet,
}

fn default_profile_version() -> u32 {
    1
}

impl ImportProfile {
    /// Capture the current settings of `filter`
    pub fn from_filter(name: impl Into<String>, filter: &dyn FileFilter) -> Self {
        let mut attributes = AttributeSet::new();
        filter.save(&mut attributes);
        Self {
            version: 1,
            name: name.into(),
            kind: filter.kind(),
            attributes,
        }
    }

    /// Create a decoder configured from this profile.
    ///
    /// Returns the warnings for every attribute that fell back to its
    /// default.
    pub fn build_filter(&self) -> (Box<dyn FileFilter>, Vec<String>) {
        let mut filter = self.kind.create();
        let warnings = filter.load(&self.attributes);
        (filter, warnings)
    }

    /// Load a profile from disk (JSON for `.json`, TOML otherwise)
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LabFlowError::Config(format!("Failed to read profile {:?}: {}", path, e))
        })?;

        let parsed = if Self::is_json_file(path) {
            serde_json::from_str(&content).map_err(LabFlowError::from)
        } else {
            toml::from_str(&content).map_err(LabFlowError::from)
        };
        parsed.with_context(|| format!("Failed to parse profile {:?}", path))
    }

    /// Save the profile, as JSON for `.json` paths and TOML otherwise
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = if Self::is_json_file(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self)?
        };
        std::fs::write(path, content).map_err(|e| {
            LabFlowError::Config(format!("Failed to write profile {:?}: {}", path, e))
        })?;
        tracing::info!("Saved import profile to {:?}", path);
        Ok(())
    }

    /// Check if a path has the profile extension
    pub fn is_profile_file(path: impl AsRef<Path>) -> bool {
        path.as_ref()
            .extension()
            .map(|ext| ext == PROFILE_FILE_EXTENSION)
            .unwrap_or(false)
    }

    fn is_json_file(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.eq_ignore_ascii_case(JSON_PROFILE_EXTENSION))
            .unwrap_or(false)
    }
}
