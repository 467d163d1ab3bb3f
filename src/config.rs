//! Builder configuration.
//!
//! Handles loading, validating, and layering the settings every component is
//! constructed with. Three layers are merged, later ones winning key by key:
//!
//! 1. Stock defaults ([`PackSettings::default`])
//! 2. A sparse `packs.toml` (from `--config`, or the working directory)
//! 3. Command-line overrides (`--base-url`, `--output-dir`)
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! base_download_url = "https://yourserver.com/packs/"
//! output_directory = "./output"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Name of the config file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "packs.toml";

/// Settings shared by the archiver and the catalog manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PackSettings {
    /// Prefix for every `download_url` in the master index. A trailing slash
    /// is optional.
    pub base_download_url: String,
    /// Where archives and `packs.json` are written.
    pub output_directory: PathBuf,
}

impl Default for PackSettings {
    fn default() -> Self {
        Self {
            base_download_url: "https://yourserver.com/packs/".to_string(),
            output_directory: PathBuf::from("./output"),
        }
    }
}

impl PackSettings {
    /// Reject settings no component can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_download_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "base_download_url must not be empty".into(),
            ));
        }
        if self.output_directory.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "output_directory must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Command-line values that override file and stock settings.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub base_download_url: Option<String>,
    pub output_directory: Option<PathBuf>,
}

impl SettingsOverrides {
    /// The overrides as a sparse TOML table, or `None` when nothing is set.
    pub fn to_toml(&self) -> Option<toml::Value> {
        let mut table = toml::map::Map::new();
        if let Some(url) = &self.base_download_url {
            table.insert("base_download_url".into(), toml::Value::String(url.clone()));
        }
        if let Some(dir) = &self.output_directory {
            table.insert(
                "output_directory".into(),
                toml::Value::String(dir.to_string_lossy().into_owned()),
            );
        }
        (!table.is_empty()).then_some(toml::Value::Table(table))
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default settings as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PackSettings::default()).expect("default settings must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
    Ok(toml::from_str(&content)?)
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_settings(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<PackSettings, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let settings: PackSettings = merged.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from all three layers.
///
/// An explicit `config_file` must exist. Without one, `packs.toml` in the
/// working directory is used if present.
pub fn load_settings(
    config_file: Option<&Path>,
    overrides: &SettingsOverrides,
) -> Result<PackSettings, ConfigError> {
    let file_layer = match config_file {
        Some(path) => Some(load_raw_config(path)?),
        None => {
            let default_path = Path::new(CONFIG_FILENAME);
            if default_path.is_file() {
                Some(load_raw_config(default_path)?)
            } else {
                None
            }
        }
    };
    resolve_settings(
        stock_defaults_value(),
        file_layer.into_iter().chain(overrides.to_toml()),
    )
}

/// Returns a fully-commented stock `packs.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Packs Builder Configuration
# ===========================
# All settings are optional. Values shown below are the defaults.
# Command-line flags (--base-url, --output-dir) override this file.
# Unknown keys will cause an error.

# Prefix for download URLs in packs.json. Archive filenames are appended
# after a single slash, so a trailing slash here is optional.
base_download_url = "https://yourserver.com/packs/"

# Directory that receives the .tar.gz archives and packs.json.
output_directory = "./output"
"##
}
