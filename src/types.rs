//! Documents shared across the pipeline.
//!
//! All of them are flat JSON: a pack's `manifest.json`, and the master index
//! (`packs.json`) written next to the archives. Missing string fields default
//! to empty so hand-edited files with gaps still load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A pack's `manifest.json`. Read-only to the pipeline.
///
/// The identity of a published pack is `(international_name, version)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    pub international_name: String,
    pub native_name: String,
    pub description: String,
    pub native_description: String,
    pub version: String,
    pub language_code: String,
    pub author: String,
}

/// One published pack version in the master index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogEntry {
    pub international_name: String,
    pub native_name: String,
    pub description: String,
    pub native_description: String,
    pub version: String,
    pub language_code: String,
    pub author: String,
    /// Archive filename inside the output directory.
    pub filename: String,
    /// Archive size in bytes.
    pub file_size: u64,
    pub download_url: String,
}

impl CatalogEntry {
    /// Entry for a freshly archived pack.
    pub fn from_manifest(
        manifest: &Manifest,
        filename: String,
        file_size: u64,
        download_url: String,
    ) -> Self {
        Self {
            international_name: manifest.international_name.clone(),
            native_name: manifest.native_name.clone(),
            description: manifest.description.clone(),
            native_description: manifest.native_description.clone(),
            version: manifest.version.clone(),
            language_code: manifest.language_code.clone(),
            author: manifest.author.clone(),
            filename,
            file_size,
            download_url,
        }
    }

    /// The `(international_name, version)` pair identifying a pack version.
    pub fn identity(&self) -> (&str, &str) {
        (&self.international_name, &self.version)
    }
}

/// The master index (`packs.json`).
///
/// `packs` is always kept sorted by `international_name` using plain string
/// ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Unix epoch when absent, so an index missing only its timestamp keeps
    /// its entries.
    #[serde(default)]
    pub last_updated: DateTime<Utc>,
    #[serde(default)]
    pub packs: Vec<CatalogEntry>,
}

impl Catalog {
    /// An empty index stamped with `now`.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            last_updated: now,
            packs: Vec::new(),
        }
    }

    /// Stable sort by `international_name`; versions of the same pack keep
    /// their relative order.
    pub fn sort_packs(&mut self) {
        self.packs
            .sort_by(|a, b| a.international_name.cmp(&b.international_name));
    }
}
