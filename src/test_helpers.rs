//! Shared test utilities for the packs-builder test suite.
//!
//! Builds pack directories on disk inside a `TempDir` so each test gets an
//! isolated tree it can mutate freely.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let pack = make_pack(tmp.path(), "italian", "Italian", "1.0.0");
//! add_images(&pack, "numbers", &["00_sasso.png", "01_te.png"]);
//! ```

use crate::config::PackSettings;
use crate::discover::{MANIFEST_FILENAME, images_root};
use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::path::{Path, PathBuf};

// =========================================================================
// Fixture setup
// =========================================================================

/// Create `<root>/<dir_name>` with a manifest for `name` at `version`.
pub fn make_pack(root: &Path, dir_name: &str, name: &str, version: &str) -> PathBuf {
    let pack = root.join(dir_name);
    fs::create_dir_all(&pack).unwrap();
    write_manifest(&pack, name, version);
    pack
}

/// Write a complete manifest with fixed descriptive fields.
pub fn write_manifest(pack: &Path, name: &str, version: &str) {
    let manifest = serde_json::json!({
        "international_name": name,
        "native_name": "Italiano",
        "description": "Test description",
        "native_description": "Descrizione test",
        "version": version,
        "language_code": "it",
        "author": "Test Author",
    });
    fs::write(
        pack.join(MANIFEST_FILENAME),
        serde_json::to_string_pretty(&manifest).unwrap(),
    )
    .unwrap();
}

/// Create empty image files under the pack's images root for one category.
pub fn add_images(pack: &Path, category: &str, files: &[&str]) {
    let dir = images_root(pack).join(category);
    fs::create_dir_all(&dir).unwrap();
    for file in files {
        fs::write(dir.join(file), "").unwrap();
    }
}

/// Settings pointing at `<root>/output` with a test base URL.
pub fn test_settings(root: &Path) -> PackSettings {
    PackSettings {
        base_download_url: "https://test.com/packs/".to_string(),
        output_directory: root.join("output"),
    }
}

// =========================================================================
// Clock and document readers
// =========================================================================

/// A fixed instant for deterministic `last_updated` values.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

/// Parse a JSON file into a generic value. Panics with the path on failure.
pub fn read_json(path: &Path) -> serde_json::Value {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("invalid JSON in {}: {e}", path.display()))
}
