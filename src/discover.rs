//! Pack discovery: locating packs, reading manifests, and listing images.
//!
//! ## Directory Structure
//!
//! A packs root holds one directory per pack. Only directories with a
//! `manifest.json` count as packs:
//!
//! ```text
//! packs/                                  # Root passed to `find_pack_directories`
//! ├── italian/
//! │   ├── manifest.json                   # Pack identity and descriptions
//! │   ├── defaults.json                   # token → image choice per category
//! │   └── major_system/
//! │       └── images/
//! │           ├── numbers/                # Category
//! │           │   ├── 00_sasso.png        # Token "00"
//! │           │   ├── 00_sedia.png        # Same token, alternative image
//! │           │   └── 01_te.webp
//! │           └── letters_upper/
//! │               └── A_ape.jpg
//! ├── spanish/
//! │   └── manifest.json
//! └── scratch/                            # No manifest → not a pack
//! ```
//!
//! Discovery never fails for a missing manifest or images directory; those are
//! reported as `None` or an empty map so a batch can carry on with other packs.

use crate::types::Manifest;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Name of the manifest file at the root of every pack.
pub const MANIFEST_FILENAME: &str = "manifest.json";

/// Path of the images root relative to the pack directory.
pub const IMAGES_SUBPATH: &[&str] = &["major_system", "images"];

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Category name → image filenames, sorted by filename.
///
/// Categories are the immediate subdirectories of the images root, in sorted
/// order. Built fresh on every call, never persisted.
pub type CategorizedImages = BTreeMap<String, Vec<String>>;

/// Every immediate subdirectory of `root` that contains a manifest file,
/// sorted by path.
pub fn find_pack_directories(root: &Path) -> Result<Vec<PathBuf>, DiscoverError> {
    if !root.is_dir() {
        return Err(DiscoverError::DirectoryNotFound(root.to_path_buf()));
    }

    let mut packs: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir() && p.join(MANIFEST_FILENAME).is_file())
        .collect();

    packs.sort();
    debug!(root = %root.display(), count = packs.len(), "discovered pack directories");
    Ok(packs)
}

/// Read and parse `manifest.json` from a pack directory.
///
/// Returns `None` when the file is absent or unreadable. Parse failures are
/// logged and treated the same as absence.
pub fn read_manifest(pack_dir: &Path) -> Option<Manifest> {
    let manifest_path = pack_dir.join(MANIFEST_FILENAME);
    if !manifest_path.is_file() {
        return None;
    }

    let content = match fs::read_to_string(&manifest_path) {
        Ok(c) => c,
        Err(e) => {
            warn!(path = %manifest_path.display(), "error reading manifest: {e}");
            return None;
        }
    };
    match parse_manifest(&content) {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(path = %manifest_path.display(), "error parsing manifest: {e}");
            None
        }
    }
}

/// A manifest must be a JSON object. Serde would otherwise accept an array
/// as a positional struct and fill the gaps with defaults.
fn parse_manifest(content: &str) -> Result<Manifest, serde_json::Error> {
    match serde_json::from_str::<Value>(content)? {
        value @ Value::Object(_) => serde_json::from_value(value),
        other => Err(serde::de::Error::custom(format!(
            "expected a JSON object, found {other}"
        ))),
    }
}

/// Path of the images root for a pack.
pub fn images_root(pack_dir: &Path) -> PathBuf {
    IMAGES_SUBPATH
        .iter()
        .fold(pack_dir.to_path_buf(), |path, part| path.join(part))
}

/// List image files per category under the pack's images root.
///
/// Only files with an allowed extension (case-insensitive) are kept, and
/// categories left with no images are omitted. A missing images root yields an
/// empty map.
pub fn discover_images(pack_dir: &Path) -> CategorizedImages {
    let mut result = CategorizedImages::new();
    let root = images_root(pack_dir);

    let entries = match fs::read_dir(&root) {
        Ok(entries) => entries,
        Err(_) => return result,
    };

    for category_path in entries.filter_map(|e| e.ok()).map(|e| e.path()) {
        if !category_path.is_dir() {
            continue;
        }
        let Some(category) = category_path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let images = list_images(&category_path);
        if !images.is_empty() {
            debug!(category, count = images.len(), "found images");
            result.insert(category.to_string(), images);
        }
    }

    result
}

fn list_images(category_path: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(category_path) else {
        return Vec::new();
    };

    let mut images: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| is_image(p))
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .filter(|name| !name.is_empty())
        .collect();

    images.sort();
    images
}

fn is_image(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}
