//! Additive synthesis of a pack's `defaults.json`.
//!
//! `defaults.json` records, per category, which image is the default for each
//! token:
//!
//! ```json
//! {
//!   "numbers": {
//!     "00": "00_sasso.png",
//!     "01": "01_te.png"
//!   },
//!   "letters_upper": {
//!     "A": "A_ape.jpg"
//!   }
//! }
//! ```
//!
//! Users edit this file by hand to pick a different image for a token. The
//! synthesizer therefore only ever *adds*: categories and tokens missing from
//! the document are filled in from the images on disk, while any token that
//! already has a value keeps it. Unknown top-level keys pass through
//! untouched. Running it twice on an unchanged pack rewrites the file
//! byte-for-byte.
//!
//! When several images share a token, the first one in filename order becomes
//! the default; the others stay available as alternatives in the pack.

use crate::discover::{self, CategorizedImages};
use crate::naming::{extract_token, normalize_category};
use crate::persist;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum DefaultsError {
    #[error("IO error writing {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
}

/// Name of the defaults document at the root of every pack.
pub const DEFAULTS_FILENAME: &str = "defaults.json";

/// Parsed `defaults.json`: an ordered JSON object.
pub type DefaultsDocument = Map<String, Value>;

/// Outcome of one synthesis run.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultsReport {
    /// The pack has no images; nothing was written.
    NoImages,
    /// The document was rewritten with identical content.
    Unchanged,
    /// New categories or tokens were added.
    Updated(DefaultsChanges),
}

/// What a merge added relative to the previous document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultsChanges {
    /// Category keys that did not exist before.
    pub added_categories: Vec<String>,
    /// Pre-existing categories and the tokens newly added to each.
    pub added_tokens: Vec<(String, Vec<String>)>,
}

impl DefaultsChanges {
    pub fn is_empty(&self) -> bool {
        self.added_categories.is_empty() && self.added_tokens.is_empty()
    }
}

impl fmt::Display for DefaultsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultsReport::NoImages => write!(f, "No images found in pack"),
            DefaultsReport::Unchanged => write!(f, "No changes made to {DEFAULTS_FILENAME}"),
            DefaultsReport::Updated(changes) => {
                let tokens: usize = changes.added_tokens.iter().map(|(_, t)| t.len()).sum();
                write!(
                    f,
                    "{DEFAULTS_FILENAME} updated: {} new categor{}, {} new token(s)",
                    changes.added_categories.len(),
                    if changes.added_categories.len() == 1 { "y" } else { "ies" },
                    tokens
                )
            }
        }
    }
}

/// Create or extend `defaults.json` for a pack from the images on disk.
pub fn synthesize_defaults(pack_dir: &Path) -> Result<DefaultsReport, DefaultsError> {
    let images = discover::discover_images(pack_dir);
    if images.is_empty() {
        info!(pack = %pack_dir.display(), "no images found, leaving defaults untouched");
        return Ok(DefaultsReport::NoImages);
    }

    let path = pack_dir.join(DEFAULTS_FILENAME);
    let existing = load_defaults(&path);
    let merged = merge_defaults(&existing, &images);

    persist::write_json(&path, &merged).map_err(|e| DefaultsError::Io(path.clone(), e))?;

    let changes = diff_defaults(&existing, &merged);
    if changes.is_empty() {
        info!(path = %path.display(), "defaults unchanged");
        Ok(DefaultsReport::Unchanged)
    } else {
        info!(
            path = %path.display(),
            categories = ?changes.added_categories,
            "defaults updated"
        );
        Ok(DefaultsReport::Updated(changes))
    }
}

/// Load a defaults document, treating absence or malformed content as empty.
pub fn load_defaults(path: &Path) -> DefaultsDocument {
    let Ok(content) = fs::read_to_string(path) else {
        return DefaultsDocument::new();
    };
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(doc)) => doc,
        _ => {
            warn!(path = %path.display(), "defaults is not a JSON object, starting fresh");
            DefaultsDocument::new()
        }
    }
}

/// Merge discovered images into a copy of `existing`.
///
/// Categories are keyed by their normalized name. For every token without a
/// value yet, the first image carrying that token is chosen. Existing values
/// are never replaced, and a category whose existing value is not an object is
/// left as it is.
pub fn merge_defaults(existing: &DefaultsDocument, images: &CategorizedImages) -> DefaultsDocument {
    let mut merged = existing.clone();

    for (category, files) in images {
        let key = normalize_category(category);
        let slot = merged
            .entry(key.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(tokens) = slot else {
            warn!(category = %key, "category in defaults is not an object, skipping");
            continue;
        };

        for file in files {
            let Some(token) = extract_token(file) else {
                continue;
            };
            if !tokens.contains_key(token) {
                tokens.insert(token.to_string(), Value::String(file.clone()));
            }
        }
    }

    merged
}

/// Categories and tokens present in `new` but not in `old`, in document order.
pub fn diff_defaults(old: &DefaultsDocument, new: &DefaultsDocument) -> DefaultsChanges {
    let mut changes = DefaultsChanges::default();

    for (category, value) in new {
        let Some(old_value) = old.get(category) else {
            changes.added_categories.push(category.clone());
            continue;
        };
        let (Some(old_tokens), Some(new_tokens)) = (old_value.as_object(), value.as_object()) else {
            continue;
        };
        let added: Vec<String> = new_tokens
            .keys()
            .filter(|token| !old_tokens.contains_key(*token))
            .cloned()
            .collect();
        if !added.is_empty() {
            changes.added_tokens.push((category.clone(), added));
        }
    }

    changes
}
