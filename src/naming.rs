//! Centralized filename rules for packs, images, and archives.
//!
//! Every piece of metadata the pipeline derives from a name goes through this
//! module, so the same normalization is applied when an archive is written and
//! when it is later read back by the index rebuild.
//!
//! ## Image tokens
//!
//! Image files are named `<token>_<word>.<ext>`. The token is the short key a
//! category's defaults mapping is indexed by:
//! - `00_sasso.png` → `"00"`
//! - `A_apple.jpg` → `"A"`
//! - `sasso.png` → no token (no underscore)
//! - `_sasso.png` → no token (empty prefix)
//!
//! ## Archive filenames
//!
//! `{international_name}_{version}.tar.gz` with the name lowercased and spaces
//! and dashes turned into underscores:
//! - `"Italian Company-X"` + `"1.0.0-beta"` → `italian_company_x_1.0.0-beta.tar.gz`
//!
//! The index rebuild parses these back by splitting on the *last* underscore:
//! - `italian_company_x_1.0.0-beta.tar.gz` → name="Italian Company X", version="1.0.0-beta"

use std::path::Path;

/// Extension of every artifact the archiver writes.
pub const ARCHIVE_EXTENSION: &str = ".tar.gz";

/// Version assumed for archives whose filename carries none.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Extract the token from an image filename: the part of the stem before the
/// first underscore, provided it is non-empty.
pub fn extract_token(filename: &str) -> Option<&str> {
    if filename.trim().is_empty() {
        return None;
    }
    let stem = Path::new(filename).file_stem()?.to_str()?;
    match stem.find('_') {
        Some(pos) if pos > 0 => Some(&stem[..pos]),
        _ => None,
    }
}

/// Normalize a category directory name into its defaults.json key.
///
/// `"Letters-Upper"` → `"letters_upper"`, `"big numbers"` → `"big_numbers"`.
pub fn normalize_category(category: &str) -> String {
    category.to_lowercase().replace(['-', ' '], "_")
}

/// Deterministic archive filename for a pack version.
pub fn archive_filename(international_name: &str, version: &str) -> String {
    let safe_name = international_name.to_lowercase().replace([' ', '-'], "_");
    let safe_version = version.replace(' ', "_");
    format!("{safe_name}_{safe_version}{ARCHIVE_EXTENSION}")
}

/// Whether a filename has the archive extension (case-insensitive).
pub fn is_archive_filename(filename: &str) -> bool {
    archive_stem(filename).is_some()
}

/// The filename with [`ARCHIVE_EXTENSION`] removed, or `None` if it doesn't
/// carry that extension.
pub fn archive_stem(filename: &str) -> Option<&str> {
    let split = filename.len().checked_sub(ARCHIVE_EXTENSION.len())?;
    if !filename.is_char_boundary(split) {
        return None;
    }
    let (stem, ext) = filename.split_at(split);
    ext.eq_ignore_ascii_case(ARCHIVE_EXTENSION).then_some(stem)
}

/// Result of parsing an archive filename back into catalog identity.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedArchiveName {
    /// Title-cased display name (`"Italian Company X"`).
    pub name: String,
    /// Everything after the last underscore, or [`DEFAULT_VERSION`].
    pub version: String,
}

/// Recover the pack name and version from an archive filename.
///
/// Handles these patterns:
/// - `"italian_1.0.0.tar.gz"` → name="Italian", version="1.0.0"
/// - `"old_church_slavonic_2.1.tar.gz"` → name="Old Church Slavonic", version="2.1"
/// - `"italian.tar.gz"` → name="Italian", version="1.0.0"
/// - `"italian_.tar.gz"` → name="Italian", version="1.0.0"
///
/// Returns `None` for filenames without the archive extension or whose name
/// part is empty.
pub fn parse_archive_filename(filename: &str) -> Option<ParsedArchiveName> {
    let stem = archive_stem(filename)?;
    let (raw_name, version) = match stem.rfind('_') {
        Some(pos) if pos > 0 => {
            let version = &stem[pos + 1..];
            let version = if version.is_empty() {
                DEFAULT_VERSION
            } else {
                version
            };
            (&stem[..pos], version)
        }
        _ => (stem, DEFAULT_VERSION),
    };
    let name = title_case(&raw_name.replace('_', " "));
    if name.trim().is_empty() {
        return None;
    }
    Some(ParsedArchiveName {
        name,
        version: version.to_string(),
    })
}

/// Uppercase the first character of every space-separated word and lowercase
/// the rest. Runs of spaces are kept as-is.
pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Join the configured base URL and an archive filename with exactly one slash.
pub fn download_url(base_url: &str, filename: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_before_first_underscore() {
        assert_eq!(extract_token("00_sasso.png"), Some("00"));
        assert_eq!(extract_token("A_apple.jpg"), Some("A"));
    }

    #[test]
    fn token_stops_at_first_of_several_underscores() {
        assert_eq!(extract_token("12_big_stone.webp"), Some("12"));
    }

    #[test]
    fn no_token_without_underscore() {
        assert_eq!(extract_token("sasso.png"), None);
    }

    #[test]
    fn no_token_when_underscore_leads() {
        assert_eq!(extract_token("_sasso.png"), None);
    }

    #[test]
    fn no_token_for_blank_input() {
        assert_eq!(extract_token(""), None);
        assert_eq!(extract_token("   "), None);
    }

    #[test]
    fn token_without_extension() {
        assert_eq!(extract_token("07_gatto"), Some("07"));
    }

    #[test]
    fn category_normalization() {
        assert_eq!(normalize_category("Letters-Upper"), "letters_upper");
        assert_eq!(normalize_category("big numbers"), "big_numbers");
        assert_eq!(normalize_category("numbers"), "numbers");
    }

    #[test]
    fn archive_filename_simple() {
        assert_eq!(archive_filename("Italian", "1.0.0"), "italian_1.0.0.tar.gz");
    }

    #[test]
    fn archive_filename_handles_special_characters() {
        assert_eq!(
            archive_filename("Italian Company-X", "1.0.0-beta"),
            "italian_company_x_1.0.0-beta.tar.gz"
        );
    }

    #[test]
    fn archive_filename_replaces_spaces_in_version() {
        assert_eq!(archive_filename("Greek", "2 rc1"), "greek_2_rc1.tar.gz");
    }

    #[test]
    fn archive_stem_requires_full_extension() {
        assert_eq!(archive_stem("italian_1.0.0.tar.gz"), Some("italian_1.0.0"));
        assert_eq!(archive_stem("ITALIAN_1.0.0.TAR.GZ"), Some("ITALIAN_1.0.0"));
        assert_eq!(archive_stem("italian_1.0.0.gz"), None);
        assert_eq!(archive_stem("notes.txt"), None);
        assert_eq!(archive_stem("gz"), None);
    }

    #[test]
    fn parse_name_and_version() {
        let p = parse_archive_filename("italian_1.0.0.tar.gz").unwrap();
        assert_eq!(p.name, "Italian");
        assert_eq!(p.version, "1.0.0");
    }

    #[test]
    fn parse_multi_word_name_splits_on_last_underscore() {
        let p = parse_archive_filename("italian_company_x_1.0.0-beta.tar.gz").unwrap();
        assert_eq!(p.name, "Italian Company X");
        assert_eq!(p.version, "1.0.0-beta");
    }

    #[test]
    fn parse_without_version_defaults() {
        let p = parse_archive_filename("italian.tar.gz").unwrap();
        assert_eq!(p.name, "Italian");
        assert_eq!(p.version, DEFAULT_VERSION);
    }

    #[test]
    fn parse_trailing_underscore_defaults_version() {
        let p = parse_archive_filename("italian_.tar.gz").unwrap();
        assert_eq!(p.name, "Italian");
        assert_eq!(p.version, DEFAULT_VERSION);
    }

    #[test]
    fn parse_rejects_other_extensions() {
        assert_eq!(parse_archive_filename("readme.txt"), None);
    }

    #[test]
    fn title_case_lowercases_tail() {
        assert_eq!(title_case("old CHURCH slavonic"), "Old Church Slavonic");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn download_url_trims_trailing_slashes() {
        assert_eq!(
            download_url("https://test.com/packs/", "italian_1.0.0.tar.gz"),
            "https://test.com/packs/italian_1.0.0.tar.gz"
        );
        assert_eq!(
            download_url("https://test.com/packs", "a.tar.gz"),
            "https://test.com/packs/a.tar.gz"
        );
    }
}
