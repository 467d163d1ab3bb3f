//! The master index of published packs (`packs.json`).
//!
//! One index lives in the output directory next to the archives it describes:
//!
//! ```json
//! {
//!   "last_updated": "2024-05-01T12:00:00Z",
//!   "packs": [
//!     {
//!       "international_name": "Italian",
//!       "native_name": "Italiano",
//!       "description": "...",
//!       "native_description": "...",
//!       "version": "1.0.0",
//!       "language_code": "it",
//!       "author": "...",
//!       "filename": "italian_1.0.0.tar.gz",
//!       "file_size": 123456,
//!       "download_url": "https://yourserver.com/packs/italian_1.0.0.tar.gz"
//!     }
//!   ]
//! }
//! ```
//!
//! Two ways to maintain it:
//!
//! - [`CatalogManager::upsert`] records one freshly archived pack, keyed by
//!   `(international_name, version)`, using its manifest for all metadata.
//! - [`CatalogManager::rebuild`] throws the index away and recreates it from
//!   the archive filenames alone. Only names, versions, sizes and URLs can be
//!   recovered that way; descriptions are generated and language/author are
//!   left empty.
//!
//! In both cases `packs` is sorted by `international_name` before saving.

use crate::config::PackSettings;
use crate::discover::read_manifest;
use crate::naming::{self, ParsedArchiveName};
use crate::persist;
use crate::types::{Catalog, CatalogEntry};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error on {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
}

/// Name of the master index inside the output directory.
pub const CATALOG_FILENAME: &str = "packs.json";

/// Reads and writes the master index for one output directory.
#[derive(Debug, Clone)]
pub struct CatalogManager {
    base_download_url: String,
    output_directory: PathBuf,
    clock: fn() -> DateTime<Utc>,
}

impl CatalogManager {
    pub fn new(settings: &PackSettings) -> Self {
        Self::with_clock(settings, Utc::now)
    }

    /// A manager that stamps `last_updated` from `clock` instead of the system time.
    pub fn with_clock(settings: &PackSettings, clock: fn() -> DateTime<Utc>) -> Self {
        Self {
            base_download_url: settings.base_download_url.clone(),
            output_directory: settings.output_directory.clone(),
            clock,
        }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.output_directory.join(CATALOG_FILENAME)
    }

    /// Load the current index. A missing or unparseable file yields an empty
    /// index stamped with the current time.
    pub fn load(&self) -> Catalog {
        let path = self.catalog_path();
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Catalog::empty((self.clock)()),
        };
        match serde_json::from_str(&content) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!(path = %path.display(), "cannot parse master index, starting fresh: {e}");
                Catalog::empty((self.clock)())
            }
        }
    }

    /// Record an archived pack in the index.
    ///
    /// An existing entry with the same `(international_name, version)` is
    /// overwritten in place; otherwise a new entry is added. Returns `None`
    /// without touching the index when the pack has no readable manifest.
    pub fn upsert(
        &self,
        pack_dir: &Path,
        archive_path: &Path,
        size: u64,
    ) -> Result<Option<CatalogEntry>, CatalogError> {
        let Some(manifest) = read_manifest(pack_dir) else {
            warn!(pack = %pack_dir.display(), "no manifest, master index not updated");
            return Ok(None);
        };

        let mut catalog = self.load();
        let filename = archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let url = naming::download_url(&self.base_download_url, &filename);
        let entry = CatalogEntry::from_manifest(&manifest, filename, size, url);

        match catalog
            .packs
            .iter_mut()
            .find(|e| e.identity() == entry.identity())
        {
            Some(existing) => *existing = entry.clone(),
            None => catalog.packs.push(entry.clone()),
        }

        catalog.sort_packs();
        catalog.last_updated = (self.clock)();
        self.save(&catalog)?;

        info!(
            pack = %entry.international_name,
            version = %entry.version,
            "master index updated"
        );
        Ok(Some(entry))
    }

    /// Recreate the index from the archives in the output directory.
    ///
    /// Manifests are not consulted. Returns `None` (and writes nothing) when
    /// the output directory doesn't exist. Archives whose names collapse to the
    /// same `(name, version)` are resolved in filename order, last one wins.
    pub fn rebuild(&self) -> Result<Option<Catalog>, CatalogError> {
        if !self.output_directory.is_dir() {
            warn!(
                dir = %self.output_directory.display(),
                "output directory does not exist, no archives to scan"
            );
            return Ok(None);
        }

        let mut catalog = Catalog::empty((self.clock)());
        for (filename, path) in self.archive_files()? {
            let Some(parsed) = naming::parse_archive_filename(&filename) else {
                continue;
            };
            let size = fs::metadata(&path)
                .map_err(|e| CatalogError::Io(path.clone(), e))?
                .len();
            let entry = self.rebuilt_entry(parsed, filename, size);

            match catalog
                .packs
                .iter_mut()
                .find(|e| e.identity() == entry.identity())
            {
                Some(existing) => {
                    warn!(
                        replaced = %existing.filename,
                        by = %entry.filename,
                        "archives share the same pack name and version"
                    );
                    *existing = entry;
                }
                None => catalog.packs.push(entry),
            }
        }

        catalog.sort_packs();
        self.save(&catalog)?;
        info!(count = catalog.packs.len(), "regenerated master index");
        Ok(Some(catalog))
    }

    /// Archive files in the output directory, sorted by filename.
    fn archive_files(&self) -> Result<Vec<(String, PathBuf)>, CatalogError> {
        let dir = &self.output_directory;
        let entries = fs::read_dir(dir).map_err(|e| CatalogError::Io(dir.clone(), e))?;

        let mut files: Vec<(String, PathBuf)> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .filter_map(|p| {
                let name = p.file_name()?.to_str()?.to_string();
                naming::is_archive_filename(&name).then_some((name, p))
            })
            .collect();

        files.sort();
        Ok(files)
    }

    fn rebuilt_entry(&self, parsed: ParsedArchiveName, filename: String, size: u64) -> CatalogEntry {
        let description = format!("Major system pack for {}", parsed.name);
        CatalogEntry {
            native_name: parsed.name.clone(),
            international_name: parsed.name,
            native_description: description.clone(),
            description,
            version: parsed.version,
            language_code: String::new(),
            author: String::new(),
            download_url: naming::download_url(&self.base_download_url, &filename),
            filename,
            file_size: size,
        }
    }

    fn save(&self, catalog: &Catalog) -> Result<(), CatalogError> {
        let dir = &self.output_directory;
        fs::create_dir_all(dir).map_err(|e| CatalogError::Io(dir.clone(), e))?;
        let path = self.catalog_path();
        persist::write_json(&path, catalog).map_err(|e| CatalogError::Io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn manager(root: &Path) -> CatalogManager {
        CatalogManager::with_clock(&test_settings(root), fixed_now)
    }

    fn upsert_pack(mgr: &CatalogManager, root: &Path, name: &str, version: &str, size: u64) {
        let pack = make_pack(root, &name.to_lowercase(), name, version);
        let archive = root.join("output").join(naming::archive_filename(name, version));
        mgr.upsert(&pack, &archive, size).unwrap().unwrap();
    }

    fn write_archive_stub(root: &Path, filename: &str, content: &str) {
        let out = root.join("output");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join(filename), content).unwrap();
    }

    #[test]
    fn upsert_adds_entry_from_manifest() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path());

        upsert_pack(&mgr, tmp.path(), "Italian", "1.0.0", 1024);

        let catalog = mgr.load();
        assert_eq!(catalog.last_updated, fixed_now());
        assert_eq!(
            catalog.packs,
            vec![CatalogEntry {
                international_name: "Italian".into(),
                native_name: "Italiano".into(),
                description: "Test description".into(),
                native_description: "Descrizione test".into(),
                version: "1.0.0".into(),
                language_code: "it".into(),
                author: "Test Author".into(),
                filename: "italian_1.0.0.tar.gz".into(),
                file_size: 1024,
                download_url: "https://test.com/packs/italian_1.0.0.tar.gz".into(),
            }]
        );
    }

    #[test]
    fn upsert_same_pack_updates_in_place() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path());
        let pack = make_pack(tmp.path(), "italian", "Italian", "1.0.0");

        mgr.upsert(&pack, Path::new("output/italian_1.0.0.tar.gz"), 100)
            .unwrap();
        mgr.upsert(&pack, Path::new("output/renamed.tar.gz"), 250)
            .unwrap();

        let catalog = mgr.load();
        assert_eq!(catalog.packs.len(), 1);
        let entry = &catalog.packs[0];
        assert_eq!(entry.file_size, 250);
        assert_eq!(entry.filename, "renamed.tar.gz");
        assert_eq!(entry.download_url, "https://test.com/packs/renamed.tar.gz");
    }

    #[test]
    fn new_version_is_separate_entry() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path());

        upsert_pack(&mgr, tmp.path(), "Italian", "1.0.0", 100);
        let pack = tmp.path().join("italian");
        write_manifest(&pack, "Italian", "1.1.0");
        mgr.upsert(&pack, Path::new("italian_1.1.0.tar.gz"), 120)
            .unwrap();

        let versions: Vec<_> = mgr.load().packs.into_iter().map(|p| p.version).collect();
        assert_eq!(versions, vec!["1.0.0", "1.1.0"]);
    }

    #[test]
    fn entries_sorted_by_name() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path());

        for name in ["Spanish", "Italian", "English"] {
            upsert_pack(&mgr, tmp.path(), name, "1.0.0", 10);
        }

        let names: Vec<_> = mgr
            .load()
            .packs
            .into_iter()
            .map(|p| p.international_name)
            .collect();
        assert_eq!(names, vec!["English", "Italian", "Spanish"]);
    }

    #[test]
    fn sort_is_ordinal() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path());

        for name in ["italian", "Spanish", "English"] {
            upsert_pack(&mgr, tmp.path(), name, "1.0.0", 10);
        }

        let names: Vec<_> = mgr
            .load()
            .packs
            .into_iter()
            .map(|p| p.international_name)
            .collect();
        assert_eq!(names, vec!["English", "Spanish", "italian"]);
    }

    #[test]
    fn upsert_without_manifest_is_noop() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path());
        let pack = tmp.path().join("empty");
        fs::create_dir_all(&pack).unwrap();

        let result = mgr.upsert(&pack, Path::new("x.tar.gz"), 1).unwrap();

        assert_eq!(result, None);
        assert!(!mgr.catalog_path().exists());
    }

    #[test]
    fn corrupt_index_is_replaced() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path());
        write_archive_stub(tmp.path(), CATALOG_FILENAME, "not json at all");

        upsert_pack(&mgr, tmp.path(), "Italian", "1.0.0", 10);

        let catalog = mgr.load();
        assert_eq!(catalog.packs.len(), 1);
    }

    #[test]
    fn index_without_timestamp_keeps_entries() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path());
        write_archive_stub(
            tmp.path(),
            CATALOG_FILENAME,
            r#"{"packs": [{"international_name": "Greek", "version": "3.0.0"}]}"#,
        );

        upsert_pack(&mgr, tmp.path(), "Italian", "1.0.0", 10);

        let catalog = mgr.load();
        let names: Vec<&str> = catalog
            .packs
            .iter()
            .map(|p| p.international_name.as_str())
            .collect();
        assert_eq!(names, vec!["Greek", "Italian"]);
        assert_eq!(catalog.last_updated, fixed_now());
    }

    #[test]
    fn index_json_shape() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path());

        upsert_pack(&mgr, tmp.path(), "Italian", "1.0.0", 42);

        let json = read_json(&mgr.catalog_path());
        assert_eq!(json["last_updated"], "2024-05-01T12:00:00Z");
        assert_eq!(json["packs"][0]["file_size"], 42);
        assert_eq!(json["packs"][0]["filename"], "italian_1.0.0.tar.gz");
    }

    #[test]
    fn rebuild_from_archive_names() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path());
        write_archive_stub(tmp.path(), "spanish_2.0.0.tar.gz", "bbbbbb");
        write_archive_stub(tmp.path(), "italian_1.0.0.tar.gz", "aaa");
        write_archive_stub(tmp.path(), "notes.txt", "not an archive");

        let catalog = mgr.rebuild().unwrap().unwrap();

        assert_eq!(catalog.packs.len(), 2);
        let italian = &catalog.packs[0];
        assert_eq!(italian.international_name, "Italian");
        assert_eq!(italian.native_name, "Italian");
        assert_eq!(italian.version, "1.0.0");
        assert_eq!(italian.file_size, 3);
        assert_eq!(italian.description, "Major system pack for Italian");
        assert_eq!(italian.language_code, "");
        assert_eq!(italian.author, "");
        assert_eq!(
            italian.download_url,
            "https://test.com/packs/italian_1.0.0.tar.gz"
        );
        let spanish = &catalog.packs[1];
        assert_eq!(spanish.international_name, "Spanish");
        assert_eq!(spanish.version, "2.0.0");
        assert_eq!(spanish.file_size, 6);

        assert_eq!(mgr.load(), catalog);
    }

    #[test]
    fn rebuild_discards_previous_index() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path());
        upsert_pack(&mgr, tmp.path(), "Greek", "3.0.0", 10);
        write_archive_stub(tmp.path(), "old_church_slavonic_1.2.tar.gz", "x");

        let catalog = mgr.rebuild().unwrap().unwrap();

        let names: Vec<_> = catalog
            .packs
            .iter()
            .map(|p| p.international_name.as_str())
            .collect();
        assert_eq!(names, vec!["Old Church Slavonic"]);
    }

    #[test]
    fn rebuild_without_output_directory_is_noop() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path());

        assert_eq!(mgr.rebuild().unwrap(), None);
        assert!(!tmp.path().join("output").exists());
    }

    #[test]
    fn rebuild_duplicate_identity_last_wins() {
        let tmp = TempDir::new().unwrap();
        let mgr = manager(tmp.path());
        write_archive_stub(tmp.path(), "Italian_1.0.0.tar.gz", "a");
        write_archive_stub(tmp.path(), "italian_1.0.0.tar.gz", "abcd");

        let catalog = mgr.rebuild().unwrap().unwrap();

        assert_eq!(catalog.packs.len(), 1);
        assert_eq!(catalog.packs[0].filename, "italian_1.0.0.tar.gz");
        assert_eq!(catalog.packs[0].file_size, 4);
    }
}
