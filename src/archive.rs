//! Packaging a pack directory into a single compressed artifact.
//!
//! Each pack version becomes one gzip-compressed tarball in the output
//! directory, named from its manifest (see [`naming::archive_filename`]):
//!
//! ```text
//! output/
//! ├── italian_1.0.0.tar.gz
//! │   └── italian/                 # top-level folder = pack directory name
//! │       ├── manifest.json
//! │       ├── defaults.json
//! │       └── major_system/images/numbers/00_sasso.png
//! └── packs.json
//! ```
//!
//! ## Idempotency
//!
//! An artifact that already exists is never rebuilt or touched: asking for it
//! again returns the size of the file on disk, even if the pack changed since.
//! Publishing a new build requires bumping the manifest version.
//!
//! ## Determinism
//!
//! Entries are added in filename order with normalized headers (mtime 0,
//! uid/gid 0, fixed modes), so an unchanged pack tree always yields the same
//! bytes.
//!
//! ## Failure handling
//!
//! The tarball is streamed into a temp file inside the output directory and
//! renamed into place only once the gzip trailer is written. Any failure drops
//! the temp file, so a half-written archive can never satisfy the idempotency
//! check on the next run.

use crate::config::PackSettings;
use crate::discover::read_manifest;
use crate::naming;
use crate::types::Manifest;
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tar::{Builder, EntryType, Header};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, error, info};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("No manifest.json found in {0}")]
    MissingManifest(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Cannot walk pack directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A finished (or pre-existing) artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchivedPack {
    /// Full path of the archive in the output directory.
    pub path: PathBuf,
    /// Size of the archive in bytes.
    pub size: u64,
    /// `false` when the archive already existed and was left as is.
    pub created: bool,
}

impl ArchivedPack {
    /// The archive's filename, as recorded in the master index.
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Writes pack archives into the configured output directory.
#[derive(Debug, Clone)]
pub struct Archiver {
    output_directory: PathBuf,
}

impl Archiver {
    pub fn new(settings: &PackSettings) -> Self {
        Self {
            output_directory: settings.output_directory.clone(),
        }
    }

    /// Where the archive for `manifest` lives.
    pub fn archive_path(&self, manifest: &Manifest) -> PathBuf {
        self.output_directory.join(naming::archive_filename(
            &manifest.international_name,
            &manifest.version,
        ))
    }

    /// Package `pack_dir` unless its archive already exists.
    ///
    /// Failures are logged here with their cause before being returned, so
    /// batch callers only need to count them.
    pub fn create_archive(&self, pack_dir: &Path) -> Result<ArchivedPack, ArchiveError> {
        let Some(manifest) = read_manifest(pack_dir) else {
            error!(pack = %pack_dir.display(), "no manifest.json found");
            return Err(ArchiveError::MissingManifest(pack_dir.to_path_buf()));
        };

        let output_path = self.archive_path(&manifest);
        let result = self.create_at(pack_dir, &output_path);
        if let Err(e) = &result {
            error!(pack = %pack_dir.display(), "error creating archive: {e}");
        }
        result
    }

    fn create_at(&self, pack_dir: &Path, output_path: &Path) -> Result<ArchivedPack, ArchiveError> {
        fs::create_dir_all(&self.output_directory)?;

        if let Ok(meta) = fs::metadata(output_path)
            && meta.is_file()
        {
            info!(
                archive = %output_path.display(),
                size = meta.len(),
                "archive already exists"
            );
            return Ok(ArchivedPack {
                path: output_path.to_path_buf(),
                size: meta.len(),
                created: false,
            });
        }

        let size = write_archive(pack_dir, output_path)?;
        info!(archive = %output_path.display(), size, "created archive");
        Ok(ArchivedPack {
            path: output_path.to_path_buf(),
            size,
            created: true,
        })
    }
}

/// Stream `pack_dir` into a tarball at `output_path` and return its size.
fn write_archive(pack_dir: &Path, output_path: &Path) -> Result<u64, ArchiveError> {
    let root_name = root_folder_name(pack_dir);
    let staging_dir = match output_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let staging = NamedTempFile::new_in(staging_dir)?;
    let encoder = GzEncoder::new(staging, Compression::best());
    let mut builder = Builder::new(encoder);

    append_tree(&mut builder, pack_dir, &root_name)?;

    let encoder = builder.into_inner()?;
    let staging = encoder.finish()?;
    staging.as_file().sync_all()?;
    let file = staging.persist(output_path).map_err(|e| e.error)?;
    Ok(file.metadata()?.len())
}

/// Name of the archive's top-level folder: the pack directory's own name.
fn root_folder_name(pack_dir: &Path) -> String {
    pack_dir
        .canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(pack_dir)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pack".to_string())
}

/// Append every directory and regular file under `pack_dir`, rooted at
/// `root_name`. Symlinks and special files are skipped.
fn append_tree<W: Write>(
    builder: &mut Builder<W>,
    pack_dir: &Path,
    root_name: &str,
) -> Result<(), ArchiveError> {
    for entry in WalkDir::new(pack_dir).sort_by_file_name() {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(pack_dir) else {
            continue;
        };
        let name = Path::new(root_name).join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            let mut header = normalized_header(EntryType::Directory, 0o755, 0);
            builder.append_data(&mut header, &name, io::empty())?;
        } else if file_type.is_file() {
            let file = File::open(entry.path())?;
            let len = file.metadata()?.len();
            let mut header = normalized_header(EntryType::Regular, 0o644, len);
            builder.append_data(&mut header, &name, file)?;
        } else {
            debug!(path = %entry.path().display(), "skipping non-regular file");
        }
    }
    Ok(())
}

fn normalized_header(entry_type: EntryType, mode: u32, size: u64) -> Header {
    let mut header = Header::new_gnu();
    header.set_entry_type(entry_type);
    header.set_mode(mode);
    header.set_size(size);
    header.set_mtime(0);
    header.set_uid(0);
    header.set_gid(0);
    header
}
