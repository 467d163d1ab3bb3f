//! Batch operations tying the components together.
//!
//! These are the entry points the CLI calls. Each pack is processed to
//! completion before the next one starts:
//!
//! ```text
//! discover ──► archive ──► upsert into packs.json     (build_all, per pack)
//! discover ──► synthesize defaults.json               (init_defaults, one pack)
//! output dir ──► rebuild packs.json                   (rebuild_catalog)
//! ```
//!
//! A failing pack never stops a batch: its error is logged, recorded in the
//! [`BatchSummary`], and the loop moves on.

use crate::archive::{ArchiveError, Archiver};
use crate::catalog::{CatalogError, CatalogManager};
use crate::config::PackSettings;
use crate::defaults::{self, DefaultsError, DefaultsReport};
use crate::discover::{self, DiscoverError};
use crate::types::{Catalog, Manifest};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Discover(#[from] DiscoverError),
    #[error("No manifest.json found in {0}")]
    MissingManifest(PathBuf),
    #[error(transparent)]
    Defaults(#[from] DefaultsError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// A pack found under a packs root.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredPack {
    pub path: PathBuf,
    /// `None` when the manifest exists but couldn't be parsed.
    pub manifest: Option<Manifest>,
}

/// Outcome of building every pack under a root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    /// Directory name and reason for each pack that failed.
    pub failures: Vec<(String, String)>,
}

/// Why a single pack failed during [`Pipeline::build_all`].
#[derive(Error, Debug)]
enum PackFailure {
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// The archiver and catalog manager for one output directory.
#[derive(Debug, Clone)]
pub struct Pipeline {
    archiver: Archiver,
    catalog: CatalogManager,
}

impl Pipeline {
    pub fn new(settings: &PackSettings) -> Self {
        Self::from_parts(Archiver::new(settings), CatalogManager::new(settings))
    }

    pub fn from_parts(archiver: Archiver, catalog: CatalogManager) -> Self {
        Self { archiver, catalog }
    }

    /// List the packs under `root` with their manifests.
    pub fn discover_packs(&self, root: &Path) -> Result<Vec<DiscoveredPack>, PipelineError> {
        let packs = discover::find_pack_directories(root)?
            .into_iter()
            .map(|path| DiscoveredPack {
                manifest: discover::read_manifest(&path),
                path,
            })
            .collect();
        Ok(packs)
    }

    /// Create or extend `defaults.json` for a single pack.
    pub fn init_defaults(&self, pack_dir: &Path) -> Result<DefaultsReport, PipelineError> {
        if !pack_dir.is_dir() {
            return Err(DiscoverError::DirectoryNotFound(pack_dir.to_path_buf()).into());
        }
        let Some(manifest) = discover::read_manifest(pack_dir) else {
            return Err(PipelineError::MissingManifest(pack_dir.to_path_buf()));
        };
        info!(
            pack = %manifest.international_name,
            version = %manifest.version,
            "initializing defaults"
        );
        Ok(defaults::synthesize_defaults(pack_dir)?)
    }

    /// Archive every pack under `root` and record each one in the master index.
    ///
    /// Only a missing root is an error; per-pack failures are tallied.
    pub fn build_all(&self, root: &Path) -> Result<BatchSummary, PipelineError> {
        let packs = discover::find_pack_directories(root)?;
        let mut summary = BatchSummary {
            total: packs.len(),
            ..Default::default()
        };

        for pack_dir in &packs {
            let name = pack_name(pack_dir);
            info!(pack = %name, "processing");
            match self.build_one(pack_dir) {
                Ok(()) => summary.succeeded += 1,
                Err(e) => {
                    warn!(pack = %name, "pack failed: {e}");
                    summary.failures.push((name, e.to_string()));
                }
            }
        }

        info!(
            succeeded = summary.succeeded,
            total = summary.total,
            "batch complete"
        );
        Ok(summary)
    }

    fn build_one(&self, pack_dir: &Path) -> Result<(), PackFailure> {
        let archived = self.archiver.create_archive(pack_dir)?;
        self.catalog.upsert(pack_dir, &archived.path, archived.size)?;
        Ok(())
    }

    /// Regenerate the master index from the archives on disk.
    ///
    /// `None` when the output directory doesn't exist yet.
    pub fn rebuild_catalog(&self) -> Result<Option<Catalog>, PipelineError> {
        Ok(self.catalog.rebuild()?)
    }
}

fn pack_name(pack_dir: &Path) -> String {
    pack_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| pack_dir.display().to_string())
}
