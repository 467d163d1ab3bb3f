//! # Packs Builder
//!
//! Turns a directory of major-system image packs into downloadable,
//! versioned archives and keeps a master index of everything published.
//!
//! A pack is any directory holding a `manifest.json`. Its images live under
//! `major_system/images/<category>/`, named `<token>_<word>.<ext>`:
//!
//! ```text
//! packs/
//! ├── italian/
//! │   ├── manifest.json            # identity: international_name + version
//! │   ├── defaults.json            # category → token → default image
//! │   └── major_system/images/
//! │       ├── numbers/
//! │       │   ├── 00_sasso.png
//! │       │   └── 01_seta.png
//! │       └── letters/
//! │           └── A_ape.jpg
//! └── spanish/
//!     └── ...
//! ```
//!
//! # Pipeline
//!
//! ```text
//! 1. Discover   packs root  →  pack dirs + manifests
//! 2. Defaults   pack images →  defaults.json      (merge, never overwrite)
//! 3. Archive    pack dir    →  <name>_<version>.tar.gz
//! 4. Catalog    archive     →  packs.json         (upsert, or rebuild from disk)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`discover`] | Finds pack directories, reads manifests, inventories images by category |
//! | [`defaults`] | Synthesizes and merges `defaults.json` without touching existing choices |
//! | [`archive`] | Writes deterministic `.tar.gz` archives, skipping versions already built |
//! | [`catalog`] | Maintains `packs.json`: upsert after a build, rebuild from archive names |
//! | [`pipeline`] | Batch entry points used by the CLI; per-pack failures never abort a run |
//! | [`config`] | Layered settings: stock defaults, `packs.toml`, command-line overrides |
//! | [`types`] | Serialized documents (`Manifest`, `CatalogEntry`, `Catalog`) |
//! | [`naming`] | Token extraction and the archive filename convention in both directions |
//! | [`persist`] | Atomic file writes via a temp file in the destination directory |
//! | [`output`] | CLI report formatting |
//!
//! # Design Decisions
//!
//! ## Archives Are Immutable
//!
//! An archive is identified by its filename alone. If
//! `italian_1.0.0.tar.gz` already exists it is never rebuilt, even when the
//! pack changed on disk; publishing changes means bumping the manifest
//! version. Download URLs therefore stay stable for the lifetime of a version.
//!
//! ## Reproducible Archives
//!
//! Entries are added in sorted order with zeroed timestamps and ownership, so
//! the same pack tree always produces the same bytes.
//!
//! ## Nothing Half-Written
//!
//! Archives, `packs.json`, and `defaults.json` are written to a temp file in
//! the same directory and renamed into place. An interrupted run leaves the
//! previous file, never a truncated one.

pub mod archive;
pub mod catalog;
pub mod config;
pub mod defaults;
pub mod discover;
pub mod naming;
pub mod output;
pub mod persist;
pub mod pipeline;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
