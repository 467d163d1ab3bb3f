//! CLI output formatting for every command.
//!
//! Output is **pack-centric**: the primary line for each pack is its
//! international name and version, with the directory or archive shown as
//! indented context underneath. Diagnostics go through `tracing` to stderr;
//! this module only produces the user-facing report on stdout.
//!
//! # Output Format
//!
//! ## Configuration
//!
//! ```text
//! Configuration
//!     Base URL: https://yourserver.com/packs/
//!     Output: ./output
//!     Index: ./output/packs.json
//! ```
//!
//! ## Discover
//!
//! ```text
//! Packs
//! 001 Italian v1.0.0
//!     Source: packs/italian
//! 002 (broken)
//!     Source: packs/broken
//!     Manifest: unreadable
//! ```
//!
//! ## Defaults
//!
//! ```text
//! defaults.json updated: 1 new category, 2 new token(s)
//!     New category: letters
//!     numbers: 2 new tokens
//! ```
//!
//! ## Build
//!
//! ```text
//! Completed: 2/3 packs processed successfully.
//!     Failed: broken
//!         No manifest.json found in packs/broken
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::catalog::CATALOG_FILENAME;
use crate::config::PackSettings;
use crate::defaults::DefaultsReport;
use crate::pipeline::{BatchSummary, DiscoveredPack};
use crate::types::Catalog;
use std::fmt;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `"1 token"`, `"3 tokens"`.
fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Directory name of a path, falling back to the full path.
fn dir_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

// ============================================================================
// Configuration
// ============================================================================

pub fn format_settings(settings: &PackSettings) -> Vec<String> {
    vec![
        "Configuration".to_string(),
        format!("{}Base URL: {}", indent(1), settings.base_download_url),
        format!("{}Output: {}", indent(1), settings.output_directory.display()),
        format!(
            "{}Index: {}",
            indent(1),
            settings.output_directory.join(CATALOG_FILENAME).display()
        ),
    ]
}

pub fn print_settings(settings: &PackSettings) {
    print_lines(format_settings(settings));
}

// ============================================================================
// Discover
// ============================================================================

pub fn format_discovered_packs(packs: &[DiscoveredPack]) -> Vec<String> {
    if packs.is_empty() {
        return vec!["No packs found".to_string()];
    }
    let mut lines = vec!["Packs".to_string()];
    for (i, pack) in packs.iter().enumerate() {
        match &pack.manifest {
            Some(m) => lines.push(format!(
                "{} {} v{}",
                format_index(i + 1),
                m.international_name,
                m.version
            )),
            None => lines.push(format!(
                "{} ({})",
                format_index(i + 1),
                dir_label(&pack.path)
            )),
        }
        lines.push(format!("{}Source: {}", indent(1), pack.path.display()));
        if pack.manifest.is_none() {
            lines.push(format!("{}Manifest: unreadable", indent(1)));
        }
    }
    lines
}

pub fn print_discovered_packs(packs: &[DiscoveredPack]) {
    print_lines(format_discovered_packs(packs));
}

// ============================================================================
// Defaults
// ============================================================================

pub fn format_defaults_report(pack_dir: &Path, report: &DefaultsReport) -> Vec<String> {
    let mut lines = Vec::new();
    match report {
        DefaultsReport::NoImages => lines.push(format!(
            "No images found in {}, defaults.json not written",
            pack_dir.display()
        )),
        DefaultsReport::Unchanged => lines.push(report.to_string()),
        DefaultsReport::Updated(changes) => {
            lines.push(report.to_string());
            for category in &changes.added_categories {
                lines.push(format!("{}New category: {}", indent(1), category));
            }
            for (category, tokens) in &changes.added_tokens {
                lines.push(format!(
                    "{}{}: {}",
                    indent(1),
                    category,
                    plural(tokens.len(), "new token")
                ));
            }
        }
    }
    lines
}

pub fn print_defaults_report(pack_dir: &Path, report: &DefaultsReport) {
    print_lines(format_defaults_report(pack_dir, report));
}

// ============================================================================
// Build
// ============================================================================

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Completed: {}/{} packs processed successfully.",
            self.succeeded, self.total
        )
    }
}

pub fn format_batch_summary(summary: &BatchSummary) -> Vec<String> {
    if summary.total == 0 {
        return vec!["No packs found".to_string()];
    }
    let mut lines = vec![summary.to_string()];
    for (name, reason) in &summary.failures {
        lines.push(format!("{}Failed: {}", indent(1), name));
        lines.push(format!("{}{}", indent(2), reason));
    }
    lines
}

pub fn print_batch_summary(summary: &BatchSummary) {
    print_lines(format_batch_summary(summary));
}

// ============================================================================
// Rebuild
// ============================================================================

pub fn format_rebuild_output(output_dir: &Path, catalog: Option<&Catalog>) -> Vec<String> {
    let Some(catalog) = catalog else {
        return vec![format!(
            "Output directory {} does not exist, nothing to rebuild",
            output_dir.display()
        )];
    };
    let mut lines = vec![format!(
        "Rebuilt index with {}",
        plural(catalog.packs.len(), "pack")
    )];
    for (i, entry) in catalog.packs.iter().enumerate() {
        lines.push(format!(
            "{} {} v{} → {}",
            format_index(i + 1),
            entry.international_name,
            entry.version,
            entry.filename
        ));
    }
    lines
}

pub fn print_rebuild_output(output_dir: &Path, catalog: Option<&Catalog>) {
    print_lines(format_rebuild_output(output_dir, catalog));
}
