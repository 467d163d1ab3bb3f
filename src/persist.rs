//! Write-then-rename persistence for the JSON documents the pipeline owns.
//!
//! A document is fully serialized in memory, written to a temp file in the
//! destination directory, and renamed over the target. Readers never observe a
//! half-written `defaults.json` or `packs.json`.

use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Serialize `value` as indented JSON and atomically replace `path` with it.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, json.as_bytes())
}

/// Atomically replace `path` with `bytes`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn writes_pretty_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.json");
        write_json(&path, &serde_json::json!({"a": {"b": "c"}})).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\n  \"a\": {"));
    }

    #[test]
    fn replaces_existing_file_without_leftovers() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.json");
        fs::write(&path, "old").unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        let names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 1);
    }
}
