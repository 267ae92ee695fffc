//! Filesystem ingestion: turn paths on disk into [`Document`]s.
//!
//! Explicit file paths are always read. Directories are walked and filtered
//! by `ingest.include_globs` / `ingest.exclude_globs`, matched against the
//! path relative to the directory. `.git`, `target`, `node_modules`, and
//! `__pycache__` are always excluded.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use rag_review_core::models::Document;

use crate::config::IngestConfig;

/// Metadata key holding the file path a document was read from.
pub const SOURCE_KEY: &str = "source";

pub fn collect_documents(paths: &[PathBuf], config: &IngestConfig) -> Result<Vec<Document>> {
    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
        "**/__pycache__/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut documents = Vec::new();
    for path in paths {
        if path.is_file() {
            if let Some(doc) = read_document(path)? {
                documents.push(doc);
            }
        } else if path.is_dir() {
            documents.extend(scan_dir(path, &include_set, &exclude_set, config.follow_symlinks)?);
        } else {
            bail!("Path does not exist: {}", path.display());
        }
    }

    debug!(count = documents.len(), "collected documents");
    Ok(documents)
}

fn scan_dir(
    root: &Path,
    include_set: &GlobSet,
    exclude_set: &GlobSet,
    follow_symlinks: bool,
) -> Result<Vec<Document>> {
    let mut found = Vec::new();

    for entry in WalkDir::new(root).follow_links(follow_symlinks) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }
        found.push(path.to_path_buf());
    }

    // Sort for deterministic ordering
    found.sort();

    let mut documents = Vec::with_capacity(found.len());
    for path in found {
        if let Some(doc) = read_document(&path)? {
            documents.push(doc);
        }
    }
    Ok(documents)
}

/// Read one file. Non-UTF-8 files are skipped with a warning.
fn read_document(path: &Path) -> Result<Option<Document>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(Some(
            Document::new(text).with_metadata(SOURCE_KEY, path.display().to_string()),
        )),
        Err(_) => {
            warn!(path = %path.display(), "skipping non-UTF-8 file");
            Ok(None)
        }
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("Invalid glob: {}", pattern))?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, body: &[u8]) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn test_directory_uses_include_globs() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.py", b"print('a')");
        write(tmp.path(), "pkg/b.py", b"print('b')");
        write(tmp.path(), "notes.md", b"# notes");
        write(tmp.path(), "pkg/__pycache__/b.py", b"stale");

        let docs = collect_documents(&[tmp.path().to_path_buf()], &IngestConfig::default()).unwrap();
        let texts: Vec<&str> = docs.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["print('a')", "print('b')"]);
        assert!(docs[0].metadata[SOURCE_KEY].ends_with("a.py"));
    }

    #[test]
    fn test_explicit_file_ignores_globs() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "notes.md", b"# notes");
        let docs = collect_documents(&[tmp.path().join("notes.md")], &IngestConfig::default()).unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_exclude_globs() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "keep.py", b"x = 1");
        write(tmp.path(), "tests/test_skip.py", b"x = 2");
        let config = IngestConfig {
            exclude_globs: vec!["tests/**".to_string()],
            ..IngestConfig::default()
        };
        let docs = collect_documents(&[tmp.path().to_path_buf()], &config).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "x = 1");
    }

    #[test]
    fn test_non_utf8_skipped() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "bad.py", &[0xff, 0xfe, 0x00]);
        let docs = collect_documents(&[tmp.path().to_path_buf()], &IngestConfig::default()).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_missing_path_errors() {
        let tmp = TempDir::new().unwrap();
        assert!(collect_documents(&[tmp.path().join("nope")], &IngestConfig::default()).is_err());
    }
}
