//! Resource loading utilities
//!
//! This module handles loading of schemas, codelists, mappings and datasets
//! from disk, applying the configured size limits.

use crate::error::{Error, Result};
use crate::limits::Limits;
use std::fs;
use std::path::{Path, PathBuf};

/// Resource loader for schemas and documents
#[derive(Debug, Clone, Default)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Limits applied by this loader
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Load a resource as a string
    pub fn load(&self, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|e| {
            Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
        })?;
        // Reject oversized files before reading them into memory
        self.limits.check_xml_size(metadata.len() as usize)?;

        fs::read_to_string(path).map_err(|e| {
            Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
        })
    }

    /// List the files in `dir` with the given extension, sorted by file name
    pub fn list(&self, dir: impl AsRef<Path>, extension: &str) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|e| {
            Error::Resource(format!("Failed to read directory '{}': {}", dir.display(), e))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(extension) {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

/// Resolve `location` (as written in an include/import) against `base_dir`
pub fn resolve_location(base_dir: Option<&Path>, location: &str) -> PathBuf {
    let candidate = Path::new(location);
    match base_dir {
        Some(base) if candidate.is_relative() => base.join(candidate),
        _ => candidate.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "<codelist name=\"Sector\"/>").unwrap();

        let loader = Loader::new();
        let content = loader.load(file.path()).unwrap();

        assert!(content.contains("<codelist name=\"Sector\"/>"));
    }

    #[test]
    fn test_missing_file() {
        let loader = Loader::new();
        let result = loader.load("/definitely/not/here.xml");
        assert!(matches!(result, Err(Error::Resource(_))));
    }

    #[test]
    fn test_size_limit() {
        let mut file = NamedTempFile::new().unwrap();
        let large_content = "x".repeat(11 * 1024 * 1024); // 11 MB
        write!(file, "{}", large_content).unwrap();

        let loader = Loader::new().with_limits(Limits::strict());
        let result = loader.load(file.path());

        // Strict limits (10 MB max) should reject 11MB file
        assert!(matches!(result, Err(Error::LimitExceeded(_))));
    }

    #[test]
    fn test_list_sorted_by_name() {
        let dir = tempdir().unwrap();
        for name in ["b.xml", "a.xml", "c.txt"] {
            fs::write(dir.path().join(name), "<x/>").unwrap();
        }

        let paths = Loader::new().list(dir.path(), "xml").unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.xml", "b.xml"]);
    }

    #[test]
    fn test_resolve_location() {
        let base = Path::new("/schemas/202");
        assert_eq!(
            resolve_location(Some(base), "xml.xsd"),
            PathBuf::from("/schemas/202/xml.xsd")
        );
        assert_eq!(
            resolve_location(Some(base), "/abs/common.xsd"),
            PathBuf::from("/abs/common.xsd")
        );
        assert_eq!(resolve_location(None, "xml.xsd"), PathBuf::from("xml.xsd"));
    }
}
