//! File access for manifests, includes, readmes and Dockerfiles
//!
//! Manifest loading reads everything through the [`FileSource`] trait, with
//! paths relative to the manifest directory and separated by `/`.
//! [`DiskFiles`] reads from a directory on the host; [`MemoryFiles`] keeps
//! the content in memory, which lets tests and benchmarks build whole
//! manifests without touching the disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Read-only access to files relative to a manifest directory
pub trait FileSource: Send + Sync {
    /// Read a file as UTF-8 text
    fn read_to_string(&self, path: &str) -> Result<String>;

    /// Check whether `path` names a regular file
    fn is_file(&self, path: &str) -> bool;

    /// Check whether `path` names a directory
    fn is_dir(&self, path: &str) -> bool;

    /// Check whether `path` exists at all
    fn exists(&self, path: &str) -> bool {
        self.is_file(path) || self.is_dir(path)
    }
}

/// Files under a directory on the host filesystem
#[derive(Debug, Clone)]
pub struct DiskFiles {
    root: PathBuf,
}

impl DiskFiles {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The directory all paths are relative to
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, path: &str) -> PathBuf {
        if path.is_empty() || path == "." {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }
}

impl FileSource for DiskFiles {
    fn read_to_string(&self, path: &str) -> Result<String> {
        let full_path = self.full_path(path);
        fs::read_to_string(&full_path).map_err(|e| Error::Filesystem {
            message: format!("Failed to read {}: {}", full_path.display(), e),
        })
    }

    fn is_file(&self, path: &str) -> bool {
        self.full_path(path).is_file()
    }

    fn is_dir(&self, path: &str) -> bool {
        self.full_path(path).is_dir()
    }
}

/// In-memory files keyed by relative path
#[derive(Debug, Clone, Default)]
pub struct MemoryFiles {
    files: BTreeMap<String, String>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file
    pub fn add_file(&mut self, path: &str, content: &str) {
        self.files
            .insert(path.trim_start_matches("./").to_string(), content.to_string());
    }

    /// Builder-style variant of [`MemoryFiles::add_file`]
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.add_file(path, content);
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write every file below `root`, creating directories as needed
    pub fn write_to(&self, root: &Path) -> Result<()> {
        for (path, content) in &self.files {
            let full_path = root.join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&full_path, content)?;
        }
        Ok(())
    }
}

impl FileSource for MemoryFiles {
    fn read_to_string(&self, path: &str) -> Result<String> {
        self.files
            .get(path.trim_start_matches("./"))
            .cloned()
            .ok_or_else(|| Error::Filesystem {
                message: format!("File not found: {}", path),
            })
    }

    fn is_file(&self, path: &str) -> bool {
        self.files.contains_key(path.trim_start_matches("./"))
    }

    fn is_dir(&self, path: &str) -> bool {
        let path = path.trim_start_matches("./").trim_end_matches('/');
        if path.is_empty() || path == "." {
            return true;
        }
        let prefix = format!("{}/", path);
        self.files.keys().any(|file| file.starts_with(&prefix))
    }
}
