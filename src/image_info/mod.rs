//! # Image info
//!
//! Image-info documents record what a build produced: per repo, per platform
//! path, the digests of the external base images the platform was built
//! from, the tags it was pushed with and a few descriptive fields. Every build
//! job writes its own document; [`merge`] folds them into one canonical
//! document which the stale-image detector reads back on the next run.
//!
//! ## Format
//!
//! ```json
//! [
//!   {
//!     "repo": "dotnet/runtime",
//!     "images": {
//!       "src/runtime/8.0/jammy/amd64": {
//!         "baseImages": { "amd64/ubuntu:jammy": "sha256:..." },
//!         "simpleTags": [ "8.0-jammy-amd64" ],
//!         "digest": "mcr.example.com/dotnet/runtime@sha256:..."
//!       }
//!     }
//!   }
//! ]
//! ```

pub mod merge;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub use merge::{merge_all, merge_documents};

/// Build record of one platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    /// External base image reference to the digest it had when built
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub base_images: BTreeMap<String, String>,
    /// Complete tag list of the last build; replaced, never merged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_url: Option<String>,
}

/// Build records of one repo, keyed by platform path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoData {
    pub repo: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub images: BTreeMap<String, ImageData>,
}

impl RepoData {
    pub fn new(repo: &str) -> Self {
        Self {
            repo: repo.to_string(),
            images: BTreeMap::new(),
        }
    }
}

/// A whole image-info document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageInfoDocument {
    pub repos: Vec<RepoData>,
}

impl ImageInfoDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document and bring it into canonical form
    pub fn parse(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::new());
        }
        let mut document: Self = serde_json::from_str(json)?;
        document.normalize();
        Ok(document)
    }

    /// Read a document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::Filesystem {
            message: format!("Failed to read image info '{}': {}", path.display(), e),
        })?;
        Self::parse(&content)
    }

    /// Canonical JSON: pretty printed with a trailing newline
    pub fn to_json_string(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json_string()?)?;
        Ok(())
    }

    /// Sort repos by name, fold repos that appear twice and sort list fields
    pub fn normalize(&mut self) {
        let repos = std::mem::take(&mut self.repos);
        *self = merge_all(std::iter::once(&ImageInfoDocument { repos }));
    }

    pub fn repo(&self, name: &str) -> Option<&RepoData> {
        self.repos.iter().find(|repo| repo.repo == name)
    }

    /// Record of the platform at `path` built by `repo`
    pub fn image(&self, repo: &str, path: &str) -> Option<&ImageData> {
        self.repo(repo).and_then(|repo| repo.images.get(path))
    }

    pub fn is_empty(&self) -> bool {
        self.repos.iter().all(|repo| repo.images.is_empty())
    }

    /// Number of image records across all repos
    pub fn image_count(&self) -> usize {
        self.repos.iter().map(|repo| repo.images.len()).sum()
    }
}

/// The `sha256:...` part of a digest or digest reference
///
/// ```
/// use image_builder::image_info::digest_sha;
///
/// assert_eq!(digest_sha("repo@sha256:abc"), "sha256:abc");
/// assert_eq!(digest_sha("sha256:abc"), "sha256:abc");
/// ```
pub fn digest_sha(digest: &str) -> &str {
    digest
        .rsplit_once('@')
        .map(|(_, sha)| sha)
        .unwrap_or(digest)
}
