//! Platform filtering
//!
//! Commands operate on a subset of the manifest selected with glob-style
//! (`*`, `?`) filters on architecture, OS type, OS version, Dockerfile path
//! and repo name. Matching ignores case. Empty filters select everything.

use crate::error::Result;
use crate::manifest::{ManifestInfo, PlatformId, PlatformInfo};
use crate::path::glob_match;

/// Filter options shared by every command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestFilter {
    /// Architecture pattern, matched against `amd64` and `arm64v8` forms
    pub architecture: Option<String>,
    pub os_type: Option<String>,
    /// Any of these OS version patterns
    pub os_versions: Vec<String>,
    /// Any of these path patterns, matched against the platform path and its
    /// Dockerfile path
    pub paths: Vec<String>,
    pub repo: Option<String>,
}

impl ManifestFilter {
    /// Filter that selects every platform
    pub fn all() -> Self {
        Self::default()
    }

    /// Whether a single platform passes every filter
    pub fn matches(&self, platform: &PlatformInfo) -> Result<bool> {
        if let Some(architecture) = &self.architecture {
            if !glob_match(architecture, &platform.architecture)?
                && !glob_match(architecture, &platform.architecture_display())?
            {
                return Ok(false);
            }
        }

        if let Some(os_type) = &self.os_type {
            if !glob_match(os_type, &platform.os)? {
                return Ok(false);
            }
        }

        if !self.os_versions.is_empty()
            && !any_match(&self.os_versions, |pattern| {
                glob_match(pattern, &platform.os_version)
            })?
        {
            return Ok(false);
        }

        if !self.paths.is_empty()
            && !any_match(&self.paths, |pattern| {
                let pattern = pattern.replace('\\', "/");
                let pattern = pattern.trim_start_matches("./").trim_end_matches('/');
                Ok(glob_match(pattern, &platform.path)?
                    || glob_match(pattern, &platform.dockerfile_path)?)
            })?
        {
            return Ok(false);
        }

        if let Some(repo) = &self.repo {
            if !glob_match(repo, &platform.repo_name)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Ids of the matching platforms, in declaration order
    pub fn apply(&self, manifest: &ManifestInfo) -> Result<Vec<PlatformId>> {
        let mut selected = Vec::new();
        for platform in manifest.platforms() {
            if self.matches(platform)? {
                selected.push(platform.id);
            }
        }
        Ok(selected)
    }
}

fn any_match<F>(patterns: &[String], mut test: F) -> Result<bool>
where
    F: FnMut(&str) -> Result<bool>,
{
    for pattern in patterns {
        if test(pattern)? {
            return Ok(true);
        }
    }
    Ok(false)
}
