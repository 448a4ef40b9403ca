//! # Remote repositories
//!
//! Subscriptions read manifests and image-info baselines from other
//! repositories, and publishing writes the merged image info back. Both go
//! through [`RemoteRepository`] so tests can substitute an in-memory
//! implementation. [`GitRemote`] is the default and uses the system `git`
//! command, which picks up SSH keys, credential helpers and any
//! authentication configured in `~/.gitconfig`.
//!
//! Checkouts are shallow clones stored under the cache root and shared for
//! the whole run through a [`CheckoutCache`], so a repository watched by
//! several subscriptions is cloned once.

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::cache::CheckoutCache;
use crate::error::{Error, Result};

/// A file at a path on a branch of a remote repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitFile {
    pub url: String,
    pub branch: String,
    pub path: String,
}

impl std::fmt::Display for GitFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}:{}", self.url, self.branch, self.path)
    }
}

/// Trait for remote repository operations - allows mocking in tests
pub trait RemoteRepository: Send + Sync {
    /// Local working directory holding `branch` of `url`
    fn checkout(&self, url: &str, branch: &str) -> Result<PathBuf>;

    /// Content of a file, `None` when it does not exist
    fn fetch_file(&self, file: &GitFile) -> Result<Option<String>>;

    /// Replace a file, commit and push; returns the previous content
    fn push_file(&self, file: &GitFile, content: &str, message: &str) -> Result<Option<String>>;
}

/// [`RemoteRepository`] backed by the `git` command line
#[derive(Debug)]
pub struct GitRemote {
    cache_root: PathBuf,
    checkouts: CheckoutCache,
}

impl GitRemote {
    pub fn new(cache_root: PathBuf) -> Self {
        Self {
            cache_root,
            checkouts: CheckoutCache::new("checkout"),
        }
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }
}

impl RemoteRepository for GitRemote {
    fn checkout(&self, url: &str, branch: &str) -> Result<PathBuf> {
        let key = format!("{}@{}", url, branch);
        self.checkouts.get_or_compute(&key, || {
            let target = checkout_path(&self.cache_root, url, branch);
            info!("Cloning {}@{}", url, branch);
            clone_shallow(url, branch, &target)?;
            Ok(target)
        })
    }

    fn fetch_file(&self, file: &GitFile) -> Result<Option<String>> {
        let full_path = self.checkout(&file.url, &file.branch)?.join(&file.path);
        if !full_path.is_file() {
            debug!("{} does not exist", file);
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(full_path)?))
    }

    fn push_file(&self, file: &GitFile, content: &str, message: &str) -> Result<Option<String>> {
        let dir = self.checkout(&file.url, &file.branch)?;
        let full_path = dir.join(&file.path);
        let previous = if full_path.is_file() {
            Some(fs::read_to_string(&full_path)?)
        } else {
            None
        };

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full_path, content)?;

        run_git(&dir, &["add", "--", &file.path], &file.url)?;
        run_git(&dir, &["commit", "--message", message], &file.url)?;
        let refspec = format!("HEAD:{}", file.branch);
        run_git(&dir, &["push", "origin", &refspec], &file.url)?;
        info!("Pushed {}", file);

        Ok(previous)
    }
}

/// Clone a branch of a repository using a shallow clone
pub fn clone_shallow(url: &str, branch: &str, target_dir: &Path) -> Result<()> {
    // git won't clone into an existing non-empty directory
    if target_dir.exists() {
        fs::remove_dir_all(target_dir)?;
    }
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let output = Command::new("git")
        .args(["clone", "--depth=1", "--branch", branch, url])
        .arg(target_dir)
        .output()
        .map_err(|e| Error::GitClone {
            url: url.to_string(),
            branch: branch.to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.contains("Authentication failed")
            || stderr.contains("Permission denied")
            || stderr.contains("Could not read from remote repository")
        {
            format!(
                "Authentication failed. Make sure you have access to the repository.\n\
                Error: {}",
                stderr
            )
        } else {
            stderr.to_string()
        };

        return Err(Error::GitClone {
            url: url.to_string(),
            branch: branch.to_string(),
            message,
        });
    }

    Ok(())
}

/// Directory under `cache_root` holding the checkout of `url` at `branch`
pub fn checkout_path(cache_root: &Path, url: &str, branch: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    let url_hash = format!("{:x}", hasher.finish());

    cache_root.join(format!("{}-{}", url_hash, branch.replace('/', "-")))
}

fn run_git(dir: &Path, args: &[&str], url: &str) -> Result<String> {
    let command = args.join(" ");
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(args)
        .output()
        .map_err(|e| Error::GitCommand {
            command: command.clone(),
            url: url.to_string(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::GitCommand {
            command,
            url: url.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
