//! Container engine access
//!
//! The staleness check only needs two things from the engine: pull an image
//! and report its digest. [`DigestSource`] is that seam; [`DockerCli`] is the
//! default implementation and shells out to the `docker` command, so the
//! user's registry logins and daemon configuration apply unchanged.

use std::process::Command;

use log::{debug, info};

use crate::cache::DigestCache;
use crate::dockerfile;
use crate::error::{Error, Result};

/// Trait for container engine operations - allows mocking in tests
pub trait DigestSource: Send + Sync {
    /// Pull `reference` so its digest reflects the registry
    fn pull_image(&self, reference: &str) -> Result<()>;

    /// Digest of a local image, `repo@sha256:...` or `sha256:...`
    fn get_image_digest(&self, reference: &str) -> Result<String>;
}

/// Digest of `reference`, pulled and inspected at most once per cache
pub fn cached_digest(
    source: &dyn DigestSource,
    cache: &DigestCache,
    reference: &str,
) -> Result<String> {
    cache.get_or_compute(&reference.to_string(), || {
        info!("Pulling {}", reference);
        source.pull_image(reference)?;
        let digest = source.get_image_digest(reference)?;
        debug!("{} -> {}", reference, digest);
        Ok(digest)
    })
}

/// [`DigestSource`] backed by the `docker` command line
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl DockerCli {
    pub fn new() -> Self {
        Self::with_program("docker")
    }

    /// Use another docker-compatible executable
    pub fn with_program(program: &str) -> Self {
        Self {
            program: program.to_string(),
        }
    }

    fn run(&self, args: &[&str], reference: &str) -> Result<String> {
        let command = format!("{} {}", self.program, args.join(" "));
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|e| Error::Docker {
                command: command.clone(),
                reference: reference.to_string(),
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(Error::Docker {
                command,
                reference: reference.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

impl DigestSource for DockerCli {
    fn pull_image(&self, reference: &str) -> Result<()> {
        self.run(&["pull", "--quiet", reference], reference)?;
        Ok(())
    }

    fn get_image_digest(&self, reference: &str) -> Result<String> {
        let output = self.run(
            &["image", "inspect", "--format", "{{json .RepoDigests}}", reference],
            reference,
        )?;
        select_repo_digest(reference, &output)
    }
}

/// Pick the digest matching the repository of `reference` from the JSON list
/// printed by `docker image inspect`
fn select_repo_digest(reference: &str, repo_digests: &str) -> Result<String> {
    let digests: Vec<String> = serde_json::from_str(repo_digests)?;
    let repo = dockerfile::repository_name(reference);

    digests
        .iter()
        .find(|digest| digest.split_once('@').is_some_and(|(name, _)| name == repo))
        .or_else(|| digests.first())
        .cloned()
        .ok_or_else(|| Error::Docker {
            command: "image inspect".to_string(),
            reference: reference.to_string(),
            stderr: "image has no repo digest".to_string(),
        })
}
