//! # CLI Command Implementations
//!
//! Each subcommand of `image-builder` lives in its own file with:
//! - an `Args` struct derived with `clap`, and
//! - an `execute` function that takes the parsed `Args` and calls into the
//!   `image_builder` library.
//!
//! Options shared by several commands (manifest location, variable
//! overrides, platform filters) are defined here and flattened into the
//! command `Args`.

pub mod completions;
pub mod generate_build_matrix;
pub mod get_stale_images;
pub mod merge_image_info;
pub mod publish_image_info;
pub mod tree;
pub mod validate;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Args;

use image_builder::context::RunContext;
use image_builder::defaults::DEFAULT_MANIFEST;
use image_builder::filesystem::DiskFiles;
use image_builder::filter::ManifestFilter;
use image_builder::manifest::{ManifestInfo, ManifestOptions};

/// Manifest location and variable overrides
#[derive(Args, Debug, Clone)]
pub struct ManifestArgs {
    /// Path to the manifest file
    #[arg(long, value_name = "FILE", default_value = DEFAULT_MANIFEST)]
    pub manifest: PathBuf,

    /// Override a manifest variable (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_variable)]
    pub variables: Vec<(String, String)>,
}

impl ManifestArgs {
    pub fn options(&self) -> ManifestOptions {
        ManifestOptions {
            variables: self.variables.iter().cloned().collect::<BTreeMap<_, _>>(),
        }
    }

    /// Load and resolve the manifest relative to its own directory
    pub fn load(&self, context: &RunContext) -> Result<ManifestInfo> {
        let (root, file_name) = split_manifest_path(&self.manifest)?;
        ManifestInfo::load(&DiskFiles::new(root), &file_name, &self.options(), context)
            .with_context(|| format!("Failed to load manifest {}", self.manifest.display()))
    }
}

/// Platform selection, every pattern accepts `*` and `?`
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only platforms with this architecture (`amd64`, `arm64v8`, ...)
    #[arg(long, value_name = "PATTERN")]
    pub architecture: Option<String>,

    /// Only platforms with this OS type (`linux`, `windows`)
    #[arg(long, value_name = "PATTERN")]
    pub os_type: Option<String>,

    /// Only platforms with one of these OS versions (repeatable)
    #[arg(long = "os-version", value_name = "PATTERN")]
    pub os_versions: Vec<String>,

    /// Only platforms whose Dockerfile path matches (repeatable)
    #[arg(long = "path", value_name = "PATTERN")]
    pub paths: Vec<String>,

    /// Only platforms of repos with this name
    #[arg(long, value_name = "PATTERN")]
    pub repo: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> ManifestFilter {
        ManifestFilter {
            architecture: self.architecture.clone(),
            os_type: self.os_type.clone(),
            os_versions: self.os_versions.clone(),
            paths: self.paths.clone(),
            repo: self.repo.clone(),
        }
    }
}

fn parse_variable(value: &str) -> std::result::Result<(String, String), String> {
    match value.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", value)),
    }
}

fn split_manifest_path(manifest: &Path) -> Result<(PathBuf, String)> {
    let file_name = manifest
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("Invalid manifest path: {}", manifest.display()))?
        .to_string();
    let root = match manifest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((root, file_name))
}

/// Write `content` to `output`, or to stdout when no file is given
pub fn write_output(output: Option<&Path>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Wrote {}", path.display());
        }
        None => {
            print!("{}", content);
            if !content.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}
