//! # Publish Image Info Command Implementation
//!
//! Merges a local image-info document into the canonical document kept in a
//! git repository and pushes the result. Nothing is pushed when the merge
//! does not change the remote document or with `--dry-run`, which prints the
//! merged document instead.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use log::{debug, info};

use image_builder::defaults::{default_cache_root, DEFAULT_COMMIT_MESSAGE};
use image_builder::git::{GitFile, GitRemote, RemoteRepository};
use image_builder::image_info::{merge_documents, ImageInfoDocument};

/// Merge local image info into the published document
#[derive(Args, Debug)]
pub struct PublishImageInfoArgs {
    /// Local image-info document to publish
    #[arg(long, value_name = "FILE")]
    pub image_info: PathBuf,

    /// URL of the repository holding the published document
    #[arg(long, value_name = "URL")]
    pub repo_url: String,

    /// Branch of the repository
    #[arg(long, value_name = "BRANCH", default_value = "main")]
    pub branch: String,

    /// Path of the document inside the repository
    #[arg(long = "target-path", value_name = "PATH")]
    pub target_path: String,

    /// Commit message
    #[arg(long, value_name = "MESSAGE", default_value = DEFAULT_COMMIT_MESSAGE)]
    pub message: String,

    /// The root directory for repository checkouts.
    #[arg(long, value_name = "DIR", env = "IMAGE_BUILDER_CACHE")]
    pub cache_root: Option<PathBuf>,

    /// Print the merged document instead of pushing it
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the `publish-image-info` command.
pub fn execute(args: PublishImageInfoArgs) -> Result<()> {
    let remote = GitRemote::new(args.cache_root.clone().unwrap_or_else(default_cache_root));
    publish(&args, &remote)?;
    Ok(())
}

/// Returns whether a new document was (or, with `--dry-run`, would be) pushed
fn publish(args: &PublishImageInfoArgs, remote: &dyn RemoteRepository) -> Result<bool> {
    let local = ImageInfoDocument::load(&args.image_info)
        .with_context(|| format!("Failed to load {}", args.image_info.display()))?;
    let file = GitFile {
        url: args.repo_url.clone(),
        branch: args.branch.clone(),
        path: args.target_path.clone(),
    };

    let previous = remote.fetch_file(&file)?;
    let published = match &previous {
        Some(content) => {
            debug!("Previous content of {}:\n{}", file, content);
            ImageInfoDocument::parse(content)
                .with_context(|| format!("Failed to parse {}", file))?
        }
        None => ImageInfoDocument::new(),
    };

    let mut merged = published.clone();
    merge_documents(&mut merged, &local);
    if merged == published && previous.is_some() {
        info!("{} is up to date", file);
        return Ok(false);
    }

    let content = merged.to_json_string()?;
    if args.dry_run {
        info!("Dry run: not pushing {}", file);
        print!("{}", content);
        return Ok(true);
    }

    remote.push_file(&file, &content, &args.message)?;
    info!("Published {} images to {}", merged.image_count(), file);
    Ok(true)
}
