//! # Validate Command Implementation
//!
//! Loads the manifest the same way every other command does (includes,
//! variables, Dockerfiles, tag uniqueness) and reports a summary. Any
//! problem is reported as an error and the command exits with code 1.
//!
//! This command is a safe, read-only operation that does not modify any files.

use anyhow::Result;
use clap::Args;

use image_builder::context::RunContext;
use image_builder::graph::PlatformGraph;
use image_builder::output::{OutputConfig, Status};

use super::ManifestArgs;

/// Validate a manifest and the Dockerfiles it references
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, out: OutputConfig) -> Result<()> {
    println!(
        "{} Validating manifest: {}",
        out.marker(Status::Info),
        out.highlight(&args.manifest.manifest.display().to_string())
    );

    let context = RunContext::new();
    let manifest = match args.manifest.load(&context) {
        Ok(manifest) => manifest,
        Err(e) => {
            println!("{} Manifest is invalid", out.marker(Status::Failed));
            return Err(e);
        }
    };

    let graph = PlatformGraph::build(&manifest);
    let image_count: usize = manifest.repos.iter().map(|repo| repo.images.len()).sum();
    let edge_count: usize = manifest
        .platform_ids()
        .into_iter()
        .map(|id| graph.parents(id).len())
        .sum();

    println!(
        "{} {} repos, {} images, {} platforms, {} dependencies",
        out.marker(Status::Ok),
        manifest.repos.len(),
        image_count,
        manifest.platforms().len(),
        edge_count
    );

    for platform in manifest.platforms() {
        if platform.final_stage_from_image.is_none() {
            println!(
                "{} {} builds from scratch",
                out.marker(Status::Info),
                out.dim(&platform.path)
            );
        }
    }

    Ok(())
}
