//! # Get Stale Images Command Implementation
//!
//! Two modes:
//!
//! - `--image-info FILE`: check the local manifest against a baseline and
//!   print the JSON list of platform paths to rebuild.
//! - `--subscriptions FILE`: check every subscribed manifest against its
//!   remote baseline and print `[{ subscriptionId, paths }]`.
//!
//! Base image digests come from `docker pull` + `docker image inspect`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use image_builder::context::RunContext;
use image_builder::defaults::default_cache_root;
use image_builder::docker::DockerCli;
use image_builder::git::GitRemote;
use image_builder::graph::PlatformGraph;
use image_builder::image_info::ImageInfoDocument;
use image_builder::stale::StaleImageDetector;
use image_builder::subscription::{load_subscriptions, SubscriptionEvaluator};

use super::{write_output, FilterArgs, ManifestArgs};

/// Find images whose base images changed since they were built
#[derive(Args, Debug)]
pub struct GetStaleImagesArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Image-info baseline of the local manifest
    #[arg(long, value_name = "FILE", required_unless_present = "subscriptions", conflicts_with = "subscriptions")]
    pub image_info: Option<PathBuf>,

    /// Subscriptions file listing remote manifests to check
    #[arg(long, value_name = "FILE")]
    pub subscriptions: Option<PathBuf>,

    /// The root directory for repository checkouts.
    ///
    /// If not provided, it defaults to the system's cache directory
    /// (e.g., `~/.cache/image-builder` on Linux).
    #[arg(long, value_name = "DIR", env = "IMAGE_BUILDER_CACHE")]
    pub cache_root: Option<PathBuf>,

    /// Docker executable used to pull and inspect base images
    #[arg(long, value_name = "PROGRAM", env = "IMAGE_BUILDER_DOCKER", default_value = "docker")]
    pub docker: String,

    /// Write the result to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the `get-stale-images` command.
pub fn execute(args: GetStaleImagesArgs) -> Result<()> {
    let context = RunContext::new();
    let docker = DockerCli::with_program(&args.docker);
    let filter = args.filter.to_filter();

    let json = match (&args.subscriptions, &args.image_info) {
        (Some(subscriptions_path), _) => {
            let subscriptions = load_subscriptions(subscriptions_path)?;
            let remote = GitRemote::new(args.cache_root.clone().unwrap_or_else(default_cache_root));
            let options = args.manifest.options();
            let results = SubscriptionEvaluator::new(&remote, &docker, &context, &options, &filter)
                .evaluate(&subscriptions)?;
            serde_json::to_string_pretty(&results)?
        }
        (None, Some(image_info_path)) => {
            let manifest = args.manifest.load(&context)?;
            let baseline = ImageInfoDocument::load(image_info_path)
                .with_context(|| format!("Failed to load baseline {}", image_info_path.display()))?;
            let platforms = filter.apply(&manifest)?;
            let graph = PlatformGraph::build(&manifest);
            let paths = StaleImageDetector::new(&graph, &docker, &context)
                .stale_paths(&platforms, &baseline)?;
            serde_json::to_string_pretty(&paths)?
        }
        (None, None) => anyhow::bail!("Either --image-info or --subscriptions is required"),
    };

    write_output(args.output.as_deref(), &json)
}
