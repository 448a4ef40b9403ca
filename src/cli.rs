//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use image_builder::output::{ColorChoice, OutputConfig};

use crate::commands;

/// Image Builder - Analyze container image manifests and their dependencies
#[derive(Parser, Debug)]
#[command(name = "image-builder")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: ColorChoice,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a manifest and the Dockerfiles it references
    Validate(commands::validate::ValidateArgs),

    /// Generate the CI build matrix for the selected platforms
    GenerateBuildMatrix(commands::generate_build_matrix::GenerateBuildMatrixArgs),

    /// Find images whose base images changed since they were built
    GetStaleImages(commands::get_stale_images::GetStaleImagesArgs),

    /// Merge image-info documents into one
    MergeImageInfo(commands::merge_image_info::MergeImageInfoArgs),

    /// Merge local image info into the published document and push it
    PublishImageInfo(commands::publish_image_info::PublishImageInfoArgs),

    /// Display the image dependency tree
    Tree(commands::tree::TreeArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        let out = OutputConfig::new(self.color);
        console::set_colors_enabled(out.use_color);
        console::set_colors_enabled_stderr(out.use_color);

        match self.command {
            Commands::Validate(args) => commands::validate::execute(args, out),
            Commands::GenerateBuildMatrix(args) => commands::generate_build_matrix::execute(args),
            Commands::GetStaleImages(args) => commands::get_stale_images::execute(args),
            Commands::MergeImageInfo(args) => commands::merge_image_info::execute(args),
            Commands::PublishImageInfo(args) => commands::publish_image_info::execute(args),
            Commands::Tree(args) => commands::tree::execute(args, out),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

/// Log to stderr so command output on stdout stays machine-readable
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    // a second initialization (tests) is harmless
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .target(env_logger::Target::Stderr)
        .try_init();
}
