//! # Generate Build Matrix Command Implementation
//!
//! Prints the CI build matrices for the selected platforms as JSON (default)
//! or YAML: `{ matrix: { leg: { variable: value } } }`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use log::info;

use image_builder::context::RunContext;
use image_builder::graph::PlatformGraph;
use image_builder::matrix::{self, MatrixType, OutputFormat};

use super::{write_output, FilterArgs, ManifestArgs};

/// Generate the CI build matrix
#[derive(Args, Debug)]
pub struct GenerateBuildMatrixArgs {
    #[command(flatten)]
    pub manifest: ManifestArgs,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// How platforms are split into legs
    /// (platform-dependency-graph, platform-versioned-os)
    #[arg(long = "type", value_name = "TYPE", default_value = "platform-dependency-graph")]
    pub matrix_type: MatrixType,

    /// Output format (json, yaml)
    #[arg(long, value_name = "FORMAT", default_value = "json")]
    pub format: OutputFormat,

    /// Write the matrix to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the `generate-build-matrix` command.
pub fn execute(args: GenerateBuildMatrixArgs) -> Result<()> {
    let context = RunContext::new();
    let manifest = args.manifest.load(&context)?;
    let platforms = args.filter.to_filter().apply(&manifest)?;
    let graph = PlatformGraph::build(&manifest);

    let matrices = matrix::generate_build_matrix(&graph, &platforms, args.matrix_type);
    info!(
        "Generated {} matrices with {} legs ({})",
        matrices.len(),
        matrices.iter().map(|m| m.legs.len()).sum::<usize>(),
        args.matrix_type
    );

    let rendered = matrix::render(&matrices, args.format)?;
    write_output(args.output.as_deref(), &rendered)
}
