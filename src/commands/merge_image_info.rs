//! # Merge Image Info Command Implementation
//!
//! Merges the image-info documents written by individual build jobs into one
//! canonical document. Directories are searched recursively for `*.json`
//! files; documents are merged in path order.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use log::{debug, info};
use walkdir::WalkDir;

use image_builder::image_info::{merge_all, ImageInfoDocument};

use super::write_output;

/// Merge image-info documents
#[derive(Args, Debug)]
pub struct MergeImageInfoArgs {
    /// Image-info files or directories containing them
    #[arg(required = true, value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Write the merged document to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Execute the `merge-image-info` command.
pub fn execute(args: MergeImageInfoArgs) -> Result<()> {
    let files = collect_files(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No image-info files found");
    }

    let mut documents = Vec::with_capacity(files.len());
    for file in &files {
        debug!("Reading {}", file.display());
        documents.push(
            ImageInfoDocument::load(file)
                .with_context(|| format!("Failed to load {}", file.display()))?,
        );
    }

    let merged = merge_all(&documents);
    info!(
        "Merged {} documents: {} repos, {} images",
        documents.len(),
        merged.repos.len(),
        merged.image_count()
    );

    write_output(args.output.as_deref(), &merged.to_json_string()?)
}

fn collect_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found = Vec::new();
            for entry in WalkDir::new(input) {
                let entry = entry
                    .with_context(|| format!("Failed to read directory {}", input.display()))?;
                if entry.file_type().is_file() && is_json(entry.path()) {
                    found.push(entry.into_path());
                }
            }
            found.sort();
            files.extend(found);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            anyhow::bail!("Input not found: {}", input.display());
        }
    }
    Ok(files)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
