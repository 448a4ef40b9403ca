//! # Image Builder Library
//!
//! This library reads a container image manifest (a catalog of repos, images
//! and platforms, each platform backed by a Dockerfile), works out how the
//! images depend on each other and answers the questions a build pipeline
//! asks: which images are stale, how to split the builds into CI legs, and
//! how to combine the image-info records written by many build jobs.
//!
//! ## Quick Example
//!
//! ```
//! use image_builder::context::RunContext;
//! use image_builder::filesystem::MemoryFiles;
//! use image_builder::graph::PlatformGraph;
//! use image_builder::manifest::{ManifestInfo, ManifestOptions, PlatformId};
//!
//! let manifest_json = r#"{
//!     "repos": [
//!         { "name": "base", "images": [ { "platforms": [
//!             { "dockerfile": "base", "os": "linux", "osVersion": "jammy",
//!               "architecture": "amd64", "tags": { "jammy": {} } } ] } ] },
//!         { "name": "app", "images": [ { "platforms": [
//!             { "dockerfile": "app", "os": "linux", "osVersion": "jammy",
//!               "architecture": "amd64", "tags": { "latest": {} } } ] } ] }
//!     ]
//! }"#;
//!
//! let files = MemoryFiles::new()
//!     .with_file("manifest.json", manifest_json)
//!     .with_file("base/Dockerfile", "FROM ubuntu:jammy\n")
//!     .with_file("app/Dockerfile", "FROM base:jammy\n");
//!
//! let manifest = ManifestInfo::load(
//!     &files,
//!     "manifest.json",
//!     &ManifestOptions::default(),
//!     &RunContext::new(),
//! )
//! .unwrap();
//!
//! let graph = PlatformGraph::build(&manifest);
//! assert_eq!(graph.children(PlatformId(0)), &[PlatformId(1)]);
//! assert_eq!(graph.ancestors(PlatformId(1)), vec![PlatformId(0)]);
//! ```
//!
//! ## Core Concepts
//!
//! - **Manifest (`manifest`, `variables`, `dockerfile`)**: loads
//!   `manifest.json` with its includes, substitutes `$(...)` variables and
//!   parses every platform's `FROM` instructions into internal (built here)
//!   and external base images.
//! - **Dependency graph (`graph`)**: parent/child edges between platforms,
//!   ancestor and descendant closures and connected subgraphs.
//! - **Staleness (`stale`, `subscription`, `docker`)**: compares the current
//!   digests of external base images with the last recorded ones and expands
//!   stale platforms to everything built on top of them.
//! - **Image info (`image_info`)**: the persisted build records and their
//!   deterministic merge.
//! - **Build matrix (`matrix`, `filter`)**: groups the selected platforms into
//!   CI legs that keep dependent images together.
//!
//! ## Execution Flow
//!
//! Every command creates one [`context::RunContext`], loads a
//! [`manifest::ManifestInfo`] (immutable afterwards), selects platforms with a
//! [`filter::ManifestFilter`] and builds a [`graph::PlatformGraph`] on top.
//! Nothing is persisted between runs except image-info documents.

pub mod cache;
pub mod context;
pub mod defaults;
pub mod docker;
pub mod dockerfile;
pub mod error;
pub mod filesystem;
pub mod filter;
pub mod git;
pub mod graph;
pub mod image_info;
pub mod manifest;
pub mod matrix;
pub mod output;
pub mod path;
pub mod stale;
pub mod subscription;
pub mod variables;

#[cfg(test)]
mod path_proptest;
#[cfg(test)]
mod testing;
