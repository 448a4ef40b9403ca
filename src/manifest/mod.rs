//! # Manifest
//!
//! The manifest (`manifest.json`) is the catalog of every image the product
//! builds: repos contain images, images contain platforms, platforms point at
//! a Dockerfile and carry tags.
//!
//! - [`model`] holds the serialized schema.
//! - [`loader`] composes `includes` and consolidates repos sharing a name.
//! - [`info`] resolves variables, reads Dockerfiles and validates the result
//!   into an immutable [`ManifestInfo`].

pub mod info;
pub mod loader;
pub mod model;

pub use info::{
    ImageInfo, ManifestInfo, ManifestOptions, PlatformId, PlatformInfo, RepoInfo, TagInfo,
};
pub use model::{DocType, Image, Manifest, Platform, Readme, Repo, Tag};
