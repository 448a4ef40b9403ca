//! Serialized manifest schema
//!
//! These types mirror `manifest.json` exactly as written, before variables are
//! substituted or Dockerfiles read. See [`crate::manifest::info`] for the
//! resolved view the rest of the crate works with.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root manifest document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Registry prefix the repos are published under (e.g. `mcr.example.com`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
    /// Manifest-declared variables usable as `$(name)`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, String>,
    /// Other manifest fragments merged in at load time
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,
    /// Product-level readme files
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub readmes: Vec<Readme>,
    #[serde(default)]
    pub repos: Vec<Repo>,
}

/// A named image family
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repo {
    pub name: String,
    /// Identifier used by `$(Repo:<id>)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub readmes: Vec<Readme>,
    #[serde(default)]
    pub images: Vec<Image>,
}

/// One logical product image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_version: Option<String>,
    /// Tags spanning all platforms of the image (manifest-list tags)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub shared_tags: BTreeMap<String, Tag>,
    #[serde(default)]
    pub platforms: Vec<Platform>,
}

/// One concrete build unit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
    /// Build-context directory, or a Dockerfile path
    pub dockerfile: String,
    pub os: String,
    pub os_version: String,
    pub architecture: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub build_args: BTreeMap<String, String>,
    #[serde(default)]
    pub tags: BTreeMap<String, Tag>,
}

/// Documentation metadata attached to a tag
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(default)]
    pub doc_type: DocType,
}

/// How a tag is surfaced in generated documentation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocType {
    #[default]
    Documented,
    Undocumented,
    PlatformDocumented,
}

/// Reference to a readme (and optionally the template it is generated from)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Readme {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_path: Option<String>,
}

/// Parse a manifest (or include fragment) from JSON text
pub fn parse(json: &str) -> crate::error::Result<Manifest> {
    Ok(serde_json::from_str(json)?)
}
