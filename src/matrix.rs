//! # Build matrix
//!
//! Splits the selected platforms into CI legs. Platforms are grouped by OS,
//! OS version, architecture and variant; with the dependency-graph matrix
//! type each group is split further into connected subgraphs, so an image
//! and the images built from it always land in the same leg.
//!
//! Legs are collected into one matrix per `{os}-{architecture}{variant}` and
//! carry the variables a pipeline needs to build them:
//!
//! | variable | example |
//! |---|---|
//! | `imageBuilderPaths` | `--path 'src/runtime/8.0/jammy/amd64'` |
//! | `osType` | `linux` |
//! | `osVersions` | `--os-version jammy` |
//! | `osVersion` | `jammy` |
//! | `architecture` | `arm64` |
//! | `variant` | `v8` (only when set) |

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::Serialize;

use crate::error::Result;
use crate::graph::PlatformGraph;
use crate::manifest::{PlatformId, PlatformInfo};
use crate::path;

/// Variables of one leg, by name
pub type LegVariables = BTreeMap<String, String>;

/// How platforms of a group are split into legs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatrixType {
    /// One leg per connected subgraph of each group
    #[default]
    PlatformDependencyGraph,
    /// One leg per group
    PlatformVersionedOs,
}

impl MatrixType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatrixType::PlatformDependencyGraph => "platform-dependency-graph",
            MatrixType::PlatformVersionedOs => "platform-versioned-os",
        }
    }
}

impl fmt::Display for MatrixType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatrixType {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "platform-dependency-graph" => Ok(MatrixType::PlatformDependencyGraph),
            "platform-versioned-os" => Ok(MatrixType::PlatformVersionedOs),
            other => Err(format!(
                "unknown matrix type '{}' (expected platform-dependency-graph or platform-versioned-os)",
                other
            )),
        }
    }
}

/// Output encoding of the matrices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            other => Err(format!("unknown output format '{}' (expected json or yaml)", other)),
        }
    }
}

/// Legs of one `{os}-{architecture}{variant}` matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildMatrixInfo {
    pub name: String,
    pub legs: BTreeMap<String, LegVariables>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    os: String,
    os_version: String,
    architecture: String,
    variant: Option<String>,
}

impl GroupKey {
    fn of(platform: &PlatformInfo) -> Self {
        Self {
            os: platform.os.to_ascii_lowercase(),
            os_version: platform.os_version.clone(),
            architecture: platform.architecture.to_ascii_lowercase(),
            variant: platform.variant.clone(),
        }
    }

    fn matrix_name(&self) -> String {
        sanitize(&format!(
            "{}-{}{}",
            self.os,
            self.architecture,
            self.variant.as_deref().unwrap_or_default()
        ))
    }
}

/// Build the matrices for `platforms`, sorted by name; empty matrices are
/// left out
pub fn generate_build_matrix(
    graph: &PlatformGraph,
    platforms: &[PlatformId],
    matrix_type: MatrixType,
) -> Vec<BuildMatrixInfo> {
    let mut groups: BTreeMap<GroupKey, Vec<PlatformId>> = BTreeMap::new();
    for &id in platforms {
        groups.entry(GroupKey::of(graph.platform(id))).or_default().push(id);
    }

    let common_prefix =
        path::common_prefix_segments(platforms.iter().map(|id| graph.platform(*id).path.as_str()));

    let mut matrices: BTreeMap<String, BTreeMap<String, LegVariables>> = BTreeMap::new();
    for (key, members) in &groups {
        let legs = match matrix_type {
            MatrixType::PlatformDependencyGraph => graph.complete_subgraphs(members),
            MatrixType::PlatformVersionedOs => vec![members.clone()],
        };

        let matrix = matrices.entry(key.matrix_name()).or_default();
        for leg in legs {
            let paths: BTreeSet<&str> = leg
                .iter()
                .map(|id| graph.platform(*id).path.as_str())
                .collect();
            let Some(first_path) = paths.first() else {
                continue;
            };

            let mut name = leg_name(key, first_path, &common_prefix);
            if paths.len() > 1 {
                name.push_str("-graph");
            }
            let name = unique_name(matrix, name);
            debug!("Leg '{}': {} platform(s)", name, paths.len());
            matrix.insert(name, leg_variables(key, &paths));
        }
    }

    matrices
        .into_iter()
        .filter(|(_, legs)| !legs.is_empty())
        .map(|(name, legs)| BuildMatrixInfo { name, legs })
        .collect()
}

/// Render matrices as `{ matrix: { leg: { variable: value } } }`
pub fn render(matrices: &[BuildMatrixInfo], format: OutputFormat) -> Result<String> {
    let map: BTreeMap<&str, &BTreeMap<String, LegVariables>> = matrices
        .iter()
        .map(|matrix| (matrix.name.as_str(), &matrix.legs))
        .collect();
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(&map)?,
        OutputFormat::Yaml => serde_yaml::to_string(&map)?,
    })
}

fn leg_name(key: &GroupKey, first_path: &str, common_prefix: &[String]) -> String {
    let segments: Vec<&str> = first_path.split('/').collect();
    // keep at least the last segment
    let shared = segments
        .iter()
        .zip(common_prefix)
        .take_while(|(a, b)| **a == b.as_str())
        .count()
        .min(segments.len().saturating_sub(1));

    let architecture_display = format!(
        "{}{}",
        key.architecture,
        key.variant.as_deref().unwrap_or_default()
    );
    let redundant = |segment: &str| {
        segment.eq_ignore_ascii_case(&key.os_version)
            || segment.eq_ignore_ascii_case(&key.architecture)
            || segment.eq_ignore_ascii_case(&architecture_display)
            || key
                .variant
                .as_deref()
                .is_some_and(|variant| segment.eq_ignore_ascii_case(variant))
    };

    let mut parts = vec![key.os_version.as_str()];
    parts.extend(segments[shared..].iter().copied().filter(|s| !redundant(s)));
    sanitize(&parts.join("-"))
}

fn unique_name(existing: &BTreeMap<String, LegVariables>, name: String) -> String {
    if !existing.contains_key(&name) {
        return name;
    }
    (2..)
        .map(|n| format!("{}-{}", name, n))
        .find(|candidate| !existing.contains_key(candidate))
        .unwrap_or(name)
}

fn leg_variables(key: &GroupKey, paths: &BTreeSet<&str>) -> LegVariables {
    let mut variables = LegVariables::new();
    let path_args: Vec<String> = paths.iter().map(|p| format!("--path '{}'", p)).collect();
    variables.insert("imageBuilderPaths".to_string(), path_args.join(" "));
    variables.insert("osType".to_string(), key.os.clone());
    variables.insert(
        "osVersions".to_string(),
        format!("--os-version {}", key.os_version),
    );
    variables.insert("osVersion".to_string(), key.os_version.clone());
    variables.insert("architecture".to_string(), key.architecture.clone());
    if let Some(variant) = &key.variant {
        variables.insert("variant".to_string(), variant.clone());
    }
    variables
}

/// Replace characters CI systems reject in leg names
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '-'
            }
        })
        .collect()
}
