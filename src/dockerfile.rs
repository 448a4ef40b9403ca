//! Dockerfile `FROM` parsing and base-image classification
//!
//! Only the parts of a Dockerfile that matter for the dependency graph are
//! read: global `ARG` defaults declared before the first `FROM`, and every
//! `FROM <image> [AS <stage>]` line in file order.
//!
//! ## Stage references
//!
//! `FROM build` refers to an earlier `FROM ... AS build` rather than to a
//! registry image. Only stages declared *above* the referencing line count,
//! and stage names compare case-insensitively like Docker does. Stage
//! references never become dependencies.
//!
//! ## Classification
//!
//! Every remaining reference is either:
//! - `scratch` - no dependency at all,
//! - **internal** - its repository is one of the manifest's repos,
//! - **external** - anything else (a third-party base image).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{Error, Result};

static FROM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[ \t]*FROM[ \t]+(?:--\S+[ \t]+)*(?P<image>[^\s#]+)(?:[ \t]+AS[ \t]+(?P<stage>[^\s#]+))?[ \t]*\r?$",
    )
    .expect("FROM regex is valid")
});

static ARG_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*ARG[ \t]+(?P<name>[A-Za-z_][A-Za-z0-9_]*)(?:=(?P<value>\S*))?[ \t]*\r?$")
        .expect("ARG regex is valid")
});

static ARG_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(?P<braced>[A-Za-z_][A-Za-z0-9_]*)\}|\$(?P<bare>[A-Za-z_][A-Za-z0-9_]*)")
        .expect("ARG token regex is valid")
});

/// Reserved base image meaning "no base image"
pub const SCRATCH: &str = "scratch";

/// One `FROM` instruction after build-arg substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromInstruction {
    /// Image reference, or stage name when `is_stage_reference` is set
    pub image: String,
    /// Name declared with `AS <stage>`
    pub stage_name: Option<String>,
    /// Whether `image` names an earlier stage of the same Dockerfile
    pub is_stage_reference: bool,
}

/// Base images of a Dockerfile, split by origin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BaseImages {
    /// References to images built by the same manifest
    pub internal: Vec<String>,
    /// Third-party references
    pub external: Vec<String>,
    /// Image of the last non-stage `FROM`; `None` when it is `scratch`
    pub final_stage: Option<String>,
}

/// Parse every `FROM` instruction of a Dockerfile
///
/// `dockerfile` is only used to identify the file in errors.
pub fn parse_from_instructions(
    content: &str,
    build_args: &BTreeMap<String, String>,
    dockerfile: &str,
) -> Result<Vec<FromInstruction>> {
    let froms: Vec<Captures> = FROM_LINE.captures_iter(content).collect();
    let Some(first_from) = froms.first() else {
        return Err(Error::MissingFrom {
            dockerfile: dockerfile.to_string(),
        });
    };

    // Global ARG defaults, overridden by the platform's build args
    let first_from_offset = first_from.get(0).map(|m| m.start()).unwrap_or(0);
    let mut args: BTreeMap<String, String> = ARG_LINE
        .captures_iter(&content[..first_from_offset])
        .filter_map(|caps| {
            let value = caps.name("value")?.as_str().trim_matches('"').trim_matches('\'');
            Some((caps["name"].to_string(), value.to_string()))
        })
        .collect();
    args.extend(build_args.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut stages: Vec<String> = Vec::new();
    let mut instructions = Vec::with_capacity(froms.len());

    for caps in froms {
        let image = substitute_args(&caps["image"], &args, dockerfile)?;
        let is_stage_reference = stages.iter().any(|stage| stage.eq_ignore_ascii_case(&image));

        let stage_name = caps.name("stage").map(|m| m.as_str().to_string());
        if let Some(stage) = &stage_name {
            if stages.iter().any(|existing| existing.eq_ignore_ascii_case(stage)) {
                return Err(Error::AmbiguousStage {
                    stage: stage.clone(),
                    dockerfile: dockerfile.to_string(),
                });
            }
            stages.push(stage.clone());
        }

        instructions.push(FromInstruction {
            image,
            stage_name,
            is_stage_reference,
        });
    }

    Ok(instructions)
}

/// Replace `$NAME` and `${NAME}` tokens with build-arg values
pub fn substitute_args(
    value: &str,
    args: &BTreeMap<String, String>,
    dockerfile: &str,
) -> Result<String> {
    let mut missing = None;
    let output = ARG_TOKEN.replace_all(value, |caps: &Captures| {
        let name = caps
            .name("braced")
            .or_else(|| caps.name("bare"))
            .map(|m| m.as_str())
            .unwrap_or_default();
        match args.get(name) {
            Some(arg) => arg.clone(),
            None => {
                missing.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(arg) => Err(Error::UnresolvedBuildArg {
            arg,
            dockerfile: dockerfile.to_string(),
        }),
        None => Ok(output.into_owned()),
    }
}

/// Split non-stage references into internal and external base images
///
/// `is_internal` decides whether a reference points at an image built by the
/// same manifest. Both lists keep file order without duplicates.
pub fn classify<F>(instructions: &[FromInstruction], is_internal: F) -> BaseImages
where
    F: Fn(&str) -> bool,
{
    let mut base_images = BaseImages::default();

    for from in instructions.iter().filter(|from| !from.is_stage_reference) {
        if is_scratch(&from.image) {
            continue;
        }
        let target = if is_internal(&from.image) {
            &mut base_images.internal
        } else {
            &mut base_images.external
        };
        if !target.contains(&from.image) {
            target.push(from.image.clone());
        }
    }

    base_images.final_stage = instructions
        .iter()
        .rev()
        .find(|from| !from.is_stage_reference)
        .filter(|from| !is_scratch(&from.image))
        .map(|from| from.image.clone());

    base_images
}

/// Whether a reference is the reserved `scratch` image
pub fn is_scratch(reference: &str) -> bool {
    reference.eq_ignore_ascii_case(SCRATCH)
}

/// Repository part of an image reference (tag and digest removed)
///
/// ```
/// use image_builder::dockerfile::repository_name;
///
/// assert_eq!(repository_name("mcr.example.com/dotnet/runtime:8.0"), "mcr.example.com/dotnet/runtime");
/// assert_eq!(repository_name("localhost:5000/app@sha256:abc"), "localhost:5000/app");
/// assert_eq!(repository_name("alpine"), "alpine");
/// ```
pub fn repository_name(reference: &str) -> &str {
    let without_digest = reference.split('@').next().unwrap_or(reference);
    let last_slash = without_digest.rfind('/').map(|i| i + 1).unwrap_or(0);
    match without_digest[last_slash..].rfind(':') {
        Some(colon) => &without_digest[..last_slash + colon],
        None => without_digest,
    }
}
