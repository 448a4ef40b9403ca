//! Resolved manifest view
//!
//! [`ManifestInfo`] is built once per invocation from a loaded [`Manifest`]:
//! every string has its variables substituted, every platform has its
//! Dockerfile located and its `FROM` instructions parsed and classified, and
//! the validation rules (unique tags, non-empty tag sets, existing relative
//! files) have been checked. It is immutable afterwards.
//!
//! Platforms are stored in one flat list in declaration order and addressed
//! by [`PlatformId`]; repos and images refer to their platforms by id.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::debug;

use super::loader;
use super::model::{DocType, Manifest, Platform, Tag};
use crate::context::RunContext;
use crate::dockerfile::{self, FromInstruction};
use crate::error::{Error, Result};
use crate::filesystem::FileSource;
use crate::path;
use crate::variables::VariableResolver;

/// File name used when a platform's `dockerfile` names a directory
pub const DOCKERFILE_NAME: &str = "Dockerfile";

/// Index of a platform in [`ManifestInfo::platforms`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlatformId(pub usize);

/// Options applied while resolving a manifest
#[derive(Debug, Clone, Default)]
pub struct ManifestOptions {
    /// Variable values that take precedence over the manifest's `variables`
    pub variables: BTreeMap<String, String>,
}

/// A tag after variable substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagInfo {
    pub name: String,
    /// `repoName:tagName`
    pub full_name: String,
    pub doc_type: DocType,
}

/// A resolved repo
#[derive(Debug, Clone)]
pub struct RepoInfo {
    pub name: String,
    pub id: Option<String>,
    pub readmes: Vec<String>,
    pub images: Vec<ImageInfo>,
}

/// A resolved image
#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub product_version: Option<String>,
    pub shared_tags: Vec<TagInfo>,
    pub platforms: Vec<PlatformId>,
}

/// A resolved platform
#[derive(Debug, Clone)]
pub struct PlatformInfo {
    pub id: PlatformId,
    pub repo_name: String,
    pub repo_index: usize,
    pub image_index: usize,
    /// Normalized `dockerfile` value; identity in image-info and filters
    pub path: String,
    /// Path of the Dockerfile itself
    pub dockerfile_path: String,
    pub os: String,
    pub os_version: String,
    pub architecture: String,
    pub variant: Option<String>,
    pub build_args: BTreeMap<String, String>,
    pub tags: Vec<TagInfo>,
    pub from_instructions: Vec<FromInstruction>,
    /// Base images built by this manifest, as written in the Dockerfile
    pub internal_from_images: Vec<String>,
    /// Third-party base images
    pub external_from_images: Vec<String>,
    pub final_stage_from_image: Option<String>,
}

impl PlatformInfo {
    /// Build-context directory
    pub fn build_context_path(&self) -> &str {
        path::parent(&self.dockerfile_path)
    }

    /// Architecture with its variant appended (`arm64v8`)
    pub fn architecture_display(&self) -> String {
        format!(
            "{}{}",
            self.architecture,
            self.variant.as_deref().unwrap_or_default()
        )
    }

    /// First tag, used as the platform's display name
    pub fn display_name(&self) -> &str {
        self.tags
            .first()
            .map(|tag| tag.full_name.as_str())
            .unwrap_or(self.path.as_str())
    }
}

/// The resolved, validated manifest
#[derive(Debug, Clone)]
pub struct ManifestInfo {
    pub registry: Option<String>,
    pub readmes: Vec<String>,
    pub repos: Vec<RepoInfo>,
    platforms: Vec<PlatformInfo>,
    tag_index: HashMap<String, PlatformId>,
    shared_tag_index: HashMap<String, (usize, usize)>,
}

impl ManifestInfo {
    /// Load, compose and resolve the manifest at `manifest_path`
    pub fn load(
        files: &dyn FileSource,
        manifest_path: &str,
        options: &ManifestOptions,
        context: &RunContext,
    ) -> Result<Self> {
        let manifest = loader::load(files, manifest_path)?;
        let base_dir = path::parent(&path::normalize_relative(manifest_path)?).to_string();
        Self::resolve(manifest, files, &base_dir, options, context)
    }

    /// Resolve an already composed manifest whose files live under `base_dir`
    pub fn resolve(
        manifest: Manifest,
        files: &dyn FileSource,
        base_dir: &str,
        options: &ManifestOptions,
        context: &RunContext,
    ) -> Result<Self> {
        let base_resolver =
            VariableResolver::new(context, manifest.variables.clone(), options.variables.clone());

        let registry = base_resolver.substitute_opt(manifest.registry.as_deref())?;
        let repo_names = manifest
            .repos
            .iter()
            .map(|repo| base_resolver.substitute(&repo.name))
            .collect::<Result<Vec<_>>>()?;
        // the loader consolidates raw names; substituted names must stay unique too
        let mut raw_by_name: HashMap<&str, &str> = HashMap::new();
        for (repo, name) in manifest.repos.iter().zip(&repo_names) {
            if let Some(first) = raw_by_name.insert(name, &repo.name) {
                return Err(Error::RepoConsolidation {
                    repo: name.clone(),
                    field: "name".to_string(),
                    first: first.to_string(),
                    second: repo.name.clone(),
                });
            }
        }
        let repo_ids: BTreeMap<String, String> = manifest
            .repos
            .iter()
            .zip(&repo_names)
            .filter_map(|(repo, name)| repo.id.clone().map(|id| (id, name.clone())))
            .collect();
        let resolver = base_resolver.with_repo_names(repo_ids);

        let internal_repos: BTreeSet<String> = repo_names.iter().cloned().collect();
        let classifier = InternalRepos {
            registry: registry.clone(),
            names: internal_repos,
        };

        let mut readmes = Vec::new();
        for readme in &manifest.readmes {
            readmes.push(resolve_readme(&resolver, files, base_dir, &readme.path)?);
        }

        let mut repos = Vec::with_capacity(manifest.repos.len());
        let mut platforms = Vec::new();

        for (repo_index, (repo, repo_name)) in manifest.repos.iter().zip(&repo_names).enumerate() {
            let mut seen_tags = BTreeSet::new();
            let mut repo_readmes = Vec::new();
            for readme in &repo.readmes {
                repo_readmes.push(resolve_readme(&resolver, files, base_dir, &readme.path)?);
            }

            let mut images = Vec::with_capacity(repo.images.len());
            for (image_index, image) in repo.images.iter().enumerate() {
                let shared_tags = resolve_tags(&resolver, repo_name, &image.shared_tags, &mut seen_tags)?;

                let mut image_platforms = Vec::with_capacity(image.platforms.len());
                for platform in &image.platforms {
                    let id = PlatformId(platforms.len());
                    let info = resolve_platform(
                        platform,
                        PlatformLocation {
                            id,
                            repo_name,
                            repo_index,
                            image_index,
                        },
                        &resolver,
                        files,
                        base_dir,
                        &classifier,
                        &mut seen_tags,
                    )?;
                    image_platforms.push(id);
                    platforms.push(info);
                }

                images.push(ImageInfo {
                    product_version: resolver.substitute_opt(image.product_version.as_deref())?,
                    shared_tags,
                    platforms: image_platforms,
                });
            }

            repos.push(RepoInfo {
                name: repo_name.clone(),
                id: repo.id.clone(),
                readmes: repo_readmes,
                images,
            });
        }

        let mut tag_index = HashMap::new();
        for platform in &platforms {
            for tag in &platform.tags {
                tag_index.insert(tag.full_name.clone(), platform.id);
            }
        }
        let mut shared_tag_index = HashMap::new();
        for (repo_index, repo) in repos.iter().enumerate() {
            for (image_index, image) in repo.images.iter().enumerate() {
                for tag in &image.shared_tags {
                    shared_tag_index.insert(tag.full_name.clone(), (repo_index, image_index));
                }
            }
        }

        debug!(
            "Resolved manifest: {} repos, {} platforms",
            repos.len(),
            platforms.len()
        );

        Ok(Self {
            registry,
            readmes,
            repos,
            platforms,
            tag_index,
            shared_tag_index,
        })
    }

    /// All platforms in declaration order
    pub fn platforms(&self) -> &[PlatformInfo] {
        &self.platforms
    }

    pub fn platform(&self, id: PlatformId) -> &PlatformInfo {
        &self.platforms[id.0]
    }

    /// Ids of all platforms in declaration order
    pub fn platform_ids(&self) -> Vec<PlatformId> {
        self.platforms.iter().map(|p| p.id).collect()
    }

    /// The image a platform belongs to
    pub fn image_of(&self, id: PlatformId) -> &ImageInfo {
        let platform = self.platform(id);
        &self.repos[platform.repo_index].images[platform.image_index]
    }

    /// Find a platform by its normalized path
    pub fn platform_by_path(&self, path: &str) -> Option<&PlatformInfo> {
        self.platforms.iter().find(|p| p.path == path)
    }

    /// Strip the manifest registry from an image reference
    pub fn normalize_reference<'a>(&self, reference: &'a str) -> &'a str {
        strip_registry(self.registry.as_deref(), reference)
    }

    /// Platforms a `FROM` reference resolves to
    ///
    /// A platform tag resolves to its platform. A shared tag resolves to the
    /// platforms of its image with the same OS and architecture as `child`,
    /// or to every platform of the image when none match.
    pub fn platforms_for_reference(&self, reference: &str, child: &PlatformInfo) -> Vec<PlatformId> {
        let normalized = self.normalize_reference(reference);
        if let Some(id) = self.tag_index.get(normalized) {
            return vec![*id];
        }

        let Some(&(repo_index, image_index)) = self.shared_tag_index.get(normalized) else {
            return Vec::new();
        };
        let candidates = &self.repos[repo_index].images[image_index].platforms;
        let matching: Vec<PlatformId> = candidates
            .iter()
            .copied()
            .filter(|id| {
                let platform = self.platform(*id);
                platform.os.eq_ignore_ascii_case(&child.os)
                    && platform.architecture.eq_ignore_ascii_case(&child.architecture)
                    && platform.variant == child.variant
            })
            .collect();
        if matching.is_empty() {
            candidates.clone()
        } else {
            matching
        }
    }
}

struct PlatformLocation<'a> {
    id: PlatformId,
    repo_name: &'a str,
    repo_index: usize,
    image_index: usize,
}

/// Decides whether a reference names a repo of this manifest
struct InternalRepos {
    registry: Option<String>,
    names: BTreeSet<String>,
}

impl InternalRepos {
    fn contains(&self, reference: &str) -> bool {
        let repo = dockerfile::repository_name(reference);
        self.names.contains(repo) || self.names.contains(strip_registry(self.registry.as_deref(), repo))
    }
}

fn strip_registry<'a>(registry: Option<&str>, reference: &'a str) -> &'a str {
    registry
        .and_then(|registry| reference.strip_prefix(registry.trim_end_matches('/')))
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(reference)
}

fn resolve_tags(
    resolver: &VariableResolver,
    repo_name: &str,
    tags: &BTreeMap<String, Tag>,
    seen: &mut BTreeSet<String>,
) -> Result<Vec<TagInfo>> {
    let mut resolved = Vec::with_capacity(tags.len());
    for (name, tag) in tags {
        let name = resolver.substitute(name)?;
        if !seen.insert(name.clone()) {
            return Err(Error::DuplicateTag {
                repo: repo_name.to_string(),
                tag: name,
            });
        }
        resolved.push(TagInfo {
            full_name: format!("{}:{}", repo_name, name),
            name,
            doc_type: tag.doc_type,
        });
    }
    Ok(resolved)
}

fn resolve_readme(
    resolver: &VariableResolver,
    files: &dyn FileSource,
    base_dir: &str,
    readme: &str,
) -> Result<String> {
    let readme = path::normalize_relative(&resolver.substitute(readme)?)?;
    let full = path::join(base_dir, &readme);
    if !files.is_file(&full) {
        return Err(Error::MissingFile { path: readme });
    }
    Ok(readme)
}

fn resolve_platform(
    platform: &Platform,
    location: PlatformLocation,
    resolver: &VariableResolver,
    files: &dyn FileSource,
    base_dir: &str,
    classifier: &InternalRepos,
    seen_tags: &mut BTreeSet<String>,
) -> Result<PlatformInfo> {
    let path = path::normalize_relative(&resolver.substitute(&platform.dockerfile)?)?;
    let full = path::join(base_dir, &path);
    let dockerfile_path = if files.is_dir(&full) {
        path::join(&path, DOCKERFILE_NAME)
    } else {
        path.clone()
    };
    let dockerfile_full = path::join(base_dir, &dockerfile_path);
    if !files.is_file(&dockerfile_full) {
        return Err(Error::MissingFile {
            path: dockerfile_path,
        });
    }

    if platform.tags.is_empty() {
        return Err(Error::ManifestValidation {
            message: format!("Platform '{}' in repo '{}' has no tags", path, location.repo_name),
            hint: Some("Every platform needs at least one entry in 'tags'".to_string()),
        });
    }
    let tags = resolve_tags(resolver, location.repo_name, &platform.tags, seen_tags)?;

    let build_args = platform
        .build_args
        .iter()
        .map(|(name, value)| Ok((name.clone(), resolver.substitute(value)?)))
        .collect::<Result<BTreeMap<_, _>>>()?;

    let content = files.read_to_string(&dockerfile_full)?;
    let from_instructions =
        dockerfile::parse_from_instructions(&content, &build_args, &dockerfile_path)?;
    let base_images = dockerfile::classify(&from_instructions, |image| classifier.contains(image));

    Ok(PlatformInfo {
        id: location.id,
        repo_name: location.repo_name.to_string(),
        repo_index: location.repo_index,
        image_index: location.image_index,
        path,
        dockerfile_path,
        os: resolver.substitute(&platform.os)?,
        os_version: resolver.substitute(&platform.os_version)?,
        architecture: resolver.substitute(&platform.architecture)?,
        variant: resolver.substitute_opt(platform.variant.as_deref())?,
        build_args,
        tags,
        from_instructions,
        internal_from_images: base_images.internal,
        external_from_images: base_images.external,
        final_stage_from_image: base_images.final_stage,
    })
}
