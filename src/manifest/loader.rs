//! Manifest loading: include composition and repo consolidation
//!
//! Loading happens in three steps:
//!
//! 1.  **Parse** the root manifest.
//! 2.  **Compose** every file listed in `includes` (paths relative to the
//!     manifest directory): their repos are appended in order and their
//!     variables added, refusing to redefine an existing variable.
//! 3.  **Consolidate** repos that share a name into one, concatenating their
//!     images and readmes. Non-collection fields must be identical or absent.

use log::debug;

use super::model::{self, Manifest, Repo};
use crate::error::{Error, Result};
use crate::filesystem::FileSource;
use crate::path;

/// Load a manifest and everything it includes
pub fn load(files: &dyn FileSource, manifest_path: &str) -> Result<Manifest> {
    let manifest_path = path::normalize_relative(manifest_path)?;
    if !files.is_file(&manifest_path) {
        return Err(Error::MissingFile {
            path: manifest_path,
        });
    }

    let mut manifest = model::parse(&files.read_to_string(&manifest_path)?)?;
    let base_dir = path::parent(&manifest_path).to_string();

    for include in manifest.includes.clone() {
        let include_path = path::normalize_relative(&path::join(&base_dir, &include))?;
        if !files.is_file(&include_path) {
            return Err(Error::MissingFile { path: include_path });
        }
        debug!("Merging manifest include {}", include_path);
        let fragment = model::parse(&files.read_to_string(&include_path)?)?;
        compose_include(&mut manifest, fragment, &include_path)?;
    }

    manifest.repos = consolidate_repos(std::mem::take(&mut manifest.repos))?;
    Ok(manifest)
}

/// Merge one include fragment into the manifest
pub fn compose_include(manifest: &mut Manifest, fragment: Manifest, include: &str) -> Result<()> {
    if !fragment.includes.is_empty() {
        return Err(Error::ManifestValidation {
            message: format!("Include '{}' declares its own includes", include),
            hint: Some("List every include in the root manifest".to_string()),
        });
    }

    for (name, value) in fragment.variables {
        if manifest.variables.contains_key(&name) {
            return Err(Error::VariableCollision {
                name,
                include: include.to_string(),
            });
        }
        manifest.variables.insert(name, value);
    }

    manifest.readmes.extend(fragment.readmes);
    manifest.repos.extend(fragment.repos);
    Ok(())
}

/// Merge repos sharing a name, keeping first-occurrence order
pub fn consolidate_repos(repos: Vec<Repo>) -> Result<Vec<Repo>> {
    let mut consolidated: Vec<Repo> = Vec::with_capacity(repos.len());

    for repo in repos {
        match consolidated.iter_mut().find(|existing| existing.name == repo.name) {
            Some(existing) => merge_repo(existing, repo)?,
            None => consolidated.push(repo),
        }
    }

    Ok(consolidated)
}

fn merge_repo(target: &mut Repo, source: Repo) -> Result<()> {
    if let Some(second) = source.id {
        match target.id.clone() {
            None => target.id = Some(second),
            Some(first) if first != second => {
                return Err(Error::RepoConsolidation {
                    repo: target.name.clone(),
                    field: "id".to_string(),
                    first,
                    second,
                });
            }
            Some(_) => {}
        }
    }

    for readme in source.readmes {
        if !target.readmes.contains(&readme) {
            target.readmes.push(readme);
        }
    }
    target.images.extend(source.images);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::MemoryFiles;

    const BASE: &str = r#"{
        "registry": "mcr.example.com",
        "variables": { "branch": "main" },
        "includes": [ "manifest.runtime.json" ],
        "repos": [
            { "name": "dotnet/runtime-deps", "images": [ { "platforms": [] } ] },
            { "name": "dotnet/runtime", "images": [ { "productVersion": "8.0", "platforms": [] } ] }
        ]
    }"#;

    const INCLUDE: &str = r#"{
        "variables": { "runtime-version": "8.0.4" },
        "repos": [
            { "name": "dotnet/runtime", "id": "runtime", "images": [ { "productVersion": "9.0", "platforms": [] } ] },
            { "name": "dotnet/aspnet", "images": [] }
        ]
    }"#;

    #[test]
    fn test_load_with_includes_consolidates_repos() {
        let files = MemoryFiles::new()
            .with_file("manifest.json", BASE)
            .with_file("manifest.runtime.json", INCLUDE);

        let manifest = load(&files, "manifest.json").unwrap();

        let names: Vec<&str> = manifest.repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["dotnet/runtime-deps", "dotnet/runtime", "dotnet/aspnet"]
        );
        let runtime = &manifest.repos[1];
        assert_eq!(runtime.id.as_deref(), Some("runtime"));
        assert_eq!(runtime.images.len(), 2);
        assert_eq!(manifest.variables["runtime-version"], "8.0.4");
        assert_eq!(manifest.variables["branch"], "main");
    }

    #[test]
    fn test_include_paths_are_relative_to_manifest() {
        let files = MemoryFiles::new()
            .with_file("eng/manifest.json", BASE)
            .with_file("eng/manifest.runtime.json", INCLUDE);

        let manifest = load(&files, "eng/manifest.json").unwrap();
        assert_eq!(manifest.repos.len(), 3);
    }

    #[test]
    fn test_missing_include_fails() {
        let files = MemoryFiles::new().with_file("manifest.json", BASE);
        let err = load(&files, "manifest.json").unwrap_err();
        assert!(matches!(err, Error::MissingFile { path } if path == "manifest.runtime.json"));
    }

    #[test]
    fn test_missing_manifest_fails() {
        let files = MemoryFiles::new();
        assert!(matches!(
            load(&files, "manifest.json"),
            Err(Error::MissingFile { .. })
        ));
    }

    #[test]
    fn test_variable_collision_fails() {
        let include = r#"{ "variables": { "branch": "release" } }"#;
        let files = MemoryFiles::new()
            .with_file("manifest.json", BASE)
            .with_file("manifest.runtime.json", include);

        let err = load(&files, "manifest.json").unwrap_err();
        assert!(matches!(err, Error::VariableCollision { name, .. } if name == "branch"));
    }

    #[test]
    fn test_conflicting_repo_ids_fail() {
        let repos = vec![
            Repo {
                name: "dotnet/sdk".to_string(),
                id: Some("sdk".to_string()),
                ..Default::default()
            },
            Repo {
                name: "dotnet/sdk".to_string(),
                id: Some("dotnet-sdk".to_string()),
                ..Default::default()
            },
        ];

        let err = consolidate_repos(repos).unwrap_err();
        match err {
            Error::RepoConsolidation { repo, field, .. } => {
                assert_eq!(repo, "dotnet/sdk");
                assert_eq!(field, "id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nested_includes_rejected() {
        let include = r#"{ "includes": [ "other.json" ] }"#;
        let files = MemoryFiles::new()
            .with_file("manifest.json", BASE)
            .with_file("manifest.runtime.json", include);

        assert!(matches!(
            load(&files, "manifest.json"),
            Err(Error::ManifestValidation { .. })
        ));
    }
}
