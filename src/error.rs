//! # Error Handling
//!
//! This module defines the centralized error type for `image-builder`. It uses
//! `thiserror` to build a single `Error` enum covering every failure the
//! library can report, each variant carrying enough context (file, tag,
//! placeholder, image reference) to point the user at the offending input.
//!
//! The variants fall into four groups:
//!
//! - **Validation** errors raised while loading a manifest: duplicate tags,
//!   conflicting repo definitions, missing or non-relative files.
//! - **Resolution** errors raised while resolving variables and Dockerfiles:
//!   unresolved placeholders, unresolved build args, Dockerfiles without a
//!   `FROM`, ambiguous stage names.
//! - **Collaborator** errors surfaced unchanged from `docker` and `git`.
//! - **Ambient** errors wrapped from I/O, JSON/YAML, glob and regex crates.
//!
//! Merging image-info documents cannot fail, so there is no merge variant.

use thiserror::Error;

/// Main error type for image-builder operations
#[derive(Error, Debug)]
pub enum Error {
    /// The manifest is structurally invalid.
    ///
    /// Includes an optional hint about how to fix the manifest.
    #[error("Manifest validation error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ManifestValidation {
        message: String,
        /// Optional hint for how to fix the manifest
        hint: Option<String>,
    },

    /// Two platforms or images in the same repo declare the same tag.
    #[error("Duplicate tag '{tag}' in repo '{repo}'")]
    DuplicateTag { repo: String, tag: String },

    /// Repos with the same name disagree on a non-collection field.
    #[error("Cannot consolidate repo '{repo}': conflicting values for '{field}' ({first} vs {second})")]
    RepoConsolidation {
        repo: String,
        field: String,
        first: String,
        second: String,
    },

    /// An included manifest redeclares an existing variable.
    #[error("Variable '{name}' from include '{include}' is already defined")]
    VariableCollision { name: String, include: String },

    /// A manifest path is absolute or escapes the manifest directory.
    #[error("Invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// A file referenced by the manifest does not exist.
    #[error("Referenced file not found: {path}")]
    MissingFile { path: String },

    /// A `$(...)` placeholder has no value.
    #[error("Unresolved variable: {placeholder}{}", chain.as_ref().map(|c| format!(" (via {})", c)).unwrap_or_default())]
    UnresolvedVariable {
        placeholder: String,
        /// Variable chain that led to the placeholder, for nested definitions
        chain: Option<String>,
    },

    /// A `$ARG` token in a `FROM` line has no build-arg value.
    #[error("Unresolved build arg '{arg}' in {dockerfile}")]
    UnresolvedBuildArg { arg: String, dockerfile: String },

    /// A Dockerfile contains no `FROM` instruction.
    #[error("Dockerfile has no FROM instruction: {dockerfile}")]
    MissingFrom { dockerfile: String },

    /// A stage name is declared more than once in a Dockerfile.
    #[error("Ambiguous stage '{stage}' in {dockerfile}: stage name declared more than once")]
    AmbiguousStage { stage: String, dockerfile: String },

    /// A `docker` command failed.
    #[error("Docker command failed for {reference}: {command} - {stderr}")]
    Docker {
        command: String,
        reference: String,
        stderr: String,
    },

    /// An error occurred while cloning a Git repository.
    #[error("Git clone error for {url}@{branch}: {message}")]
    GitClone {
        url: String,
        branch: String,
        message: String,
    },

    /// A `git` command failed.
    #[error("Git command failed for {url}: {command} - {stderr}")]
    GitCommand {
        command: String,
        url: String,
        stderr: String,
    },

    /// A subscription entry is unusable.
    #[error("Subscription '{id}': {message}")]
    Subscription { id: String, message: String },

    /// An in-memory or on-disk file access failed.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML error, wrapped from `serde_yaml::Error`.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A regular expression error, wrapped from `regex::Error`.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A mutex guarding a shared cache has been poisoned.
    #[error("Lock poisoned: {context}")]
    LockPoisoned { context: String },
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_manifest_validation() {
        let error = Error::ManifestValidation {
            message: "Platform has no tags".to_string(),
            hint: None,
        };
        let display = format!("{}", error);
        assert!(display.contains("Manifest validation error"));
        assert!(display.contains("Platform has no tags"));
        assert!(!display.contains("hint:"));
    }

    #[test]
    fn test_error_display_manifest_validation_with_hint() {
        let error = Error::ManifestValidation {
            message: "Platform has no tags".to_string(),
            hint: Some("Add at least one entry to 'tags'".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("hint:"));
        assert!(display.contains("Add at least one entry"));
    }

    #[test]
    fn test_error_display_unresolved_variable() {
        let error = Error::UnresolvedVariable {
            placeholder: "$(branch)".to_string(),
            chain: None,
        };
        assert_eq!(error.to_string(), "Unresolved variable: $(branch)");

        let error = Error::UnresolvedVariable {
            placeholder: "$(a)".to_string(),
            chain: Some("a -> b -> a".to_string()),
        };
        assert!(error.to_string().contains("(via a -> b -> a)"));
    }

    #[test]
    fn test_error_display_build_arg() {
        let error = Error::UnresolvedBuildArg {
            arg: "REPO".to_string(),
            dockerfile: "src/runtime/8.0/Dockerfile".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("REPO"));
        assert!(display.contains("src/runtime/8.0/Dockerfile"));
    }

    #[test]
    fn test_error_display_repo_consolidation() {
        let error = Error::RepoConsolidation {
            repo: "dotnet/runtime".to_string(),
            field: "id".to_string(),
            first: "runtime".to_string(),
            second: "rt".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("dotnet/runtime"));
        assert!(display.contains("'id'"));
        assert!(display.contains("runtime vs rt"));
    }

    #[test]
    fn test_error_display_docker() {
        let error = Error::Docker {
            command: "image inspect".to_string(),
            reference: "alpine:3.19".to_string(),
            stderr: "No such image".to_string(),
        };
        let display = error.to_string();
        assert!(display.contains("Docker command failed"));
        assert!(display.contains("alpine:3.19"));
        assert!(display.contains("No such image"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        assert!(error.to_string().contains("I/O error"));
    }

    #[test]
    fn test_error_from_json_error() {
        let json_error = serde_json::from_str::<serde_json::Value>("{unclosed").unwrap_err();
        let error: Error = json_error.into();
        assert!(error.to_string().contains("JSON error"));
    }

    #[test]
    fn test_error_from_glob_error() {
        let glob_error = glob::Pattern::new("[unclosed").unwrap_err();
        let error: Error = glob_error.into();
        assert!(error.to_string().contains("Glob pattern error"));
    }
}
