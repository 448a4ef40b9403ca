//! Path and pattern utilities for image-builder

use glob::{MatchOptions, Pattern};

use crate::error::{Error, Result};

const CASE_INSENSITIVE: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Match a value against a glob pattern (`*` and `?`), ignoring case
pub fn glob_match(pattern: &str, value: &str) -> Result<bool> {
    let pattern = Pattern::new(pattern).map_err(Error::Glob)?;
    Ok(pattern.matches_with(value, CASE_INSENSITIVE))
}

/// Normalize a manifest-relative path
///
/// Converts `\` separators to `/`, drops `.` segments and trailing slashes.
/// Absolute paths and paths escaping the manifest directory with `..` are
/// rejected.
pub fn normalize_relative(path: &str) -> Result<String> {
    let unified = path.replace('\\', "/");
    let invalid = |message: &str| Error::InvalidPath {
        path: path.to_string(),
        message: message.to_string(),
    };

    if unified.starts_with('/') || unified.chars().nth(1) == Some(':') {
        return Err(invalid("path must be relative to the manifest"));
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(invalid("path must not leave the manifest directory")),
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(invalid("path is empty"));
    }
    Ok(segments.join("/"))
}

/// Join two manifest-relative paths
pub fn join(base: &str, path: &str) -> String {
    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base.trim_end_matches('/'), path)
    }
}

/// Directory part of a relative path (`""` for a top-level entry)
pub fn parent(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

/// Leading path segments shared by every path
pub fn common_prefix_segments<'a, I>(paths: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut iter = paths.into_iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };

    let mut prefix: Vec<&str> = first.split('/').collect();
    for path in iter {
        let shared = prefix
            .iter()
            .zip(path.split('/'))
            .take_while(|(a, b)| *a == b)
            .count();
        prefix.truncate(shared);
    }
    prefix.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("src/runtime/*", "src/runtime/8.0").unwrap());
        assert!(glob_match("src/*/8.0/*", "src/sdk/8.0/jammy").unwrap());
        assert!(glob_match("arm?4", "arm64").unwrap());
        assert!(glob_match("Linux", "linux").unwrap());
        assert!(!glob_match("amd64", "arm64").unwrap());
        assert!(glob_match("[oops", "x").is_err());
    }

    #[test]
    fn test_normalize_relative() {
        assert_eq!(
            normalize_relative("src\\runtime\\8.0\\").unwrap(),
            "src/runtime/8.0"
        );
        assert_eq!(
            normalize_relative("./src//runtime/./8.0").unwrap(),
            "src/runtime/8.0"
        );
        assert!(matches!(
            normalize_relative("/abs/path"),
            Err(Error::InvalidPath { .. })
        ));
        assert!(normalize_relative("C:/images").is_err());
        assert!(normalize_relative("src/../../etc").is_err());
        assert!(normalize_relative("./").is_err());
    }

    #[test]
    fn test_join_and_parent() {
        assert_eq!(join("", "Dockerfile"), "Dockerfile");
        assert_eq!(join("src/app/", "Dockerfile"), "src/app/Dockerfile");
        assert_eq!(parent("src/app/Dockerfile"), "src/app");
        assert_eq!(parent("Dockerfile"), "");
    }

    #[test]
    fn test_common_prefix_segments() {
        let paths = ["src/runtime/8.0/jammy", "src/runtime/9.0/jammy", "src/runtime/8.0/alpine"];
        assert_eq!(
            common_prefix_segments(paths.iter().copied()),
            vec!["src".to_string(), "runtime".to_string()]
        );
        assert_eq!(
            common_prefix_segments(["src/a", "eng/b"].iter().copied()),
            Vec::<String>::new()
        );
        assert!(common_prefix_segments(std::iter::empty()).is_empty());
    }
}
