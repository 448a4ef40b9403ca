//! Default values shared by the commands.

use std::path::PathBuf;

/// Manifest file used when `--manifest` is not given
pub const DEFAULT_MANIFEST: &str = "manifest.json";

/// Commit message used when publishing image info
pub const DEFAULT_COMMIT_MESSAGE: &str = "Update image info";

/// Returns the default cache root directory for repository checkouts.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/image-builder` (XDG Base Directory)
/// - macOS: `~/Library/Caches/image-builder`
/// - Windows: `{FOLDERID_LocalAppData}\image-builder`
///
/// Falls back to `.image-builder-cache` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--cache-root` CLI flag or the
/// `IMAGE_BUILDER_CACHE` environment variable.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".image-builder-cache"))
        .join("image-builder")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cache_root_returns_path() {
        assert!(default_cache_root().ends_with("image-builder"));
    }

    #[test]
    fn test_default_cache_root_is_absolute_or_fallback() {
        let cache_root = default_cache_root();
        assert!(
            cache_root.is_absolute() || cache_root.starts_with(".image-builder-cache"),
            "Expected absolute path or fallback, got: {:?}",
            cache_root
        );
    }
}
