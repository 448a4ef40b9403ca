//! Shared test utilities for the CLI E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_sample_manifest();
//!     fixture.command().arg("validate").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    pub use super::TestFixture;
}

/// Manifest snippets for testing.
#[allow(dead_code)]
pub mod manifests {
    /// Two repos: `app` is built from `base`.
    pub const SAMPLE: &str = r#"{
  "repos": [
    {
      "name": "base",
      "images": [
        {
          "platforms": [
            {
              "dockerfile": "src/base/jammy/amd64",
              "os": "linux",
              "osVersion": "jammy",
              "architecture": "amd64",
              "tags": { "1.0-jammy": {} }
            }
          ]
        }
      ]
    },
    {
      "name": "app",
      "images": [
        {
          "platforms": [
            {
              "dockerfile": "src/app/jammy/amd64",
              "os": "linux",
              "osVersion": "jammy",
              "architecture": "amd64",
              "tags": { "1.0-jammy": {}, "latest": {} }
            }
          ]
        }
      ]
    }
  ]
}
"#;

    pub const BASE_DOCKERFILE: &str = "FROM ubuntu:jammy\nRUN echo base\n";

    pub const APP_DOCKERFILE: &str = "FROM base:1.0-jammy\nCOPY app /app\n";

    /// The same tag declared on two platforms.
    pub const DUPLICATE_TAGS: &str = r#"{
  "repos": [
    {
      "name": "base",
      "images": [
        {
          "platforms": [
            { "dockerfile": "a", "os": "linux", "osVersion": "jammy", "architecture": "amd64", "tags": { "latest": {} } },
            { "dockerfile": "b", "os": "linux", "osVersion": "jammy", "architecture": "arm64", "tags": { "latest": {} } }
          ]
        }
      ]
    }
  ]
}
"#;
}

/// A temporary directory holding a manifest and its Dockerfiles.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `manifest.json` with the given content.
    pub fn with_manifest(self, content: &str) -> Self {
        self.with_file("manifest.json", content)
    }

    /// Write the two-repo sample manifest and both Dockerfiles.
    #[allow(dead_code)]
    pub fn with_sample_manifest(self) -> Self {
        self.with_manifest(manifests::SAMPLE)
            .with_file("src/base/jammy/amd64/Dockerfile", manifests::BASE_DOCKERFILE)
            .with_file("src/app/jammy/amd64/Dockerfile", manifests::APP_DOCKERFILE)
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the manifest.
    #[allow(dead_code)]
    pub fn manifest_path(&self) -> PathBuf {
        self.temp_dir.path().join("manifest.json")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command configured to run in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("image-builder");
        cmd.current_dir(self.path()).env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_sample_manifest() {
        let fixture = TestFixture::new().with_sample_manifest();
        assert!(fixture.manifest_path().exists());
        assert!(fixture.path().join("src/app/jammy/amd64/Dockerfile").exists());
    }

    #[test]
    fn test_manifests_are_valid_json() {
        for manifest in [manifests::SAMPLE, manifests::DUPLICATE_TAGS] {
            let parsed: Result<serde_json::Value, _> = serde_json::from_str(manifest);
            assert!(parsed.is_ok(), "Manifest should be valid JSON: {}", manifest);
        }
    }
}
