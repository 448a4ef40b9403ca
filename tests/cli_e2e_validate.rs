//! End-to-end tests for the `validate` command.
//!
//! These tests invoke the actual CLI binary and validate the behavior of the
//! `validate` subcommand from a user's perspective.

mod common;
use common::prelude::*;

#[test]
fn test_validate_sample_manifest() {
    let fixture = TestFixture::new().with_sample_manifest();

    fixture
        .command()
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 repos, 2 images, 2 platforms, 1 dependencies"));
}

#[test]
fn test_validate_explicit_manifest_path() {
    let fixture = TestFixture::new()
        .with_file("eng/manifest.json", manifests::SAMPLE)
        .with_file("eng/src/base/jammy/amd64/Dockerfile", manifests::BASE_DOCKERFILE)
        .with_file("eng/src/app/jammy/amd64/Dockerfile", manifests::APP_DOCKERFILE);

    fixture
        .command()
        .arg("validate")
        .arg("--manifest")
        .arg("eng/manifest.json")
        .assert()
        .success();
}

#[test]
fn test_validate_missing_manifest() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("validate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("manifest.json"));
}

#[test]
fn test_validate_missing_dockerfile() {
    let fixture = TestFixture::new()
        .with_manifest(manifests::SAMPLE)
        .with_file("src/base/jammy/amd64/Dockerfile", manifests::BASE_DOCKERFILE);

    fixture
        .command()
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Manifest is invalid"));
}

#[test]
fn test_validate_duplicate_tags() {
    let fixture = TestFixture::new()
        .with_manifest(manifests::DUPLICATE_TAGS)
        .with_file("a/Dockerfile", "FROM ubuntu:jammy\n")
        .with_file("b/Dockerfile", "FROM ubuntu:jammy\n");

    fixture.command().arg("validate").assert().failure();
}

#[test]
fn test_validate_invalid_json() {
    let fixture = TestFixture::new().with_manifest("{ \"repos\": [ ");

    fixture.command().arg("validate").assert().failure();
}

#[test]
fn test_validate_reports_scratch_images() {
    let fixture = TestFixture::new()
        .with_manifest(
            r#"{ "repos": [ { "name": "tiny", "images": [ { "platforms": [
                { "dockerfile": "tiny", "os": "linux", "osVersion": "none", "architecture": "amd64", "tags": { "1": {} } }
            ] } ] } ] }"#,
        )
        .with_file("tiny/Dockerfile", "FROM scratch\nCOPY hello /\n");

    fixture
        .command()
        .args(["--color", "never", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tiny builds from scratch"));
}

#[test]
fn test_validate_variable_override() {
    let fixture = TestFixture::new()
        .with_manifest(
            r#"{ "variables": { "os": "jammy" }, "repos": [ { "name": "base", "images": [ { "platforms": [
                { "dockerfile": "src/$(os)", "os": "linux", "osVersion": "$(os)", "architecture": "amd64", "tags": { "$(os)": {} } }
            ] } ] } ] }"#,
        )
        .with_file("src/noble/Dockerfile", "FROM ubuntu:noble\n");

    // only the overridden directory exists
    fixture.command().arg("validate").assert().failure();
    fixture
        .command()
        .args(["validate", "--var", "os=noble"])
        .assert()
        .success();
}
