//! Shared fixtures for unit tests.
//!
//! The sample manifest has this dependency graph (platform ids in brackets):
//!
//! ```text
//! runtime-deps amd64 [0] -> runtime amd64 [2] -> aspnet amd64 [4] -> sdk amd64 [5]
//!                                          \______________________/
//! runtime-deps arm64 [1] -> runtime arm64 [3]
//! app alpine [6]
//! ```
//!
//! sdk [5] has two parents: runtime [2] and aspnet [4].

use crate::context::RunContext;
use crate::filesystem::MemoryFiles;
use crate::manifest::{ManifestInfo, ManifestOptions, PlatformId};

pub const SAMPLE_MANIFEST: &str = r#"{
    "registry": "mcr.example.com",
    "repos": [
        {
            "id": "runtime-deps",
            "name": "dotnet/runtime-deps",
            "images": [ { "productVersion": "8.0", "platforms": [
                { "dockerfile": "src/runtime-deps/8.0/jammy/amd64", "os": "linux", "osVersion": "jammy", "architecture": "amd64",
                  "tags": { "8.0-jammy-amd64": {} } },
                { "dockerfile": "src/runtime-deps/8.0/jammy/arm64v8", "os": "linux", "osVersion": "jammy", "architecture": "arm64", "variant": "v8",
                  "tags": { "8.0-jammy-arm64v8": {} } }
            ] } ]
        },
        {
            "name": "dotnet/runtime",
            "images": [ { "productVersion": "8.0", "platforms": [
                { "dockerfile": "src/runtime/8.0/jammy/amd64", "os": "linux", "osVersion": "jammy", "architecture": "amd64",
                  "buildArgs": { "REPO": "mcr.example.com/$(Repo:runtime-deps)" },
                  "tags": { "8.0-jammy-amd64": {} } },
                { "dockerfile": "src/runtime/8.0/jammy/arm64v8", "os": "linux", "osVersion": "jammy", "architecture": "arm64", "variant": "v8",
                  "tags": { "8.0-jammy-arm64v8": {} } }
            ] } ]
        },
        {
            "name": "dotnet/aspnet",
            "images": [ { "productVersion": "8.0", "platforms": [
                { "dockerfile": "src/aspnet/8.0/jammy/amd64", "os": "linux", "osVersion": "jammy", "architecture": "amd64",
                  "tags": { "8.0-jammy-amd64": {} } }
            ] } ]
        },
        {
            "name": "dotnet/sdk",
            "images": [ { "productVersion": "8.0", "platforms": [
                { "dockerfile": "src/sdk/8.0/jammy/amd64", "os": "linux", "osVersion": "jammy", "architecture": "amd64",
                  "tags": { "8.0-jammy-amd64": {} } }
            ] } ]
        },
        {
            "name": "samples/app",
            "images": [ { "platforms": [
                { "dockerfile": "src/app/alpine/amd64", "os": "linux", "osVersion": "alpine3.19", "architecture": "amd64",
                  "tags": { "alpine-amd64": {} } }
            ] } ]
        }
    ]
}"#;

pub fn sample_files() -> MemoryFiles {
    MemoryFiles::new()
        .with_file("manifest.json", SAMPLE_MANIFEST)
        .with_file(
            "src/runtime-deps/8.0/jammy/amd64/Dockerfile",
            "FROM amd64/ubuntu:jammy\nRUN apt-get update\n",
        )
        .with_file(
            "src/runtime-deps/8.0/jammy/arm64v8/Dockerfile",
            "FROM arm64v8/ubuntu:jammy\n",
        )
        .with_file(
            "src/runtime/8.0/jammy/amd64/Dockerfile",
            "ARG REPO\nFROM amd64/buildpack-deps:jammy-curl AS installer\nRUN curl -o dotnet.tar.gz https://example.com\n\nFROM $REPO:8.0-jammy-amd64\nCOPY --from=installer /dotnet /usr/share/dotnet\n",
        )
        .with_file(
            "src/runtime/8.0/jammy/arm64v8/Dockerfile",
            "FROM mcr.example.com/dotnet/runtime-deps:8.0-jammy-arm64v8\n",
        )
        .with_file(
            "src/aspnet/8.0/jammy/amd64/Dockerfile",
            "FROM dotnet/runtime:8.0-jammy-amd64\n",
        )
        .with_file(
            "src/sdk/8.0/jammy/amd64/Dockerfile",
            "FROM mcr.example.com/dotnet/runtime:8.0-jammy-amd64 AS runtime\nFROM mcr.example.com/dotnet/aspnet:8.0-jammy-amd64\nCOPY --from=runtime /usr/share/dotnet /usr/share/dotnet\n",
        )
        .with_file(
            "src/app/alpine/amd64/Dockerfile",
            "FROM alpine:3.19 AS build\nFROM build\n",
        )
}

pub fn sample_manifest() -> ManifestInfo {
    ManifestInfo::load(
        &sample_files(),
        "manifest.json",
        &ManifestOptions::default(),
        &RunContext::new(),
    )
    .expect("sample manifest is valid")
}

pub fn ids(values: &[usize]) -> Vec<PlatformId> {
    values.iter().copied().map(PlatformId).collect()
}
