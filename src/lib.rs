//! pkgscout - Package version tool server library
//!
//! This library provides the core of a tool server that resolves the
//! latest stable versions of dependencies across package ecosystems:
//! - npm, PyPI, Maven Central, Go module proxy, crates.io, pub.dev
//! - GitHub-hosted Swift packages and GitHub Actions
//! - Packagist (Composer)
//! - Docker Hub, GHCR, and custom V2 container registries
//! - The AWS Bedrock model catalogue

pub mod cache;
pub mod cli;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod server;
pub mod version;
