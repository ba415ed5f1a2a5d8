//! Core domain models for pkgscout
//!
//! This module contains the normalised result descriptors every
//! resolver produces, and the caller-supplied per-package constraints:
//! - PackageVersion for the package ecosystems
//! - DockerImageVersion for container image tags
//! - GitHubActionVersion for workflow actions
//! - BedrockModel for the AWS Bedrock model catalogue
//! - VersionConstraint for exclude/major-pin directives

mod bedrock;
mod constraint;
mod docker;
mod github;
mod package_version;

pub use bedrock::BedrockModel;
pub use constraint::{VersionConstraint, VersionConstraints};
pub use docker::DockerImageVersion;
pub use github::GitHubActionVersion;
pub use package_version::{
    sort_by_name, PackageVersion, SDK_DEPENDENCY, SPECIAL_DEPENDENCY, UNKNOWN_VERSION,
};
