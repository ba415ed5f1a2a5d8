//! Dart resolver
//!
//! Fetches package metadata from pub.dev.
//! API endpoint: https://pub.dev/api/packages/{package}
//!
//! SDK-managed dependencies (flutter, dart, `sdk:` environment refs)
//! and git/path sources are reported as skipped with sentinel latest
//! values; everything else resolves against the registry, preferring
//! the published `latest` unless it is retracted.

use crate::domain::{
    sort_by_name, PackageVersion, SDK_DEPENDENCY, SPECIAL_DEPENDENCY, UNKNOWN_VERSION,
};
use crate::error::{FetchError, ToolError};
use crate::handlers::{parse_required, ArgsMap, DependencySpec, HandlerContext};
use crate::server::ToolResponse;
use crate::version;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// pub.dev API base URL
const PUB_DEV_API_URL: &str = "https://pub.dev/api/packages";

/// Skip reason for SDK/environment dependencies
const SDK_SKIP_REASON: &str = "SDK or environment dependency, version is managed by the SDK";

/// Skip reason for git/path dependencies
const SPECIAL_SKIP_REASON: &str = "Git or path dependency, not a version constraint";

/// Dart resolver
pub struct DartHandler {
    ctx: HandlerContext,
    base_url: String,
}

/// pub.dev package response
#[derive(Debug, Deserialize)]
struct DartPackageInfo {
    latest: DartPackageVersion,
    #[serde(default)]
    versions: Vec<DartPackageVersion>,
}

#[derive(Debug, Deserialize)]
struct DartPackageVersion {
    version: String,
    #[serde(default)]
    retracted: bool,
}

/// One pubspec dependency after shape discrimination
#[derive(Debug)]
struct DartDependency {
    name: String,
    version: Option<String>,
    sdk: bool,
    environment: bool,
}

/// Array-shape entry
#[derive(Debug, Deserialize)]
struct DartListedDependency {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    sdk: Option<bool>,
    #[serde(default)]
    environment: Option<bool>,
}

/// Dependencies argument: pubspec-style mapping or array of entries
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DartDependencies {
    Map(BTreeMap<String, DependencySpec>),
    List(Vec<DartListedDependency>),
}

/// True for package names the Dart/Flutter SDK manages itself
fn is_sdk_name(name: &str) -> bool {
    name == "flutter" || name == "dart" || name.starts_with("flutter:") || name.starts_with("dart:")
}

/// True for environment references (`sdk:` prefix)
fn is_environment_name(name: &str) -> bool {
    name.starts_with("sdk:")
}

impl DartDependencies {
    fn into_dependencies(self) -> Vec<DartDependency> {
        match self {
            DartDependencies::Map(map) => map
                .into_iter()
                .map(|(name, spec)| DartDependency {
                    sdk: is_sdk_name(&name),
                    environment: is_environment_name(&name),
                    version: spec.version_marker(),
                    name,
                })
                .collect(),
            DartDependencies::List(list) => list
                .into_iter()
                .map(|dep| DartDependency {
                    sdk: dep.sdk.unwrap_or_else(|| is_sdk_name(&dep.name)),
                    environment: dep
                        .environment
                        .unwrap_or_else(|| is_environment_name(&dep.name)),
                    version: dep.version,
                    name: dep.name,
                })
                .collect(),
        }
    }
}

impl DartHandler {
    /// Creates a new Dart resolver
    pub fn new(ctx: HandlerContext) -> Self {
        Self::with_base_url(ctx, PUB_DEV_API_URL)
    }

    /// Creates a resolver against a custom API base (tests)
    pub fn with_base_url(ctx: HandlerContext, base_url: impl Into<String>) -> Self {
        Self {
            ctx,
            base_url: base_url.into(),
        }
    }

    /// Picks the latest non-retracted version from a package response
    fn select_latest(info: &DartPackageInfo) -> Option<String> {
        if !info.latest.retracted {
            return Some(info.latest.version.clone());
        }
        version::max_by_compare(
            info.versions
                .iter()
                .filter(|v| !v.retracted)
                .map(|v| v.version.as_str()),
        )
        .map(|v| v.to_string())
    }

    /// Latest version of a package, via the cache
    async fn get_latest(&self, name: &str) -> Result<String, FetchError> {
        let key = format!("dart:{}", name);
        if let Some(latest) = self.ctx.cache().get_as::<String>(&key) {
            return Ok(latest);
        }

        let url = format!("{}/{}", self.base_url, name);
        debug!(package = name, url, "fetching Dart package info");
        let info: DartPackageInfo = self.ctx.http().get_json(&url, &[]).await?;

        let latest = Self::select_latest(&info).ok_or_else(|| {
            FetchError::not_found(format!("no valid versions found for package {}", name))
        })?;

        self.ctx.cache().put_as(&key, &latest);
        Ok(latest)
    }

    /// Handles `check_dart_versions`
    pub async fn check_versions(&self, args: &ArgsMap) -> Result<ToolResponse, ToolError> {
        info!("checking Dart package versions");

        let dependencies: DartDependencies = parse_required(args, "dependencies")?;
        let dependencies = dependencies.into_dependencies();

        let mut results = Vec::with_capacity(dependencies.len());
        for dep in dependencies {
            if dep.sdk || dep.environment {
                results.push(PackageVersion::skipped(
                    dep.name,
                    dep.version,
                    SDK_DEPENDENCY,
                    "pub.dev",
                    SDK_SKIP_REASON,
                ));
                continue;
            }

            let is_special = dep
                .version
                .as_deref()
                .is_some_and(|v| v.starts_with("git:") || v.starts_with("path:"));
            if is_special {
                results.push(PackageVersion::skipped(
                    dep.name,
                    dep.version,
                    SPECIAL_DEPENDENCY,
                    "pub.dev",
                    SPECIAL_SKIP_REASON,
                ));
                continue;
            }

            let current = dep.version.as_deref().map(version::clean);
            match self.get_latest(&dep.name).await {
                Ok(latest) => {
                    results.push(PackageVersion::resolved(dep.name, current, latest, "pub.dev"));
                }
                Err(e) => {
                    error!(package = %dep.name, error = %e, "failed to fetch Dart package info");
                    results.push(PackageVersion::skipped(
                        dep.name,
                        current,
                        UNKNOWN_VERSION,
                        "pub.dev",
                        format!("Failed to fetch package info: {}", e),
                    ));
                }
            }
        }

        sort_by_name(&mut results);
        ToolResponse::json(&results)
    }
}
