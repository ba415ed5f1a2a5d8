//! npm resolver
//!
//! Fetches package metadata from the npm registry.
//! API endpoint: https://registry.npmjs.org/{package}
//!
//! Latest is the `dist-tags.latest` entry; when a majorVersion
//! constraint pins a package below the published latest, the newest
//! version within the pinned major line is reported instead.

use crate::domain::{sort_by_name, PackageVersion, VersionConstraints, UNKNOWN_VERSION};
use crate::error::ToolError;
use crate::handlers::{parse_constraints, parse_required, ArgsMap, HandlerContext};
use crate::server::ToolResponse;
use crate::version;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info};

/// npm registry base URL
const NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// npm resolver
pub struct NpmHandler {
    ctx: HandlerContext,
    base_url: String,
}

/// npm package metadata response
#[derive(Debug, Serialize, Deserialize)]
struct NpmPackageInfo {
    #[serde(rename = "dist-tags", default)]
    dist_tags: HashMap<String, String>,
    #[serde(default)]
    versions: HashMap<String, serde_json::Value>,
}

impl NpmHandler {
    /// Creates a new npm resolver
    pub fn new(ctx: HandlerContext) -> Self {
        Self::with_base_url(ctx, NPM_REGISTRY_URL)
    }

    /// Creates a resolver against a custom registry base (tests)
    pub fn with_base_url(ctx: HandlerContext, base_url: impl Into<String>) -> Self {
        Self {
            ctx,
            base_url: base_url.into(),
        }
    }

    /// Escapes a package name for use as one registry path segment.
    /// Scoped names keep their `@` but encode the separating slash.
    fn escape_package_name(name: &str) -> String {
        name.replace('/', "%2F")
    }

    fn package_url(&self, name: &str) -> String {
        format!("{}/{}", self.base_url, Self::escape_package_name(name))
    }

    /// Picks the reported latest: the `latest` dist-tag, falling back
    /// to the lexicographic maximum of the published version keys.
    fn select_latest(info: &NpmPackageInfo) -> Option<String> {
        if let Some(latest) = info.dist_tags.get("latest") {
            if !latest.is_empty() {
                return Some(latest.clone());
            }
        }
        let mut versions: Vec<&String> = info.versions.keys().collect();
        versions.sort();
        versions.last().map(|v| (*v).to_string())
    }

    /// Applies a majorVersion pin: when the chosen latest is above the
    /// pinned major, the lexicographic maximum within that major line
    /// wins. With no version in that line, the original latest stands.
    fn apply_major_pin(info: &NpmPackageInfo, latest: &str, target_major: u64) -> String {
        match version::parse(latest) {
            Ok((major, _, _)) if major > target_major => {}
            _ => return latest.to_string(),
        }

        let mut candidates: Vec<&String> = info
            .versions
            .keys()
            .filter(|v| matches!(version::parse(v), Ok((major, _, _)) if major == target_major))
            .collect();
        candidates.sort();
        match candidates.last() {
            Some(v) => {
                debug!(latest, pinned = %v, target_major, "applied major version pin");
                (*v).to_string()
            }
            None => latest.to_string(),
        }
    }

    /// Handles `check_npm_versions`
    pub async fn check_versions(&self, args: &ArgsMap) -> Result<ToolResponse, ToolError> {
        info!("checking npm package versions");

        let dependencies: BTreeMap<String, String> = parse_required(args, "dependencies")?;
        let constraints: VersionConstraints = parse_constraints(args)?;

        let mut results = Vec::with_capacity(dependencies.len());
        for (name, declared) in dependencies {
            if let Some(constraint) = constraints.get(&name) {
                if constraint.exclude_package {
                    results.push(PackageVersion::skipped(
                        name,
                        None,
                        UNKNOWN_VERSION,
                        "npm",
                        "Package excluded by constraints",
                    ));
                    continue;
                }
            }

            let current = Some(version::clean(&declared));
            let url = self.package_url(&name);
            let info: NpmPackageInfo = match self
                .ctx
                .cached_json(&format!("npm:{}", name), &url, &[])
                .await
            {
                Ok(info) => info,
                Err(e) => {
                    error!(package = %name, error = %e, "failed to fetch npm package info");
                    results.push(PackageVersion::skipped(
                        name,
                        current,
                        UNKNOWN_VERSION,
                        "npm",
                        format!("Failed to fetch package info: {}", e),
                    ));
                    continue;
                }
            };

            let Some(mut latest) = Self::select_latest(&info) else {
                results.push(PackageVersion::skipped(
                    name,
                    current,
                    UNKNOWN_VERSION,
                    "npm",
                    "No published versions found",
                ));
                continue;
            };

            if let Some(constraint) = constraints.get(&name) {
                if let Some(target_major) = constraint.major_version {
                    latest = Self::apply_major_pin(&info, &latest, target_major);
                }
            }

            results.push(PackageVersion::resolved(name, current, latest, "npm"));
        }

        sort_by_name(&mut results);
        ToolResponse::json(&results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(latest: Option<&str>, versions: &[&str]) -> NpmPackageInfo {
        let mut dist_tags = HashMap::new();
        if let Some(latest) = latest {
            dist_tags.insert("latest".to_string(), latest.to_string());
        }
        NpmPackageInfo {
            dist_tags,
            versions: versions
                .iter()
                .map(|v| (v.to_string(), json!({})))
                .collect(),
        }
    }

    #[test]
    fn test_escape_package_name() {
        assert_eq!(NpmHandler::escape_package_name("lodash"), "lodash");
        assert_eq!(
            NpmHandler::escape_package_name("@types/node"),
            "@types%2Fnode"
        );
    }

    #[test]
    fn test_select_latest_prefers_dist_tag() {
        let info = info(Some("18.2.0"), &["17.0.2", "18.2.0"]);
        assert_eq!(NpmHandler::select_latest(&info), Some("18.2.0".to_string()));
    }

    #[test]
    fn test_select_latest_falls_back_to_version_keys() {
        let info = info(None, &["1.0.0", "1.0.2", "1.0.1"]);
        assert_eq!(NpmHandler::select_latest(&info), Some("1.0.2".to_string()));
    }

    #[test]
    fn test_major_pin_selects_within_line() {
        let info = info(Some("18.2.0"), &["17.0.2", "17.0.3", "18.2.0"]);
        assert_eq!(NpmHandler::apply_major_pin(&info, "18.2.0", 17), "17.0.3");
    }

    #[test]
    fn test_major_pin_no_candidates_keeps_latest() {
        let info = info(Some("18.2.0"), &["18.1.0", "18.2.0"]);
        assert_eq!(NpmHandler::apply_major_pin(&info, "18.2.0", 17), "18.2.0");
    }

    #[test]
    fn test_major_pin_inactive_when_latest_within_cap() {
        let info = info(Some("17.0.2"), &["16.8.0", "17.0.2"]);
        assert_eq!(NpmHandler::apply_major_pin(&info, "17.0.2", 17), "17.0.2");
    }
}
