//! Composer resolver
//!
//! Fetches PHP package metadata from Packagist, trying the package
//! endpoint, then the two p2 metadata endpoints, then confirming
//! existence via the search API before one retry.
//! API endpoints:
//! - https://packagist.org/packages/{vendor}/{package}.json
//! - https://packagist.org/p2/{vendor}/{package}.json
//! - https://repo.packagist.org/p2/{vendor}/{package}.json
//! - https://packagist.org/search.json?q={vendor}/{package}
//!
//! Latest is the most recently published version among non-dev
//! versions (no `dev-`/`-dev` in the version key or value).

use crate::domain::{sort_by_name, PackageVersion, VersionConstraints, UNKNOWN_VERSION};
use crate::error::{FetchError, ToolError};
use crate::handlers::{parse_constraints, parse_required, ArgsMap, HandlerContext};
use crate::server::ToolResponse;
use crate::version;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info};

/// Packagist base URL (package metadata and search)
const PACKAGIST_URL: &str = "https://packagist.org";

/// Packagist metadata mirror base URL
const PACKAGIST_REPO_URL: &str = "https://repo.packagist.org";

/// Composer resolver
pub struct ComposerHandler {
    ctx: HandlerContext,
    base_url: String,
    repo_base_url: String,
}

/// Package metadata in either the package or the p2 response shape
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PackagistResponse {
    Package {
        package: PackagistPackage,
    },
    P2 {
        packages: HashMap<String, Vec<PackagistVersion>>,
    },
}

#[derive(Debug, Deserialize)]
struct PackagistPackage {
    #[serde(default)]
    versions: HashMap<String, PackagistVersion>,
}

#[derive(Debug, Deserialize)]
struct PackagistVersion {
    version: String,
    #[serde(default)]
    time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct PackagistSearchResponse {
    #[serde(default)]
    results: Vec<PackagistSearchResult>,
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct PackagistSearchResult {
    name: String,
}

/// True for dev version keys/values (`dev-main`, `1.x-dev`, ...)
fn is_dev_version(value: &str) -> bool {
    value.contains("dev-") || value.contains("-dev")
}

impl ComposerHandler {
    /// Creates a new Composer resolver
    pub fn new(ctx: HandlerContext) -> Self {
        Self::with_base_urls(ctx, PACKAGIST_URL, PACKAGIST_REPO_URL)
    }

    /// Creates a resolver against custom Packagist bases (tests)
    pub fn with_base_urls(
        ctx: HandlerContext,
        base_url: impl Into<String>,
        repo_base_url: impl Into<String>,
    ) -> Self {
        Self {
            ctx,
            base_url: base_url.into(),
            repo_base_url: repo_base_url.into(),
        }
    }

    fn metadata_endpoints(&self, vendor: &str, package: &str) -> Vec<String> {
        vec![
            format!("{}/packages/{}/{}.json", self.base_url, vendor, package),
            format!("{}/p2/{}/{}.json", self.base_url, vendor, package),
            format!("{}/p2/{}/{}.json", self.repo_base_url, vendor, package),
        ]
    }

    /// Picks the most recently published non-dev version
    fn select_latest(response: &PackagistResponse) -> Option<String> {
        let entries: Vec<(&str, &PackagistVersion)> = match response {
            PackagistResponse::Package { package } => package
                .versions
                .iter()
                .map(|(key, version)| (key.as_str(), version))
                .collect(),
            PackagistResponse::P2 { packages } => packages
                .values()
                .flatten()
                .map(|version| (version.version.as_str(), version))
                .collect(),
        };

        let mut latest: Option<(&PackagistVersion, DateTime<Utc>)> = None;
        for (key, candidate) in entries {
            if is_dev_version(key) || is_dev_version(&candidate.version) {
                continue;
            }
            let Some(time) = candidate.time else {
                continue;
            };
            let newer = match latest {
                Some((_, latest_time)) => time > latest_time,
                None => true,
            };
            if newer {
                latest = Some((candidate, time));
            }
        }

        latest.map(|(candidate, _)| candidate.version.clone())
    }

    /// Latest version of `vendor/package`, via the cache
    async fn get_latest(&self, vendor: &str, package: &str) -> Result<String, FetchError> {
        let key = format!("packagist:{}/{}", vendor, package);
        if let Some(latest) = self.ctx.cache().get_as::<String>(&key) {
            return Ok(latest);
        }

        let full_name = format!("{}/{}", vendor, package);
        let mut response: Option<PackagistResponse> = None;
        for url in self.metadata_endpoints(vendor, package) {
            debug!(package = %full_name, url, "trying Packagist endpoint");
            match self.ctx.http().get_json::<PackagistResponse>(&url, &[]).await {
                Ok(decoded) => {
                    response = Some(decoded);
                    break;
                }
                Err(e) => {
                    debug!(url, error = %e, "endpoint failed, trying next");
                }
            }
        }

        let response = match response {
            Some(response) => response,
            None => self.confirm_and_retry(vendor, package).await?,
        };

        let latest = Self::select_latest(&response).ok_or_else(|| {
            FetchError::not_found(format!(
                "no stable versions found for {}/{}",
                vendor, package
            ))
        })?;

        self.ctx.cache().put_as(&key, &latest);
        Ok(latest)
    }

    /// Confirms the package exists via the search API and retries the
    /// package endpoint once on an exact match.
    async fn confirm_and_retry(
        &self,
        vendor: &str,
        package: &str,
    ) -> Result<PackagistResponse, FetchError> {
        let full_name = format!("{}/{}", vendor, package);
        let search_url = format!("{}/search.json?q={}", self.base_url, full_name);
        debug!(url = search_url, "falling back to Packagist search");

        let search: PackagistSearchResponse =
            self.ctx.http().get_json(&search_url, &[]).await?;
        if search.total == 0 || search.results.is_empty() {
            return Err(FetchError::not_found(format!(
                "no packages found for {}",
                full_name
            )));
        }

        let exact = search
            .results
            .iter()
            .any(|result| result.name.eq_ignore_ascii_case(&full_name));
        if !exact {
            return Err(FetchError::not_found(format!(
                "no exact match found for {}",
                full_name
            )));
        }

        let url = format!("{}/packages/{}/{}.json", self.base_url, vendor, package);
        self.ctx.http().get_json(&url, &[]).await
    }

    /// Handles `check_composer_versions`
    pub async fn check_versions(&self, args: &ArgsMap) -> Result<ToolResponse, ToolError> {
        info!("checking Composer package versions");

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
                        "packagist",
                        "Package excluded by constraints",
                    ));
                    continue;
                }
            }

            let parts: Vec<&str> = name.split('/').collect();
            let [vendor, package] = parts.as_slice() else {
                results.push(PackageVersion::skipped(
                    name,
                    None,
                    UNKNOWN_VERSION,
                    "packagist",
                    "Invalid package name format",
                ));
                continue;
            };

            let current = Some(version::clean(&declared));
            match self.get_latest(vendor, package).await {
                Ok(latest) => {
                    results.push(PackageVersion::resolved(name, current, latest, "packagist"));
                }
                Err(e) => {
                    error!(package = %name, error = %e, "failed to fetch Packagist package info");
                    results.push(PackageVersion::skipped(
                        name,
                        current,
                        UNKNOWN_VERSION,
                        "packagist",
                        format!("Failed to fetch version info: {}", e),
                    ));
                }
            }
        }

        sort_by_name(&mut results);
        ToolResponse::json(&results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_dev_version() {
        assert!(is_dev_version("dev-main"));
        assert!(is_dev_version("2.x-dev"));
        assert!(!is_dev_version("v10.3.2"));
        assert!(!is_dev_version("1.0.0"));
    }

    #[test]
    fn test_select_latest_by_publish_time() {
        let response: PackagistResponse = serde_json::from_value(json!({
            "package": {
                "versions": {
                    "v10.0.0": {"version": "v10.0.0", "time": "2023-02-14T10:00:00+00:00"},
                    "v10.3.2": {"version": "v10.3.2", "time": "2023-11-20T10:00:00+00:00"},
                    "dev-main": {"version": "dev-main", "time": "2024-01-01T10:00:00+00:00"},
                    "2.x-dev": {"version": "2.x-dev", "time": "2024-01-02T10:00:00+00:00"}
                }
            }
        }))
        .unwrap();
        assert_eq!(
            ComposerHandler::select_latest(&response),
            Some("v10.3.2".to_string())
        );
    }

    #[test]
    fn test_select_latest_p2_shape() {
        let response: PackagistResponse = serde_json::from_value(json!({
            "packages": {
                "monolog/monolog": [
                    {"version": "3.5.0", "time": "2023-10-27T15:32:01+00:00"},
                    {"version": "3.4.0", "time": "2023-06-21T08:46:11+00:00"}
                ]
            }
        }))
        .unwrap();
        assert_eq!(
            ComposerHandler::select_latest(&response),
            Some("3.5.0".to_string())
        );
    }

    #[test]
    fn test_select_latest_all_dev_is_none() {
        let response: PackagistResponse = serde_json::from_value(json!({
            "package": {
                "versions": {
                    "dev-main": {"version": "dev-main", "time": "2024-01-01T10:00:00+00:00"}
                }
            }
        }))
        .unwrap();
        assert_eq!(ComposerHandler::select_latest(&response), None);
    }

    #[test]
    fn test_metadata_endpoint_order() {
        let ctx = HandlerContext::new(
            crate::registry::HttpClient::new().unwrap(),
            std::sync::Arc::new(crate::cache::TtlCache::new()),
        );
        let handler = ComposerHandler::new(ctx);
        let endpoints = handler.metadata_endpoints("laravel", "framework");
        assert_eq!(
            endpoints,
            vec![
                "https://packagist.org/packages/laravel/framework.json",
                "https://packagist.org/p2/laravel/framework.json",
                "https://repo.packagist.org/p2/laravel/framework.json",
            ]
        );
    }
}
