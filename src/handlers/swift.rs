//! Swift package resolver
//!
//! Resolves GitHub-hosted Swift packages via the GitHub releases API.
//! API endpoints:
//! - Releases: https://api.github.com/repos/{owner}/{repo}/releases
//! - Tag fallback: https://api.github.com/repos/{owner}/{repo}/tags
//!
//! Only non-draft, non-prerelease releases qualify; tags are consulted
//! when a repository publishes no releases. Non-GitHub package URLs
//! are skipped.

use crate::domain::{sort_by_name, PackageVersion, VersionConstraints, UNKNOWN_VERSION};
use crate::error::{FetchError, ToolError};
use crate::handlers::{parse_constraints, parse_required, ArgsMap, HandlerContext};
use crate::server::ToolResponse;
use crate::version;
use serde::Deserialize;
use tracing::{debug, error, info};

/// GitHub API base URL
const GITHUB_API_URL: &str = "https://api.github.com";

/// Accept header for the GitHub REST API
const GITHUB_ACCEPT: (&str, &str) = ("Accept", "application/vnd.github.v3+json");

/// Swift resolver
pub struct SwiftHandler {
    ctx: HandlerContext,
    base_url: String,
}

/// One Package.swift dependency
#[derive(Debug, Deserialize)]
struct SwiftDependency {
    url: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    requirement: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    prerelease: bool,
}

#[derive(Debug, Deserialize)]
struct GitHubTag {
    name: String,
}

/// Extracts `(owner, repo)` from a GitHub package URL
fn parse_github_url(url: &str) -> Option<(String, String)> {
    if !url.contains("github.com") {
        return None;
    }
    let parts: Vec<&str> = url.split('/').collect();
    if parts.len() < 5 {
        return None;
    }
    let owner = parts[3];
    let repo = parts[4].trim_end_matches(".git");
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

impl SwiftHandler {
    /// Creates a new Swift resolver
    pub fn new(ctx: HandlerContext) -> Self {
        Self::with_base_url(ctx, GITHUB_API_URL)
    }

    /// Creates a resolver against a custom API base (tests)
    pub fn with_base_url(ctx: HandlerContext, base_url: impl Into<String>) -> Self {
        Self {
            ctx,
            base_url: base_url.into(),
        }
    }

    /// Qualifying version candidates for a package, newest-irrelevant
    /// order, via the cache. Release tags win; tags are the fallback.
    async fn get_candidates(&self, url: &str) -> Result<Vec<String>, FetchError> {
        let key = format!("swift:{}", url);
        if let Some(candidates) = self.ctx.cache().get_as::<Vec<String>>(&key) {
            return Ok(candidates);
        }

        let (owner, repo) = parse_github_url(url)
            .ok_or_else(|| FetchError::not_found(format!("invalid GitHub URL format: {}", url)))?;

        let releases_url = format!("{}/repos/{}/{}/releases", self.base_url, owner, repo);
        debug!(url, releases_url, "fetching Swift package releases");
        let releases: Vec<GitHubRelease> = self
            .ctx
            .http()
            .get_json(&releases_url, &[GITHUB_ACCEPT])
            .await?;

        let mut candidates: Vec<String> = releases
            .iter()
            .filter(|r| !r.draft && !r.prerelease)
            .map(|r| r.tag_name.trim_start_matches('v').to_string())
            .collect();

        if candidates.is_empty() {
            let tags_url = format!("{}/repos/{}/{}/tags", self.base_url, owner, repo);
            debug!(url, tags_url, "no releases, fetching Swift package tags");
            let tags: Vec<GitHubTag> =
                self.ctx.http().get_json(&tags_url, &[GITHUB_ACCEPT]).await?;
            candidates = tags
                .iter()
                .map(|t| t.name.trim_start_matches('v').to_string())
                .collect();
        }

        if candidates.is_empty() {
            return Err(FetchError::not_found(format!(
                "no releases or tags found for: {}",
                url
            )));
        }

        self.ctx.cache().put_as(&key, &candidates);
        Ok(candidates)
    }

    /// Selects the latest candidate, honouring an optional major pin
    fn select_latest(candidates: &[String], major_pin: Option<u64>) -> Option<String> {
        let latest =
            version::max_by_compare(candidates.iter().map(String::as_str))?.to_string();

        let Some(target_major) = major_pin else {
            return Some(latest);
        };
        match version::parse(&latest) {
            Ok((major, _, _)) if major > target_major => {}
            _ => return Some(latest),
        }

        let pinned = candidates
            .iter()
            .filter(|v| matches!(version::parse(v), Ok((major, _, _)) if major == target_major))
            .max_by(|a, b| version::compare(a, b));
        match pinned {
            Some(pinned) => {
                debug!(latest, pinned = %pinned, target_major, "applied major version pin");
                Some(pinned.clone())
            }
            None => Some(latest),
        }
    }

    /// Handles `check_swift_versions`
    pub async fn check_versions(&self, args: &ArgsMap) -> Result<ToolResponse, ToolError> {
        info!("checking Swift package versions");

        let dependencies: Vec<SwiftDependency> = parse_required(args, "dependencies")?;
        let constraints: VersionConstraints = parse_constraints(args)?;

        let mut results = Vec::with_capacity(dependencies.len());
        for dep in &dependencies {
            if let Some(constraint) = constraints.get(&dep.url) {
                if constraint.exclude_package {
                    results.push(PackageVersion::skipped(
                        &dep.url,
                        None,
                        UNKNOWN_VERSION,
                        "swift",
                        "Package excluded by constraints",
                    ));
                    continue;
                }
            }

            let current = dep.version.as_deref().map(version::clean);

            if !dep.url.contains("github.com") {
                results.push(PackageVersion::skipped(
                    &dep.url,
                    current,
                    UNKNOWN_VERSION,
                    "swift",
                    "Non-GitHub repository",
                ));
                continue;
            }

            let candidates = match self.get_candidates(&dep.url).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    error!(url = %dep.url, error = %e, "failed to fetch Swift package info");
                    results.push(PackageVersion::skipped(
                        &dep.url,
                        current,
                        UNKNOWN_VERSION,
                        "swift",
                        format!("Failed to fetch package info: {}", e),
                    ));
                    continue;
                }
            };

            let major_pin = constraints.get(&dep.url).and_then(|c| c.major_version);
            match Self::select_latest(&candidates, major_pin) {
                Some(latest) => {
                    results.push(PackageVersion::resolved(&dep.url, current, latest, "swift"));
                }
                None => {
                    results.push(PackageVersion::skipped(
                        &dep.url,
                        current,
                        UNKNOWN_VERSION,
                        "swift",
                        format!("no releases or tags found for: {}", dep.url),
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

    #[test]
    fn test_parse_github_url() {
        assert_eq!(
            parse_github_url("https://github.com/apple/swift-argument-parser"),
            Some(("apple".to_string(), "swift-argument-parser".to_string()))
        );
        assert_eq!(
            parse_github_url("https://github.com/vapor/vapor.git"),
            Some(("vapor".to_string(), "vapor".to_string()))
        );
    }

    #[test]
    fn test_parse_github_url_rejects() {
        assert_eq!(parse_github_url("https://gitlab.com/group/project"), None);
        assert_eq!(parse_github_url("https://github.com/onlyowner"), None);
    }

    #[test]
    fn test_select_latest_unconstrained() {
        let candidates = vec!["1.2.0".to_string(), "2.0.1".to_string(), "2.0.0".to_string()];
        assert_eq!(
            SwiftHandler::select_latest(&candidates, None),
            Some("2.0.1".to_string())
        );
    }

    #[test]
    fn test_select_latest_with_major_pin() {
        let candidates = vec![
            "1.2.0".to_string(),
            "1.5.3".to_string(),
            "2.0.0".to_string(),
        ];
        assert_eq!(
            SwiftHandler::select_latest(&candidates, Some(1)),
            Some("1.5.3".to_string())
        );
    }

    #[test]
    fn test_select_latest_pin_without_candidates_keeps_latest() {
        let candidates = vec!["3.0.0".to_string(), "4.0.0".to_string()];
        assert_eq!(
            SwiftHandler::select_latest(&candidates, Some(1)),
            Some("4.0.0".to_string())
        );
    }

    #[test]
    fn test_select_latest_empty() {
        assert_eq!(SwiftHandler::select_latest(&[], None), None);
    }
}
