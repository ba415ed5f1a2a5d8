//! Docker registry resolver
//!
//! Lists container image tags from Docker Hub, the GitHub Container
//! Registry, or any V2 registry at a caller-supplied base URL.
//! API endpoints:
//! - https://hub.docker.com/v2/repositories/{ns}/{repo}/tags?page_size=100
//! - https://ghcr.io/v2/{owner}/{repo}/tags/list
//! - {customRegistry}/v2/{image}/tags/list
//!
//! Tags are filtered by the caller's regex patterns (any match keeps
//! the tag; invalid patterns are logged and ignored) and truncated to
//! the requested limit in upstream order.

use crate::domain::DockerImageVersion;
use crate::error::{FetchError, ToolError};
use crate::handlers::{parse_optional, parse_required, ArgsMap, HandlerContext};
use crate::server::ToolResponse;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

/// Docker Hub API base URL
const DOCKER_HUB_URL: &str = "https://hub.docker.com";

/// GitHub Container Registry base URL
const GHCR_URL: &str = "https://ghcr.io";

/// Environment variable holding a bearer token for custom registries
const REGISTRY_TOKEN_ENV: &str = "PKGSCOUT_REGISTRY_TOKEN";

/// Default number of tags to return
const DEFAULT_LIMIT: usize = 10;

/// Docker resolver
pub struct DockerHandler {
    ctx: HandlerContext,
    hub_base_url: String,
    ghcr_base_url: String,
}

/// Docker Hub tag listing response
#[derive(Debug, Deserialize)]
struct DockerHubTagsResponse {
    #[serde(default)]
    results: Vec<DockerHubTag>,
}

#[derive(Debug, Deserialize)]
struct DockerHubTag {
    name: String,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    images: Vec<DockerHubImage>,
}

#[derive(Debug, Deserialize)]
struct DockerHubImage {
    #[serde(default)]
    digest: Option<String>,
    #[serde(default)]
    size: Option<u64>,
}

/// V2 registry tag listing response (GHCR and custom registries)
#[derive(Debug, Deserialize)]
struct V2TagsResponse {
    #[serde(default)]
    tags: Vec<String>,
}

/// Which registry to consult
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegistryKind {
    DockerHub,
    Ghcr,
    Custom,
}

impl RegistryKind {
    fn parse(value: &str) -> Result<Self, ToolError> {
        match value {
            "dockerhub" => Ok(RegistryKind::DockerHub),
            "ghcr" => Ok(RegistryKind::Ghcr),
            "custom" => Ok(RegistryKind::Custom),
            other => Err(ToolError::invalid(
                "registry",
                format!("invalid registry: {}", other),
            )),
        }
    }
}

impl DockerHandler {
    /// Creates a new Docker resolver
    pub fn new(ctx: HandlerContext) -> Self {
        Self::with_base_urls(ctx, DOCKER_HUB_URL, GHCR_URL)
    }

    /// Creates a resolver against custom registry bases (tests)
    pub fn with_base_urls(
        ctx: HandlerContext,
        hub_base_url: impl Into<String>,
        ghcr_base_url: impl Into<String>,
    ) -> Self {
        Self {
            ctx,
            hub_base_url: hub_base_url.into(),
            ghcr_base_url: ghcr_base_url.into(),
        }
    }

    /// Splits a Docker Hub image reference into namespace and repo,
    /// defaulting the namespace to `library`.
    fn split_hub_image(image: &str) -> (String, String) {
        match image.split_once('/') {
            Some((namespace, repo)) => (namespace.to_string(), repo.to_string()),
            None => ("library".to_string(), image.to_string()),
        }
    }

    /// Lists Docker Hub tags for an image, via the cache
    async fn hub_tags(&self, image: &str) -> Result<Vec<DockerImageVersion>, FetchError> {
        let key = format!("dockerhub:{}", image);
        if let Some(tags) = self.ctx.cache().get_as::<Vec<DockerImageVersion>>(&key) {
            return Ok(tags);
        }

        let (namespace, repo) = Self::split_hub_image(image);
        let url = format!(
            "{}/v2/repositories/{}/{}/tags?page_size=100",
            self.hub_base_url, namespace, repo
        );
        debug!(image, url, "fetching Docker Hub tags");
        let response: DockerHubTagsResponse = self.ctx.http().get_json(&url, &[]).await?;

        let tags: Vec<DockerImageVersion> = response
            .results
            .into_iter()
            .map(|result| DockerImageVersion {
                name: image.to_string(),
                tag: result.name,
                registry: "dockerhub".to_string(),
                digest: result.images.first().and_then(|i| i.digest.clone()),
                created: result.last_updated.map(|t| t.to_rfc3339()),
                size: result.images.first().and_then(|i| i.size),
            })
            .collect();

        self.ctx.cache().put_as(&key, &tags);
        Ok(tags)
    }

    /// Lists GHCR tags for an image, via the cache
    async fn ghcr_tags(&self, image: &str) -> Result<Vec<DockerImageVersion>, ToolError> {
        let image = if image.starts_with("ghcr.io/") {
            image.to_string()
        } else {
            format!("ghcr.io/{}", image)
        };

        let path = image.trim_start_matches("ghcr.io/");
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() < 2 {
            return Err(ToolError::invalid(
                "image",
                format!("invalid GHCR image format: {}", image),
            ));
        }
        let (owner, repo) = (parts[0], parts[1]);

        let key = format!("ghcr:{}", image);
        if let Some(tags) = self.ctx.cache().get_as::<Vec<DockerImageVersion>>(&key) {
            return Ok(tags);
        }

        let url = format!("{}/v2/{}/{}/tags/list", self.ghcr_base_url, owner, repo);
        debug!(image = %image, url, "fetching GHCR tags");
        let response: V2TagsResponse = self
            .ctx
            .http()
            .get_json(&url, &[])
            .await
            .map_err(|e| fetch_failure("GHCR", e))?;

        let tags: Vec<DockerImageVersion> = response
            .tags
            .into_iter()
            .map(|tag| DockerImageVersion::new(&image, tag, "ghcr"))
            .collect();

        self.ctx.cache().put_as(&key, &tags);
        Ok(tags)
    }

    /// Lists tags from a custom V2 registry
    async fn custom_tags(
        &self,
        image: &str,
        registry_base: &str,
    ) -> Result<Vec<DockerImageVersion>, ToolError> {
        let base = registry_base.trim_end_matches('/');
        let url = format!("{}/v2/{}/tags/list", base, image);
        debug!(image, url, "fetching custom registry tags");

        let token = std::env::var(REGISTRY_TOKEN_ENV).ok();
        let auth = token.map(|token| format!("Bearer {}", token));
        let headers: Vec<(&str, &str)> = match auth.as_deref() {
            Some(auth) => vec![("Authorization", auth)],
            None => Vec::new(),
        };

        let response: V2TagsResponse = self
            .ctx
            .http()
            .get_json(&url, &headers)
            .await
            .map_err(|e| fetch_failure(registry_base, e))?;

        Ok(response
            .tags
            .into_iter()
            .map(|tag| DockerImageVersion::new(image, tag, registry_base))
            .collect())
    }

    /// Keeps tags matching any filter pattern (all tags when no
    /// patterns are given) and truncates to `limit` in upstream order.
    fn filter_tags(
        tags: Vec<DockerImageVersion>,
        patterns: &[String],
        limit: usize,
    ) -> Vec<DockerImageVersion> {
        let compiled: Vec<Regex> = patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    warn!(pattern = %pattern, error = %e, "invalid tag filter pattern, ignoring");
                    None
                }
            })
            .collect();

        tags.into_iter()
            .filter(|tag| {
                patterns.is_empty() || compiled.iter().any(|regex| regex.is_match(&tag.tag))
            })
            .take(limit)
            .collect()
    }

    /// Handles `check_docker_tags`
    pub async fn check_tags(&self, args: &ArgsMap) -> Result<ToolResponse, ToolError> {
        info!("checking Docker image tags");

        let image: String = parse_required(args, "image")?;
        if image.is_empty() {
            return Err(ToolError::missing("image"));
        }

        let registry = match parse_optional::<String>(args, "registry")? {
            Some(value) if !value.is_empty() => RegistryKind::parse(&value)?,
            _ => RegistryKind::DockerHub,
        };
        let limit = parse_optional::<usize>(args, "limit")?.unwrap_or(DEFAULT_LIMIT);
        let patterns: Vec<String> = parse_optional(args, "filterTags")?.unwrap_or_default();
        let include_digest: bool = parse_optional(args, "includeDigest")?.unwrap_or(false);

        let tags = match registry {
            RegistryKind::DockerHub => self
                .hub_tags(&image)
                .await
                .map_err(|e| fetch_failure("Docker Hub", e))?,
            RegistryKind::Ghcr => self.ghcr_tags(&image).await?,
            RegistryKind::Custom => {
                let registry_base: String = parse_optional(args, "customRegistry")?
                    .filter(|base: &String| !base.is_empty())
                    .ok_or_else(|| ToolError::missing("customRegistry"))?;
                self.custom_tags(&image, &registry_base).await?
            }
        };

        let mut tags = Self::filter_tags(tags, &patterns, limit);
        if !include_digest {
            for tag in &mut tags {
                tag.digest = None;
            }
        }

        ToolResponse::json(&tags)
    }
}

/// Surfaces a fetch failure to the protocol layer; a tag listing is a
/// single-image request with no per-dependency skip to fall back to.
fn fetch_failure(registry: &str, e: FetchError) -> ToolError {
    error!(registry, error = %e, "failed to fetch Docker tags");
    ToolError::Fetch(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str) -> DockerImageVersion {
        DockerImageVersion::new("nginx", name, "dockerhub")
    }

    #[test]
    fn test_registry_kind_parse() {
        assert_eq!(
            RegistryKind::parse("dockerhub").unwrap(),
            RegistryKind::DockerHub
        );
        assert_eq!(RegistryKind::parse("ghcr").unwrap(), RegistryKind::Ghcr);
        assert_eq!(RegistryKind::parse("custom").unwrap(), RegistryKind::Custom);
        assert!(RegistryKind::parse("quay").is_err());
    }

    #[test]
    fn test_split_hub_image() {
        assert_eq!(
            DockerHandler::split_hub_image("nginx"),
            ("library".to_string(), "nginx".to_string())
        );
        assert_eq!(
            DockerHandler::split_hub_image("grafana/grafana"),
            ("grafana".to_string(), "grafana".to_string())
        );
    }

    #[test]
    fn test_filter_tags_keeps_matches_in_order() {
        let tags = vec![
            tag("1.25.3"),
            tag("1.25.2"),
            tag("latest"),
            tag("alpine"),
            tag("1.24.0"),
        ];
        let filtered =
            DockerHandler::filter_tags(tags, &["^1\\.".to_string()], 2);
        let names: Vec<&str> = filtered.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(names, vec!["1.25.3", "1.25.2"]);
    }

    #[test]
    fn test_filter_tags_no_patterns_keeps_all_up_to_limit() {
        let tags = vec![tag("a"), tag("b"), tag("c")];
        let filtered = DockerHandler::filter_tags(tags, &[], 2);
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn test_filter_tags_invalid_pattern_ignored() {
        let tags = vec![tag("1.25.3"), tag("latest")];
        let filtered = DockerHandler::filter_tags(
            tags,
            &["[".to_string(), "^latest$".to_string()],
            10,
        );
        let names: Vec<&str> = filtered.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(names, vec!["latest"]);
    }

    #[test]
    fn test_filter_tags_only_invalid_patterns_drops_everything() {
        let tags = vec![tag("1.25.3")];
        let filtered = DockerHandler::filter_tags(tags, &["[".to_string()], 10);
        assert!(filtered.is_empty());
    }
}
