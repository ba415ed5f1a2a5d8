//! GitHub Actions resolver
//!
//! Resolves workflow actions via the GitHub releases API, falling back
//! to the repository tag list in API order when no qualifying release
//! exists.
//! API endpoints:
//! - Releases: https://api.github.com/repos/{owner}/{repo}/releases
//! - Tag fallback: https://api.github.com/repos/{owner}/{repo}/tags

use crate::domain::GitHubActionVersion;
use crate::error::{FetchError, ToolError};
use crate::handlers::{parse_optional, parse_required, ArgsMap, HandlerContext};
use crate::server::ToolResponse;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

/// GitHub API base URL
const GITHUB_API_URL: &str = "https://api.github.com";

/// Accept header for the GitHub REST API
const GITHUB_ACCEPT: (&str, &str) = ("Accept", "application/vnd.github.v3+json");

/// GitHub Actions resolver
pub struct GitHubActionsHandler {
    ctx: HandlerContext,
    base_url: String,
}

/// One workflow action to check
#[derive(Debug, Deserialize)]
struct ActionRef {
    owner: String,
    repo: String,
    #[serde(rename = "currentVersion", default)]
    current_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubRelease {
    tag_name: String,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    prerelease: bool,
    #[serde(default)]
    published_at: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubTag {
    name: String,
}

/// Resolved latest release of one action, as cached
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ActionRelease {
    version: String,
    published_at: Option<String>,
    url: Option<String>,
}

impl GitHubActionsHandler {
    /// Creates a new GitHub Actions resolver
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

    /// Latest release of `owner/repo`, via the cache. The first
    /// non-draft, non-prerelease release wins; otherwise the first tag
    /// in API order.
    async fn get_latest(&self, owner: &str, repo: &str) -> Result<ActionRelease, FetchError> {
        let key = format!("github-action:{}/{}", owner, repo);
        if let Some(release) = self.ctx.cache().get_as::<ActionRelease>(&key) {
            return Ok(release);
        }

        let releases_url = format!("{}/repos/{}/{}/releases", self.base_url, owner, repo);
        debug!(owner, repo, url = releases_url, "fetching action releases");
        let releases: Vec<GitHubRelease> = self
            .ctx
            .http()
            .get_json(&releases_url, &[GITHUB_ACCEPT])
            .await?;

        if let Some(release) = releases.iter().find(|r| !r.draft && !r.prerelease) {
            let resolved = ActionRelease {
                version: release.tag_name.clone(),
                published_at: release.published_at.clone(),
                url: release.html_url.clone(),
            };
            self.ctx.cache().put_as(&key, &resolved);
            return Ok(resolved);
        }

        let tags_url = format!("{}/repos/{}/{}/tags", self.base_url, owner, repo);
        debug!(owner, repo, url = tags_url, "no releases, fetching action tags");
        let tags: Vec<GitHubTag> = self.ctx.http().get_json(&tags_url, &[GITHUB_ACCEPT]).await?;

        let Some(tag) = tags.first() else {
            return Err(FetchError::not_found(format!(
                "no releases or tags found for: {}/{}",
                owner, repo
            )));
        };

        let resolved = ActionRelease {
            version: tag.name.clone(),
            published_at: None,
            url: Some(format!(
                "https://github.com/{}/{}/releases/tag/{}",
                owner, repo, tag.name
            )),
        };
        self.ctx.cache().put_as(&key, &resolved);
        Ok(resolved)
    }

    /// Handles `check_github_actions`
    pub async fn check_versions(&self, args: &ArgsMap) -> Result<ToolResponse, ToolError> {
        info!("checking GitHub Actions versions");

        let actions: Vec<ActionRef> = parse_required(args, "actions")?;
        let include_details: bool = parse_optional(args, "includeDetails")?.unwrap_or(false);

        let mut results = Vec::with_capacity(actions.len());
        for action in &actions {
            match self.get_latest(&action.owner, &action.repo).await {
                Ok(release) => {
                    let mut result = GitHubActionVersion::new(
                        &action.owner,
                        &action.repo,
                        action.current_version.clone(),
                        release.version,
                    );
                    if include_details {
                        result.published_at = release.published_at;
                        result.url = release.url;
                    }
                    results.push(result);
                }
                Err(e) => {
                    error!(
                        owner = %action.owner,
                        repo = %action.repo,
                        error = %e,
                        "failed to fetch GitHub Action info"
                    );
                    let latest = match e {
                        FetchError::NotFound { .. } => "not found",
                        FetchError::Transport { .. }
                        | FetchError::Status { .. }
                        | FetchError::Decode { .. } => "error",
                    };
                    results.push(GitHubActionVersion::new(
                        &action.owner,
                        &action.repo,
                        action.current_version.clone(),
                        latest,
                    ));
                }
            }
        }

        results.sort_by(|a, b| {
            let owner = a.owner.to_lowercase().cmp(&b.owner.to_lowercase());
            owner.then_with(|| a.repo.to_lowercase().cmp(&b.repo.to_lowercase()))
        });

        ToolResponse::json(&results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_ref_deserialize() {
        let action: ActionRef = serde_json::from_value(json!({
            "owner": "actions",
            "repo": "checkout",
            "currentVersion": "v3"
        }))
        .unwrap();
        assert_eq!(action.owner, "actions");
        assert_eq!(action.current_version.as_deref(), Some("v3"));
    }

    #[test]
    fn test_action_ref_requires_owner_and_repo() {
        assert!(serde_json::from_value::<ActionRef>(json!({"owner": "actions"})).is_err());
        assert!(serde_json::from_value::<ActionRef>(json!({"repo": "checkout"})).is_err());
    }

    #[test]
    fn test_release_qualification_fields_default() {
        let release: GitHubRelease =
            serde_json::from_value(json!({"tag_name": "v4.1.0"})).unwrap();
        assert!(!release.draft);
        assert!(!release.prerelease);
    }
}
