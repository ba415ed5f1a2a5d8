//! Java resolver (Maven pom and Gradle shapes)
//!
//! Fetches artifact metadata from the Maven Central Search API.
//! API endpoint: https://search.maven.org/solrsearch/select
//!
//! Query format: q=g:"{groupId}"+AND+a:"{artifactId}"&core=gav&rows=1&wt=json

use crate::domain::{sort_by_name, PackageVersion, UNKNOWN_VERSION};
use crate::error::{FetchError, ToolError};
use crate::handlers::{parse_required, ArgsMap, HandlerContext};
use crate::server::ToolResponse;
use serde::Deserialize;
use tracing::{debug, error, info};

/// Maven Central Search API base URL
const MAVEN_CENTRAL_URL: &str = "https://search.maven.org/solrsearch/select";

/// Java resolver
pub struct JavaHandler {
    ctx: HandlerContext,
    base_url: String,
}

/// Maven Central search response
#[derive(Debug, Deserialize)]
struct MavenSearchResponse {
    response: MavenResponseBody,
}

#[derive(Debug, Deserialize)]
struct MavenResponseBody {
    #[serde(default)]
    docs: Vec<MavenVersionDoc>,
}

#[derive(Debug, Deserialize)]
struct MavenVersionDoc {
    #[serde(default)]
    v: Option<String>,
    #[serde(rename = "latestVersion", default)]
    latest_version: Option<String>,
}

impl MavenVersionDoc {
    /// `v` is the authoritative version of a gav doc; `latestVersion`
    /// only appears on artifact-core docs and is the fallback.
    fn latest(&self) -> Option<String> {
        self.v.clone().or_else(|| self.latest_version.clone())
    }
}

/// One pom.xml dependency
#[derive(Debug, Deserialize)]
struct MavenDependency {
    #[serde(rename = "groupId")]
    group_id: String,
    #[serde(rename = "artifactId")]
    artifact_id: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

/// One build.gradle dependency
#[derive(Debug, Deserialize)]
struct GradleDependency {
    configuration: String,
    group: String,
    name: String,
    #[serde(default)]
    version: Option<String>,
}

impl JavaHandler {
    /// Creates a new Java resolver
    pub fn new(ctx: HandlerContext) -> Self {
        Self::with_base_url(ctx, MAVEN_CENTRAL_URL)
    }

    /// Creates a resolver against a custom search base (tests)
    pub fn with_base_url(ctx: HandlerContext, base_url: impl Into<String>) -> Self {
        Self {
            ctx,
            base_url: base_url.into(),
        }
    }

    fn search_url(&self, group: &str, artifact: &str) -> String {
        format!(
            "{}?q=g:\"{}\"+AND+a:\"{}\"&core=gav&rows=1&wt=json",
            self.base_url, group, artifact
        )
    }

    /// Latest version of `group:artifact`, via the cache
    async fn get_latest(&self, group: &str, artifact: &str) -> Result<String, FetchError> {
        let key = format!("maven:{}:{}", group, artifact);
        if let Some(latest) = self.ctx.cache().get_as::<String>(&key) {
            return Ok(latest);
        }

        let url = self.search_url(group, artifact);
        debug!(group, artifact, url, "fetching Maven artifact info");
        let response: MavenSearchResponse = self.ctx.http().get_json(&url, &[]).await?;

        let latest = response
            .response
            .docs
            .first()
            .and_then(MavenVersionDoc::latest)
            .ok_or_else(|| {
                FetchError::not_found(format!("artifact not found: {}:{}", group, artifact))
            })?;

        self.ctx.cache().put_as(&key, &latest);
        Ok(latest)
    }

    async fn process(
        &self,
        group: &str,
        artifact: &str,
        declared: Option<String>,
        decoration: Option<&str>,
        registry: &str,
    ) -> PackageVersion {
        let base_name = format!("{}:{}", group, artifact);
        let name = match decoration {
            Some(decoration) => format!("{} ({})", base_name, decoration),
            None => base_name.clone(),
        };

        match self.get_latest(group, artifact).await {
            Ok(latest) => PackageVersion::resolved(name, declared, latest, registry),
            Err(e) => {
                error!(artifact = %base_name, error = %e, "failed to fetch Maven artifact info");
                PackageVersion::skipped(
                    base_name,
                    declared,
                    UNKNOWN_VERSION,
                    registry,
                    format!("Failed to fetch artifact info: {}", e),
                )
            }
        }
    }

    /// Handles `check_maven_versions`
    pub async fn check_maven(&self, args: &ArgsMap) -> Result<ToolResponse, ToolError> {
        info!("checking Maven package versions");

        let dependencies: Vec<MavenDependency> = parse_required(args, "dependencies")?;

        let mut results = Vec::with_capacity(dependencies.len());
        for dep in &dependencies {
            results.push(
                self.process(
                    &dep.group_id,
                    &dep.artifact_id,
                    dep.version.clone(),
                    dep.scope.as_deref(),
                    "maven",
                )
                .await,
            );
        }

        sort_by_name(&mut results);
        ToolResponse::json(&results)
    }

    /// Handles `check_gradle_versions`
    pub async fn check_gradle(&self, args: &ArgsMap) -> Result<ToolResponse, ToolError> {
        info!("checking Gradle package versions");

        let dependencies: Vec<GradleDependency> = parse_required(args, "dependencies")?;

        let mut results = Vec::with_capacity(dependencies.len());
        for dep in &dependencies {
            results.push(
                self.process(
                    &dep.group,
                    &dep.name,
                    dep.version.clone(),
                    Some(dep.configuration.as_str()),
                    "gradle",
                )
                .await,
            );
        }

        sort_by_name(&mut results);
        ToolResponse::json(&results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_shape() {
        let ctx = HandlerContext::new(
            crate::registry::HttpClient::new().unwrap(),
            std::sync::Arc::new(crate::cache::TtlCache::new()),
        );
        let handler = JavaHandler::new(ctx);
        let url = handler.search_url("org.apache.wicket", "wicket-core");
        assert!(url.starts_with("https://search.maven.org/solrsearch/select"));
        assert!(url.contains("q=g:\"org.apache.wicket\"+AND+a:\"wicket-core\""));
        assert!(url.contains("core=gav"));
        assert!(url.contains("rows=1"));
        assert!(url.contains("wt=json"));
    }

    #[test]
    fn test_deserialize_gav_response() {
        let json = r#"
        {
            "response": {
                "numFound": 2,
                "docs": [
                    {"id": "org.apache.wicket:wicket-core:9.12.0", "v": "9.12.0"},
                    {"id": "org.apache.wicket:wicket-core:9.11.0", "v": "9.11.0"}
                ]
            }
        }
        "#;
        let response: MavenSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.response.docs[0].v.as_deref(), Some("9.12.0"));
    }

    #[test]
    fn test_deserialize_latest_version_field() {
        let json = r#"{"response": {"docs": [{"latestVersion": "5.10.1"}]}}"#;
        let response: MavenSearchResponse = serde_json::from_str(json).unwrap();
        let doc = &response.response.docs[0];
        assert_eq!(doc.latest().as_deref(), Some("5.10.1"));
    }

    #[test]
    fn test_v_takes_precedence_over_latest_version() {
        let json =
            r#"{"response": {"docs": [{"v": "9.12.0", "latestVersion": "9.13.0-M1"}]}}"#;
        let response: MavenSearchResponse = serde_json::from_str(json).unwrap();
        let doc = &response.response.docs[0];
        assert_eq!(doc.latest().as_deref(), Some("9.12.0"));
    }

    #[test]
    fn test_gradle_dependency_requires_configuration() {
        let result = serde_json::from_value::<GradleDependency>(serde_json::json!({
            "group": "org.jetbrains.kotlin",
            "name": "kotlin-stdlib"
        }));
        assert!(result.is_err());
    }
}
