//! Per-ecosystem resolvers
//!
//! Every resolver follows the same contract: parse the raw argument map
//! into a typed request, look each dependency up through the shared
//! cache-then-fetch substrate, apply ecosystem-specific selection
//! rules, and emit one result descriptor per dependency. Failures
//! become skipped descriptors, never request aborts. The shared pieces
//! live here; the ecosystem-specific decoding, URL construction, and
//! latest-version selection live in the per-ecosystem modules.

mod bedrock;
mod composer;
mod dart;
mod docker;
mod github_actions;
mod go;
mod java;
mod npm;
mod python;
mod rust_crates;
mod swift;

pub use bedrock::{BedrockCatalog, BedrockHandler};
pub use composer::ComposerHandler;
pub use dart::DartHandler;
pub use docker::DockerHandler;
pub use github_actions::GitHubActionsHandler;
pub use go::GoHandler;
pub use java::JavaHandler;
pub use npm::NpmHandler;
pub use python::PythonHandler;
pub use rust_crates::RustHandler;
pub use swift::SwiftHandler;

use crate::cache::TtlCache;
use crate::domain::VersionConstraints;
use crate::error::{FetchError, ToolError};
use crate::registry::HttpClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Raw tool-call arguments as delivered by the protocol layer
pub type ArgsMap = serde_json::Map<String, serde_json::Value>;

/// Shared substrate handed to every resolver: the HTTP fetcher and the
/// process-wide TTL cache.
#[derive(Clone)]
pub struct HandlerContext {
    http: HttpClient,
    cache: Arc<TtlCache>,
}

impl HandlerContext {
    /// Creates a context over the shared client and cache
    pub fn new(http: HttpClient, cache: Arc<TtlCache>) -> Self {
        Self { http, cache }
    }

    /// The cache-then-fetch pattern: return the live cached value for
    /// `key`, or GET `url`, decode as JSON, store, and return.
    pub async fn cached_json<T>(
        &self,
        key: &str,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<T, FetchError>
    where
        T: Serialize + DeserializeOwned,
    {
        if let Some(value) = self.cache.get_as::<T>(key) {
            return Ok(value);
        }
        let value: T = self.http.get_json(url, headers).await?;
        self.cache.put_as(key, &value);
        Ok(value)
    }

    /// Direct access to the HTTP fetcher for multi-endpoint lookups
    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Direct access to the cache for post-transform storage
    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }
}

/// Extracts and deserializes a required top-level argument.
///
/// A missing key is a MissingParameter carrying the key name; a
/// present key of the wrong shape is an InvalidParameter.
pub fn parse_required<T: DeserializeOwned>(args: &ArgsMap, key: &str) -> Result<T, ToolError> {
    let value = args.get(key).ok_or_else(|| ToolError::missing(key))?;
    serde_json::from_value(value.clone()).map_err(|e| ToolError::invalid(key, e.to_string()))
}

/// Extracts and deserializes an optional top-level argument
pub fn parse_optional<T: DeserializeOwned>(
    args: &ArgsMap,
    key: &str,
) -> Result<Option<T>, ToolError> {
    match args.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| ToolError::invalid(key, e.to_string())),
    }
}

/// Parses the optional `constraints` argument shared by npm, Swift,
/// and Composer.
pub fn parse_constraints(args: &ArgsMap) -> Result<VersionConstraints, ToolError> {
    Ok(parse_optional(args, "constraints")?.unwrap_or_default())
}

/// A manifest git source: either a bare URL or a `{url, ref}` table
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GitSource {
    Url(String),
    Detailed {
        #[serde(default)]
        url: Option<String>,
        #[serde(rename = "ref", default)]
        reference: Option<String>,
    },
}

impl GitSource {
    /// Renders the source as a `git: <url>[@<ref>]` marker string
    pub fn describe(&self) -> String {
        match self {
            GitSource::Url(url) => format!("git: {}", url),
            GitSource::Detailed { url, reference } => {
                let url = url.as_deref().unwrap_or_default();
                match reference {
                    Some(reference) => format!("git: {}@{}", url, reference),
                    None => format!("git: {}", url),
                }
            }
        }
    }
}

/// A dependency table value: manifests declare either a plain version
/// string or a table carrying `version` and/or a path/git source.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    Version(String),
    Table {
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        path: Option<String>,
        #[serde(default)]
        git: Option<GitSource>,
    },
    Other(serde_json::Value),
}

impl DependencySpec {
    /// The declared version string, with path/git sources rendered as
    /// `path: <p>` / `git: <url>` markers and scalars coerced to text.
    pub fn version_marker(&self) -> Option<String> {
        match self {
            DependencySpec::Version(version) => Some(version.clone()),
            DependencySpec::Table { version, path, git } => {
                if let Some(version) = version {
                    Some(version.clone())
                } else if let Some(path) = path {
                    Some(format!("path: {}", path))
                } else {
                    git.as_ref().map(|git| git.describe())
                }
            }
            DependencySpec::Other(value) => match value {
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            },
        }
    }
}

/// A dependency named inside an array-shaped listing
#[derive(Debug, Clone, Deserialize)]
pub struct NamedDependency {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// Dependencies accepted as either a manifest-style mapping or an
/// array of named entries.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DependencyListing {
    Map(BTreeMap<String, DependencySpec>),
    List(Vec<NamedDependency>),
}

impl DependencyListing {
    /// Flattens either shape into `(name, declared-version)` pairs
    pub fn into_pairs(self) -> Vec<(String, Option<String>)> {
        match self {
            DependencyListing::Map(map) => map
                .into_iter()
                .map(|(name, spec)| {
                    let version = spec.version_marker();
                    (name, version)
                })
                .collect(),
            DependencyListing::List(list) => list
                .into_iter()
                .map(|dep| (dep.name, dep.version))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: serde_json::Value) -> ArgsMap {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_parse_required_missing_key() {
        let err =
            parse_required::<Vec<String>>(&args(json!({})), "requirements").unwrap_err();
        assert!(matches!(err, ToolError::MissingParameter { name } if name == "requirements"));
    }

    #[test]
    fn test_parse_required_wrong_shape() {
        let err = parse_required::<Vec<String>>(&args(json!({"requirements": 7})), "requirements")
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameter { name, .. } if name == "requirements"));
    }

    #[test]
    fn test_parse_constraints_absent_is_empty() {
        let constraints = parse_constraints(&args(json!({}))).unwrap();
        assert!(constraints.is_empty());
    }

    #[test]
    fn test_parse_constraints_values() {
        let constraints = parse_constraints(&args(json!({
            "constraints": {
                "react": {"majorVersion": 17},
                "left-pad": {"excludePackage": true}
            }
        })))
        .unwrap();
        assert_eq!(constraints["react"].major_version, Some(17));
        assert!(constraints["left-pad"].exclude_package);
    }

    #[test]
    fn test_dependency_spec_shapes() {
        let plain: DependencySpec = serde_json::from_value(json!("^1.2.3")).unwrap();
        assert_eq!(plain.version_marker(), Some("^1.2.3".to_string()));

        let table: DependencySpec =
            serde_json::from_value(json!({"version": "0.4", "features": ["full"]})).unwrap();
        assert_eq!(table.version_marker(), Some("0.4".to_string()));

        let path: DependencySpec = serde_json::from_value(json!({"path": "../local"})).unwrap();
        assert_eq!(path.version_marker(), Some("path: ../local".to_string()));

        let git: DependencySpec =
            serde_json::from_value(json!({"git": {"url": "https://g.example/r.git", "ref": "main"}}))
                .unwrap();
        assert_eq!(
            git.version_marker(),
            Some("git: https://g.example/r.git@main".to_string())
        );
    }

    #[test]
    fn test_dependency_listing_map_and_list() {
        let map: DependencyListing =
            serde_json::from_value(json!({"serde": "1.0", "tokio": {"version": "1"}})).unwrap();
        let mut pairs = map.into_pairs();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("serde".to_string(), Some("1.0".to_string())),
                ("tokio".to_string(), Some("1".to_string())),
            ]
        );

        let list: DependencyListing =
            serde_json::from_value(json!([{"name": "serde", "version": "1.0"}, {"name": "log"}]))
                .unwrap();
        assert_eq!(
            list.into_pairs(),
            vec![
                ("serde".to_string(), Some("1.0".to_string())),
                ("log".to_string(), None),
            ]
        );
    }
}
