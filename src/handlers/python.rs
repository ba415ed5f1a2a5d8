//! Python resolver (requirements.txt and pyproject.toml shapes)
//!
//! Fetches package metadata from PyPI.
//! API endpoint: https://pypi.org/pypi/{package}/json

use crate::domain::{sort_by_name, PackageVersion, UNKNOWN_VERSION};
use crate::error::ToolError;
use crate::handlers::{parse_required, ArgsMap, DependencySpec, HandlerContext};
use crate::server::ToolResponse;
use crate::version;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{error, info};

/// PyPI API base URL
const PYPI_API_URL: &str = "https://pypi.org/pypi";

/// Pattern for one requirements.txt line: a package name followed by
/// an optional constraint expression.
fn requirement_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([A-Za-z0-9_.-]+)\s*([<>=!~^].*)?$").unwrap())
}

/// Python resolver
pub struct PythonHandler {
    ctx: HandlerContext,
    base_url: String,
}

/// PyPI package metadata response
#[derive(Debug, Serialize, Deserialize)]
struct PyPiPackageInfo {
    info: PyPiInfo,
}

#[derive(Debug, Serialize, Deserialize)]
struct PyPiInfo {
    version: String,
}

/// The three dependency groups a pyproject.toml declares
#[derive(Debug, Deserialize)]
struct PyprojectGroups {
    #[serde(default)]
    dependencies: BTreeMap<String, DependencySpec>,
    #[serde(rename = "optional-dependencies", default)]
    optional_dependencies: BTreeMap<String, BTreeMap<String, DependencySpec>>,
    #[serde(rename = "dev-dependencies", default)]
    dev_dependencies: BTreeMap<String, DependencySpec>,
}

impl PythonHandler {
    /// Creates a new Python resolver
    pub fn new(ctx: HandlerContext) -> Self {
        Self::with_base_url(ctx, PYPI_API_URL)
    }

    /// Creates a resolver against a custom API base (tests)
    pub fn with_base_url(ctx: HandlerContext, base_url: impl Into<String>) -> Self {
        Self {
            ctx,
            base_url: base_url.into(),
        }
    }

    /// Splits a requirements line into name and constraint expression
    fn parse_requirement(line: &str) -> Option<(String, Option<String>)> {
        let captures = requirement_pattern().captures(line)?;
        let name = captures.get(1)?.as_str().to_string();
        let constraint = captures
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|c| !c.is_empty());
        Some((name, constraint))
    }

    /// Looks up one package and builds its result descriptor
    async fn process_package(&self, name: &str, declared: Option<&str>) -> PackageVersion {
        let current = declared.map(|v| version::clean(v));
        let url = format!("{}/{}/json", self.base_url, name);

        match self
            .ctx
            .cached_json::<PyPiPackageInfo>(&format!("pypi:{}", name), &url, &[])
            .await
        {
            Ok(info) => PackageVersion::resolved(name, current, info.info.version, "pypi"),
            Err(e) => {
                error!(package = name, error = %e, "failed to fetch PyPI package info");
                PackageVersion::skipped(
                    name,
                    current,
                    UNKNOWN_VERSION,
                    "pypi",
                    format!("Failed to fetch package info: {}", e),
                )
            }
        }
    }

    /// Handles `check_python_versions` (requirements.txt lines)
    pub async fn check_requirements(&self, args: &ArgsMap) -> Result<ToolResponse, ToolError> {
        info!("checking Python package versions from requirements");

        let requirements: Vec<String> = parse_required(args, "requirements")?;

        let mut results = Vec::with_capacity(requirements.len());
        for line in &requirements {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match Self::parse_requirement(line) {
                Some((name, constraint)) => {
                    results
                        .push(self.process_package(&name, constraint.as_deref()).await);
                }
                None => {
                    results.push(PackageVersion::skipped(
                        line,
                        None,
                        UNKNOWN_VERSION,
                        "pypi",
                        format!("Failed to parse requirement: {}", line),
                    ));
                }
            }
        }

        sort_by_name(&mut results);
        ToolResponse::json(&results)
    }

    /// Handles `check_pyproject_versions` (grouped dependency tables)
    pub async fn check_pyproject(&self, args: &ArgsMap) -> Result<ToolResponse, ToolError> {
        info!("checking Python package versions from pyproject");

        let groups: PyprojectGroups = parse_required(args, "dependencies")?;

        let mut results = Vec::new();

        for (name, spec) in &groups.dependencies {
            results
                .push(self.process_package(name, spec.version_marker().as_deref()).await);
        }

        for (group, dependencies) in &groups.optional_dependencies {
            for (name, spec) in dependencies {
                let mut result = self
                    .process_package(name, spec.version_marker().as_deref())
                    .await;
                result.name = format!("{} (optional:{})", name, group);
                results.push(result);
            }
        }

        for (name, spec) in &groups.dev_dependencies {
            let mut result = self
                .process_package(name, spec.version_marker().as_deref())
                .await;
            result.name = format!("{} (dev)", name);
            results.push(result);
        }

        sort_by_name(&mut results);
        ToolResponse::json(&results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("requests==2.28.1", "requests", Some("==2.28.1"))]
    #[case("flask", "flask", None)]
    #[case("django>=4.2,<5.0", "django", Some(">=4.2,<5.0"))]
    #[case("typing_extensions~=4.8", "typing_extensions", Some("~=4.8"))]
    #[case("zope.interface==6.0", "zope.interface", Some("==6.0"))]
    fn test_parse_requirement(
        #[case] line: &str,
        #[case] name: &str,
        #[case] constraint: Option<&str>,
    ) {
        let (parsed_name, parsed_constraint) = PythonHandler::parse_requirement(line).unwrap();
        assert_eq!(parsed_name, name);
        assert_eq!(parsed_constraint.as_deref(), constraint);
    }

    #[rstest]
    #[case("-r other-requirements.txt")]
    #[case("./local/package")]
    #[case("package @ https://example.com/pkg.whl")]
    fn test_parse_requirement_rejects(#[case] line: &str) {
        assert!(PythonHandler::parse_requirement(line).is_none());
    }

    #[test]
    fn test_pyproject_groups_deserialize() {
        let groups: PyprojectGroups = serde_json::from_value(serde_json::json!({
            "dependencies": {"requests": "^2.28"},
            "optional-dependencies": {"test": {"pytest": "^7.0"}},
            "dev-dependencies": {"ruff": "^0.1"}
        }))
        .unwrap();
        assert_eq!(groups.dependencies.len(), 1);
        assert_eq!(groups.optional_dependencies["test"].len(), 1);
        assert_eq!(groups.dev_dependencies.len(), 1);
    }

    #[test]
    fn test_pyproject_groups_all_optional() {
        let groups: PyprojectGroups = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(groups.dependencies.is_empty());
        assert!(groups.optional_dependencies.is_empty());
        assert!(groups.dev_dependencies.is_empty());
    }
}
