//! The normalised per-package result descriptor

use serde::{Deserialize, Serialize};

/// Sentinel latest for packages whose registry could not be consulted
pub const UNKNOWN_VERSION: &str = "unknown";

/// Sentinel latest for SDK/environment-managed dependencies
pub const SDK_DEPENDENCY: &str = "sdk dependency";

/// Sentinel latest for git/path dependencies that carry no version
pub const SPECIAL_DEPENDENCY: &str = "special dependency";

/// Result of a latest-version lookup for one declared dependency.
///
/// `name` may be decorated with a suffix such as ` (dev)`,
/// ` (optional:<group>)`, or ` (<scope>)`. When `skipped` is set,
/// `latest_version` holds a sentinel rather than a resolved version and
/// `skip_reason` explains why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageVersion {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    pub latest_version: String,
    pub registry: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl PackageVersion {
    /// Creates a resolved (non-skipped) descriptor
    pub fn resolved(
        name: impl Into<String>,
        current_version: Option<String>,
        latest_version: impl Into<String>,
        registry: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            current_version,
            latest_version: latest_version.into(),
            registry: registry.into(),
            skipped: false,
            skip_reason: None,
        }
    }

    /// Creates a skipped descriptor carrying a sentinel latest version
    pub fn skipped(
        name: impl Into<String>,
        current_version: Option<String>,
        latest_version: impl Into<String>,
        registry: impl Into<String>,
        skip_reason: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            current_version,
            latest_version: latest_version.into(),
            registry: registry.into(),
            skipped: true,
            skip_reason: Some(skip_reason.into()),
        }
    }
}

/// Sorts results ascending by lowercased name (stable)
pub fn sort_by_name(results: &mut [PackageVersion]) {
    results.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_has_no_skip_fields() {
        let result = PackageVersion::resolved("react", Some("17.0.2".into()), "18.2.0", "npm");
        assert!(!result.skipped);
        assert_eq!(result.skip_reason, None);
    }

    #[test]
    fn test_skipped_carries_reason_and_sentinel() {
        let result = PackageVersion::skipped(
            "flutter",
            Some("sdk: flutter".into()),
            SDK_DEPENDENCY,
            "pub.dev",
            "SDK or environment dependency, version is managed by the SDK",
        );
        assert!(result.skipped);
        assert_eq!(result.latest_version, "sdk dependency");
        assert!(result.skip_reason.as_deref().unwrap().contains("SDK"));
    }

    #[test]
    fn test_serialize_omits_absent_optionals() {
        let result = PackageVersion::resolved("requests", None, "2.31.0", "pypi");
        let json = serde_json::to_value(&result).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("currentVersion"));
        assert!(!obj.contains_key("skipped"));
        assert!(!obj.contains_key("skipReason"));
        assert_eq!(obj["latestVersion"], "2.31.0");
    }

    #[test]
    fn test_serialize_skipped_fields() {
        let result = PackageVersion::skipped(
            "github.com/a/b",
            Some("v1.0.0".into()),
            "replaced by github.com/c/d@v2.0.0",
            "go",
            "Module is replaced",
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["skipped"], true);
        assert_eq!(json["skipReason"], "Module is replaced");
    }

    #[test]
    fn test_sort_by_name_is_case_insensitive() {
        let mut results = vec![
            PackageVersion::resolved("Zlib", None, "1.0.0", "npm"),
            PackageVersion::resolved("axios", None, "1.0.0", "npm"),
            PackageVersion::resolved("Express", None, "1.0.0", "npm"),
        ];
        sort_by_name(&mut results);
        let names: Vec<_> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["axios", "Express", "Zlib"]);
    }
}
