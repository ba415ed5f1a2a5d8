//! Caller-supplied per-package version constraints

use serde::Deserialize;
use std::collections::HashMap;

/// Directive for one package: exclude it from the check entirely, or
/// cap the reported latest version at a major release line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct VersionConstraint {
    /// Cap: report the newest version whose major equals this value
    #[serde(default)]
    pub major_version: Option<u64>,
    /// Skip the package with reason `Package excluded by constraints`
    #[serde(default)]
    pub exclude_package: bool,
}

/// Constraints keyed by package name (or package URL for Swift)
pub type VersionConstraints = HashMap<String, VersionConstraint>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_constraint() {
        let constraint: VersionConstraint =
            serde_json::from_value(json!({"majorVersion": 17, "excludePackage": false})).unwrap();
        assert_eq!(constraint.major_version, Some(17));
        assert!(!constraint.exclude_package);
    }

    #[test]
    fn test_deserialize_defaults() {
        let constraint: VersionConstraint = serde_json::from_value(json!({})).unwrap();
        assert_eq!(constraint, VersionConstraint::default());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result =
            serde_json::from_value::<VersionConstraint>(json!({"majorVesion": 17}));
        assert!(result.is_err());
    }
}
