//! GitHub Actions version descriptor

use crate::version;
use serde::{Deserialize, Serialize};

/// Latest-release information for one workflow action.
///
/// `latest_major`/`latest_minor`/`latest_patch` are derived from the
/// release tag (leading `v` stripped) when it parses as a dotted
/// version, so callers can pin `uses: owner/repo@v<major>` styles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitHubActionVersion {
    pub owner: String,
    pub repo: String,
    /// `<owner>/<repo>`
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<String>,
    pub latest_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_major: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_minor: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_patch: Option<u64>,
}

impl GitHubActionVersion {
    /// Creates a descriptor for `owner/repo` with the given latest tag,
    /// deriving major/minor/patch when the tag parses.
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        current_version: Option<String>,
        latest_version: impl Into<String>,
    ) -> Self {
        let owner = owner.into();
        let repo = repo.into();
        let latest_version = latest_version.into();
        let name = format!("{}/{}", owner, repo);

        let derived = version::parse(&version::clean(&latest_version)).ok();

        Self {
            owner,
            repo,
            name,
            current_version,
            latest_version,
            published_at: None,
            url: None,
            latest_major: derived.map(|(major, _, _)| major),
            latest_minor: derived.map(|(_, minor, _)| minor),
            latest_patch: derived.map(|(_, _, patch)| patch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivations_from_dotted_tag() {
        let action = GitHubActionVersion::new("actions", "checkout", None, "v4.1.2");
        assert_eq!(action.name, "actions/checkout");
        assert_eq!(action.latest_major, Some(4));
        assert_eq!(action.latest_minor, Some(1));
        assert_eq!(action.latest_patch, Some(2));
    }

    #[test]
    fn test_no_derivations_for_non_version_tag() {
        let action = GitHubActionVersion::new("actions", "checkout", None, "unknown");
        assert_eq!(action.latest_major, None);
        assert_eq!(action.latest_minor, None);
        assert_eq!(action.latest_patch, None);
    }

    #[test]
    fn test_serialize_omits_absent_details() {
        let action =
            GitHubActionVersion::new("actions", "cache", Some("v3".into()), "not found");
        let json = serde_json::to_value(&action).unwrap();
        let obj = json.as_object().unwrap();
        assert!(!obj.contains_key("publishedAt"));
        assert!(!obj.contains_key("url"));
        assert!(!obj.contains_key("latestMajor"));
        assert_eq!(obj["currentVersion"], "v3");
    }
}
