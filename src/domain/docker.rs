//! Container image tag descriptor

use serde::{Deserialize, Serialize};

/// One tag of a container image, optionally enriched with the digest,
/// creation time (RFC3339), and size the upstream registry reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DockerImageVersion {
    pub name: String,
    pub tag: String,
    /// `dockerhub`, `ghcr`, or the custom registry base
    pub registry: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl DockerImageVersion {
    /// Creates a bare tag descriptor with no enrichment
    pub fn new(
        name: impl Into<String>,
        tag: impl Into<String>,
        registry: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
            registry: registry.into(),
            digest: None,
            created: None,
            size: None,
        }
    }
}
