//! Rust crate resolver
//!
//! Fetches crate metadata from crates.io.
//! API endpoint: https://crates.io/api/v1/crates/{crate}
//!
//! Latest is `max_stable_version`, falling back to `max_version`,
//! falling back to the highest non-yanked published version.

use crate::domain::{sort_by_name, PackageVersion, UNKNOWN_VERSION};
use crate::error::{FetchError, ToolError};
use crate::handlers::{parse_required, ArgsMap, DependencyListing, HandlerContext};
use crate::server::ToolResponse;
use crate::version;
use serde::Deserialize;
use tracing::{debug, error, info};

/// crates.io API base URL
const CRATES_IO_API_URL: &str = "https://crates.io/api/v1";

/// Rust resolver
pub struct RustHandler {
    ctx: HandlerContext,
    base_url: String,
}

/// crates.io crate response
#[derive(Debug, Deserialize)]
struct CrateInfo {
    #[serde(rename = "crate")]
    krate: CrateSummary,
    #[serde(default)]
    versions: Vec<CrateVersion>,
}

#[derive(Debug, Deserialize)]
struct CrateSummary {
    #[serde(default)]
    max_stable_version: Option<String>,
    #[serde(default)]
    max_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrateVersion {
    num: String,
    #[serde(default)]
    yanked: bool,
}

impl RustHandler {
    /// Creates a new Rust resolver
    pub fn new(ctx: HandlerContext) -> Self {
        Self::with_base_url(ctx, CRATES_IO_API_URL)
    }

    /// Creates a resolver against a custom API base (tests)
    pub fn with_base_url(ctx: HandlerContext, base_url: impl Into<String>) -> Self {
        Self {
            ctx,
            base_url: base_url.into(),
        }
    }

    /// Picks the latest stable version from a crate response
    fn select_latest(info: &CrateInfo) -> Option<String> {
        if let Some(stable) = &info.krate.max_stable_version {
            if !stable.is_empty() {
                return Some(stable.clone());
            }
        }
        if let Some(max) = &info.krate.max_version {
            if !max.is_empty() {
                return Some(max.clone());
            }
        }
        version::max_by_compare(
            info.versions
                .iter()
                .filter(|v| !v.yanked)
                .map(|v| v.num.as_str()),
        )
        .map(|v| v.to_string())
    }

    /// Latest version of a crate, via the cache
    async fn get_latest(&self, name: &str) -> Result<String, FetchError> {
        let key = format!("rust:{}", name);
        if let Some(latest) = self.ctx.cache().get_as::<String>(&key) {
            return Ok(latest);
        }

        let url = format!("{}/crates/{}", self.base_url, name);
        debug!(krate = name, url, "fetching crate info");
        let info: CrateInfo = self.ctx.http().get_json(&url, &[]).await?;

        let latest = Self::select_latest(&info).ok_or_else(|| {
            FetchError::not_found(format!("no valid versions found for crate {}", name))
        })?;

        self.ctx.cache().put_as(&key, &latest);
        Ok(latest)
    }

    /// Handles `check_rust_versions`
    pub async fn check_versions(&self, args: &ArgsMap) -> Result<ToolResponse, ToolError> {
        info!("checking Rust crate versions");

        let listing: DependencyListing = parse_required(args, "dependencies")?;
        let dependencies = listing.into_pairs();

        let mut results = Vec::with_capacity(dependencies.len());
        for (name, declared) in dependencies {
            let current = declared.map(|v| version::clean(&v));
            match self.get_latest(&name).await {
                Ok(latest) => {
                    results.push(PackageVersion::resolved(name, current, latest, "crates.io"));
                }
                Err(e) => {
                    error!(krate = %name, error = %e, "failed to fetch crate info");
                    results.push(PackageVersion::skipped(
                        name,
                        current,
                        UNKNOWN_VERSION,
                        "crates.io",
                        format!("Failed to fetch crate info: {}", e),
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

    fn crate_info(
        max_stable: Option<&str>,
        max: Option<&str>,
        versions: &[(&str, bool)],
    ) -> CrateInfo {
        CrateInfo {
            krate: CrateSummary {
                max_stable_version: max_stable.map(String::from),
                max_version: max.map(String::from),
            },
            versions: versions
                .iter()
                .map(|(num, yanked)| CrateVersion {
                    num: num.to_string(),
                    yanked: *yanked,
                })
                .collect(),
        }
    }

    #[test]
    fn test_select_latest_prefers_max_stable() {
        let info = crate_info(Some("1.0.195"), Some("1.0.196-rc1"), &[]);
        assert_eq!(
            RustHandler::select_latest(&info),
            Some("1.0.195".to_string())
        );
    }

    #[test]
    fn test_select_latest_falls_back_to_max_version() {
        let info = crate_info(None, Some("0.5.0-alpha"), &[]);
        assert_eq!(
            RustHandler::select_latest(&info),
            Some("0.5.0-alpha".to_string())
        );
    }

    #[test]
    fn test_select_latest_skips_yanked() {
        let info = crate_info(
            None,
            None,
            &[("0.3.0", false), ("0.4.0", true), ("0.2.0", false)],
        );
        assert_eq!(RustHandler::select_latest(&info), Some("0.3.0".to_string()));
    }

    #[test]
    fn test_select_latest_none_available() {
        let info = crate_info(None, None, &[("0.1.0", true)]);
        assert_eq!(RustHandler::select_latest(&info), None);
    }
}
