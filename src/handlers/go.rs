//! Go module resolver
//!
//! Fetches module version information from the Go module proxy.
//! API endpoint: https://proxy.golang.org/{module}/@latest
//!
//! Modules named in a go.mod `replace` directive are reported as
//! skipped with a `replaced by <new>@<ver>` sentinel instead of a
//! proxy lookup.

use crate::domain::{sort_by_name, PackageVersion, UNKNOWN_VERSION};
use crate::error::{FetchError, ToolError};
use crate::handlers::{parse_required, ArgsMap, HandlerContext};
use crate::server::ToolResponse;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, error, info};

/// Go module proxy base URL
const GO_PROXY_URL: &str = "https://proxy.golang.org";

/// Go resolver
pub struct GoHandler {
    ctx: HandlerContext,
    base_url: String,
}

/// Proxy @latest response
#[derive(Debug, Serialize, Deserialize)]
struct GoModuleInfo {
    #[serde(rename = "Version")]
    version: String,
    #[serde(rename = "Time", default)]
    time: Option<String>,
}

/// One go.mod require entry
#[derive(Debug, Deserialize)]
struct GoRequire {
    path: String,
    #[serde(default)]
    version: Option<String>,
}

/// One go.mod replace entry
#[derive(Debug, Deserialize)]
struct GoReplace {
    old: String,
    new: String,
    #[serde(default)]
    version: Option<String>,
}

/// Structured go.mod shape
#[derive(Debug, Deserialize)]
struct GoModule {
    #[allow(dead_code)]
    module: String,
    #[serde(default)]
    require: Vec<GoRequire>,
    #[serde(default)]
    replace: Vec<GoReplace>,
}

/// Dependencies argument: a full go.mod structure or a plain
/// path-to-version map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GoDependencies {
    Module(GoModule),
    Simple(BTreeMap<String, String>),
}

impl GoHandler {
    /// Creates a new Go resolver
    pub fn new(ctx: HandlerContext) -> Self {
        Self::with_base_url(ctx, GO_PROXY_URL)
    }

    /// Creates a resolver against a custom proxy base (tests)
    pub fn with_base_url(ctx: HandlerContext, base_url: impl Into<String>) -> Self {
        Self {
            ctx,
            base_url: base_url.into(),
        }
    }

    /// Encodes a module path for the proxy: uppercase letters become
    /// `!lowercase` per the module proxy protocol.
    fn encode_module_path(module: &str) -> String {
        let mut encoded = String::with_capacity(module.len());
        for ch in module.chars() {
            if ch.is_uppercase() {
                encoded.push('!');
                for lower in ch.to_lowercase() {
                    encoded.push(lower);
                }
            } else {
                encoded.push(ch);
            }
        }
        encoded
    }

    /// Latest version of a module path, via the cache
    async fn get_latest(&self, module: &str) -> Result<String, FetchError> {
        let key = format!("go:{}", module);
        if let Some(latest) = self.ctx.cache().get_as::<String>(&key) {
            return Ok(latest);
        }

        let url = format!(
            "{}/{}/@latest",
            self.base_url,
            Self::encode_module_path(module)
        );
        debug!(module, url, "fetching Go module info");
        let info: GoModuleInfo = self.ctx.http().get_json(&url, &[]).await?;

        self.ctx.cache().put_as(&key, &info.version);
        Ok(info.version)
    }

    /// Handles `check_go_versions`
    pub async fn check_versions(&self, args: &ArgsMap) -> Result<ToolResponse, ToolError> {
        info!("checking Go module versions");

        let (require, replace) = match parse_required(args, "dependencies")? {
            GoDependencies::Module(module) => (module.require, module.replace),
            GoDependencies::Simple(map) => (
                map.into_iter()
                    .map(|(path, version)| GoRequire {
                        path,
                        version: Some(version),
                    })
                    .collect(),
                Vec::new(),
            ),
        };

        let mut results = Vec::with_capacity(require.len());
        for req in &require {
            if let Some(rep) = replace.iter().find(|rep| rep.old == req.path) {
                results.push(PackageVersion::skipped(
                    &req.path,
                    req.version.clone(),
                    format!(
                        "replaced by {}@{}",
                        rep.new,
                        rep.version.as_deref().unwrap_or_default()
                    ),
                    "go",
                    "Module is replaced",
                ));
                continue;
            }

            match self.get_latest(&req.path).await {
                Ok(latest) => {
                    results.push(PackageVersion::resolved(
                        &req.path,
                        req.version.clone(),
                        latest,
                        "go",
                    ));
                }
                Err(e) => {
                    error!(module = %req.path, error = %e, "failed to fetch Go module info");
                    results.push(PackageVersion::skipped(
                        &req.path,
                        req.version.clone(),
                        UNKNOWN_VERSION,
                        "go",
                        format!("Failed to fetch module info: {}", e),
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
    use serde_json::json;

    #[test]
    fn test_encode_module_path_simple() {
        assert_eq!(
            GoHandler::encode_module_path("github.com/gin-gonic/gin"),
            "github.com/gin-gonic/gin"
        );
    }

    #[test]
    fn test_encode_module_path_with_uppercase() {
        assert_eq!(
            GoHandler::encode_module_path("github.com/Azure/azure-sdk-for-go"),
            "github.com/!azure/azure-sdk-for-go"
        );
    }

    #[test]
    fn test_dependencies_module_shape() {
        let deps: GoDependencies = serde_json::from_value(json!({
            "module": "example.com/app",
            "require": [{"path": "github.com/a/b", "version": "v1.0.0"}],
            "replace": [{"old": "github.com/a/b", "new": "github.com/c/d", "version": "v2.0.0"}]
        }))
        .unwrap();
        let GoDependencies::Module(module) = deps else {
            panic!("expected module shape");
        };
        assert_eq!(module.require.len(), 1);
        assert_eq!(module.replace[0].new, "github.com/c/d");
    }

    #[test]
    fn test_dependencies_simple_shape() {
        let deps: GoDependencies = serde_json::from_value(json!({
            "github.com/spf13/cobra": "v1.8.0"
        }))
        .unwrap();
        let GoDependencies::Simple(map) = deps else {
            panic!("expected simple shape");
        };
        assert_eq!(map["github.com/spf13/cobra"], "v1.8.0");
    }
}
