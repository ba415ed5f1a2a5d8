//! The static tool catalogue
//!
//! One entry per tool: the stable tool name, a short description, the
//! input JSON-schema advertised to clients, and the resolver adapter
//! the dispatcher invokes.

use super::{RegisteredTool, ToolHandler, ToolResponse, ToolSpec};
use crate::error::ToolError;
use crate::handlers::{
    ArgsMap, BedrockHandler, ComposerHandler, DartHandler, DockerHandler, GitHubActionsHandler,
    GoHandler, HandlerContext, JavaHandler, NpmHandler, PythonHandler, RustHandler, SwiftHandler,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Schema fragment for the shared `constraints` argument
fn constraints_schema() -> Value {
    json!({
        "type": "object",
        "description": "Optional constraints for specific packages",
        "additionalProperties": {
            "type": "object",
            "properties": {
                "majorVersion": {
                    "type": "integer",
                    "description": "Limit results to this major version"
                },
                "excludePackage": {
                    "type": "boolean",
                    "description": "Skip the package entirely"
                }
            }
        }
    })
}

macro_rules! tool_adapter {
    ($adapter:ident, $handler:ty, $method:ident) => {
        struct $adapter(Arc<$handler>);

        #[async_trait]
        impl ToolHandler for $adapter {
            async fn call(&self, args: &ArgsMap) -> Result<ToolResponse, ToolError> {
                self.0.$method(args).await
            }
        }
    };
}

tool_adapter!(NpmTool, NpmHandler, check_versions);
tool_adapter!(PythonRequirementsTool, PythonHandler, check_requirements);
tool_adapter!(PyprojectTool, PythonHandler, check_pyproject);
tool_adapter!(MavenTool, JavaHandler, check_maven);
tool_adapter!(GradleTool, JavaHandler, check_gradle);
tool_adapter!(GoTool, GoHandler, check_versions);
tool_adapter!(RustTool, RustHandler, check_versions);
tool_adapter!(DartTool, DartHandler, check_versions);
tool_adapter!(SwiftTool, SwiftHandler, check_versions);
tool_adapter!(ComposerTool, ComposerHandler, check_versions);
tool_adapter!(ActionsTool, GitHubActionsHandler, check_versions);
tool_adapter!(DockerTool, DockerHandler, check_tags);
tool_adapter!(BedrockModelsTool, BedrockHandler, check_models);
tool_adapter!(LatestBedrockModelTool, BedrockHandler, get_latest_model);

/// Builds the full tool table over the shared context
pub(super) fn build(ctx: HandlerContext) -> Vec<RegisteredTool> {
    let npm = Arc::new(NpmHandler::new(ctx.clone()));
    let python = Arc::new(PythonHandler::new(ctx.clone()));
    let java = Arc::new(JavaHandler::new(ctx.clone()));
    let go = Arc::new(GoHandler::new(ctx.clone()));
    let rust = Arc::new(RustHandler::new(ctx.clone()));
    let dart = Arc::new(DartHandler::new(ctx.clone()));
    let swift = Arc::new(SwiftHandler::new(ctx.clone()));
    let composer = Arc::new(ComposerHandler::new(ctx.clone()));
    let actions = Arc::new(GitHubActionsHandler::new(ctx.clone()));
    let docker = Arc::new(DockerHandler::new(ctx));
    let bedrock = Arc::new(BedrockHandler::new());

    vec![
        RegisteredTool {
            spec: ToolSpec {
                name: "check_npm_versions",
                description: "Check latest stable versions for npm packages",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "dependencies": {
                            "type": "object",
                            "description": "Dependencies object from package.json",
                            "additionalProperties": {"type": "string"}
                        },
                        "constraints": constraints_schema()
                    },
                    "required": ["dependencies"]
                }),
            },
            handler: Arc::new(NpmTool(npm)),
        },
        RegisteredTool {
            spec: ToolSpec {
                name: "check_python_versions",
                description: "Check latest stable versions for Python packages in requirements.txt",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "requirements": {
                            "type": "array",
                            "description": "Array of requirements.txt lines",
                            "items": {"type": "string"}
                        }
                    },
                    "required": ["requirements"]
                }),
            },
            handler: Arc::new(PythonRequirementsTool(python.clone())),
        },
        RegisteredTool {
            spec: ToolSpec {
                name: "check_pyproject_versions",
                description: "Check latest stable versions for Python packages in pyproject.toml",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "dependencies": {
                            "type": "object",
                            "description": "Dependency groups from pyproject.toml",
                            "properties": {
                                "dependencies": {"type": "object"},
                                "optional-dependencies": {"type": "object"},
                                "dev-dependencies": {"type": "object"}
                            }
                        }
                    },
                    "required": ["dependencies"]
                }),
            },
            handler: Arc::new(PyprojectTool(python)),
        },
        RegisteredTool {
            spec: ToolSpec {
                name: "check_maven_versions",
                description: "Check latest stable versions for Java packages in pom.xml",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "dependencies": {
                            "type": "array",
                            "description": "Array of Maven dependencies",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "groupId": {"type": "string"},
                                    "artifactId": {"type": "string"},
                                    "version": {"type": "string"},
                                    "scope": {"type": "string"}
                                },
                                "required": ["groupId", "artifactId"]
                            }
                        }
                    },
                    "required": ["dependencies"]
                }),
            },
            handler: Arc::new(MavenTool(java.clone())),
        },
        RegisteredTool {
            spec: ToolSpec {
                name: "check_gradle_versions",
                description: "Check latest stable versions for Java packages in build.gradle",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "dependencies": {
                            "type": "array",
                            "description": "Array of Gradle dependencies",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "configuration": {"type": "string"},
                                    "group": {"type": "string"},
                                    "name": {"type": "string"},
                                    "version": {"type": "string"}
                                },
                                "required": ["configuration", "group", "name"]
                            }
                        }
                    },
                    "required": ["dependencies"]
                }),
            },
            handler: Arc::new(GradleTool(java)),
        },
        RegisteredTool {
            spec: ToolSpec {
                name: "check_go_versions",
                description: "Check latest versions for Go modules in go.mod",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "dependencies": {
                            "type": "object",
                            "description": "Module map, or a go.mod structure with require/replace lists",
                            "properties": {
                                "module": {"type": "string"},
                                "require": {
                                    "type": "array",
                                    "items": {
                                        "type": "object",
                                        "properties": {
                                            "path": {"type": "string"},
                                            "version": {"type": "string"}
                                        },
                                        "required": ["path"]
                                    }
                                },
                                "replace": {
                                    "type": "array",
                                    "items": {
                                        "type": "object",
                                        "properties": {
                                            "old": {"type": "string"},
                                            "new": {"type": "string"},
                                            "version": {"type": "string"}
                                        },
                                        "required": ["old", "new"]
                                    }
                                }
                            }
                        }
                    },
                    "required": ["dependencies"]
                }),
            },
            handler: Arc::new(GoTool(go)),
        },
        RegisteredTool {
            spec: ToolSpec {
                name: "check_rust_versions",
                description: "Check latest stable versions for Rust crates in Cargo.toml",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "dependencies": {
                            "type": "object",
                            "description": "Dependencies table from Cargo.toml"
                        }
                    },
                    "required": ["dependencies"]
                }),
            },
            handler: Arc::new(RustTool(rust)),
        },
        RegisteredTool {
            spec: ToolSpec {
                name: "check_dart_versions",
                description: "Check latest stable versions for Dart packages in pubspec.yaml",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "dependencies": {
                            "type": "object",
                            "description": "Dependencies from pubspec.yaml"
                        }
                    },
                    "required": ["dependencies"]
                }),
            },
            handler: Arc::new(DartTool(dart)),
        },
        RegisteredTool {
            spec: ToolSpec {
                name: "check_swift_versions",
                description: "Check latest stable versions for Swift packages in Package.swift",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "dependencies": {
                            "type": "array",
                            "description": "Array of Swift package dependencies",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "url": {"type": "string"},
                                    "version": {"type": "string"},
                                    "requirement": {"type": "string"}
                                },
                                "required": ["url"]
                            }
                        },
                        "constraints": constraints_schema()
                    },
                    "required": ["dependencies"]
                }),
            },
            handler: Arc::new(SwiftTool(swift)),
        },
        RegisteredTool {
            spec: ToolSpec {
                name: "check_composer_versions",
                description: "Check latest stable versions for PHP Composer packages",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "dependencies": {
                            "type": "object",
                            "description": "Dependencies object from composer.json",
                            "additionalProperties": {"type": "string"}
                        },
                        "constraints": constraints_schema()
                    },
                    "required": ["dependencies"]
                }),
            },
            handler: Arc::new(ComposerTool(composer)),
        },
        RegisteredTool {
            spec: ToolSpec {
                name: "check_github_actions",
                description: "Check latest versions for GitHub Actions",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "actions": {
                            "type": "array",
                            "description": "Array of GitHub Actions to check",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "owner": {"type": "string"},
                                    "repo": {"type": "string"},
                                    "currentVersion": {"type": "string"}
                                },
                                "required": ["owner", "repo"]
                            }
                        },
                        "includeDetails": {
                            "type": "boolean",
                            "description": "Include published date and release URL",
                            "default": false
                        }
                    },
                    "required": ["actions"]
                }),
            },
            handler: Arc::new(ActionsTool(actions)),
        },
        RegisteredTool {
            spec: ToolSpec {
                name: "check_docker_tags",
                description: "List current tags for container images from Docker Hub, GHCR, or custom registries",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "image": {
                            "type": "string",
                            "description": "Image name (e.g. \"nginx\", \"ghcr.io/owner/repo\")"
                        },
                        "registry": {
                            "type": "string",
                            "enum": ["dockerhub", "ghcr", "custom"],
                            "default": "dockerhub"
                        },
                        "customRegistry": {
                            "type": "string",
                            "description": "Base URL for a custom V2 registry (required when registry is \"custom\")"
                        },
                        "limit": {
                            "type": "integer",
                            "description": "Maximum number of tags to return",
                            "default": 10
                        },
                        "filterTags": {
                            "type": "array",
                            "description": "Regex patterns; tags matching any pattern are kept",
                            "items": {"type": "string"}
                        },
                        "includeDigest": {
                            "type": "boolean",
                            "description": "Include image digests in results",
                            "default": false
                        }
                    },
                    "required": ["image"]
                }),
            },
            handler: Arc::new(DockerTool(docker)),
        },
        RegisteredTool {
            spec: ToolSpec {
                name: "check_bedrock_models",
                description: "Search, list, and get information about Amazon Bedrock models",
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "action": {
                            "type": "string",
                            "enum": ["list", "search", "get", "get_latest_claude_sonnet"],
                            "default": "list"
                        },
                        "query": {
                            "type": "string",
                            "description": "Search query over model name, id, and provider"
                        },
                        "provider": {
                            "type": "string",
                            "description": "Filter by provider name"
                        },
                        "region": {
                            "type": "string",
                            "description": "Filter by supported AWS region"
                        },
                        "modelId": {
                            "type": "string",
                            "description": "Model id to retrieve (action: \"get\")"
                        }
                    }
                }),
            },
            handler: Arc::new(BedrockModelsTool(bedrock.clone())),
        },
        RegisteredTool {
            spec: ToolSpec {
                name: "get_latest_bedrock_model",
                description: "Return the latest Claude Sonnet model available on Amazon Bedrock",
                input_schema: json!({
                    "type": "object",
                    "properties": {}
                }),
            },
            handler: Arc::new(LatestBedrockModelTool(bedrock)),
        },
    ]
}
