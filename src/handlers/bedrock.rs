//! AWS Bedrock model catalogue resolver
//!
//! The catalogue is a static in-process list, the authoritative
//! source for deterministic lookups, and can be swapped out wholesale
//! when constructing the handler, so tests substitute their own
//! catalogue without touching anything upstream.
//!
//! Actions: `list` returns the full catalogue, `search` filters by
//! substring (with an ordered-character fallback ranked behind exact
//! substring matches), `get` finds one model by exact id, and
//! `get_latest_claude_sonnet` picks the newest Claude Sonnet.

use crate::domain::BedrockModel;
use crate::error::ToolError;
use crate::handlers::{parse_optional, ArgsMap};
use crate::server::ToolResponse;
use crate::version;
use regex::Regex;
use std::sync::OnceLock;
use tracing::info;

/// Pattern for a dotted version embedded in a model name
fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+(?:\.\d+){0,2})").unwrap())
}

/// The Bedrock model catalogue
#[derive(Debug, Clone)]
pub struct BedrockCatalog {
    models: Vec<BedrockModel>,
}

impl BedrockCatalog {
    /// Creates a catalogue from an explicit model list (tests)
    pub fn new(models: Vec<BedrockModel>) -> Self {
        Self { models }
    }

    /// All models in the catalogue
    pub fn models(&self) -> &[BedrockModel] {
        &self.models
    }
}

fn model(
    provider: &str,
    model_name: &str,
    model_id: &str,
    regions: &[&str],
    input: &[&str],
    output: &[&str],
    streaming: bool,
) -> BedrockModel {
    BedrockModel {
        provider: provider.to_string(),
        model_name: model_name.to_string(),
        model_id: model_id.to_string(),
        regions_supported: regions.iter().map(|r| r.to_string()).collect(),
        input_modalities: input.iter().map(|m| m.to_string()).collect(),
        output_modalities: output.iter().map(|m| m.to_string()).collect(),
        streaming_supported: streaming,
    }
}

impl Default for BedrockCatalog {
    fn default() -> Self {
        let text = &["text"];
        let multimodal = &["text", "image"];
        let common = &["us-east-1", "us-west-2"];
        let wide = &["us-east-1", "us-west-2", "eu-central-1"];
        Self::new(vec![
            model(
                "anthropic",
                "Claude 3 Opus",
                "anthropic.claude-3-opus-20240229-v1:0",
                wide,
                multimodal,
                text,
                true,
            ),
            model(
                "anthropic",
                "Claude 3 Sonnet",
                "anthropic.claude-3-sonnet-20240229-v1:0",
                wide,
                multimodal,
                text,
                true,
            ),
            model(
                "anthropic",
                "Claude 3.5 Sonnet",
                "anthropic.claude-3-5-sonnet-20240620-v1:0",
                wide,
                multimodal,
                text,
                true,
            ),
            model(
                "anthropic",
                "Claude 3.5 Sonnet v2",
                "anthropic.claude-3-5-sonnet-20241022-v2:0",
                wide,
                multimodal,
                text,
                true,
            ),
            model(
                "anthropic",
                "Claude 3.7 Sonnet",
                "anthropic.claude-3-7-sonnet-20250219-v1:0",
                wide,
                multimodal,
                text,
                true,
            ),
            model(
                "anthropic",
                "Claude 3 Haiku",
                "anthropic.claude-3-haiku-20240307-v1:0",
                wide,
                multimodal,
                text,
                true,
            ),
            model(
                "amazon",
                "Titan Text G1 - Express",
                "amazon.titan-text-express-v1",
                common,
                text,
                text,
                true,
            ),
            model(
                "amazon",
                "Titan Image Generator G1",
                "amazon.titan-image-generator-v1",
                common,
                text,
                &["image"],
                false,
            ),
            model(
                "cohere",
                "Command",
                "cohere.command-text-v14",
                common,
                text,
                text,
                true,
            ),
            model(
                "meta",
                "Llama 3 8B Instruct",
                "meta.llama3-8b-instruct-v1:0",
                common,
                text,
                text,
                true,
            ),
            model(
                "meta",
                "Llama 3 70B Instruct",
                "meta.llama3-70b-instruct-v1:0",
                common,
                text,
                text,
                true,
            ),
            model(
                "mistral",
                "Mistral Large",
                "mistral.mistral-large-2402-v1:0",
                common,
                text,
                text,
                true,
            ),
            model(
                "stability",
                "Stable Diffusion XL 1.0",
                "stability.stable-diffusion-xl-v1",
                common,
                text,
                &["image"],
                false,
            ),
        ])
    }
}

/// True when every character of `needle` appears in `haystack` in order
fn is_ordered_match(haystack: &str, needle: &str) -> bool {
    let mut chars = haystack.chars();
    needle
        .chars()
        .all(|wanted| chars.any(|available| available == wanted))
}

/// Bedrock resolver
pub struct BedrockHandler {
    catalog: BedrockCatalog,
}

impl BedrockHandler {
    /// Creates a resolver over the built-in catalogue
    pub fn new() -> Self {
        Self::with_catalog(BedrockCatalog::default())
    }

    /// Creates a resolver over an explicit catalogue (tests)
    pub fn with_catalog(catalog: BedrockCatalog) -> Self {
        Self { catalog }
    }

    fn sorted_models(&self) -> Vec<BedrockModel> {
        let mut models = self.catalog.models().to_vec();
        models.sort_by(|a, b| {
            a.provider
                .cmp(&b.provider)
                .then_with(|| a.model_name.cmp(&b.model_name))
        });
        models
    }

    /// Match quality for a search query: 0 for a substring hit on
    /// name/id/provider, 1 for an in-order character match on the
    /// name, None for a miss.
    fn match_rank(model: &BedrockModel, query: &str) -> Option<u8> {
        let name = model.model_name.to_lowercase();
        let id = model.model_id.to_lowercase();
        let provider = model.provider.to_lowercase();
        if name.contains(query) || id.contains(query) || provider.contains(query) {
            return Some(0);
        }
        if is_ordered_match(&name, query) {
            return Some(1);
        }
        None
    }

    fn search(
        &self,
        query: Option<&str>,
        provider: Option<&str>,
        region: Option<&str>,
    ) -> Vec<BedrockModel> {
        let query = query.map(str::to_lowercase);
        let provider = provider.map(str::to_lowercase);
        let region = region.map(str::to_lowercase);

        let mut matches: Vec<(u8, BedrockModel)> = self
            .catalog
            .models()
            .iter()
            .filter_map(|model| {
                let rank = match &query {
                    Some(query) => Self::match_rank(model, query)?,
                    None => 0,
                };
                Some((rank, model.clone()))
            })
            .filter(|(_, model)| match &provider {
                Some(provider) => model.provider.to_lowercase().contains(provider),
                None => true,
            })
            .filter(|(_, model)| match &region {
                Some(region) => model
                    .regions_supported
                    .iter()
                    .any(|r| r.to_lowercase().contains(region)),
                None => true,
            })
            .collect();

        matches.sort_by(|(rank_a, a), (rank_b, b)| {
            rank_a
                .cmp(rank_b)
                .then_with(|| a.provider.cmp(&b.provider))
                .then_with(|| a.model_name.cmp(&b.model_name))
        });
        matches.into_iter().map(|(_, model)| model).collect()
    }

    fn get(&self, model_id: &str) -> Option<BedrockModel> {
        self.catalog
            .models()
            .iter()
            .find(|model| model.model_id == model_id)
            .cloned()
    }

    /// The newest Claude Sonnet: highest dotted version detected in
    /// the model name, then names carrying `v2`, then the
    /// lexicographically greatest model id.
    fn latest_claude_sonnet(&self) -> Option<BedrockModel> {
        self.catalog
            .models()
            .iter()
            .filter(|model| {
                let name = model.model_name.to_lowercase();
                model.provider.to_lowercase().contains("anthropic")
                    && name.contains("claude")
                    && name.contains("sonnet")
            })
            .max_by(|a, b| {
                let version_a = detect_version(&a.model_name);
                let version_b = detect_version(&b.model_name);
                version::compare(version_a.as_deref().unwrap_or(""), version_b.as_deref().unwrap_or(""))
                    .then_with(|| {
                        let v2_a = a.model_name.to_lowercase().contains("v2");
                        let v2_b = b.model_name.to_lowercase().contains("v2");
                        v2_a.cmp(&v2_b)
                    })
                    .then_with(|| a.model_id.cmp(&b.model_id))
            })
            .cloned()
    }

    /// Handles `check_bedrock_models`
    pub async fn check_models(&self, args: &ArgsMap) -> Result<ToolResponse, ToolError> {
        let action = parse_optional::<String>(args, "action")?
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| "list".to_string());
        info!(action = %action, "checking Bedrock models");

        match action.as_str() {
            "list" => ToolResponse::json(&self.sorted_models()),
            "search" => {
                let query = parse_optional::<String>(args, "query")?;
                let provider = parse_optional::<String>(args, "provider")?;
                let region = parse_optional::<String>(args, "region")?;
                ToolResponse::json(&self.search(
                    query.as_deref(),
                    provider.as_deref(),
                    region.as_deref(),
                ))
            }
            "get" => {
                let model_id = parse_optional::<String>(args, "modelId")?
                    .filter(|id| !id.is_empty())
                    .ok_or_else(|| ToolError::missing("modelId"))?;
                let model = self.get(&model_id).ok_or_else(|| {
                    ToolError::invalid("modelId", format!("model not found: {}", model_id))
                })?;
                ToolResponse::json(&model)
            }
            "get_latest_claude_sonnet" => {
                let model = self.latest_claude_sonnet().ok_or_else(|| {
                    ToolError::invalid("action", "Claude Sonnet model not found")
                })?;
                ToolResponse::json(&model)
            }
            other => Err(ToolError::invalid(
                "action",
                format!("invalid action: {}", other),
            )),
        }
    }

    /// Handles `get_latest_bedrock_model`
    pub async fn get_latest_model(&self, _args: &ArgsMap) -> Result<ToolResponse, ToolError> {
        info!("getting latest Claude Sonnet Bedrock model");
        let model = self
            .latest_claude_sonnet()
            .ok_or_else(|| ToolError::invalid("action", "Claude Sonnet model not found"))?;
        ToolResponse::json(&model)
    }
}

impl Default for BedrockHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Extracts a dotted version embedded in a model name
fn detect_version(model_name: &str) -> Option<String> {
    version_pattern()
        .find(model_name)
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handler() -> BedrockHandler {
        BedrockHandler::new()
    }

    #[test]
    fn test_detect_version() {
        assert_eq!(detect_version("Claude 3.5 Sonnet"), Some("3.5".to_string()));
        assert_eq!(detect_version("Claude 3 Opus"), Some("3".to_string()));
        assert_eq!(detect_version("Command"), None);
    }

    #[test]
    fn test_is_ordered_match() {
        assert!(is_ordered_match("claude 3.5 sonnet", "cld"));
        assert!(is_ordered_match("claude", "claude"));
        assert!(!is_ordered_match("claude", "dlc"));
    }

    #[test]
    fn test_list_sorted_by_provider_then_name() {
        let models = handler().sorted_models();
        let providers: Vec<&str> = models.iter().map(|m| m.provider.as_str()).collect();
        let mut sorted = providers.clone();
        sorted.sort();
        assert_eq!(providers, sorted);
    }

    #[test]
    fn test_search_substring_beats_ordered_match() {
        let results = handler().search(Some("sonnet"), None, None);
        assert!(!results.is_empty());
        assert!(results
            .iter()
            .all(|m| m.model_name.to_lowercase().contains("sonnet")));
    }

    #[test]
    fn test_search_provider_and_region_filters() {
        let results = handler().search(None, Some("meta"), Some("us-east-1"));
        assert!(!results.is_empty());
        assert!(results.iter().all(|m| m.provider == "meta"));

        let none = handler().search(None, Some("meta"), Some("ap-southeast-4"));
        assert!(none.is_empty());
    }

    #[test]
    fn test_get_exact_model_id() {
        let model = handler()
            .get("anthropic.claude-3-haiku-20240307-v1:0")
            .unwrap();
        assert_eq!(model.model_name, "Claude 3 Haiku");
        assert!(handler().get("anthropic.claude-nonexistent").is_none());
    }

    #[test]
    fn test_latest_claude_sonnet_picks_highest_version() {
        let model = handler().latest_claude_sonnet().unwrap();
        assert_eq!(model.model_name, "Claude 3.7 Sonnet");
    }

    #[test]
    fn test_latest_claude_sonnet_v2_tiebreak() {
        let catalog = BedrockCatalog::new(vec![
            model(
                "anthropic",
                "Claude 3.5 Sonnet",
                "anthropic.claude-3-5-sonnet-20240620-v1:0",
                &["us-east-1"],
                &["text"],
                &["text"],
                true,
            ),
            model(
                "anthropic",
                "Claude 3.5 Sonnet v2",
                "anthropic.claude-3-5-sonnet-20241022-v2:0",
                &["us-east-1"],
                &["text"],
                &["text"],
                true,
            ),
        ]);
        let handler = BedrockHandler::with_catalog(catalog);
        let latest = handler.latest_claude_sonnet().unwrap();
        assert_eq!(latest.model_name, "Claude 3.5 Sonnet v2");
    }

    #[tokio::test]
    async fn test_invalid_action_rejected() {
        let args = json!({"action": "purge"});
        let err = handler()
            .check_models(args.as_object().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameter { name, .. } if name == "action"));
    }

    #[tokio::test]
    async fn test_get_requires_model_id() {
        let args = json!({"action": "get"});
        let err = handler()
            .check_models(args.as_object().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingParameter { name } if name == "modelId"));
    }
}
