//! AWS Bedrock model catalogue entry

use serde::{Deserialize, Serialize};

/// One model in the Bedrock catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockModel {
    pub provider: String,
    pub model_name: String,
    pub model_id: String,
    pub regions_supported: Vec<String>,
    pub input_modalities: Vec<String>,
    pub output_modalities: Vec<String>,
    pub streaming_supported: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_field_names() {
        let model = BedrockModel {
            provider: "anthropic".into(),
            model_name: "Claude 3.5 Sonnet".into(),
            model_id: "anthropic.claude-3-5-sonnet-20241022-v2:0".into(),
            regions_supported: vec!["us-east-1".into()],
            input_modalities: vec!["text".into(), "image".into()],
            output_modalities: vec!["text".into()],
            streaming_supported: true,
        };
        let json = serde_json::to_value(&model).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("modelName"));
        assert!(obj.contains_key("modelId"));
        assert!(obj.contains_key("regionsSupported"));
        assert!(obj.contains_key("streamingSupported"));
    }
}
