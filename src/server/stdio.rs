//! Line-delimited stdio serving loop
//!
//! The protocol framing proper is the transport layer's business; this
//! loop is the minimal boundary the core consumes. Each stdin line is
//! one decoded tool call `{"tool_name": ..., "arguments": {...}}`; each
//! stdout line is one reply: a single text content item carrying the
//! JSON payload, or an error object. Nothing else may write to stdout,
//! so logs stay in the rotated file.

use super::ToolRegistry;
use crate::handlers::ArgsMap;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error};

/// One decoded tool call from the protocol layer
#[derive(Debug, Deserialize)]
struct ToolCallRequest {
    tool_name: String,
    #[serde(default)]
    arguments: ArgsMap,
}

/// A text content item in a tool reply
#[derive(Debug, Serialize)]
struct TextContent {
    #[serde(rename = "type")]
    kind: &'static str,
    text: String,
}

/// One reply line
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ToolCallReply {
    Result { content: Vec<TextContent> },
    Error { error: String },
}

impl ToolCallReply {
    fn text(payload: String) -> Self {
        ToolCallReply::Result {
            content: vec![TextContent {
                kind: "text",
                text: payload,
            }],
        }
    }

    fn error(message: String) -> Self {
        ToolCallReply::Error { error: message }
    }
}

/// Serves tool calls over stdin/stdout until EOF
pub async fn serve_stdio(registry: &ToolRegistry) -> std::io::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = match serde_json::from_str::<ToolCallRequest>(line) {
            Ok(request) => {
                debug!(tool = %request.tool_name, "received tool call");
                match registry.dispatch(&request.tool_name, &request.arguments).await {
                    Ok(response) => ToolCallReply::text(response.text().to_string()),
                    Err(e) => {
                        error!(tool = %request.tool_name, error = %e, "tool call failed");
                        ToolCallReply::error(e.to_string())
                    }
                }
            }
            Err(e) => {
                error!(error = %e, "malformed tool call line");
                ToolCallReply::error(format!("malformed tool call: {}", e))
            }
        };

        let mut serialized = serde_json::to_string(&reply)
            .unwrap_or_else(|e| format!(r#"{{"error":"failed to serialize reply: {}"}}"#, e));
        serialized.push('\n');
        stdout.write_all(serialized.as_bytes()).await?;
        stdout.flush().await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_result_shape() {
        let reply = ToolCallReply::text("[]".to_string());
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["content"][0]["type"], "text");
        assert_eq!(json["content"][0]["text"], "[]");
    }

    #[test]
    fn test_reply_error_shape() {
        let reply = ToolCallReply::error("unknown tool: x".to_string());
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["error"], "unknown tool: x");
    }

    #[test]
    fn test_request_tolerates_missing_arguments() {
        let request: ToolCallRequest =
            serde_json::from_str(r#"{"tool_name": "get_latest_bedrock_model"}"#).unwrap();
        assert_eq!(request.tool_name, "get_latest_bedrock_model");
        assert!(request.arguments.is_empty());
    }
}
