//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ToolError: failures surfaced to the protocol layer (bad arguments,
//!   unknown tool, serialization of the result)
//! - FetchError: registry communication failures; resolvers convert
//!   these into skipped result descriptors rather than aborting

use thiserror::Error;

/// Errors surfaced to the protocol layer as a failed tool call
#[derive(Error, Debug)]
pub enum ToolError {
    /// A required top-level argument is absent
    #[error("missing required parameter: {name}")]
    MissingParameter { name: String },

    /// An argument is present but has the wrong shape or an
    /// out-of-enum value
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// The requested tool is not in the catalogue
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    /// A top-level registry fetch failed with nothing to skip
    #[error("registry fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Rendering the result list as JSON failed
    #[error("failed to serialize result: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from a single registry fetch
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network, TLS, or timeout failure before a response arrived
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The registry answered with a non-2xx status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The response body was not the expected shape
    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The registry answered but had no usable versions
    #[error("{message}")]
    NotFound { message: String },
}

impl ToolError {
    /// Creates a new MissingParameter error
    pub fn missing(name: impl Into<String>) -> Self {
        ToolError::MissingParameter { name: name.into() }
    }

    /// Creates a new InvalidParameter error
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        ToolError::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a new UnknownTool error
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        ToolError::UnknownTool { name: name.into() }
    }
}

impl FetchError {
    /// Creates a new NotFound error
    pub fn not_found(message: impl Into<String>) -> Self {
        FetchError::NotFound {
            message: message.into(),
        }
    }

    /// HTTP status code, when the failure carries one
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
