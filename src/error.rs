//! Error types shared by the query core and the MCP/HTTP front-ends.

use thiserror::Error;

use crate::config::ASK_ALCF_URL;

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the query core and the servers wrapping it.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed input rejected before any browser interaction.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The target site was unreachable or never became ready.
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// No selector candidate became visible within its wait budget.
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// The generation marker never disappeared within the query timeout.
    #[error("response generation timed out after {timeout_ms}ms")]
    ResponseTimeout {
        /// The overall timeout that elapsed, in milliseconds.
        timeout_ms: u64,
    },

    /// Both extraction strategies failed to produce usable text.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// Browser launch or CDP plumbing failure.
    #[error("browser error: {0}")]
    Browser(String),

    /// JSON-RPC protocol error.
    #[error("JSON-RPC error: {code} - {message}")]
    JsonRpc {
        /// JSON-RPC error code.
        code: i32,
        /// Error message.
        message: String,
    },

    /// Tool not found.
    #[error("tool not found: {0}")]
    ToolNotFound(String),

    /// Invalid tool or request parameters.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub(crate) fn browser(err: impl std::fmt::Display) -> Self {
        Error::Browser(err.to_string())
    }

    /// Get the JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            Error::JsonRpc { code, .. } => *code,
            Error::ToolNotFound(_) => codes::METHOD_NOT_FOUND,
            Error::InvalidParams(_) | Error::Validation(_) => codes::INVALID_PARAMS,
            Error::Serialization(_) => codes::PARSE_ERROR,
            Error::Navigation(_)
            | Error::ElementNotFound(_)
            | Error::ResponseTimeout { .. }
            | Error::Extraction(_)
            | Error::Browser(_) => -32000,
            Error::Io(_) => -32002,
            Error::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Human-readable message naming the probable cause, without internals.
    pub fn user_message(&self) -> String {
        match self {
            Error::ResponseTimeout { timeout_ms } => format!(
                "Request timed out after {timeout_ms}ms while querying AskALCF. \
                 The service may be slow or unavailable. \
                 Try increasing the timeout parameter or try again later."
            ),
            Error::Navigation(_) => format!(
                "Could not connect to {ASK_ALCF_URL}. \
                 Please check your internet connection and verify that \
                 ask.alcf.anl.gov is accessible."
            ),
            Error::ElementNotFound(_) | Error::Extraction(_) => {
                "Could not find the expected elements on the page. \
                 The AskALCF website structure may have changed. \
                 Please report this issue to the server maintainer."
                    .to_string()
            }
            Error::Validation(msg) | Error::InvalidParams(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

/// Standard JSON-RPC error codes.
pub mod codes {
    /// Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// The method does not exist or is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
}
