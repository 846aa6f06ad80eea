//! # askalcf
//!
//! Query the AskALCF assistant (ask.alcf.anl.gov) through browser automation.
//!
//! The assistant is a Streamlit chat app with no public API, so this crate
//! drives a headless Chromium session instead: navigate, type the question,
//! submit, wait out the "Generating answer..." marker, scrape the rendered
//! answer. The core is exposed three ways:
//!
//! - **CLI**: `askalcf ask "What is Aurora?"`
//! - **MCP**: a JSON-RPC 2.0 stdio server (`askalcf mcp`) exposing
//!   `alcf_ask_question` and `alcf_get_system_info` tools
//! - **HTTP** (feature `http`): an axum server (`askalcf serve`) with
//!   `/ask` and `/system-info` endpoints
//!
//! ## Usage with VS Code
//!
//! Add to your `.vscode/mcp.json`:
//!
//! ```json
//! {
//!   "servers": {
//!     "askalcf": {
//!       "command": "askalcf",
//!       "args": ["mcp"],
//!       "env": {}
//!     }
//!   }
//! }
//! ```
//!
//! Every query launches its own browser and tears it down when done; nothing
//! persists between calls.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod extract;
#[cfg(feature = "http")]
pub mod http;
pub mod locator;
pub mod protocol;
pub mod query;
pub mod server;
pub mod session;
pub mod submit;
pub mod tools;
pub mod waiter;

pub use config::QueryConfig;
pub use error::{Error, Result};
pub use protocol::{JsonRpcRequest, JsonRpcResponse, McpMessage};
pub use query::{Query, QueryOrchestrator};
pub use server::McpServer;
pub use tools::{Tool, ToolRegistry};
