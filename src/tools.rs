//! Tool definitions and registry for the MCP server.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::config::{CHARACTER_LIMIT, DEFAULT_TIMEOUT_MS, MAX_TIMEOUT_MS, MIN_TIMEOUT_MS};
use crate::error::{Error, Result};
use crate::protocol::{ContentItem, ToolCallResult, ToolDefinition};
use crate::query::{Query, QueryOrchestrator};
use crate::QueryConfig;

/// Tool trait for implementing MCP tools.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolCallResult>;
}

/// Context passed to tools during execution.
pub struct ToolContext {
    /// Orchestrator shared by every tool call. Each call launches and tears
    /// down its own browser; nothing persists between calls.
    pub orchestrator: QueryOrchestrator,
}

impl ToolContext {
    /// Create a new tool context.
    pub fn new(config: QueryConfig) -> Self {
        Self {
            orchestrator: QueryOrchestrator::with_config(config),
        }
    }
}

/// Registry of available tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    context: Arc<ToolContext>,
}

impl ToolRegistry {
    /// Create a new tool registry with the built-in tools.
    pub fn new(config: QueryConfig) -> Self {
        let context = Arc::new(ToolContext::new(config));
        let mut tools: HashMap<String, Arc<dyn Tool>> = HashMap::new();

        let ask_tool = Arc::new(AskQuestionTool);
        tools.insert(ask_tool.definition().name.clone(), ask_tool);

        let system_info_tool = Arc::new(SystemInfoTool);
        tools.insert(system_info_tool.definition().name.clone(), system_info_tool);

        Self { tools, context }
    }

    /// Get tool definitions.
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.definition()).collect()
    }

    /// Execute a tool by name.
    pub async fn execute(&self, name: &str, arguments: serde_json::Value) -> Result<ToolCallResult> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;

        tool.execute(arguments, &self.context).await
    }

    /// Register a custom tool.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.definition().name.clone();
        self.tools.insert(name, tool);
    }
}

/// Response rendering requested by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// A readable markdown document.
    #[default]
    Markdown,
    /// A JSON envelope for machine consumers.
    Json,
}

/// Cap `answer` at the character limit, flagging whether it was cut.
pub(crate) fn truncate_answer(answer: String) -> (String, bool) {
    if answer.chars().count() <= CHARACTER_LIMIT {
        return (answer, false);
    }
    let mut truncated: String = answer.chars().take(CHARACTER_LIMIT).collect();
    truncated.push_str(&format!(
        "\n\n[Response truncated at {CHARACTER_LIMIT} characters. The full response was longer.]"
    ));
    (truncated, true)
}

fn markdown_envelope(question: &str, answer: &str) -> String {
    format!(
        "# ALCF Query Response\n\n**Question:** {question}\n\n**Answer:**\n\n{answer}\n\n\
         *Source: ask.alcf.anl.gov*"
    )
}

fn json_envelope(question: &str, answer: &str, truncated: bool) -> serde_json::Value {
    json!({
        "question": question,
        "answer": answer,
        "source": "ask.alcf.anl.gov",
        "truncated": truncated,
    })
}

/// Render one answer for the client, truncating first.
fn render_answer(question: &str, answer: String, format: ResponseFormat) -> Result<ToolCallResult> {
    let (answer, truncated) = truncate_answer(answer);
    let text = match format {
        ResponseFormat::Markdown => markdown_envelope(question, &answer),
        ResponseFormat::Json => serde_json::to_string_pretty(&json_envelope(
            question, &answer, truncated,
        ))?,
    };
    Ok(ToolCallResult {
        content: vec![ContentItem::text(text)],
        is_error: false,
    })
}

/// Render a query failure as tool output rather than a protocol error.
fn render_error(question: &str, err: &Error, format: ResponseFormat) -> Result<ToolCallResult> {
    let message = err.user_message();
    let text = match format {
        ResponseFormat::Markdown => format!(
            "# ALCF Query Failed\n\n**Question:** {question}\n\n**Error:** {message}"
        ),
        ResponseFormat::Json => serde_json::to_string_pretty(&json!({
            "question": question,
            "error": message,
            "source": "ask.alcf.anl.gov",
        }))?,
    };
    Ok(ToolCallResult {
        content: vec![ContentItem::text(text)],
        is_error: true,
    })
}

// ============================================================================
// Built-in Tools
// ============================================================================

/// Tool that asks the AskALCF assistant a free-form question.
pub struct AskQuestionTool;

#[derive(Debug, Deserialize)]
struct AskQuestionArgs {
    /// Question to ask.
    question: String,
    /// Overall timeout in milliseconds.
    #[serde(default = "default_timeout")]
    timeout: u64,
    /// How to render the answer.
    #[serde(default)]
    response_format: ResponseFormat,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[async_trait::async_trait]
impl Tool for AskQuestionTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "alcf_ask_question".into(),
            description: "Ask a question about ALCF (Argonne Leadership Computing Facility) \
                          systems, documentation, or policies. Queries the AskALCF assistant \
                          at ask.alcf.anl.gov and returns its answer."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "The question to ask (5-1000 characters)"
                    },
                    "timeout": {
                        "type": "integer",
                        "description": "Overall timeout in milliseconds",
                        "default": DEFAULT_TIMEOUT_MS,
                        "minimum": MIN_TIMEOUT_MS,
                        "maximum": MAX_TIMEOUT_MS
                    },
                    "response_format": {
                        "type": "string",
                        "enum": ["markdown", "json"],
                        "description": "Answer rendering",
                        "default": "markdown"
                    }
                },
                "required": ["question"]
            }),
        }
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolCallResult> {
        let args: AskQuestionArgs =
            serde_json::from_value(arguments).map_err(|e| Error::InvalidParams(e.to_string()))?;

        let query = match Query::new(&args.question, args.timeout) {
            Ok(query) => query,
            Err(err) => return render_error(&args.question, &err, args.response_format),
        };

        match context.orchestrator.ask(&query).await {
            Ok(answer) => render_answer(query.question(), answer, args.response_format),
            Err(err) => render_error(query.question(), &err, args.response_format),
        }
    }
}

/// Tool that asks a templated question about one ALCF system.
pub struct SystemInfoTool;

#[derive(Debug, Deserialize)]
struct SystemInfoArgs {
    /// System to describe, e.g. "Aurora" or "Polaris".
    system_name: String,
    /// Overall timeout in milliseconds.
    #[serde(default = "default_timeout")]
    timeout: u64,
    /// How to render the answer.
    #[serde(default)]
    response_format: ResponseFormat,
}

#[async_trait::async_trait]
impl Tool for SystemInfoTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "alcf_get_system_info".into(),
            description: "Get an overview of one ALCF system (Aurora, Polaris, ...): its key \
                          specifications, architecture, and capabilities."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "system_name": {
                        "type": "string",
                        "description": "Name of the ALCF system, e.g. \"Aurora\""
                    },
                    "timeout": {
                        "type": "integer",
                        "description": "Overall timeout in milliseconds",
                        "default": DEFAULT_TIMEOUT_MS,
                        "minimum": MIN_TIMEOUT_MS,
                        "maximum": MAX_TIMEOUT_MS
                    },
                    "response_format": {
                        "type": "string",
                        "enum": ["markdown", "json"],
                        "description": "Answer rendering",
                        "default": "markdown"
                    }
                },
                "required": ["system_name"]
            }),
        }
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolCallResult> {
        let args: SystemInfoArgs =
            serde_json::from_value(arguments).map_err(|e| Error::InvalidParams(e.to_string()))?;

        let question = system_info_question(&args.system_name);
        let query = match Query::new(&question, args.timeout) {
            Ok(query) => query,
            Err(err) => return render_error(&question, &err, args.response_format),
        };

        match context.orchestrator.ask(&query).await {
            Ok(answer) => render_answer(query.question(), answer, args.response_format),
            Err(err) => render_error(query.question(), &err, args.response_format),
        }
    }
}

/// The templated question sent for a system-info request.
pub fn system_info_question(system_name: &str) -> String {
    format!(
        "What is {} and what are its key specifications, architecture, and capabilities?",
        system_name.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_answers_pass_through_untruncated() {
        let (answer, truncated) = truncate_answer("Aurora is an exascale system.".to_string());
        assert!(!truncated);
        assert_eq!(answer, "Aurora is an exascale system.");
    }

    #[test]
    fn long_answers_are_cut_with_a_marker() {
        let long = "x".repeat(CHARACTER_LIMIT + 100);
        let (answer, truncated) = truncate_answer(long);
        assert!(truncated);
        assert!(answer.contains("[Response truncated at 25000 characters"));
        assert!(answer.chars().count() < CHARACTER_LIMIT + 120);
    }

    #[test]
    fn markdown_is_the_default_format() {
        let args: AskQuestionArgs =
            serde_json::from_value(json!({ "question": "What is Aurora?" })).unwrap();
        assert_eq!(args.response_format, ResponseFormat::Markdown);
        assert_eq!(args.timeout, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn json_envelope_carries_the_truncation_flag() {
        let envelope = json_envelope("q", "a", true);
        assert_eq!(envelope["question"], "q");
        assert_eq!(envelope["answer"], "a");
        assert_eq!(envelope["source"], "ask.alcf.anl.gov");
        assert_eq!(envelope["truncated"], true);
    }

    #[test]
    fn system_info_question_embeds_the_system_name() {
        let question = system_info_question(" Aurora ");
        assert!(question.starts_with("What is Aurora and"));
        assert!(question.contains("specifications, architecture, and capabilities"));
    }

    #[test]
    fn validation_failures_render_as_tool_errors() {
        let err = Error::Validation("question must be longer".to_string());
        let result = render_error("hi", &err, ResponseFormat::Markdown).unwrap();
        assert!(result.is_error);
        let ContentItem::Text { text } = &result.content[0];
        assert!(text.contains("question must be longer"));
    }
}
