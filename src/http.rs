//! Optional HTTP front-end over the query core.
//!
//! A small axum router mirroring the MCP tool surface: `/ask` for free-form
//! questions, `/system-info` for the templated system overview.

use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{DEFAULT_TIMEOUT_MS, QueryConfig};
use crate::error::Error;
use crate::query::{Query, QueryOrchestrator};
use crate::server::{SERVER_NAME, SERVER_VERSION};
use crate::tools::system_info_question;

/// Body for `POST /ask`.
#[derive(Debug, Deserialize)]
pub struct AskQuestionRequest {
    /// Question to ask.
    pub question: String,
    /// Overall timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Body for `POST /system-info`.
#[derive(Debug, Deserialize)]
pub struct SystemInfoRequest {
    /// System to describe.
    pub system_name: String,
    /// Overall timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Successful answer envelope.
#[derive(Debug, Serialize)]
pub struct AlcfResponse {
    /// The question as submitted.
    pub question: String,
    /// The extracted answer.
    pub answer: String,
    /// Where the answer came from.
    pub source: String,
    /// Whether the answer was cut at the character limit.
    pub truncated: bool,
}

/// Error envelope.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable guidance.
    pub error: String,
}

/// HTTP status for each failure class.
fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Validation(_) | Error::InvalidParams(_) => StatusCode::BAD_REQUEST,
        Error::ResponseTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        Error::Navigation(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &Error) -> Response {
    (
        status_for(err),
        Json(ErrorResponse {
            error: err.user_message(),
        }),
    )
        .into_response()
}

async fn run_query(orchestrator: &QueryOrchestrator, question: &str, timeout: u64) -> Response {
    let query = match Query::new(question, timeout) {
        Ok(query) => query,
        Err(err) => return error_response(&err),
    };
    match orchestrator.ask(&query).await {
        Ok(answer) => {
            let (answer, truncated) = crate::tools::truncate_answer(answer);
            Json(AlcfResponse {
                question: query.question().to_string(),
                answer,
                source: "ask.alcf.anl.gov".to_string(),
                truncated,
            })
            .into_response()
        }
        Err(err) => error_response(&err),
    }
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "name": SERVER_NAME,
        "version": SERVER_VERSION,
        "endpoints": ["/health", "/ask", "/system-info"],
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn ask(
    State(orchestrator): State<Arc<QueryOrchestrator>>,
    Json(request): Json<AskQuestionRequest>,
) -> Response {
    run_query(&orchestrator, &request.question, request.timeout).await
}

async fn system_info(
    State(orchestrator): State<Arc<QueryOrchestrator>>,
    Json(request): Json<SystemInfoRequest>,
) -> Response {
    let question = system_info_question(&request.system_name);
    run_query(&orchestrator, &question, request.timeout).await
}

/// Build the router.
pub fn router(config: QueryConfig) -> Router {
    let orchestrator = Arc::new(QueryOrchestrator::with_config(config));
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route("/system-info", post(system_info))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(orchestrator)
}

/// Bind and serve until the process is stopped.
pub async fn serve(host: &str, port: u16, config: QueryConfig) -> anyhow::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "HTTP server listening");
    axum::serve(listener, router(config))
        .await
        .context("HTTP server failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_endpoint_responds_ok() {
        let app = router(QueryConfig::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn root_lists_the_endpoints() {
        let app = router(QueryConfig::default());
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn failure_classes_map_to_distinct_statuses() {
        assert_eq!(
            status_for(&Error::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&Error::ResponseTimeout { timeout_ms: 1 }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_for(&Error::Navigation("down".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&Error::Extraction("none".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
