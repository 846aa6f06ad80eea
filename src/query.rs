//! Validated queries and the orchestrator composing one end-to-end ask.

use std::time::Duration;

use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::config::{
    QueryConfig, ASK_ALCF_URL, MAX_QUESTION_LEN, MAX_TIMEOUT_MS, MIN_QUESTION_LEN, MIN_TIMEOUT_MS,
};
use crate::error::{Error, Result};
use crate::extract::extract_from_page;
use crate::locator::{locate_input, INPUT_CANDIDATES};
use crate::session::BrowserSession;
use crate::submit::submit_question;
use crate::waiter::{GenerationState, GenerationWaiter, PageMarkerProbe};

/// A validated question plus its overall timeout.
#[derive(Debug, Clone)]
pub struct Query {
    question: String,
    timeout: Duration,
}

impl Query {
    /// Validate `question` and `timeout_ms` against the accepted bounds.
    pub fn new(question: &str, timeout_ms: u64) -> Result<Self> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::Validation("question cannot be empty".to_string()));
        }
        let len = question.chars().count();
        if !(MIN_QUESTION_LEN..=MAX_QUESTION_LEN).contains(&len) {
            return Err(Error::Validation(format!(
                "question must be between {MIN_QUESTION_LEN} and {MAX_QUESTION_LEN} characters, got {len}"
            )));
        }
        if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&timeout_ms) {
            return Err(Error::Validation(format!(
                "timeout must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS} milliseconds, got {timeout_ms}"
            )));
        }
        Ok(Self {
            question: question.to_string(),
            timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// The trimmed question text.
    pub fn question(&self) -> &str {
        &self.question
    }

    /// The overall timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Runs queries end to end: launch, navigate, submit, wait, extract.
#[derive(Debug, Clone, Default)]
pub struct QueryOrchestrator {
    config: QueryConfig,
}

impl QueryOrchestrator {
    /// An orchestrator with default timing.
    pub fn new() -> Self {
        Self::default()
    }

    /// An orchestrator with custom timing.
    pub fn with_config(config: QueryConfig) -> Self {
        Self { config }
    }

    /// Ask one question, returning the extracted answer text.
    ///
    /// The browser is torn down on every exit path; cancellation kills the
    /// child process through the session's drop.
    pub async fn ask(&self, query: &Query) -> Result<String> {
        let query_id = Uuid::new_v4();
        let span = info_span!("ask", %query_id);
        async {
            info!(chars = query.question().chars().count(), "query started");
            let session = BrowserSession::launch(&self.config).await?;
            let outcome = self.run(&session, query).await;
            session.close().await;
            match &outcome {
                Ok(answer) => info!(chars = answer.chars().count(), "query succeeded"),
                Err(err) => info!(error = %err, "query failed"),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(&self, session: &BrowserSession, query: &Query) -> Result<String> {
        session
            .navigate(ASK_ALCF_URL, self.config.navigation_timeout)
            .await?;

        let page = session.page();
        let input = locate_input(
            page,
            INPUT_CANDIDATES,
            self.config.selector_wait,
            self.config.probe_interval,
        )
        .await?;

        submit_question(page, &input, query.question()).await?;

        let waiter = GenerationWaiter::new(&self.config);
        let probe = PageMarkerProbe::new(page);
        if waiter.run(&probe, query.timeout()).await == GenerationState::TimedOut {
            return Err(Error::ResponseTimeout {
                timeout_ms: query.timeout().as_millis() as u64,
            });
        }

        let extraction = extract_from_page(page, query.question()).await?;
        info!(strategy = ?extraction.strategy, "answer extracted");
        Ok(extraction.text)
    }
}
