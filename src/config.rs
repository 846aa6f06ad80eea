//! Service constants and per-query timing configuration.

use std::time::Duration;

/// The AskALCF chat assistant.
pub const ASK_ALCF_URL: &str = "https://ask.alcf.anl.gov";

/// Ceiling applied to answers before they leave a server front-end.
pub const CHARACTER_LIMIT: usize = 25_000;

/// Default overall query timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
/// Lowest accepted query timeout in milliseconds.
pub const MIN_TIMEOUT_MS: u64 = 10_000;
/// Highest accepted query timeout in milliseconds.
pub const MAX_TIMEOUT_MS: u64 = 180_000;

/// Shortest accepted question, in characters after trimming.
pub const MIN_QUESTION_LEN: usize = 5;
/// Longest accepted question, in characters after trimming.
pub const MAX_QUESTION_LEN: usize = 1000;

/// Timing knobs for one browser query.
///
/// Defaults match the live site's observed behaviour; tests shrink them.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Launch the browser without a visible window.
    pub headless: bool,
    /// Budget for the initial page load to settle.
    pub navigation_timeout: Duration,
    /// Budget for a chat-input candidate to become visible.
    pub selector_wait: Duration,
    /// Pause between selector visibility probes.
    pub probe_interval: Duration,
    /// Budget for the generation marker to appear after submission.
    pub marker_wait: Duration,
    /// Pause between generation-marker polls.
    pub poll_interval: Duration,
    /// Grace period after the marker disappears, before extraction.
    pub settle_delay: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            headless: true,
            navigation_timeout: Duration::from_secs(30),
            selector_wait: Duration::from_secs(10),
            probe_interval: Duration::from_millis(250),
            marker_wait: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
            settle_delay: Duration::from_secs(2),
        }
    }
}
