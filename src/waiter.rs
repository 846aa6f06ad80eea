//! Waiting out answer generation.
//!
//! The site shows a transient "Generating answer..." marker while the model
//! streams. The waiter watches the marker through a probe trait so the timing
//! logic is testable against a scripted page.

use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::Page;
use tracing::{debug, warn};

use crate::config::QueryConfig;
use crate::error::{Error, Result};

/// Progress of one answer generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    /// The marker has not appeared yet.
    NotStarted,
    /// The marker is visible.
    InProgress,
    /// The marker disappeared and the settle delay has elapsed.
    Complete,
    /// The marker was still visible when the query timeout ran out.
    TimedOut,
}

/// Checks whether the generation marker is currently visible.
#[async_trait]
pub trait MarkerProbe {
    /// One visibility check.
    async fn marker_visible(&self) -> Result<bool>;
}

/// Two-phase wait over a [`MarkerProbe`].
pub struct GenerationWaiter {
    marker_wait: Duration,
    poll_interval: Duration,
    settle_delay: Duration,
}

impl GenerationWaiter {
    /// Build a waiter from the query's timing knobs.
    pub fn new(config: &QueryConfig) -> Self {
        Self {
            marker_wait: config.marker_wait,
            poll_interval: config.poll_interval,
            settle_delay: config.settle_delay,
        }
    }

    /// Wait for generation to finish, bounded by `overall_timeout`.
    ///
    /// Phase one waits up to the marker budget for the marker to appear;
    /// missing it is only a warning since fast answers can finish before the
    /// first poll. Phase two polls until the marker is gone or the overall
    /// timeout elapses. Probe errors while polling read as "marker gone".
    pub async fn run<P: MarkerProbe + Sync>(
        &self,
        probe: &P,
        overall_timeout: Duration,
    ) -> GenerationState {
        let appeared = tokio::time::timeout(self.marker_wait, async {
            loop {
                if probe.marker_visible().await.unwrap_or(false) {
                    return;
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        })
        .await
        .is_ok();

        if appeared {
            debug!("generation marker visible");
        } else {
            warn!(
                wait_ms = self.marker_wait.as_millis() as u64,
                "generation marker never appeared, assuming generation started"
            );
        }

        let started = tokio::time::Instant::now();
        loop {
            match probe.marker_visible().await {
                Ok(true) => {}
                Ok(false) | Err(_) => {
                    debug!("generation marker gone");
                    tokio::time::sleep(self.settle_delay).await;
                    return GenerationState::Complete;
                }
            }
            if started.elapsed() >= overall_timeout {
                return GenerationState::TimedOut;
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// JS expression: is a leaf element showing the generation marker visible?
const MARKER_VISIBLE_JS: &str = r#"(() => {
    const nodes = document.querySelectorAll('p, span, div');
    for (const el of nodes) {
        if (el.children.length > 0) continue;
        const text = (el.innerText || '').trim().toLowerCase();
        if (text !== 'generating answer...') continue;
        const style = window.getComputedStyle(el);
        if (style.display === 'none' || style.visibility === 'hidden') continue;
        const rect = el.getBoundingClientRect();
        if (rect.width > 0 && rect.height > 0) return true;
    }
    return false;
})()"#;

/// Probe backed by a live page.
pub struct PageMarkerProbe<'p> {
    page: &'p Page,
}

impl<'p> PageMarkerProbe<'p> {
    /// Probe `page` for the generation marker.
    pub fn new(page: &'p Page) -> Self {
        Self { page }
    }
}

#[async_trait]
impl MarkerProbe for PageMarkerProbe<'_> {
    async fn marker_visible(&self) -> Result<bool> {
        self.page
            .evaluate(MARKER_VISIBLE_JS)
            .await
            .map_err(Error::browser)?
            .into_value()
            .map_err(Error::browser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct ScriptedProbe {
        // Popped front-to-back; the last value repeats once exhausted.
        script: Mutex<Vec<bool>>,
        fail_when_empty: bool,
    }

    impl ScriptedProbe {
        fn new(script: Vec<bool>) -> Self {
            Self {
                script: Mutex::new(script),
                fail_when_empty: false,
            }
        }
    }

    #[async_trait]
    impl MarkerProbe for ScriptedProbe {
        async fn marker_visible(&self) -> Result<bool> {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                return Ok(script.remove(0));
            }
            match script.first() {
                Some(&last) if !self.fail_when_empty => Ok(last),
                _ => Err(Error::Browser("probe failed".to_string())),
            }
        }
    }

    fn fast_config() -> QueryConfig {
        QueryConfig {
            marker_wait: Duration::from_secs(10),
            poll_interval: Duration::from_millis(500),
            settle_delay: Duration::from_secs(2),
            ..QueryConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn marker_appears_then_disappears() {
        let waiter = GenerationWaiter::new(&fast_config());
        let probe = ScriptedProbe::new(vec![false, true, true, false]);
        let state = waiter.run(&probe, Duration::from_secs(60)).await;
        assert_eq!(state, GenerationState::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn marker_never_appears_is_downgraded_to_warning() {
        let waiter = GenerationWaiter::new(&fast_config());
        let probe = ScriptedProbe::new(vec![false]);
        let start = tokio::time::Instant::now();
        let state = waiter.run(&probe, Duration::from_secs(60)).await;
        assert_eq!(state, GenerationState::Complete);
        // Full appear-wait budget spent, then settle delay.
        assert!(start.elapsed() >= Duration::from_secs(12));
    }

    #[tokio::test(start_paused = true)]
    async fn marker_stuck_times_out() {
        let waiter = GenerationWaiter::new(&fast_config());
        let probe = ScriptedProbe::new(vec![true]);
        let start = tokio::time::Instant::now();
        let state = waiter.run(&probe, Duration::from_millis(10_000)).await;
        assert_eq!(state, GenerationState::TimedOut);
        assert!(start.elapsed() >= Duration::from_millis(9_500));
    }

    #[tokio::test(start_paused = true)]
    async fn probe_error_while_polling_reads_as_complete() {
        let waiter = GenerationWaiter::new(&fast_config());
        let probe = ScriptedProbe {
            script: Mutex::new(vec![true, true]),
            fail_when_empty: true,
        };
        let state = waiter.run(&probe, Duration::from_secs(60)).await;
        assert_eq!(state, GenerationState::Complete);
    }
}
