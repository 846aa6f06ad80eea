//! Pulling the answer text out of the rendered page.
//!
//! Two strategies. The structured one walks the page's paragraphs, anchors
//! on the echoed question, and collects until the feedback region. The
//! fallback slices the raw body text. Both are pure functions over captured
//! text so they test without a browser; the page glue lives at the bottom.

use chromiumoxide::Page;
use tracing::debug;

use crate::error::{Error, Result};

/// Paragraphs that are UI chrome, never answer text.
const SKIP_TEXTS: &[&str] = &["AskALCF", "Send", "Generating answer...", "AskALCF Feedback"];

/// A paragraph containing one of these ends the answer region.
const BREAK_MARKERS: &[&str] = &["AskALCF Feedback", "Ask a question about ALCF"];

/// Substrings that truncate the raw-body fallback, earliest match wins.
const FALLBACK_END_MARKERS: &[&str] = &[
    "AskALCF Feedback",
    "Ask a question about ALCF",
    "AskALCF User Documentation",
];

/// Fallback answers at or below this length are noise, not answers.
const MIN_FALLBACK_LEN: usize = 10;

/// Which strategy produced the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Paragraph walk anchored on the echoed question.
    Structured,
    /// Raw body text sliced after the question.
    Fallback,
}

/// An extracted answer and how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// The answer text.
    pub text: String,
    /// The strategy that produced it.
    pub strategy: Strategy,
}

/// Structured strategy over captured paragraph texts.
///
/// Collection starts after the paragraph that exactly equals the trimmed
/// question and stops at the first paragraph containing a break marker.
pub fn structured_answer(paragraphs: &[String], question: &str) -> Option<String> {
    let question = question.trim();
    let mut collected: Vec<&str> = Vec::new();
    let mut after_question = false;

    for paragraph in paragraphs {
        let text = paragraph.trim();
        if text.is_empty() {
            continue;
        }
        if !after_question {
            if text == question {
                after_question = true;
            }
            continue;
        }
        if BREAK_MARKERS.iter().any(|marker| text.contains(marker)) {
            break;
        }
        if SKIP_TEXTS.contains(&text) {
            continue;
        }
        collected.push(text);
    }

    if collected.is_empty() {
        None
    } else {
        Some(collected.join("\n\n"))
    }
}

/// Fallback strategy over the raw body text.
///
/// Takes everything after the first occurrence of the question, truncates at
/// the earliest end marker, and rejects slices too short to be an answer.
pub fn fallback_answer(body: &str, question: &str) -> Option<String> {
    let question = question.trim();
    let start = body.find(question)? + question.len();
    let mut tail = &body[start..];

    if let Some(cut) = FALLBACK_END_MARKERS
        .iter()
        .filter_map(|marker| tail.find(marker))
        .min()
    {
        tail = &tail[..cut];
    }

    let answer = tail.trim();
    if answer.len() > MIN_FALLBACK_LEN {
        Some(answer.to_string())
    } else {
        None
    }
}

/// Run both strategies in order.
pub fn extract_answer(paragraphs: &[String], body: &str, question: &str) -> Result<Extraction> {
    if let Some(text) = structured_answer(paragraphs, question) {
        return Ok(Extraction {
            text,
            strategy: Strategy::Structured,
        });
    }
    if let Some(text) = fallback_answer(body, question) {
        return Ok(Extraction {
            text,
            strategy: Strategy::Fallback,
        });
    }
    Err(Error::Extraction(
        "no answer text found after the question".to_string(),
    ))
}

/// Capture the page's paragraphs and body text, then extract.
pub async fn extract_from_page(page: &Page, question: &str) -> Result<Extraction> {
    let paragraphs: Vec<String> = page
        .evaluate("Array.from(document.querySelectorAll('p')).map(p => p.innerText)")
        .await
        .map_err(Error::browser)?
        .into_value()
        .map_err(Error::browser)?;

    let body: String = page
        .evaluate("document.body ? document.body.innerText : ''")
        .await
        .map_err(Error::browser)?
        .into_value()
        .map_err(Error::browser)?;

    debug!(paragraphs = paragraphs.len(), body_chars = body.len(), "page text captured");
    extract_answer(&paragraphs, &body, question)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn structured_collects_between_question_and_feedback() {
        let paragraphs = page(&[
            "AskALCF",
            "What is Aurora?",
            "Aurora is...",
            "AskALCF Feedback",
            "rate this",
        ]);
        let answer = structured_answer(&paragraphs, "What is Aurora?").unwrap();
        assert_eq!(answer, "Aurora is...");
    }

    #[test]
    fn structured_skips_chrome_and_joins_with_blank_lines() {
        let paragraphs = page(&[
            "AskALCF",
            "What is Polaris?",
            "Generating answer...",
            "Polaris is a testbed.",
            "",
            "It has 560 nodes.",
            "Send",
            "Ask a question about ALCF systems",
        ]);
        let answer = structured_answer(&paragraphs, "What is Polaris?").unwrap();
        assert_eq!(answer, "Polaris is a testbed.\n\nIt has 560 nodes.");
    }

    #[test]
    fn structured_requires_the_exact_question() {
        let paragraphs = page(&["AskALCF", "what is aurora?", "Aurora is..."]);
        assert_eq!(structured_answer(&paragraphs, "What is Aurora?"), None);
    }

    #[test]
    fn structured_is_idempotent_over_its_own_output() {
        let paragraphs = page(&["What is Aurora?", "Aurora is an exascale system."]);
        let first = structured_answer(&paragraphs, "What is Aurora?").unwrap();
        let again = structured_answer(&paragraphs, "What is Aurora?").unwrap();
        assert_eq!(first, again);
    }

    #[test]
    fn fallback_cuts_at_the_earliest_marker() {
        let body = "header What is Aurora? Aurora is an exascale machine. \
                    AskALCF User Documentation more AskALCF Feedback tail";
        let answer = fallback_answer(body, "What is Aurora?").unwrap();
        assert_eq!(answer, "Aurora is an exascale machine.");
    }

    #[test]
    fn fallback_rejects_short_slices_and_missing_questions() {
        assert_eq!(fallback_answer("What is Aurora? ok", "What is Aurora?"), None);
        assert_eq!(fallback_answer("nothing relevant here", "What is Aurora?"), None);
    }

    #[test]
    fn extract_prefers_structured_then_falls_back() {
        let paragraphs = page(&["What is Aurora?", "Aurora is an exascale system."]);
        let body = "What is Aurora? Aurora is an exascale system built at Argonne.";

        let hit = extract_answer(&paragraphs, body, "What is Aurora?").unwrap();
        assert_eq!(hit.strategy, Strategy::Structured);

        let hit = extract_answer(&[], body, "What is Aurora?").unwrap();
        assert_eq!(hit.strategy, Strategy::Fallback);
        assert_eq!(hit.text, "Aurora is an exascale system built at Argonne.");

        let err = extract_answer(&[], "", "What is Aurora?").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}
