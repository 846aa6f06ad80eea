//! Finding the chat input and submit button.
//!
//! Candidate selectors are data, not code: the site is a Streamlit app whose
//! markup drifts between releases, so the lists below are ordered from most
//! to least specific and the first visible match wins.

use std::time::Duration;

use chromiumoxide::{Element, Page};
use tracing::trace;

use crate::error::{Error, Result};

/// One way of locating an element on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorRule {
    /// A CSS selector, matched visible-only.
    Css(&'static str),
    /// A visible `<button>` whose trimmed text equals the label.
    ButtonLabel(&'static str),
}

/// Chat-input candidates, most specific first.
pub const INPUT_CANDIDATES: &[SelectorRule] = &[
    SelectorRule::Css(r#"input[placeholder*="Ask" i]"#),
    SelectorRule::Css(r#"textarea[placeholder*="Ask" i]"#),
    SelectorRule::Css(r#"input[data-testid*="chatInput"]"#),
    SelectorRule::Css(r#"textarea[data-testid*="chatInput"]"#),
    SelectorRule::Css(r#"textarea[data-testid="stChatInputTextArea"]"#),
    SelectorRule::Css(r#"textarea[placeholder*="chat" i]"#),
    SelectorRule::Css("textarea"),
];

/// Submit-button candidates, most specific first.
pub const SUBMIT_CANDIDATES: &[SelectorRule] = &[
    SelectorRule::Css(r#"button[kind="primary"]"#),
    SelectorRule::Css(r#"button[type="submit"]"#),
    SelectorRule::ButtonLabel("Submit"),
    SelectorRule::ButtonLabel("Send"),
];

/// JS expression: is the first match for `selector` visible?
fn css_visible_expr(selector: &str) -> String {
    let quoted = serde_json::to_string(selector).unwrap_or_default();
    format!(
        r#"(() => {{
            const el = document.querySelector({quoted});
            if (!el) return false;
            const style = window.getComputedStyle(el);
            if (style.display === 'none' || style.visibility === 'hidden') return false;
            const rect = el.getBoundingClientRect();
            return rect.width > 0 && rect.height > 0;
        }})()"#
    )
}

/// JS expression: index of the first visible button whose trimmed text
/// equals `label`, or -1.
fn button_index_expr(label: &str) -> String {
    let quoted = serde_json::to_string(label).unwrap_or_default();
    format!(
        r#"(() => {{
            const buttons = Array.from(document.querySelectorAll('button'));
            for (let i = 0; i < buttons.length; i++) {{
                const b = buttons[i];
                if ((b.innerText || '').trim() !== {quoted}) continue;
                const style = window.getComputedStyle(b);
                if (style.display === 'none' || style.visibility === 'hidden') continue;
                const rect = b.getBoundingClientRect();
                if (rect.width > 0 && rect.height > 0) return i;
            }}
            return -1;
        }})()"#
    )
}

/// Try one rule once. Every probe failure reads as "not found".
async fn probe(page: &Page, rule: &SelectorRule) -> Option<Element> {
    match rule {
        SelectorRule::Css(selector) => {
            let visible: bool = page
                .evaluate(css_visible_expr(selector))
                .await
                .ok()?
                .into_value()
                .ok()?;
            if !visible {
                return None;
            }
            page.find_element(*selector).await.ok()
        }
        SelectorRule::ButtonLabel(label) => {
            let index: i64 = page
                .evaluate(button_index_expr(label))
                .await
                .ok()?
                .into_value()
                .ok()?;
            if index < 0 {
                return None;
            }
            let buttons = page.find_elements("button").await.ok()?;
            buttons.into_iter().nth(index as usize)
        }
    }
}

/// Poll `candidates` in order until one is visible or `wait` elapses.
pub async fn locate_input(
    page: &Page,
    candidates: &[SelectorRule],
    wait: Duration,
    poll: Duration,
) -> Result<Element> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        for rule in candidates {
            if let Some(element) = probe(page, rule).await {
                trace!(?rule, "input candidate visible");
                return Ok(element);
            }
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(Error::ElementNotFound(
                "no chat input candidate became visible".to_string(),
            ));
        }
        tokio::time::sleep(poll).await;
    }
}

/// First visible submit candidate, if any. A single pass, no waiting.
pub async fn find_visible_submit(page: &Page, candidates: &[SelectorRule]) -> Option<Element> {
    for rule in candidates {
        if let Some(element) = probe(page, rule).await {
            trace!(?rule, "submit candidate visible");
            return Some(element);
        }
    }
    None
}
