//! Question submission.

use chromiumoxide::{Element, Page};
use tracing::debug;

use crate::error::{Error, Result};
use crate::locator::{find_visible_submit, SUBMIT_CANDIDATES};

/// Type the question into `input` and submit it once.
///
/// The first visible button candidate is clicked; when none is visible the
/// input gets a single Enter keypress. Never both.
pub async fn submit_question(page: &Page, input: &Element, question: &str) -> Result<()> {
    input.focus().await.map_err(Error::browser)?;
    input.type_str(question).await.map_err(Error::browser)?;

    match find_visible_submit(page, SUBMIT_CANDIDATES).await {
        Some(button) => {
            button.click().await.map_err(Error::browser)?;
            debug!("submitted via button click");
        }
        None => {
            input.press_key("Enter").await.map_err(Error::browser)?;
            debug!("submitted via Enter keypress");
        }
    }
    Ok(())
}
