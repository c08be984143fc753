//! Response extraction: generated text out of the JSON, fence off the text.
//!
//! The fence search is a plain pattern match, not a Markdown parser: the first
//! ```` ```xml\n … \n``` ```` block wins (non-greedy, `.` matches
//! newlines). When no such block exists the text is returned untouched, so a
//! model that ignores the "in a code block" instruction still produces output.

use crate::error::MarkupError;
use crate::pipeline::llm::ChatResponse;
use once_cell::sync::Lazy;
use regex::Regex;

/// The first choice's message content.
///
/// # Errors
/// [`MarkupError::MissingContent`] when there are no choices or the content
/// is `null`.
pub fn extract_content(response: &ChatResponse) -> Result<&str, MarkupError> {
    response
        .choices
        .first()
        .and_then(|c| c.message.content.as_deref())
        .ok_or(MarkupError::MissingContent)
}

static RE_XML_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```xml\n(.*?)\n```").unwrap());

/// Unwrap a ```` ```xml ```` block, or return `text` unchanged.
pub fn extract_xml_block(text: &str) -> String {
    match RE_XML_FENCE.captures(text) {
        Some(caps) => caps[1].to_string(),
        None => text.to_string(),
    }
}
