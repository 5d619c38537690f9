//! # Embedded JSON Extraction
//!
//! The planner models answer in free text that is expected to contain one
//! JSON object. The span from the first `{` to the last `}` is taken as that
//! object; nothing smarter is attempted, so any change here changes how often
//! the deterministic fallbacks run.

use serde::de::DeserializeOwned;
use tracing::{debug, error};

/// Returns the span between the first `{` and the last `}`, inclusive.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parses the object embedded in a model reply.
///
/// Returns `None` when no braces are present or the span is not valid JSON
/// for `T`. Fields missing from the object take their `Default` values if `T`
/// declares them with `#[serde(default)]`.
pub fn parse_embedded<T: DeserializeOwned>(text: &str) -> Option<T> {
    let Some(span) = extract_json_object(text) else {
        debug!("Model reply did not contain a JSON object.");
        return None;
    };
    match serde_json::from_str(span) {
        Ok(value) => Some(value),
        Err(e) => {
            error!(error = %e, text = %text, "Failed to parse JSON embedded in model reply");
            None
        }
    }
}
