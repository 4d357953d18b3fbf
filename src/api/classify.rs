//! Detection of the upstream error envelope in decoded response text.

use crate::api::types::ErrorEnvelope;
use crate::error::{TweetlineError, TweetlineResult};
use tracing::debug;

/// Literal prefix of an error envelope. Matched verbatim: case-sensitive and
/// without skipping leading whitespace.
pub const ERROR_ENVELOPE_MARKER: &str = "{\"errors\":";

/// Return `text` unchanged unless it is an error envelope, in which case the
/// parsed entries are raised as `TweetlineError::Api`.
pub fn classify(text: String) -> TweetlineResult<String> {
    if !text.starts_with(ERROR_ENVELOPE_MARKER) {
        return Ok(text);
    }

    let entries = match serde_json::from_str::<ErrorEnvelope>(&text) {
        Ok(envelope) => envelope.errors,
        Err(e) => {
            debug!(error = %e, "Error envelope could not be parsed");
            Vec::new()
        }
    };

    debug!(
        entries = entries.len(),
        first_code = entries.first().map(|entry| entry.code),
        "Response classified as API error"
    );
    Err(TweetlineError::Api { entries })
}
