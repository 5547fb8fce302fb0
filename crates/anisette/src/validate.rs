//! Response validation
//!
//! Providers that are down tend to answer with HTML error pages or empty
//! bodies, so every diagnostic quotes a bounded, single-line snippet of the
//! body rather than the raw payload.

use serde_json::Value;

use crate::constants::SNIPPET_MAX_CHARS;
use crate::error::{Error, Result};

/// Accept a 2xx response whose body parses as JSON.
pub fn validate(status: u16, content_type: Option<&str>, body: &[u8]) -> Result<Value> {
    let content_type = content_type.filter(|ct| !ct.is_empty());

    if !(200..=299).contains(&status) {
        return Err(Error::HttpStatus {
            status,
            content_type: content_type.map(String::from),
            snippet: compact_body(body),
        });
    }

    serde_json::from_slice(body).map_err(|e| {
        let mut message = String::from("failed to parse anisette response as JSON");
        if let Some(content_type) = content_type {
            message.push_str(&format!(" ({content_type})"));
        }
        let snippet = compact_body(body);
        if !snippet.is_empty() {
            message.push_str(&format!(": {snippet}"));
        }
        message.push_str(&format!(" [{e}]"));
        Error::Parse(message)
    })
}

/// Log-safe body excerpt: `\r`, `\n` and `\t` become spaces, and anything past
/// [`SNIPPET_MAX_CHARS`] characters is replaced by `...`.
pub fn compact_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let mut snippet: String = text
        .chars()
        .take(SNIPPET_MAX_CHARS)
        .map(|c| match c {
            '\r' | '\n' | '\t' => ' ',
            c => c,
        })
        .collect();
    if text.chars().nth(SNIPPET_MAX_CHARS).is_some() {
        snippet.push_str("...");
    }
    snippet
}
