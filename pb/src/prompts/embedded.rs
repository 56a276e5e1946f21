//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Fixed system prompt sent with every decomposition request
pub const DECOMPOSE_SYSTEM: &str =
    "You are a JSON-only API. Respond with valid JSON only. No thinking blocks, no explanations, no commentary.";

/// Task decomposition prompt
pub const DECOMPOSE: &str = include_str!("../../prompts/decompose.pmt");

/// Complete palace image prompt
pub const PALACE: &str = include_str!("../../prompts/palace.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "decompose" => Some(DECOMPOSE),
        "palace" => Some(PALACE),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
