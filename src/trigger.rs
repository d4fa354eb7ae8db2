//! Trigger marker injection
//!
//! Completion analysis works on a copy of the document in which a sentinel
//! token is spliced in at the cursor. The sentinel lexes as part of an
//! identifier, so `db.` becomes `db.<marker>` and parses as a member access,
//! and `find({ ` gains a key the object checks can see.

use crate::parser::{LineIndex, Position};

/// Sentinel spliced at the cursor before parsing
///
/// Wrapped in private-use code points so it can never collide with text a
/// user would type.
pub const TRIGGER_CHARACTER: &str = "\u{E000}TRIGGER_CHARACTER\u{E000}";

/// Whether a piece of source text contains the trigger marker
pub fn contains_trigger(text: &str) -> bool {
    text.contains(TRIGGER_CHARACTER)
}

/// Splice the trigger marker into `text` at `position`
///
/// Only the cursor line is rewritten; every other line is copied unchanged.
/// The character offset counts chars (Unicode scalar values), as
/// [`Position`] does everywhere, and is clamped to the line length. A
/// position past the last line leaves the text unchanged.
///
/// # Arguments
/// * `text` - Document text
/// * `position` - Zero-indexed cursor position
///
/// # Returns
/// * `String` - The document with the marker at the cursor
pub fn inject_trigger_character(text: &str, position: Position) -> String {
    let index = LineIndex::new(text);
    if position.line >= index.line_count() {
        return text.to_string();
    }

    let split = text
        .char_indices()
        .nth(index.offset(position))
        .map_or(text.len(), |(byte, _)| byte);

    let mut out = String::with_capacity(text.len() + TRIGGER_CHARACTER.len());
    out.push_str(&text[..split]);
    out.push_str(TRIGGER_CHARACTER);
    out.push_str(&text[split..]);
    out
}
