/*
 * conditional.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Conditional markers.
//!
//! ```text
//! {?:key} content {:?}
//! {?:key} content {:else:} alternate {:?}
//! {?:[key]}                       (array shorthand)
//! ```
//!
//! Parsing is plain left-to-right string splitting. Conditionals do not nest
//! and malformed markers are not detected: the first `}` after an opener ends
//! the key, the first `{:?}` after it closes the block, and an else clause is
//! only recognised when the body holds exactly one `{:else:}`.

use indexmap::IndexMap;
use serde::Serialize;

use crate::value::Variables;

pub const CONDITIONAL_OPEN: &str = "{?:";
pub const CONDITIONAL_CLOSE: &str = "{:?}";
pub const ELSE_SEPARATOR: &str = "{:else:}";
pub const ARRAY_SHORTHAND_OPEN: &str = "{?:[";
pub const ARRAY_SHORTHAND_CLOSE: &str = "]}";
/// Suffix marking a conditional key as an array key.
pub const ARRAY_SUFFIX: &str = "[]";

/// A parsed `{?:key}...{:?}` block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionalBlock {
    /// The key, including any trailing `[]`.
    pub key: String,
    /// Text between the opener and `{:else:}` (or the closer).
    pub content: String,
    /// Else-clause text followed by the spacer, or empty when there is no
    /// else clause.
    pub alt_content: String,
    /// Whether `key` is defined in the mapping the block was parsed against.
    pub resolved: bool,
}

/// One chunk of template text following a conditional opener.
struct Chunk<'a> {
    key: &'a str,
    content: &'a str,
    alternate: Option<&'a str>,
    /// Text after the closer, up to the next opener.
    rest: &'a str,
}

impl<'a> Chunk<'a> {
    fn parse(chunk: &'a str) -> Self {
        let (body, rest) = chunk.split_once(CONDITIONAL_CLOSE).unwrap_or((chunk, ""));
        let (key, content) = body.split_once('}').unwrap_or((body, ""));
        match content.split_once(ELSE_SEPARATOR) {
            Some((primary, alternate)) if !alternate.contains(ELSE_SEPARATOR) => Chunk {
                key,
                content: primary,
                alternate: Some(alternate),
                rest,
            },
            _ => Chunk {
                key,
                content,
                alternate: None,
                rest,
            },
        }
    }

    fn alt_content(&self, spacer: &str) -> String {
        match self.alternate {
            Some(alternate) => format!("{alternate}{spacer}"),
            None => String::new(),
        }
    }
}

/// Rewrite every `{?:[NAME]}` into `{?:NAME[]}{NAME[]}{:else:}`.
///
/// Only the opening half is produced; the template author supplies the
/// per-item text and the closing `{:?}`.
pub fn expand_array_shorthand(raw: &str) -> String {
    let mut parts = raw.split(ARRAY_SHORTHAND_OPEN);
    let mut out = parts.next().unwrap_or_default().to_string();

    for part in parts {
        let (name, rest) = part
            .split_once(ARRAY_SHORTHAND_CLOSE)
            .unwrap_or((part, ""));
        out.push_str(CONDITIONAL_OPEN);
        out.push_str(name);
        out.push_str(ARRAY_SUFFIX);
        out.push('}');
        out.push('{');
        out.push_str(name);
        out.push_str(ARRAY_SUFFIX);
        out.push('}');
        out.push_str(ELSE_SEPARATOR);
        out.push_str(rest);
    }

    out
}

/// Parse every conditional block in `raw`, keyed by block key.
///
/// Text before the first opener is ignored. When a key appears twice the later
/// block wins but keeps the earlier block's position.
pub fn extract_conditionals(
    raw: &str,
    variables: &Variables,
    spacer: &str,
) -> IndexMap<String, ConditionalBlock> {
    raw.split(CONDITIONAL_OPEN)
        .skip(1)
        .map(|chunk| {
            let chunk = Chunk::parse(chunk);
            let block = ConditionalBlock {
                key: chunk.key.to_string(),
                content: chunk.content.to_string(),
                alt_content: chunk.alt_content(spacer),
                resolved: variables.contains_key(chunk.key),
            };
            (block.key.clone(), block)
        })
        .collect()
}

/// Replace every conditional block in `raw` with the branch selected by
/// whether its key is defined in `variables`.
///
/// A defined key emits `spacer + content + spacer`; an undefined one emits
/// `spacer + alt_content`.
pub fn filter_conditionals(raw: &str, variables: &Variables, spacer: &str) -> String {
    let mut chunks = raw.split(CONDITIONAL_OPEN);
    let mut cooked = chunks.next().unwrap_or_default().to_string();

    for chunk in chunks {
        let chunk = Chunk::parse(chunk);
        cooked.push_str(spacer);
        if variables.contains_key(chunk.key) {
            cooked.push_str(chunk.content);
            cooked.push_str(spacer);
        } else {
            cooked.push_str(&chunk.alt_content(spacer));
        }
        cooked.push_str(chunk.rest);
    }

    cooked
}
