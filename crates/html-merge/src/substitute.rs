/*
 * substitute.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Variable substitution.
//!
//! Substitution runs two sweeps over a single accumulator, seeded with the raw
//! template:
//!
//! 1. **Plain**: every `{key}` is replaced by the value's text.
//! 2. **JSON**: every `{[key]}` is replaced by the value's JSON encoding.
//!
//! Each sweep visits keys in mapping order and each replacement operates on
//! the output of the previous one, so text inserted for one key can contain
//! markers that a later key then replaces.
//!
//! [`try_substitute`] is the fast path: it never waits, and gives up as soon as
//! a marker needs an asynchronous value. [`substitute_deferred`] runs the same
//! sweeps, awaiting asynchronous values and yielding one scheduler turn after
//! every replacement. [`substitute`] tries the first and falls back to the
//! second, restarting from the untouched template.

use crate::value::{AsyncResolver, Value, Variables, format_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sweep {
    Plain,
    Json,
}

const SWEEPS: [Sweep; 2] = [Sweep::Plain, Sweep::Json];

enum Resolution<'a> {
    Ready(String),
    /// The value has no representation for this marker; leave it in place.
    Skip,
    Pending(&'a AsyncResolver),
}

impl Sweep {
    fn marker(self, key: &str) -> String {
        match self {
            Sweep::Plain => format!("{{{key}}}"),
            Sweep::Json => format!("{{[{key}]}}"),
        }
    }

    /// Encode a function's resolved string for this sweep.
    fn encode(self, text: String) -> String {
        match self {
            Sweep::Plain => text,
            Sweep::Json => serde_json::Value::String(text).to_string(),
        }
    }

    fn resolve<'a>(self, key: &str, value: &'a Value) -> Resolution<'a> {
        match (self, value) {
            (Sweep::Plain, Value::String(s)) => Resolution::Ready(s.clone()),
            (Sweep::Json, Value::String(s)) => Resolution::Ready(self.encode(s.clone())),
            (_, Value::Number(n)) => Resolution::Ready(format_number(n)),
            (Sweep::Plain, Value::Json(_)) => Resolution::Skip,
            (Sweep::Json, Value::Json(json)) => Resolution::Ready(json.to_string()),
            (_, Value::Sync(resolver)) => Resolution::Ready(self.encode(resolver.resolve(key))),
            (_, Value::Async(resolver)) => Resolution::Pending(resolver),
        }
    }
}

/// Substitute `variables` into `raw`.
///
/// Runs without waiting unless a marker in the template needs an
/// asynchronous value. An empty template or mapping is returned unchanged.
pub async fn substitute(raw: &str, variables: &Variables) -> String {
    if raw.is_empty() || variables.is_empty() {
        return raw.to_string();
    }

    match try_substitute(raw, variables) {
        Some(cooked) => cooked,
        None => {
            tracing::debug!(
                keys = variables.len(),
                "asynchronous value needed, restarting substitution on the deferred path"
            );
            substitute_deferred(raw, variables).await
        }
    }
}

/// Substitute without waiting.
///
/// Returns `None`, discarding all work done so far, as soon as a marker
/// present in the accumulator is bound to an asynchronous value.
pub fn try_substitute(raw: &str, variables: &Variables) -> Option<String> {
    let mut cooked = raw.to_string();

    for sweep in SWEEPS {
        for (key, value) in variables.iter() {
            let marker = sweep.marker(key);
            if !cooked.contains(&marker) {
                continue;
            }
            match sweep.resolve(key, value) {
                Resolution::Ready(text) => cooked = cooked.replace(&marker, &text),
                Resolution::Skip => {}
                Resolution::Pending(_) => return None,
            }
        }
    }

    Some(cooked)
}

/// Substitute, awaiting asynchronous values.
///
/// The plain sweep finishes before the JSON sweep starts. Every replacement
/// is followed by a one-turn yield before the next key is processed.
pub async fn substitute_deferred(raw: &str, variables: &Variables) -> String {
    let mut cooked = raw.to_string();

    for sweep in SWEEPS {
        for (key, value) in variables.iter() {
            let marker = sweep.marker(key);
            if !cooked.contains(&marker) {
                continue;
            }
            let text = match sweep.resolve(key, value) {
                Resolution::Ready(text) => text,
                Resolution::Skip => continue,
                Resolution::Pending(resolver) => {
                    tracing::trace!(key, ?sweep, "awaiting asynchronous value");
                    sweep.encode(resolver.resolve(key).await)
                }
            };
            cooked = cooked.replace(&marker, &text);
            tokio::task::yield_now().await;
        }
    }

    cooked
}
