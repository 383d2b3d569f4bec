/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Merge values and variable mappings.
//!
//! A [`Variables`] mapping is an ordered set of unique keys. Order matters:
//! substitution visits keys in mapping order, and a key's replacement text is
//! visible to every later key.
//!
//! Function values come in two explicit shapes chosen by whoever builds the
//! mapping. A [`SyncResolver`] returns its string immediately; an
//! [`AsyncResolver`] produces it later. Both receive the *key name* they were
//! looked up under, not a stored value.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use serde_json::Number;

use crate::error::{MergeError, MergeResult};

/// A value that can be bound to a key in a [`Variables`] mapping.
#[derive(Debug, Clone)]
pub enum Value {
    /// Interpolated as-is; JSON-encoded as a quoted string.
    String(String),

    /// Interpolated as its decimal form; JSON-encoded unquoted.
    Number(Number),

    /// Any other JSON value (objects, arrays, booleans, null).
    ///
    /// Structured values are only emitted through `{[key]}`; a plain `{key}`
    /// marker for them is left untouched. JSON arrays double as collections
    /// for array rendering.
    Json(serde_json::Value),

    /// A function resolved synchronously with the key name.
    Sync(SyncResolver),

    /// A function whose string arrives later.
    Async(AsyncResolver),
}

impl Value {
    /// Build a synchronous function value.
    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Value::Sync(SyncResolver::new(f))
    }

    /// Build an asynchronous function value from a future-returning closure.
    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn(&str) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = String> + Send + 'static,
    {
        Value::Async(AsyncResolver::new(f))
    }

    /// Build an asynchronous function value in completion-callback form.
    ///
    /// The closure is handed a [`Completion`] that it must consume exactly
    /// once, either before returning or later from another task or thread.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&str, Completion) + Send + Sync + 'static,
    {
        Value::Async(AsyncResolver::from_callback(f))
    }

    /// Whether resolving this value may need to wait.
    pub fn is_async(&self) -> bool {
        matches!(self, Value::Async(_))
    }

    /// Short name of the variant, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Json(json) => json_kind(json),
            Value::Sync(_) => "sync function",
            Value::Async(_) => "async function",
        }
    }

    /// The JSON array held by this value, if any.
    pub fn as_array(&self) -> Option<&Vec<serde_json::Value>> {
        match self {
            Value::Json(serde_json::Value::Array(items)) => Some(items),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Number(n) => Value::Number(n),
            other => Value::Json(other),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Json(serde_json::Value::Bool(b))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        match Number::from_f64(n) {
            Some(n) => Value::Number(n),
            // NaN and infinities have no JSON form
            None => Value::Json(serde_json::Value::Null),
        }
    }
}

macro_rules! value_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

value_from_integer!(i32, i64, u32, u64, usize);

impl From<SyncResolver> for Value {
    fn from(resolver: SyncResolver) -> Self {
        Value::Sync(resolver)
    }
}

impl From<AsyncResolver> for Value {
    fn from(resolver: AsyncResolver) -> Self {
        Value::Async(resolver)
    }
}

/// A function value that returns its string immediately.
#[derive(Clone)]
pub struct SyncResolver(Arc<dyn Fn(&str) -> String + Send + Sync>);

impl SyncResolver {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the function with the key it was found under.
    pub fn resolve(&self, key: &str) -> String {
        (self.0)(key)
    }
}

impl fmt::Debug for SyncResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SyncResolver(..)")
    }
}

/// A function value whose string is produced asynchronously.
#[derive(Clone)]
pub struct AsyncResolver(Arc<dyn Fn(&str) -> BoxFuture<'static, String> + Send + Sync>);

impl AsyncResolver {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(&str) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = String> + Send + 'static,
    {
        Self(Arc::new(move |key: &str| f(key).boxed()))
    }

    /// Adapt a completion-callback function.
    ///
    /// The callback runs as soon as the value is resolved; the returned future
    /// finishes when the [`Completion`] is consumed. A completion dropped
    /// without a value leaves the future pending forever.
    pub fn from_callback<F>(f: F) -> Self
    where
        F: Fn(&str, Completion) + Send + Sync + 'static,
    {
        Self(Arc::new(move |key: &str| {
            let (sender, receiver) = oneshot::channel();
            f(key, Completion { sender });
            let key = key.to_string();
            async move {
                match receiver.await {
                    Ok(value) => value,
                    Err(oneshot::Canceled) => {
                        tracing::warn!(key = %key, "completion dropped without a value");
                        futures::future::pending().await
                    }
                }
            }
            .boxed()
        }))
    }

    /// Start resolving the value for `key`.
    pub fn resolve(&self, key: &str) -> BoxFuture<'static, String> {
        (self.0)(key)
    }
}

impl fmt::Debug for AsyncResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AsyncResolver(..)")
    }
}

/// Handle through which a callback-style function delivers its string.
///
/// Consuming `self` in [`Completion::complete`] makes a second delivery
/// impossible.
#[derive(Debug)]
pub struct Completion {
    sender: oneshot::Sender<String>,
}

impl Completion {
    /// Deliver the resolved string.
    pub fn complete(self, value: impl Into<String>) {
        // The merge may have been dropped by its caller; nothing to do then.
        let _ = self.sender.send(value.into());
    }
}

/// An ordered mapping of unique keys to [`Value`]s.
///
/// Re-inserting an existing key replaces its value but keeps its original
/// position.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    entries: IndexMap<String, Value>,
}

impl Variables {
    /// Create a new empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `key` to `value`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder form of [`Variables::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Whether `key` is defined, regardless of its value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy every binding of `other` into this mapping, `other` winning on
    /// collisions.
    pub fn extend_from(&mut self, other: &Variables) {
        for (key, value) in other.iter() {
            self.entries.insert(key.to_string(), value.clone());
        }
    }

    /// Build a mapping from a JSON object, keeping its key order.
    pub fn from_json(json: serde_json::Value) -> MergeResult<Self> {
        match json {
            serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(MergeError::NotAnObject {
                found: json_kind(&other),
            }),
        }
    }

    /// Parse a mapping from JSON text.
    pub fn from_json_str(text: &str) -> MergeResult<Self> {
        Self::from_json(serde_json::from_str(text)?)
    }

    /// Build a mapping from a JSON object, flattening nested objects into
    /// dot-qualified keys.
    ///
    /// `{"head": {"title": "Menu"}}` becomes `head.title = "Menu"`. Arrays and
    /// empty objects are kept whole so arrays stay usable as collections.
    pub fn from_json_flattened(json: serde_json::Value) -> MergeResult<Self> {
        match json {
            serde_json::Value::Object(map) => {
                let mut variables = Variables::new();
                flatten_into(&mut variables, "", map);
                Ok(variables)
            }
            other => Err(MergeError::NotAnObject {
                found: json_kind(&other),
            }),
        }
    }
}

fn flatten_into(
    variables: &mut Variables,
    prefix: &str,
    map: serde_json::Map<String, serde_json::Value>,
) {
    for (key, value) in map {
        let path = format!("{prefix}{key}");
        match value {
            serde_json::Value::Object(inner) if !inner.is_empty() => {
                flatten_into(variables, &format!("{path}."), inner);
            }
            other => variables.insert(path, other),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Variables {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut variables = Variables::new();
        variables.extend(iter);
        variables
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Variables {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

/// Decimal text for a number.
///
/// Whole-valued floats print without a fraction (`10.0` and `1e2` become
/// `10` and `100`), and negative zero prints as `0`.
pub fn format_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        // f64's Display never adds a trailing ".0"
        Some(f) if n.is_f64() => f.to_string(),
        _ => n.to_string(),
    }
}

pub(crate) fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
