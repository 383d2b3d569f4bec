/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Marker-based merge engine for HTML fragments.
//!
//! A template is plain text with markers:
//!
//! - Interpolation: `{key}`
//! - JSON interpolation: `{[key]}`
//! - Conditionals: `{?:key}...{:?}` and `{?:key}...{:else:}...{:?}`
//! - Array blocks: `{?:[items]}<li>{name}</li>{:?}`, with `{_meta.index}`,
//!   `{_meta.key}` and `{_meta.indexOddEven}` available per element
//!
//! Conditionals test whether a key is *defined*, not whether its value is
//! truthy. Unknown keys are left in the output as written. There is no
//! escaping and conditionals do not nest.
//!
//! # Architecture
//!
//! Values may be functions of the key name, either synchronous
//! ([`Value::sync`]) or asynchronous ([`Value::future`], [`Value::callback`]).
//! [`merge`] therefore returns a future. It substitutes without waiting
//! whenever no asynchronous value is needed, and otherwise restarts on a
//! deferred path that awaits each value in turn. Both paths produce the same
//! text.
//!
//! # Example
//!
//! ```
//! use html_merge::{Variables, merge_blocking};
//!
//! let vars = Variables::new().with("name", "World");
//! let html = merge_blocking("{?:name}Hello {name}!{:else:}Hello?{:?}", &vars, "");
//! assert_eq!(html, "Hello World!");
//! ```

pub mod array;
pub mod conditional;
pub mod error;
pub mod merge;
pub mod store;
pub mod substitute;
pub mod value;

// Re-export main types at crate root
pub use array::{Collection, render_collection, render_each};
pub use conditional::{
    ConditionalBlock, expand_array_shorthand, extract_conditionals, filter_conditionals,
};
pub use error::{MergeError, MergeResult};
pub use merge::{merge, merge_blocking};
pub use store::{DirectorySource, MemorySource, TemplateCache, TemplateSource};
pub use substitute::{substitute, substitute_deferred, try_substitute};
pub use value::{AsyncResolver, Completion, SyncResolver, Value, Variables, format_number};
