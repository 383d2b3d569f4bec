/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for loading templates and variables.
//!
//! The merge engine itself never fails: unresolved markers stay in the output
//! and malformed markers produce best-effort text. Errors only arise at the
//! boundary where templates and variable mappings are loaded.

use thiserror::Error;

/// Errors that can occur while preparing a merge.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Variables must be supplied as a JSON object.
    #[error("Variables must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// A template id could not be resolved by the template source.
    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    /// Malformed JSON input.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (e.g., reading a template file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for merge preparation.
pub type MergeResult<T> = Result<T, MergeError>;
