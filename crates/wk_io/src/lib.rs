//! crates/wk_io/src/lib.rs
//! Minimal, single-source-of-truth I/O crate.
//!
//! - Shared error type (`IoError`) with `From` conversions used across modules.
//! - Public surface kept stable; details live in submodules.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for wk_io (used by canonical_json/hasher/loader).
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (open, create_dir_all, rename, fsync, etc.)
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON serialization/deserialization errors with a location hint.
    #[error("json error at {pointer}: {msg}")]
    Json {
        pointer: String,
        msg: String,
    },

    /// Hashing-related errors.
    #[error("hash error: {0}")]
    Hash(String),

    /// Inputs that parse but break a domain rule.
    #[error("invalid: {0}")]
    Invalid(String),

    /// Input exceeds a read limit.
    #[error("limit exceeded: {0}")]
    Limit(String),
}

/* ---------------- From conversions (used by file modules) ---------------- */

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json keeps line/column, not a pointer; report the position instead.
        let pointer = if e.line() == 0 { "/".to_string() } else { format!("line {} column {}", e.line(), e.column()) };
        IoError::Json { pointer, msg: e.to_string() }
    }
}

impl From<wk_core::errors::CoreError> for IoError {
    fn from(e: wk_core::errors::CoreError) -> Self {
        IoError::Invalid(e.to_string())
    }
}

pub mod canonical_json;
pub mod hasher;
pub mod loader;

/// Returns true if `s` looks like a URL (any `<scheme>://`, including `file://`).
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    s.trim().contains("://")
}
