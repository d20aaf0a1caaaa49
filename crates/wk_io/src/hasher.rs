//! crates/wk_io/src/hasher.rs
//!
//! Deterministic hashing and ID builders for canonical artifacts.
//!
//! - Canonical JSON hashing: sorted object keys, array order preserved.
//! - IDs derive from canonical bytes: `RES:` (result) and `RUN:` (an RFC3339
//!   UTC timestamp plus a hash of canonical run bytes).
//! - Hex digests are **lowercase**.
//!
//! Use `sha256_canonical(..)` for JSON values/structs and `sha256_hex(..)`
//! for bytes that are already canonical.

#![forbid(unsafe_code)]

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::canonical_json::to_canonical_bytes;
use crate::IoError;

/* ---------------------------- Canonical hashing ---------------------------- */

/// SHA-256 over **canonical JSON bytes** of any serializable value.
pub fn sha256_canonical<T: Serialize + ?Sized>(value: &T) -> Result<String, IoError> {
    let bytes = to_canonical_bytes(value)?;
    Ok(sha256_hex(&bytes))
}

/// `"RES:" + sha256(canonical(value))`.
pub fn res_id_from_canonical<T: Serialize + ?Sized>(value: &T) -> Result<String, IoError> {
    Ok(format!("RES:{}", sha256_canonical(value)?))
}

/// `"RUN:" + timestamp + "-" + sha256(bytes)`; `timestamp` must be `YYYY-MM-DDTHH:MM:SSZ`.
pub fn run_id_from_bytes(timestamp_utc: &str, bytes: &[u8]) -> Result<String, IoError> {
    if !is_ts_utc_z(timestamp_utc) {
        return Err(IoError::Hash(format!("invalid timestamp: {timestamp_utc}")));
    }
    Ok(format!("RUN:{timestamp_utc}-{}", sha256_hex(bytes)))
}

/* ------------------------------- Raw hashing ------------------------------- */

/// SHA-256 over raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Lowercase 64-hex check.
#[cfg(test)]
pub(crate) fn is_hex64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Strict "YYYY-MM-DDTHH:MM:SSZ" shape check (length 20).
fn is_ts_utc_z(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() != 20 { return false; }
    b.iter().enumerate().all(|(i, c)| match i {
        4 | 7 => *c == b'-',
        10 => *c == b'T',
        13 | 16 => *c == b':',
        19 => *c == b'Z',
        _ => c.is_ascii_digit(),
    })
}
