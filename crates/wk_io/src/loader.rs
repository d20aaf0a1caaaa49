//! Loader: read local JSON inputs (parameter set, bill request, JSON-lines
//! batches), validate the parameter domains, and hand typed values to the
//! pipeline. No network I/O.

#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use wk_core::{
    variables::{self, Params},
    ParticipantCounts, RoundingUnit, WeightTable,
};

use crate::{hasher, looks_like_url_strict, IoError};

/// Upper bound on any single input file.
pub const MAX_INPUT_BYTES: u64 = 4 * 1024 * 1024;

// ----------------------------- Public wire-facing types -----------------------------

/// One bill to split. `weights` are per-rank overrides on top of the preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BillRequest {
    /// Caller label echoed in batch output (non-normative).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub total_amount: u64,
    pub counts: ParticipantCounts,
    #[serde(default, skip_serializing_if = "WeightTable::is_empty")]
    pub weights: WeightTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounding_unit: Option<RoundingUnit>,
}

/// Digests (sha256 hex) of the canonical inputs of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDigests {
    pub parameter_set_sha256: String,
    pub request_sha256: String,
}

/// One line of a batch: either a parsed request or the reason it was rejected.
#[derive(Debug)]
pub struct BatchLine {
    /// 1-based line number in the source.
    pub line: usize,
    pub request: Result<BillRequest, IoError>,
}

// ----------------------------- Loading -----------------------------

/// Load and domain-check a parameter set.
pub fn load_params(path: &Path) -> Result<Params, IoError> {
    let text = read_text_bounded(path)?;
    parse_params(&text)
}

/// Parse and domain-check a parameter set from JSON text.
pub fn parse_params(text: &str) -> Result<Params, IoError> {
    let params: Params = serde_json::from_str(text)?;
    variables::validate_domains(&params)?;
    Ok(params)
}

/// Load a single bill request.
pub fn load_request(path: &Path) -> Result<BillRequest, IoError> {
    let text = read_text_bounded(path)?;
    parse_request(&text)
}

pub fn parse_request(text: &str) -> Result<BillRequest, IoError> {
    Ok(serde_json::from_str(text)?)
}

/// Read a JSON-lines batch. Blank lines and `#` comments are skipped; a line
/// that fails to parse is reported in place without stopping the batch.
pub fn read_batch<R: Read>(reader: R) -> Result<Vec<BatchLine>, IoError> {
    let mut out = Vec::new();
    let mut budget = MAX_INPUT_BYTES;
    for (ix, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        budget = budget
            .checked_sub(line.len() as u64 + 1)
            .ok_or_else(|| IoError::Limit(format!("batch exceeds {MAX_INPUT_BYTES} bytes")))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        out.push(BatchLine { line: ix + 1, request: parse_request(trimmed) });
    }
    Ok(out)
}

/// Open a batch file (or stdin for `-`).
pub fn load_batch(path: &Path) -> Result<Vec<BatchLine>, IoError> {
    if path.as_os_str() == "-" {
        return read_batch(std::io::stdin().lock());
    }
    let f = open_local(path)?;
    read_batch(f)
}

/// Canonical digests of the inputs that determine a result.
pub fn digest_inputs(params: &Params, request: &BillRequest) -> Result<InputDigests, IoError> {
    Ok(InputDigests {
        parameter_set_sha256: hasher::sha256_canonical(params)?,
        request_sha256: hasher::sha256_canonical(request)?,
    })
}

// ----------------------------- Helpers -----------------------------

fn open_local(path: &Path) -> Result<File, IoError> {
    if let Some(s) = path.to_str() {
        if looks_like_url_strict(s) {
            return Err(IoError::Path(format!("path must be local (no scheme): {s}")));
        }
    }
    File::open(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))
}

fn read_text_bounded(path: &Path) -> Result<String, IoError> {
    let f = open_local(path)?;
    let mut buf = String::new();
    let n = f.take(MAX_INPUT_BYTES + 1).read_to_string(&mut buf)?;
    if n as u64 > MAX_INPUT_BYTES {
        return Err(IoError::Limit(format!("{} exceeds {MAX_INPUT_BYTES} bytes", path.display())));
    }
    Ok(buf)
}
