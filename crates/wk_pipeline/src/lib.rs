//! wk_pipeline — deterministic pipeline surface (load→validate→allocate→build result→build run record).
//! This crate stays I/O-free and delegates JSON/hashing to `wk_io` and math to `wk_algo`.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use wk_core::variables::Params;
use wk_io::loader::{BatchLine, BillRequest, InputDigests};

pub mod allocate;
pub mod build_result;
pub mod build_run_record;
pub mod load;
pub mod validate;

pub use allocate::Outcome;
pub use build_result::{ResultDoc, ResultRow, ResultStatus};
pub use build_run_record::{RunOutputs, RunRecordDoc};
pub use load::ResolvedInputs;
pub use validate::{Severity, ValidationIssue, ValidationReport};

/// Engine identifiers (baked by the build system in real deployments).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineMeta {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub build: String,
}

/// Per-run context: configuration plus the provenance stamped on artifacts.
#[derive(Debug, Clone)]
pub struct PipelineCtx {
    pub params: Params,
    pub engine_meta: EngineMeta,
    /// RFC3339 UTC; normalized to `YYYY-MM-DDTHH:MM:SSZ` in the run record.
    pub timestamp_utc: String,
}

/// Top-level pipeline outputs.
#[derive(Debug, Clone)]
pub struct PipelineOutputs {
    pub result: ResultDoc,
    pub run_record: RunRecordDoc,
    pub validation: ValidationReport,
}

impl PipelineOutputs {
    /// True when the calculator produced a breakdown (not the zero-weight warning).
    pub fn is_allocated(&self) -> bool {
        self.result.status == ResultStatus::Allocated
    }
}

/// Single error surface for the pipeline orchestration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    Io(String),
    Schema(String),
    Validate(String),
    Allocate(String),
    Build(String),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use PipelineError::*;
        match self {
            Io(m) => write!(f, "io: {m}"),
            Schema(m) => write!(f, "schema: {m}"),
            Validate(m) => write!(f, "validation: {m}"),
            Allocate(m) => write!(f, "allocate: {m}"),
            Build(m) => write!(f, "build: {m}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<wk_io::IoError> for PipelineError {
    fn from(e: wk_io::IoError) -> Self {
        use wk_io::IoError;
        match e {
            IoError::Json { pointer, msg } => PipelineError::Schema(format!("json {pointer}: {msg}")),
            IoError::Invalid(m) => PipelineError::Validate(m),
            IoError::Hash(m) => PipelineError::Build(format!("hash: {m}")),
            IoError::Path(m) => PipelineError::Io(format!("path: {m}")),
            IoError::Limit(m) => PipelineError::Io(format!("limit: {m}")),
        }
    }
}

// -------------------------------------- Public API --------------------------------------

/// Run one request through every stage.
///
/// A zero total weight is not an error: it yields a result with
/// `status = zero_weight` and the warning text, so callers can show it and
/// accept a corrected request.
pub fn run_request(ctx: &PipelineCtx, request: &BillRequest) -> Result<PipelineOutputs, PipelineError> {
    // --- LOAD ---
    let resolved = load::resolve(&ctx.params, request)?;
    debug!(
        preset = %resolved.preset,
        rounding_unit = resolved.rounding_unit.get(),
        ranks = resolved.counts.len(),
        "resolved request"
    );

    // --- VALIDATE ---
    let validation = validate::validate(&ctx.params, &resolved);
    for issue in validation.issues.iter().filter(|i| i.severity == Severity::Warning) {
        warn!(code = issue.code, "{}", issue.message);
    }
    if !validation.pass {
        return Err(PipelineError::Validate(validation.error_summary()));
    }

    // --- ALLOCATE ---
    let outcome = allocate::allocate(&resolved)?;

    // --- BUILD_RESULT ---
    let result = build_result::build_result(&resolved, &outcome, &validation)?;

    // --- BUILD_RUN_RECORD ---
    let digests: InputDigests = wk_io::loader::digest_inputs(&ctx.params, request)?;
    let run_record = build_run_record::build_run_record(ctx, &digests, &result)?;

    Ok(PipelineOutputs { result, run_record, validation })
}

/// One processed batch line.
#[derive(Debug)]
pub struct BatchEntry {
    pub line: usize,
    pub request_id: Option<String>,
    pub outcome: Result<PipelineOutputs, PipelineError>,
}

/// Run every batch line independently; a failing line never stops the rest.
pub fn run_batch(ctx: &PipelineCtx, lines: Vec<BatchLine>) -> Vec<BatchEntry> {
    lines
        .into_iter()
        .map(|bl| match bl.request {
            Ok(req) => BatchEntry {
                line: bl.line,
                request_id: req.id.clone(),
                outcome: run_request(ctx, &req),
            },
            Err(e) => BatchEntry {
                line: bl.line,
                request_id: None,
                outcome: Err(PipelineError::from(e)),
            },
        })
        .collect()
}

/// Engine identifiers stamped on every run record.
/// `WARIKAN_{VENDOR,NAME,VERSION,BUILD}` set at compile time override the defaults.
pub fn engine_identifiers() -> EngineMeta {
    EngineMeta {
        vendor: option_env!("WARIKAN_VENDOR").unwrap_or("warikan").to_string(),
        name: option_env!("WARIKAN_NAME").unwrap_or("warikan").to_string(),
        version: option_env!("WARIKAN_VERSION")
            .unwrap_or(env!("CARGO_PKG_VERSION"))
            .to_string(),
        build: option_env!("WARIKAN_BUILD").unwrap_or("dev").to_string(),
    }
}
