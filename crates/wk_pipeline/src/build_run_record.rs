//! build_run_record.rs
//! Provenance for one run: normalized timestamp, engine identity, input
//! digests, and the result it produced. The id is
//! `"RUN:<timestamp>-<sha256(canonical idless record)>"`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use wk_io::{
    canonical_json::to_canonical_bytes,
    hasher::{run_id_from_bytes, sha256_hex},
    loader::InputDigests,
};

use crate::build_result::{result_canonical_bytes, ResultDoc};
use crate::{EngineMeta, PipelineCtx, PipelineError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOutputs {
    pub result_id: String,
    pub result_sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecordDoc {
    pub id: String,
    pub timestamp_utc: String,
    pub engine: EngineMeta,
    pub inputs: InputDigests,
    pub outputs: RunOutputs,
}

#[derive(Serialize)]
struct RunNoId<'a> {
    timestamp_utc: &'a str,
    engine: &'a EngineMeta,
    inputs: &'a InputDigests,
    outputs: &'a RunOutputs,
}

/// Parse any RFC3339 instant and render it as `YYYY-MM-DDTHH:MM:SSZ`.
pub fn normalize_rfc3339_utc(ts: &str) -> Result<String, PipelineError> {
    let dt: DateTime<Utc> = ts
        .parse::<DateTime<Utc>>()
        .map_err(|_| PipelineError::Build(format!("timestamp_utc is not RFC3339: {ts}")))?;
    Ok(dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

pub fn build_run_record(
    ctx: &PipelineCtx,
    inputs: &InputDigests,
    result: &ResultDoc,
) -> Result<RunRecordDoc, PipelineError> {
    let timestamp_utc = normalize_rfc3339_utc(&ctx.timestamp_utc)?;
    let outputs = RunOutputs {
        result_id: result.id.clone(),
        result_sha256: sha256_hex(&result_canonical_bytes(result)?),
    };

    let noid = RunNoId {
        timestamp_utc: &timestamp_utc,
        engine: &ctx.engine_meta,
        inputs,
        outputs: &outputs,
    };
    let bytes = to_canonical_bytes(&noid)?;
    let id = run_id_from_bytes(&timestamp_utc, &bytes)?;

    Ok(RunRecordDoc {
        id,
        timestamp_utc,
        engine: ctx.engine_meta.clone(),
        inputs: inputs.clone(),
        outputs,
    })
}
