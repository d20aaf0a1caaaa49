// crates/wk_cli/src/main.rs
//
// Wires up exit codes, logging, typed error mapping, and the three run paths
// (flags → single request, --request FILE, --batch FILE|-). Each computed
// bill prints its text report to stdout; with --out the canonical artifacts
// and requested reports are written as well.

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    /// Bad input, or nothing billed because total weight was 0.
    pub const VALIDATION: i32 = 2;
    pub const IO: i32 = 4;
    pub const INTERNAL: i32 = 5;
}

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use args::{parse_and_validate as parse_cli, Args, Mode};

use wk_core::{variables::Params, ParticipantCounts, WeightTable};
use wk_io::{
    canonical_json,
    loader::{self, BillRequest},
    IoError,
};
use wk_pipeline::{
    engine_identifiers, run_batch, run_request, PipelineCtx, PipelineError, PipelineOutputs,
};
use wk_report::{build_model, render_text::render_text, ReportError, ReportModel};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// Schema / JSON shape / bounds failures.
    Validation(String),
    /// Nothing billed: total weight is 0.
    ZeroWeight(String),
    /// I/O errors (read/write/path/limits).
    Io(String),
    /// Calculator overflow, id self-check, inconsistent report.
    Internal(String),
    /// Rendering errors (report build or output).
    Render(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) => write!(f, "{m}"),
            MainError::ZeroWeight(m) => write!(f, "{m}"),
            MainError::Io(m) => write!(f, "{m}"),
            MainError::Internal(m) => write!(f, "internal: {m}"),
            MainError::Render(m) => write!(f, "render: {m}"),
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("warikan: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };
    init_tracing(&args);

    let rc = match run(&args) {
        Ok(rc) => rc,
        Err(e @ MainError::ZeroWeight(_)) => {
            eprintln!("warikan: warning: {e}");
            map_error(&e)
        }
        Err(e) => {
            eprintln!("warikan: error: {e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// stderr logging; --verbose / --quiet win over RUST_LOG, which wins over `warn`.
fn init_tracing(args: &Args) {
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else if args.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(args: &Args) -> Result<i32, MainError> {
    let params = match &args.params {
        Some(p) => loader::load_params(p).map_err(map_io_err)?,
        None => Params::default(),
    };
    let ctx = PipelineCtx {
        params,
        engine_meta: engine_identifiers(),
        timestamp_utc: args
            .timestamp
            .clone()
            .unwrap_or_else(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
    };

    match args.mode() {
        Mode::Flags => {
            let req = request_from_flags(args)?;
            run_single(args, &ctx, &req)
        }
        Mode::Request(path) => {
            let req = apply_overrides(args, loader::load_request(&path).map_err(map_io_err)?);
            run_single(args, &ctx, &req)
        }
        Mode::Batch(path) => run_batch_file(args, &ctx, &path),
    }
}

fn request_from_flags(args: &Args) -> Result<BillRequest, MainError> {
    let total_amount = args
        .total
        .ok_or_else(|| MainError::Validation("--total is required".into()))?;
    let req = BillRequest {
        id: None,
        total_amount,
        counts: args.counts.iter().cloned().collect::<ParticipantCounts>(),
        weights: args.weights.iter().cloned().collect::<WeightTable>(),
        preset: None,
        rounding_unit: None,
    };
    Ok(apply_overrides(args, req))
}

/// --preset / --rounding take precedence over the request body.
fn apply_overrides(args: &Args, mut req: BillRequest) -> BillRequest {
    if let Some(p) = &args.preset {
        req.preset = Some(p.clone());
    }
    if let Some(u) = args.rounding {
        req.rounding_unit = Some(u);
    }
    req
}

fn run_single(args: &Args, ctx: &PipelineCtx, req: &BillRequest) -> Result<i32, MainError> {
    let outs = run_request(ctx, req).map_err(map_pipeline_err)?;
    let model = report_model(&outs)?;
    print!("{}", render_text(&model));

    if let Some(dir) = &args.out {
        write_artifacts(dir, &outs)?;
        maybe_render_reports(args, &model, dir)?;
    }

    if outs.is_allocated() {
        Ok(exitcodes::OK)
    } else {
        let msg = outs.result.warning.clone().unwrap_or_default();
        Err(MainError::ZeroWeight(msg))
    }
}

/// Every line runs independently; the exit code is the worst line's.
fn run_batch_file(args: &Args, ctx: &PipelineCtx, path: &Path) -> Result<i32, MainError> {
    let lines = loader::load_batch(path).map_err(map_io_err)?;
    let lines = lines
        .into_iter()
        .map(|mut bl| {
            bl.request = bl.request.map(|r| apply_overrides(args, r));
            bl
        })
        .collect::<Vec<_>>();
    debug!(lines = lines.len(), "batch loaded");

    let mut rc = exitcodes::OK;
    for entry in run_batch(ctx, lines) {
        let label = match &entry.request_id {
            Some(id) => format!("line {} ({id})", entry.line),
            None => format!("line {}", entry.line),
        };
        println!("== {label}");

        let line_rc = match entry.outcome {
            Ok(outs) => match batch_line_outputs(args, &outs, entry.line) {
                Ok(()) if outs.is_allocated() => exitcodes::OK,
                Ok(()) => exitcodes::VALIDATION,
                Err(e) => {
                    eprintln!("warikan: {label}: {e}");
                    map_error(&e)
                }
            },
            Err(e) => {
                let e = map_pipeline_err(e);
                println!("error: {e}");
                warn!("{label}: {e}");
                map_error(&e)
            }
        };
        rc = rc.max(line_rc);
    }
    Ok(rc)
}

fn batch_line_outputs(args: &Args, outs: &PipelineOutputs, line: usize) -> Result<(), MainError> {
    let model = report_model(outs)?;
    print!("{}", render_text(&model));
    if let Some(dir) = &args.out {
        let line_dir: PathBuf = dir.join(format!("line-{line:04}"));
        write_artifacts(&line_dir, outs)?;
        maybe_render_reports(args, &model, &line_dir)?;
    }
    Ok(())
}

fn report_model(outs: &PipelineOutputs) -> Result<ReportModel, MainError> {
    Ok(build_model(&outs.result).map_err(map_report_err)?.with_run(&outs.run_record))
}

fn write_artifacts(out_dir: &Path, outs: &PipelineOutputs) -> Result<(), MainError> {
    let res_path = out_dir.join("result.json");
    canonical_json::write_canonical_file(&outs.result, &res_path)
        .map_err(|e| MainError::Io(format!("write result.json: {e}")))?;

    let run_path = out_dir.join("run_record.json");
    canonical_json::write_canonical_file(&outs.run_record, &run_path)
        .map_err(|e| MainError::Io(format!("write run_record.json: {e}")))?;

    info!(dir = %out_dir.display(), result_id = %outs.result.id, "artifacts written");
    Ok(())
}

fn maybe_render_reports(args: &Args, model: &ReportModel, out_dir: &Path) -> Result<(), MainError> {
    for fmt in &args.render {
        match fmt.as_str() {
            "json" => render_json_report(model, out_dir)?,
            "html" => render_html_report(model, out_dir)?,
            other => return Err(MainError::Render(format!("unknown renderer: {other}"))),
        }
    }
    Ok(())
}

// Always accept the concrete model type; gate body by feature.
fn render_json_report(model: &ReportModel, out_dir: &Path) -> Result<(), MainError> {
    #[cfg(feature = "report-json")]
    {
        let text = wk_report::render_json::render_json(model).map_err(map_report_err)?;
        let path = out_dir.join("report.json");
        canonical_json::write_bytes_atomic(&path, text.as_bytes())
            .map_err(|e| MainError::Io(format!("write report.json: {e}")))?;
        info!(path = %path.display(), "report written");
        Ok(())
    }
    #[cfg(not(feature = "report-json"))]
    {
        let _ = (model, out_dir);
        Err(MainError::Render(
            "json renderer not enabled (build with feature `report-json`)".into(),
        ))
    }
}

fn render_html_report(model: &ReportModel, out_dir: &Path) -> Result<(), MainError> {
    #[cfg(feature = "report-html")]
    {
        let html = wk_report::render_html::render_html(model);
        let path = out_dir.join("report.html");
        canonical_json::write_bytes_atomic(&path, html.as_bytes())
            .map_err(|e| MainError::Io(format!("write report.html: {e}")))?;
        info!(path = %path.display(), "report written");
        Ok(())
    }
    #[cfg(not(feature = "report-html"))]
    {
        let _ = (model, out_dir);
        Err(MainError::Render(
            "html renderer not enabled (build with feature `report-html`)".into(),
        ))
    }
}

/// Map our typed errors to the exit-code table.
fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) | MainError::ZeroWeight(_) => VALIDATION,
        MainError::Io(_) => IO,
        MainError::Internal(_) | MainError::Render(_) => INTERNAL,
    }
}

fn map_io_err(e: IoError) -> MainError {
    match e {
        IoError::Json { pointer, msg } => MainError::Validation(format!("json {pointer}: {msg}")),
        IoError::Invalid(m) => MainError::Validation(m),
        IoError::Path(m) => MainError::Io(format!("path: {m}")),
        IoError::Limit(m) => MainError::Io(format!("limit: {m}")),
        IoError::Hash(m) => MainError::Internal(format!("hash: {m}")),
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    use PipelineError::*;
    match e {
        Schema(m) | Validate(m) => MainError::Validation(m),
        Io(m) => MainError::Io(m),
        Allocate(m) | Build(m) => MainError::Internal(m),
    }
}

fn map_report_err(e: ReportError) -> MainError {
    match e {
        ReportError::Inconsistent(m) => MainError::Internal(format!("report: {m}")),
        ReportError::Render(m) => MainError::Render(m.to_string()),
    }
}
