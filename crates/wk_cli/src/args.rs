// crates/wk_cli/src/args.rs
//
// Offline CLI argument surface: clap types, value parsers, and the checks
// clap cannot express (mode selection, local paths, file existence).
//
// Rules:
// - Exactly one input mode: flags (--total/--count/--weight), --request FILE,
//   or --batch FILE|-
// - --preset / --rounding override whatever the request says
// - No networked paths (reject any scheme:// like http/https/file)
// - --render needs --out

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use clap::Parser;

use wk_core::{RankId, RoundingUnit};
use wk_io::looks_like_url_strict;

/// Parsed CLI arguments (raw).
#[derive(Debug, Parser, Clone)]
#[command(
    name = "warikan",
    version,
    disable_help_subcommand = true,
    about = "Split a bill across ranks by weight, rounding every share up"
)]
pub struct Args {
    // --- Flag mode ---
    /// Bill total (non-negative integer).
    #[arg(long, conflicts_with_all = ["request", "batch"])]
    pub total: Option<u64>,
    /// Participants of a rank, e.g. `--count GM=1`. Repeatable.
    #[arg(long = "count", value_name = "RANK=N", value_parser = parse_rank_pair,
          conflicts_with_all = ["request", "batch"])]
    pub counts: Vec<(RankId, u32)>,
    /// Weight override for a rank, e.g. `--weight T=3`. Repeatable.
    #[arg(long = "weight", value_name = "RANK=W", value_parser = parse_rank_pair,
          conflicts_with_all = ["request", "batch"])]
    pub weights: Vec<(RankId, u32)>,

    // --- File modes ---
    /// Bill request JSON path.
    #[arg(long, conflicts_with = "batch")]
    pub request: Option<PathBuf>,
    /// JSON-lines file of bill requests (`-` for stdin).
    #[arg(long)]
    pub batch: Option<PathBuf>,

    // --- Configuration ---
    /// Weight preset name (overrides the request and the parameter-set default).
    #[arg(long)]
    pub preset: Option<String>,
    /// Rounding unit: 10, 100 or 1000.
    #[arg(long, value_parser = parse_rounding)]
    pub rounding: Option<RoundingUnit>,
    /// Parameter set JSON path (roster, presets, bounds).
    #[arg(long)]
    pub params: Option<PathBuf>,

    // --- Output & rendering ---
    /// Output directory for result.json / run_record.json / reports.
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Renderer(s) to emit into --out. Choose up to 2 (json, html).
    #[arg(long, value_parser = ["json", "html"], num_args = 0..=2)]
    pub render: Vec<String>,

    // --- Control ---
    /// Run timestamp (RFC3339); defaults to now.
    #[arg(long, value_parser = parse_timestamp)]
    pub timestamp: Option<String>,
    /// Only print errors to stderr.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,
    /// Debug logging to stderr.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

/// Where the bill(s) come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Flags,
    Request(PathBuf),
    Batch(PathBuf),
}

impl Args {
    pub fn mode(&self) -> Mode {
        if let Some(p) = &self.request {
            Mode::Request(p.clone())
        } else if let Some(p) = &self.batch {
            Mode::Batch(p.clone())
        } else {
            Mode::Flags
        }
    }
}

/// Errors surfaced by argument validation.
/// Keep messages short/stable (handy for scripts/tests).
#[derive(Debug, PartialEq, Eq)]
pub enum CliError {
    Missing(&'static str),
    BadCombo(&'static str),
    NonLocalPath(String),
    NotFound(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CliError::*;
        match self {
            Missing(s) => write!(f, "missing required flag: {s}"),
            BadCombo(s) => write!(f, "invalid flag combination: {s}"),
            NonLocalPath(p) => write!(f, "path must be local file (no scheme): {p}"),
            NotFound(p) => write!(f, "file not found: {p}"),
        }
    }
}
impl std::error::Error for CliError {}

/// `RANK=N` with a valid rank token and a non-negative integer.
pub fn parse_rank_pair(s: &str) -> Result<(RankId, u32), String> {
    let (rank, n) = s
        .split_once('=')
        .ok_or_else(|| format!("expected RANK=N, got `{s}`"))?;
    let rank = rank
        .trim()
        .parse::<RankId>()
        .map_err(|_| format!("invalid rank `{}`", rank.trim()))?;
    let n = n
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("`{}` is not a non-negative integer", n.trim()))?;
    Ok((rank, n))
}

pub fn parse_rounding(s: &str) -> Result<RoundingUnit, String> {
    match s.trim() {
        "10" => Ok(RoundingUnit::TEN),
        "100" => Ok(RoundingUnit::HUNDRED),
        "1000" => Ok(RoundingUnit::THOUSAND),
        other => Err(format!("rounding unit must be 10, 100 or 1000 (got `{other}`)")),
    }
}

/// Any RFC3339 instant, normalized to `YYYY-MM-DDTHH:MM:SSZ`.
pub fn parse_timestamp(s: &str) -> Result<String, String> {
    s.trim()
        .parse::<DateTime<Utc>>()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .map_err(|e| format!("invalid RFC3339 timestamp `{s}`: {e}"))
}

/// Entry point used by main.rs. clap reports its own usage errors (exit 2).
pub fn parse_and_validate() -> Result<Args, CliError> {
    validate(Args::parse())
}

/// Checks clap cannot express.
pub fn validate(args: Args) -> Result<Args, CliError> {
    for p in iter_all_paths(&args) {
        ensure_local_path(p)?;
    }

    match args.mode() {
        Mode::Flags => {
            if args.total.is_none() {
                return Err(CliError::Missing("--total (or --request / --batch)"));
            }
        }
        Mode::Request(p) => ensure_local_exists(&p, "--request")?,
        Mode::Batch(p) => {
            if p.as_os_str() != "-" {
                ensure_local_exists(&p, "--batch")?;
            }
        }
    }
    if let Some(p) = &args.params {
        ensure_local_exists(p, "--params")?;
    }
    if !args.render.is_empty() && args.out.is_none() {
        return Err(CliError::BadCombo("--render requires --out"));
    }
    Ok(args)
}

/// Ensure a provided path string is local (no scheme); existence is checked separately.
#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if looks_like_url_strict(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

/// Ensure a path is local (no scheme) and exists as a regular file.
fn ensure_local_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    ensure_local_path(p)?;
    let meta = fs::metadata(p).map_err(|_| CliError::NotFound(format!("{label} {}", p.display())))?;
    if !meta.is_file() {
        return Err(CliError::NotFound(format!("{label} {}", p.display())));
    }
    Ok(())
}

/// All path-like flags (including `--out`) for scheme checks.
fn iter_all_paths(args: &Args) -> impl Iterator<Item = &Path> {
    [
        args.request.as_deref(),
        args.batch.as_deref(),
        args.params.as_deref(),
        args.out.as_deref(),
    ]
    .into_iter()
    .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Args, CliError> {
        let mut full = vec!["warikan"];
        full.extend_from_slice(argv);
        validate(Args::try_parse_from(full).expect("clap parse"))
    }

    #[test]
    fn rank_pairs_parse() {
        assert_eq!(parse_rank_pair("GM=1").unwrap(), ("GM".parse().unwrap(), 1));
        assert_eq!(parse_rank_pair(" T = 10 ").unwrap(), ("T".parse().unwrap(), 10));
        assert!(parse_rank_pair("GM").is_err());
        assert!(parse_rank_pair("GM=-1").is_err());
        assert!(parse_rank_pair("G M=1").is_err());
        assert!(parse_rank_pair("GM=x").is_err());
    }

    #[test]
    fn rounding_choices_only() {
        assert_eq!(parse_rounding("1000").unwrap(), RoundingUnit::THOUSAND);
        assert!(parse_rounding("50").is_err());
        assert!(parse_rounding("0").is_err());
    }

    #[test]
    fn timestamps_normalize() {
        assert_eq!(parse_timestamp("2026-10-18T21:00:00+02:00").unwrap(), "2026-10-18T19:00:00Z");
        assert!(parse_timestamp("tomorrow").is_err());
    }

    #[test]
    fn flag_mode_collects_repeats() {
        let a = parse(&["--total", "10000", "--count", "GM=1", "--count", "M=1", "--weight", "T=3"]).unwrap();
        assert_eq!(a.mode(), Mode::Flags);
        assert_eq!(a.counts.len(), 2);
        assert_eq!(a.weights, vec![("T".parse().unwrap(), 3)]);
    }

    #[test]
    fn flag_mode_needs_total() {
        assert_eq!(parse(&["--count", "GM=1"]).unwrap_err(), CliError::Missing("--total (or --request / --batch)"));
    }

    #[test]
    fn request_conflicts_with_flags() {
        let argv = ["warikan", "--request", "r.json", "--total", "1"];
        assert!(Args::try_parse_from(argv).is_err());
        let argv = ["warikan", "--request", "r.json", "--batch", "b.jsonl"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn paths_must_be_local_and_exist() {
        assert!(matches!(parse(&["--request", "https://x/r.json"]), Err(CliError::NonLocalPath(_))));
        assert!(matches!(parse(&["--request", "no/such/file.json"]), Err(CliError::NotFound(_))));
        assert!(parse(&["--batch", "-"]).is_ok());
    }

    #[test]
    fn render_requires_out() {
        assert_eq!(
            parse(&["--total", "1", "--render", "json"]).unwrap_err(),
            CliError::BadCombo("--render requires --out")
        );
        assert!(parse(&["--total", "1", "--render", "json", "html", "--out", "o"]).is_ok());
    }

    #[test]
    fn negative_total_is_rejected_by_clap() {
        assert!(Args::try_parse_from(["warikan", "--total", "-100"]).is_err());
    }
}
