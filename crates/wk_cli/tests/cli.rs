//! Black-box tests of the `warikan` binary.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

const TS: &str = "2026-10-18T20:00:00Z";

fn warikan() -> Command {
    let mut cmd = Command::cargo_bin("warikan").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn flags_mode_prints_breakdown_and_surplus() {
    warikan()
        .args(["--total", "10000", "--count", "GM=1", "--count", "M=1", "--count", "T=0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GM        20      1        5800      5800  57.4%"))
        .stdout(predicate::str::contains("M         15      1        4300      4300  42.6%"))
        .stdout(predicate::str::contains("organizer surplus (rounding excess): 100"))
        .stdout(predicate::str::contains("T ").not());
}

#[test]
fn rounding_and_preset_flags_apply() {
    warikan()
        .args(["--total", "10000", "--count", "GM=1", "--count", "M=1"])
        .args(["--preset", "classic", "--rounding", "1000"])
        .assert()
        .success()
        // classic: GM 15, M 10 → 6000 / 4000 exactly
        .stdout(predicate::str::contains("preset classic"))
        .stdout(predicate::str::contains("organizer surplus (rounding excess): 0"));
}

#[test]
fn zero_weight_warns_and_exits_2() {
    warikan()
        .args(["--total", "10000", "--count", "GM=0", "--count", "M=0"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("warning: total weight is 0; set participant counts"))
        .stderr(predicate::str::contains("warikan: warning: total weight is 0"));
}

#[test]
fn negative_and_malformed_inputs_are_usage_errors() {
    warikan().args(["--total", "-100"]).assert().code(2);
    warikan().args(["--total", "100", "--count", "GM"]).assert().code(2);
    warikan().args(["--total", "100", "--rounding", "50"]).assert().code(2);
    warikan()
        .args(["--count", "GM=1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing required flag: --total"));
}

#[test]
fn out_of_bounds_count_is_a_validation_error() {
    warikan()
        .args(["--total", "10000", "--count", "GM=11"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("count for GM is 11"));
}

#[test]
fn request_file_writes_artifacts_and_reports() {
    let dir = tempdir().unwrap();
    let req = dir.path().join("request.json");
    fs::write(&req, r#"{"total_amount":10000,"counts":{"GM":1,"M":1}}"#).unwrap();
    let out = dir.path().join("out");

    warikan()
        .arg("--request")
        .arg(&req)
        .arg("--out")
        .arg(&out)
        .args(["--render", "json", "html", "--timestamp", TS])
        .assert()
        .success();

    let result: serde_json::Value =
        serde_json::from_slice(&fs::read(out.join("result.json")).unwrap()).unwrap();
    assert!(result["id"].as_str().unwrap().starts_with("RES:"));
    assert_eq!(result["organizer_surplus"], 100);
    assert_eq!(result["rows"][0]["amount_per_person"], 5800);

    let run: serde_json::Value =
        serde_json::from_slice(&fs::read(out.join("run_record.json")).unwrap()).unwrap();
    assert!(run["id"].as_str().unwrap().starts_with("RUN:2026-10-18T20:00:00Z-"));
    assert_eq!(run["outputs"]["result_id"], result["id"]);
    assert_eq!(run["engine"], serde_json::to_value(wk_pipeline::engine_identifiers()).unwrap());

    let report: serde_json::Value =
        serde_json::from_slice(&fs::read(out.join("report.json")).unwrap()).unwrap();
    assert_eq!(report["summary"]["message"], "organizer surplus (rounding excess): 100");

    let html = fs::read_to_string(out.join("report.html")).unwrap();
    assert!(html.contains("<table>"));
}

#[test]
fn result_is_reproducible_across_runs() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    for out in [&a, &b] {
        warikan()
            .args(["--total", "7300", "--count", "PM=2", "--count", "T=3"])
            .arg("--out")
            .arg(out)
            .args(["--timestamp", TS])
            .assert()
            .success();
    }
    assert_eq!(
        fs::read(a.join("result.json")).unwrap(),
        fs::read(b.join("result.json")).unwrap()
    );
    assert_eq!(
        fs::read(a.join("run_record.json")).unwrap(),
        fs::read(b.join("run_record.json")).unwrap()
    );
}

#[test]
fn missing_request_file_is_rejected() {
    warikan()
        .args(["--request", "does/not/exist.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("file not found"));
}

#[test]
fn malformed_request_json_is_a_validation_error() {
    let dir = tempdir().unwrap();
    let req = dir.path().join("bad.json");
    fs::write(&req, r#"{"total_amount":-5,"counts":{}}"#).unwrap();
    warikan().arg("--request").arg(&req).assert().code(2);
}

#[test]
fn batch_continues_past_bad_lines() {
    let input = "\
{\"id\":\"mon\",\"total_amount\":10000,\"counts\":{\"GM\":1,\"M\":1}}
{\"id\":\"tue\",\"total_amount\":10000,\"counts\":{\"GM\":0}}
oops
{\"id\":\"wed\",\"total_amount\":600,\"counts\":{\"T\":2}}
";
    warikan()
        .args(["--batch", "-"])
        .write_stdin(input)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("== line 1 (mon)"))
        .stdout(predicate::str::contains("warning: total weight is 0; set participant counts"))
        .stdout(predicate::str::contains("== line 3\nerror:"))
        .stdout(predicate::str::contains("== line 4 (wed)"))
        .stdout(predicate::str::contains("organizer surplus (rounding excess): 0"));
}

#[test]
fn batch_writes_one_directory_per_line() {
    let dir = tempdir().unwrap();
    let batch = dir.path().join("bills.jsonl");
    fs::write(
        &batch,
        "# weekly\n{\"total_amount\":3000,\"counts\":{\"M\":1}}\n{\"total_amount\":3000,\"counts\":{\"T\":3}}\n",
    )
    .unwrap();
    let out = dir.path().join("out");

    warikan()
        .arg("--batch")
        .arg(&batch)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("line-0002").join("result.json").is_file());
    assert!(out.join("line-0003").join("run_record.json").is_file());
}

#[test]
fn params_file_changes_default_preset() {
    let dir = tempdir().unwrap();
    let params = dir.path().join("params.json");
    fs::write(&params, r#"{"default_preset":"classic"}"#).unwrap();
    warikan()
        .arg("--params")
        .arg(&params)
        .args(["--total", "1000", "--count", "T=1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("preset classic"));
}

#[test]
fn params_file_with_unknown_default_preset_is_rejected() {
    let dir = tempdir().unwrap();
    let params = dir.path().join("params.json");
    fs::write(&params, r#"{"default_preset":"vip"}"#).unwrap();
    warikan()
        .arg("--params")
        .arg(&params)
        .args(["--total", "1000", "--count", "T=1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown weight preset: vip"));
}

#[test]
fn weight_override_out_of_range_is_a_validation_error() {
    warikan()
        .args(["--total", "10000", "--count", "GM=1", "--weight", "GM=101"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("weight for GM is 101"));
    warikan()
        .args(["--total", "10000", "--count", "GM=1", "--weight", "GM=0"])
        .assert()
        .code(2);
}
