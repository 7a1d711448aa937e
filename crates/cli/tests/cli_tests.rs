// End-to-end tests for the `callbill` binary: exit codes, the --json stdout
// contract, and the artifacts written to disk.
//
// Run with: cargo test -p callbill-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::tempdir;

fn callbill() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_callbill"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("CALLBILL_CONFIG");
    cmd.env_remove("CALLBILL_LOG");
    cmd
}

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../recon/tests/fixtures")
        .join(name)
        .display()
        .to_string()
}

fn run(args: &[&str]) -> Output {
    callbill().args(args).output().expect("spawn callbill")
}

fn code(output: &Output) -> i32 {
    output.status.code().expect("exit code")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Assert stdout is a single, parseable JSON value with no extra lines.
fn assert_single_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "exit code: {:?}\nstderr: {}",
        output.status,
        stderr(output)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty");
    serde_json::from_str(trimmed)
        .unwrap_or_else(|e| panic!("stdout must be valid JSON.\nParse error: {e}\nstdout:\n{trimmed}"))
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ===========================================================================
// --json contract
// ===========================================================================

#[test]
fn toll_free_json_dry_run() {
    let calls = fixture("toll_free_calls.csv");
    let customers = fixture("customers.csv");
    let output = run(&["toll-free", &calls, &customers, "--json", "--dry-run"]);
    let val = assert_single_json(&output);

    assert_eq!(val["meta"]["flow"], "toll_free");
    assert_eq!(val["meta"]["artifact_prefix"], "Toll_Free_Analysis");
    assert_eq!(val["meta"]["mode"], "matched");
    assert_eq!(val["summary"]["output_rows"], 2);
    assert_eq!(val["artifacts"], serde_json::json!([]));

    let sheets = val["sheets"]["sheets"].as_array().expect("sheets array");
    assert_eq!(sheets.len(), 3);
    assert_eq!(sheets[2]["name"], "Billing Details");
    assert_eq!(sheets[2]["rows"][0], serde_json::json!(["Acme", 210, "3.50", "0.12"]));
}

#[test]
fn ani_json_reports_date_range() {
    let week1 = fixture("ani_week1.csv");
    let week2 = fixture("ani_week2.csv");
    let output = run(&[
        "ani", &week1, &week2, "--start", "2025-10-01", "--end", "2025-10-01", "--json", "--dry-run",
    ]);
    let val = assert_single_json(&output);

    assert_eq!(val["meta"]["flow"], "ani_summary");
    assert_eq!(val["summary"]["rejected_date"], 2);
    let rows = val["sheets"]["sheets"][0]["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], serde_json::json!(["2125550001", "150.00", "200.00", "260.00", 2]));
}

// ===========================================================================
// Artifacts
// ===========================================================================

#[test]
fn toll_free_writes_dated_workbook() {
    let dir = tempdir().unwrap();
    let output = run(&[
        "toll-free",
        &fixture("toll_free_calls.csv"),
        &fixture("customers.csv"),
        "--out-dir",
        dir.path().to_str().unwrap(),
    ]);
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));

    let names = file_names(dir.path());
    assert_eq!(names.len(), 1);
    let name = &names[0];
    assert!(name.starts_with("Toll_Free_Analysis_"), "{name}");
    assert!(name.ends_with(".xlsx"), "{name}");
    // Toll_Free_Analysis_YYYY-MM-DD.xlsx
    assert_eq!(name.len(), "Toll_Free_Analysis_".len() + 10 + ".xlsx".len());
    assert!(stderr(&output).contains("wrote "));
}

#[test]
fn ani_filename_carries_date_infix() {
    let dir = tempdir().unwrap();
    let output = run(&[
        "ani",
        &fixture("ani_week1.csv"),
        "--start",
        "2025-10-01",
        "--out-dir",
        dir.path().to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));

    let names = file_names(dir.path());
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("processed_data_2025-10-01_to_end_"), "{}", names[0]);
    assert!(names[0].ends_with(".json"));

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(&names[0])).unwrap()).unwrap();
    assert_eq!(written["meta"]["flow"], "ani_summary");
}

#[test]
fn csv_format_writes_one_file_per_sheet() {
    let dir = tempdir().unwrap();
    let output = run(&[
        "toll-free",
        &fixture("toll_free_calls.csv"),
        &fixture("customers.csv"),
        "--out-dir",
        dir.path().to_str().unwrap(),
        "--format",
        "csv",
    ]);
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));

    let names = file_names(dir.path());
    assert_eq!(names.len(), 3);
    assert!(names.iter().any(|n| n.ends_with("-Billing_Details.csv")));
    assert!(names.iter().any(|n| n.ends_with("-Customer_Info.csv")));
    assert!(names.iter().any(|n| n.ends_with("-Duration_Summary.csv")));
}

#[test]
fn config_directory_is_used_without_out_dir() {
    let dir = tempdir().unwrap();
    let reports = dir.path().join("reports");
    let config = dir.path().join("callbill.toml");
    std::fs::write(
        &config,
        format!("[output]\ndirectory = {:?}\n", reports.display().to_string()),
    )
    .unwrap();

    let output = run(&[
        "compare",
        &fixture("clients.csv"),
        &fixture("compare_calls.csv"),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));

    let names = file_names(&reports);
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("comparison_result_"), "{}", names[0]);
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempdir().unwrap();
    let output = run(&[
        "ani",
        &fixture("ani_week1.csv"),
        "--out-dir",
        dir.path().to_str().unwrap(),
        "--dry-run",
    ]);
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    assert!(file_names(dir.path()).is_empty());
    assert!(stderr(&output).contains("dry run"));
}

// ===========================================================================
// Human output
// ===========================================================================

#[test]
fn preview_prints_primary_sheet() {
    let output = run(&[
        "toll-free",
        &fixture("toll_free_calls.csv"),
        &fixture("customers.csv"),
        "--preview",
        "--dry-run",
    ]);
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "Billing Details");
    assert!(lines[1].starts_with("Customer"));
    assert!(lines[3].starts_with("Acme"));
    assert!(lines[4].starts_with("Globex"));
}

#[test]
fn quiet_run_keeps_stderr_empty() {
    let output = run(&[
        "compare",
        &fixture("clients.csv"),
        &fixture("compare_calls.csv"),
        "--dry-run",
        "--quiet",
    ]);
    assert_eq!(code(&output), 0);
    assert_eq!(stderr(&output), "");
}

#[test]
fn config_check_accepts_valid_file() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("callbill.toml");
    std::fs::write(&config, "[tariff]\nunit_rate = \"0.05\"\n").unwrap();

    let output = run(&["config", "check", config.to_str().unwrap()]);
    assert_eq!(code(&output), 0, "stderr: {}", stderr(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(": ok"));
    assert!(stdout.contains("unit_rate:          0.05"));
}

// ===========================================================================
// Exit codes
// ===========================================================================

#[test]
fn reversed_dates_exit_2() {
    let output = run(&[
        "ani",
        &fixture("ani_week1.csv"),
        "--start",
        "2025-10-07",
        "--end",
        "2025-10-01",
        "--dry-run",
    ]);
    assert_eq!(code(&output), 2);
    assert!(stderr(&output).contains("error: invalid date range"));
    assert!(stderr(&output).contains("hint:"));
}

#[test]
fn unsupported_input_exits_2() {
    let output = run(&["ani", "calls.pdf", "--dry-run"]);
    assert_eq!(code(&output), 2);
    assert!(stderr(&output).contains("unsupported file type 'pdf'"));
}

#[test]
fn missing_column_exits_3() {
    let output = run(&[
        "toll-free",
        &fixture("ani_week1.csv"),
        &fixture("customers.csv"),
        "--dry-run",
    ]);
    assert_eq!(code(&output), 3);
    assert!(stderr(&output).contains("missing required column(s)"));
}

#[test]
fn only_empty_files_exit_4() {
    let output = run(&["ani", &fixture("ani_empty.csv"), "--dry-run"]);
    assert_eq!(code(&output), 4);
}

#[test]
fn no_overlap_exits_5() {
    let dir = tempdir().unwrap();
    let calls = dir.path().join("calls.csv");
    std::fs::write(&calls, "ani,duration,total_amount\n3105550000,60,1.00\n").unwrap();

    let output = run(&["compare", &fixture("clients.csv"), calls.to_str().unwrap(), "--dry-run"]);
    assert_eq!(code(&output), 5);
    assert!(stderr(&output).contains("no billable rows"));
}

#[test]
fn invalid_config_exits_6() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    std::fs::write(&config, "toll_free_prefixes = [\"8000\"]\n").unwrap();

    let output = run(&["config", "check", config.to_str().unwrap()]);
    assert_eq!(code(&output), 6);
    assert!(stderr(&output).contains("exactly 3 digits"));

    let output = run(&[
        "ani",
        &fixture("ani_week1.csv"),
        "--config",
        config.to_str().unwrap(),
        "--dry-run",
    ]);
    assert_eq!(code(&output), 6);
}

#[test]
fn missing_input_exits_7() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.csv");
    let output = run(&["ani", missing.to_str().unwrap(), "--dry-run"]);
    assert_eq!(code(&output), 7);
    assert!(stderr(&output).contains("cannot read"));
}
