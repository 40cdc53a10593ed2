#![allow(
    clippy::tests_outside_test_module,
    clippy::missing_assert_message,
    clippy::indexing_slicing,
    reason = "integration test crate: tests sit at the crate root and index fixture output"
)]

use std::path::Path;
use std::process::{Command, Output};

fn linkreload_cmd(fixture: &str) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_linkreload"));
    cmd.current_dir(Path::new("tests/fixtures").join(fixture));
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn library_lists_top_level_candidates_only() {
    let output = linkreload_cmd("library").arg("library").output().unwrap();
    assert!(
        output.status.success(),
        "library failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let out = stdout(&output);
    assert!(out.contains("WallTypeA_v2"), "got: {out}");
    assert!(out.contains("Door.RFA"), "extension match ignores case: {out}");
    assert!(!out.contains("Stair"), "subdirectories are not searched: {out}");
    assert!(!out.contains("notes"), "other extensions are skipped: {out}");
    assert!(out.contains("5 rfa candidates (5 distinct names)"), "got: {out}");
}

#[test]
fn resolve_prefers_exact_family_name() {
    let output = linkreload_cmd("library")
        .args(["resolve", "WallTypeA"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(out.contains("UNIQUE"));
    assert!(out.contains("WallTypeA.rfa"));
    assert!(!out.contains("WallTypeA_v2.rfa"));
}

#[test]
fn resolve_reports_ambiguity_after_normalizing() {
    let output = linkreload_cmd("library")
        .args(["resolve", "Grid-Rev3"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let out = stdout(&output);
    assert!(out.contains("Grid-Rev3 -> Grid"), "got: {out}");
    assert!(out.contains("AMBIGUOUS"));
    assert!(out.contains("Grid-A.rfa"));
    assert!(out.contains("Grid-B.rfa"));
}

#[test]
fn resolve_unknown_name_is_not_found() {
    let output = linkreload_cmd("library")
        .args(["resolve", "Stair"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(stdout(&output).contains("NOT FOUND  Stair"));
}

#[test]
fn resolve_cad_link_uses_configured_extension() {
    let output = linkreload_cmd("library")
        .args(["resolve", "--kind", "cad", "Site"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("Site.dwg"));
}

#[test]
fn report_summarizes_hosts() {
    let output = linkreload_cmd("library")
        .args(["report", "families.tsv"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let out = stdout(&output);
    assert!(out.starts_with("HOSTFILE\tID\tFAMILYNAME"));
    assert!(out.contains("Tower.rvt"));
    assert!(out.contains("Annex.rvt"));
    assert!(out.contains("3 records"));
}

#[test]
fn report_filters_by_host() {
    let output = linkreload_cmd("library")
        .args(["report", "families.tsv", "--host", "C:\\Projects\\Annex.rvt"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let out = stdout(&output);
    assert_eq!(out.lines().count(), 2, "header plus one record: {out}");
    assert!(!out.contains("Door"));
}

#[test]
fn missing_report_is_an_error() {
    let output = linkreload_cmd("library")
        .args(["report", "nope.tsv"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}

#[test]
fn plan_passes_when_every_name_resolves() {
    let output = linkreload_cmd("library")
        .args(["plan", "families.tsv", "--kind", "family"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "plan failed: {}",
        stdout(&output)
    );
    assert!(stdout(&output).contains("All 3 references resolve uniquely"));
}

#[test]
fn plan_flags_unresolved_names() {
    let output = linkreload_cmd("library")
        .args(["plan", "unresolved.tsv", "--kind", "family"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let out = stdout(&output);
    assert!(out.contains("AMBIGUOUS  Grid-Rev3 -> ambiguous"), "got: {out}");
    assert!(out.contains("NO MATCH   Stair -> not found"), "got: {out}");
    assert!(out.contains("2 of 3 references cannot be reloaded"));
}

#[test]
fn plan_with_column_past_every_record_fails() {
    let output = linkreload_cmd("library")
        .args(["plan", "families.tsv", "--kind", "family", "--column", "20"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let out = stdout(&output);
    assert_eq!(out.matches("NO NAME").count(), 3, "got: {out}");
    assert!(out.contains("3 of 3 references cannot be reloaded"), "got: {out}");
}

#[test]
fn plan_counts_short_records_as_unresolved() {
    let output = linkreload_cmd("library")
        .args(["plan", "short.tsv", "--kind", "family"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let out = stdout(&output);
    assert!(out.contains("RELOAD     WallTypeA"), "got: {out}");
    assert!(out.contains("NO NAME    C:\\Projects\\Annex.rvt (column 2)"), "got: {out}");
    assert!(out.contains("1 of 2 references cannot be reloaded"), "got: {out}");
}
