#![cfg(feature = "cli_api")]

use assert_cmd::Command;
use predicates::str::contains as str_contains;
use tempfile::NamedTempFile;

const SETUP: &str = "range 2024-01-01 2024-01-31\n\
resource add r1 person 8 50 Alice Example\n\
alloc add r1 t1 6 2024-01-15 2024-01-20 75\n\
alloc add r1 t2 8 2024-01-18 2024-01-25\n";

#[allow(deprecated)]
fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.write_stdin(script.to_string()).assert()
}

#[test]
fn cli_adds_resources_and_allocations() {
    run_cli(&format!("{SETUP}show\nquit\n"))
        .success()
        .stdout(str_contains("Resource r1 added."))
        .stdout(str_contains("Allocation of task t2 to r1 added."))
        .stdout(str_contains("Alice Example"));
}

#[test]
fn cli_analyze_prints_summary() {
    run_cli(&format!("{SETUP}analyze\nquit\n"))
        .success()
        .stdout(str_contains("window=2024-01-01..2024-01-31"))
        .stdout(str_contains("conflicts=3"))
        .stdout(str_contains("high=3"));
}

#[test]
fn cli_conflicts_table_lists_overloaded_days() {
    let assert = run_cli(&format!("{SETUP}conflicts\nquit\n")).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    for day in ["2024-01-18", "2024-01-19", "2024-01-20"] {
        assert!(output.contains(day), "missing {day} in:\n{output}");
    }
    assert!(!output.contains("2024-01-21"));
    assert!(output.contains("t1,t2"));
}

#[test]
fn cli_reports_utilization_for_a_day() {
    run_cli(&format!("{SETUP}util r1 2024-01-19\nutil r1 2024-01-16\nquit\n"))
        .success()
        .stdout(str_contains("r1 on 2024-01-19: 14.00h (100.0%) OVERLOADED"))
        .stdout(str_contains("r1 on 2024-01-16: 6.00h (75.0%)"));
}

#[test]
fn cli_rejects_allocation_for_unknown_resource() {
    run_cli("alloc add ghost t1 4 2024-01-01 2024-01-02 50\nquit\n")
        .success()
        .stdout(str_contains("unknown resource_id 'ghost'"));
}

#[test]
fn cli_rejects_zero_capacity() {
    run_cli("resource add r1 person 0\nquit\n")
        .success()
        .stdout(str_contains("daily_capacity must be a positive number"));
}

#[test]
fn cli_reports_reversed_range() {
    run_cli("range 2024-02-10 2024-02-01\nquit\n")
        .success()
        .stdout(str_contains("is before range start"));
}

#[test]
fn cli_removing_resource_drops_its_conflicts() {
    run_cli(&format!("{SETUP}resource remove r1\nconflicts\nquit\n"))
        .success()
        .stdout(str_contains("Removed resource r1."))
        .stdout(str_contains("No conflicts between 2024-01-01 and 2024-01-31."));
}

#[test]
fn cli_save_and_load_json_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    let script = format!(
        "{SETUP}save json {path}\nresource add temp equipment 24\nload json {path}\nshow\nquit\n"
    );
    let assert = run_cli(&script).success();
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(output.contains("Portfolio loaded from"));
    let after_reload = output
        .split("Portfolio loaded from")
        .last()
        .unwrap_or_default();
    assert!(after_reload.contains("Alice Example"));
    assert!(
        !after_reload.contains("temp"),
        "temporary resource should not appear after reload:\n{}",
        after_reload
    );
}

#[test]
fn cli_save_and_load_csv_round_trip() {
    let tmp = NamedTempFile::new().expect("create temp file");
    let path = tmp.path().to_string_lossy().to_string();
    run_cli(&format!(
        "{SETUP}save csv {path}\nalloc remove r1 t2\nload csv {path}\nanalyze\nquit\n"
    ))
    .success()
    .stdout(str_contains("Removed 1 allocation(s)."))
    .stdout(str_contains("conflicts=3"));
}

#[test]
fn cli_config_load_changes_severity() {
    let mut tmp = NamedTempFile::new().expect("create temp file");
    std::io::Write::write_all(
        &mut tmp,
        br#"{"severity": {"low_max": 6.0, "medium_max": 10.0}}"#,
    )
    .unwrap();
    let path = tmp.path().to_string_lossy().to_string();
    run_cli(&format!("{SETUP}config load {path}\nanalyze\nquit\n"))
        .success()
        .stdout(str_contains("Config loaded from"))
        .stdout(str_contains("low=3"));
}

#[test]
fn cli_unknown_command_hints_help() {
    run_cli("frobnicate\nquit\n")
        .success()
        .stdout(str_contains("Unknown command. Type 'help'."));
}
