use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

fn wbmap(store: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("wbmap").unwrap();
    cmd.arg("--store-dir").arg(store);
    cmd
}

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("wbmap").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("wbmap"))
        .stdout(predicate::str::contains("filter"));
}

#[test]
fn filter_by_query_lists_matches() {
    let dir = tempdir().unwrap();
    wbmap(dir.path())
        .args(["filter", "--query", "United"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 countries found"))
        .stdout(predicate::str::contains("United Kingdom"))
        .stdout(predicate::str::contains("United Arab Emirates"))
        .stdout(predicate::str::contains("Nigeria").not());
}

#[test]
fn filter_by_region_and_query() {
    let dir = tempdir().unwrap();
    wbmap(dir.path())
        .args(["filter", "--region", "Africa", "--query", "nigeria"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 countries found"))
        .stdout(predicate::str::contains("ng  Nigeria"));
}

#[test]
fn filter_rejects_unknown_region() {
    let dir = tempdir().unwrap();
    wbmap(dir.path())
        .args(["filter", "--region", "Atlantis"])
        .assert()
        .failure();
}

#[test]
fn restore_with_empty_store() {
    let dir = tempdir().unwrap();
    wbmap(dir.path())
        .arg("restore")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved selection."));
}

#[test]
fn restore_reports_code_without_profile() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("selected-country-code.json"), "de").unwrap();
    wbmap(dir.path())
        .arg("restore")
        .assert()
        .success()
        .stdout(predicate::str::contains("Selected de"));
}

#[test]
fn restore_drops_expired_profile() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("selected-country-code.json"), "de").unwrap();
    std::fs::write(
        dir.path().join("selected-country-profile.json"),
        r#"{"name":"Germany","capital":"Berlin","region":"Europe & Central Asia","incomeLevel":"High income","longitude":"13.4115","latitude":"52.5235","savedAt":"2001-01-01T00:00:00Z"}"#,
    )
    .unwrap();
    wbmap(dir.path())
        .arg("restore")
        .assert()
        .success()
        .stdout(predicate::str::contains("expired"));
    assert!(!dir.path().join("selected-country-code.json").exists());
    assert!(!dir.path().join("selected-country-profile.json").exists());
}

#[test]
fn clear_forgets_saved_selection() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("selected-country-code.json"), "fr").unwrap();
    wbmap(dir.path())
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("Selection cleared."));
    assert!(!dir.path().join("selected-country-code.json").exists());
}

#[test]
fn retry_without_selection() {
    let dir = tempdir().unwrap();
    wbmap(dir.path())
        .arg("retry")
        .assert()
        .success()
        .stdout(predicate::str::contains("No saved selection to retry."));
}

#[test]
fn select_fails_cleanly_when_api_unreachable() {
    let dir = tempdir().unwrap();
    wbmap(dir.path())
        .args(["--base-url", "http://127.0.0.1:9", "select", "fr", "--wait", "20"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load country information"));
    // the selection itself is kept so it can be retried
    assert!(dir.path().join("selected-country-code.json").exists());
}

#[test]
fn invalid_country_code_is_reported() {
    let dir = tempdir().unwrap();
    wbmap(dir.path())
        .args(["select", "usa"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid country code \"usa\""));
}

#[test]
fn export_requires_output_path() {
    let dir = tempdir().unwrap();
    wbmap(dir.path())
        .args(["export", "br"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--out"));
}

// Live test (opt-in): cargo test --features online
#[cfg(feature = "online")]
#[test]
fn select_online_germany() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("gdp.csv");
    wbmap(dir.path())
        .args(["select", "de", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Berlin"));
    assert!(out.exists());
}
