//! Integration tests for the matdar search, show and print commands

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

const VOTERS: &str = r#"[
  {"serial_no": 1, "voter_id": "A1", "name_marathi": "Jane Doe",
   "relation_name_marathi": "John Doe", "relation": "Husband",
   "house_no": "12-B", "age": 40, "gender": "F"},
  {"serial_no": 2, "id": "A2", "full_name": "Asha Patil",
   "relation_name": "Ravi Patil", "relation_type": "Father",
   "house_no": "4", "age": "33", "gender": "F", "source_page": 7},
  {"serial_no": 3, "voter_id": "A3", "name_marathi": "Kiran Patil",
   "house_no": "5", "age": 51}
]"#;

/// Test environment with a voter list and an isolated config directory
struct TestEnv {
    temp_dir: TempDir,
    voters_path: PathBuf,
    config_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        Self::with_config("")
    }

    fn with_config(config: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let voters_path = temp_dir.path().join("voters.json");
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&voters_path, VOTERS).unwrap();
        fs::write(&config_path, config).unwrap();
        Self {
            temp_dir,
            voters_path,
            config_path,
        }
    }

    /// Run matdar against this env's voter list and config
    fn matdar(&self) -> AssertCommand {
        let mut cmd = matdar_cmd();
        cmd.env("HOME", self.temp_dir.path())
            .env("XDG_CONFIG_HOME", self.temp_dir.path().join("config"))
            .env("XDG_DATA_HOME", self.temp_dir.path().join("data"))
            .env_remove("MATDAR_LOG")
            .args([
                "--config",
                self.config_path.to_str().unwrap(),
                "--source",
                self.voters_path.to_str().unwrap(),
            ]);
        cmd
    }
}

/// Get the matdar binary command
fn matdar_cmd() -> AssertCommand {
    AssertCommand::cargo_bin("matdar").unwrap()
}

// =============================================================================
// search
// =============================================================================

#[test]
fn test_search_by_name_prints_compact_card() {
    let env = TestEnv::new();
    env.matdar()
        .args(["search", "jane"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Jane Doe"))
        .stdout(predicate::str::contains("House No: 12-B • Age: 40"))
        .stdout(predicate::str::contains("John Doe").not())
        .stdout(predicate::str::contains("Asha Patil").not());
}

#[test]
fn test_search_ignores_case_spaces_and_hyphens() {
    let env = TestEnv::new();
    env.matdar()
        .args(["search", "12b"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Jane Doe"));

    env.matdar()
        .args(["search", "ASHA pat"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Asha Patil"));
}

#[test]
fn test_search_matches_relative_name() {
    let env = TestEnv::new();
    env.matdar()
        .args(["search", "ravi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Asha Patil"))
        .stdout(predicate::str::contains("Kiran Patil").not());
}

#[test]
fn test_search_without_matches() {
    let env = TestEnv::new();
    env.matdar()
        .args(["search", "xyz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches"));
}

#[test]
fn test_empty_query_lists_nothing() {
    let env = TestEnv::new();
    env.matdar()
        .args(["search"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches"));

    env.matdar()
        .args(["search", "  - "])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches"));
}

#[test]
fn test_search_all_keeps_source_order() {
    let env = TestEnv::new();
    let output = env.matdar().args(["search", "--all"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let jane = stdout.find("Jane Doe").unwrap();
    let asha = stdout.find("Asha Patil").unwrap();
    let kiran = stdout.find("Kiran Patil").unwrap();
    assert!(jane < asha && asha < kiran);
}

#[test]
fn test_search_json_normalizes_keys() {
    let env = TestEnv::new();
    let output = env
        .matdar()
        .args(["search", "--json", "patil"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["id"], "A2");
    assert_eq!(records[0]["age"], 33);
    assert_eq!(records[0]["source_page"], 7);
    assert_eq!(records[1]["id"], "A3");
    assert_eq!(records[1]["full_name"], "Kiran Patil");
    assert_eq!(records[1]["relation_name"], "");
}

#[test]
fn test_manual_mode_config_still_searches() {
    let env = TestEnv::with_config("[search]\nmode = \"manual\"\n");
    env.matdar()
        .args(["search", "kiran"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Kiran Patil"));
}

#[test]
fn test_search_fields_restrict_matching() {
    let env = TestEnv::with_config("[search]\nfields = [\"full_name\"]\n");
    env.matdar()
        .args(["search", "ravi"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches"));
}

#[test]
fn test_marathi_labels() {
    let env = TestEnv::with_config("labels = \"marathi\"\n");
    env.matdar()
        .args(["search", "jane"])
        .assert()
        .success()
        .stdout(predicate::str::contains("घर क्रमांक: 12-B"));
}

// =============================================================================
// show
// =============================================================================

#[test]
fn test_show_lists_every_field() {
    let env = TestEnv::new();
    env.matdar()
        .args(["show", "A2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Asha Patil"))
        .stdout(predicate::str::contains("Ravi Patil"))
        .stdout(predicate::str::contains("Father"))
        .stdout(predicate::str::contains("EPIC"))
        .stdout(predicate::str::contains("Source Page"));
}

#[test]
fn test_show_unknown_id_fails() {
    let env = TestEnv::new();
    env.matdar()
        .args(["show", "ZZ9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no voter with id \"ZZ9\""));
}

// =============================================================================
// print
// =============================================================================

#[test]
fn test_print_to_stdout_includes_all_fields() {
    let env = TestEnv::new();
    env.matdar()
        .args(["print", "jane"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Voter List (1 records)"))
        .stdout(predicate::str::contains("Relative Name:"))
        .stdout(predicate::str::contains("John Doe"))
        .stdout(predicate::str::contains("Husband"))
        .stdout(predicate::str::contains("A1"));
}

#[test]
fn test_print_to_file() {
    let env = TestEnv::new();
    let out = env.temp_dir.path().join("out").join("print.txt");
    env.matdar()
        .args(["print", "--all", "--output", out.to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote 3 record(s)"));

    let text = fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("Voter List (3 records)"));
    assert!(text.contains("Kiran Patil"));
}

#[test]
fn test_print_without_matches_writes_nothing() {
    let env = TestEnv::new();
    let out = env.temp_dir.path().join("print.txt");
    env.matdar()
        .args(["print", "--output", out.to_str().unwrap(), "xyz"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches"));
    assert!(!out.exists());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_missing_source_fails() {
    let env = TestEnv::new();
    let missing = env.temp_dir.path().join("absent.json");
    env.matdar()
        .args(["--source", missing.to_str().unwrap(), "search", "jane"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn test_malformed_source_fails() {
    let env = TestEnv::new();
    fs::write(&env.voters_path, "{\"not\": \"a list\"}").unwrap();
    env.matdar()
        .args(["search", "jane"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed voter list"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let env = TestEnv::new();
    let missing = env.temp_dir.path().join("nope.toml");
    matdar_cmd()
        .env("HOME", env.temp_dir.path())
        .args([
            "--config",
            missing.to_str().unwrap(),
            "--source",
            env.voters_path.to_str().unwrap(),
            "search",
            "jane",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn test_key_collision_is_rejected() {
    let env = TestEnv::with_config("[keys.global]\nprint = \"q\"\n");
    env.matdar()
        .args(["search", "jane"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("key binding collision"));
}

#[test]
fn test_unknown_config_key_warns() {
    let env = TestEnv::with_config("colour = \"blue\"\n");
    env.matdar()
        .args(["search", "jane"])
        .assert()
        .success()
        .stderr(predicate::str::contains("unknown configuration key `colour`"));
}
