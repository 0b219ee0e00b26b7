//! Integration tests for the armonik CLI.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn armonik_cmd(config_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_armonik"));
    cmd.env("ARMONIK_CLI_CONFIG", config_dir.join("config.toml"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run(config_dir: &Path, args: &[&str]) -> Output {
    armonik_cmd(config_dir)
        .args(args)
        .output()
        .expect("failed to run armonik")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_filter_json() {
    let tmp = TempDir::new().unwrap();
    let output = run(
        tmp.path(),
        &["filter", "session", "session_id = id and status != running"],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let clause = &json["or"][0]["and"];
    assert_eq!(clause[0]["field"]["name"], "session_id");
    assert_eq!(clause[0]["operator"], "equal");
    assert_eq!(clause[0]["value"], "id");
    assert_eq!(clause[1]["operator"], "not_equal");
    assert_eq!(clause[1]["value"]["name"], "RUNNING");
    assert_eq!(clause[1]["value"]["code"], 1);
}

#[test]
fn test_filter_text() {
    let tmp = TempDir::new().unwrap();
    let output = run(
        tmp.path(),
        &["filter", "tasks", "status = Completed OR options['tier'] = 'gold plan'", "-f", "text"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output).trim(),
        "status = completed or options.tier = 'gold plan'"
    );
}

#[test]
fn test_filter_table() {
    let tmp = TempDir::new().unwrap();
    let output = run(
        tmp.path(),
        &["filter", "result", "(size > 10 or size < 2) and name contains out", "--format", "table"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    let rows: Vec<&str> = text.lines().skip(2).collect();
    assert_eq!(rows.len(), 4);
    assert!(rows[0].starts_with("1 "));
    assert!(rows[3].starts_with("2 "));
    assert!(rows[3].contains("contains"));
}

#[test]
fn test_filter_yaml_matches_json() {
    let tmp = TempDir::new().unwrap();
    let expression = "status = completed or (size >= 10 and name startswith out)";
    let json = run(tmp.path(), &["filter", "result", expression, "-f", "json"]);
    let yaml = run(tmp.path(), &["filter", "result", expression, "-f", "yaml"]);
    assert!(yaml.status.success(), "{}", stderr(&yaml));

    let text = stdout(&yaml);
    assert!(text.starts_with("or:"), "{}", text);
    assert!(text.contains("operator: starts_with"), "{}", text);

    let from_yaml: serde_json::Value = serde_yaml_ng::from_str(&text).unwrap();
    let from_json: serde_json::Value = serde_json::from_str(&stdout(&json)).unwrap();
    assert_eq!(from_yaml, from_json);
}

#[test]
fn test_filter_too_many_clauses() {
    let tmp = TempDir::new().unwrap();
    let expression = vec!["(size = 1 or size = 2)"; 11].join(" and ");

    for format in ["json", "yaml", "table"] {
        let output = run(tmp.path(), &["filter", "result", &expression, "-f", format]);
        assert_eq!(output.status.code(), Some(6), "{}: {}", format, stderr(&output));
        assert!(stderr(&output).contains("more than 1024 OR-clauses"), "{}", stderr(&output));
        assert!(output.stdout.is_empty());
    }

    // The canonical text form does not expand clauses.
    let output = run(tmp.path(), &["filter", "result", &expression, "-f", "text"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let ten = vec!["(size = 1 or size = 2)"; 10].join(" and ");
    let output = run(tmp.path(), &["filter", "result", &ten, "-f", "json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json["or"].as_array().unwrap().len(), 1024);
}

#[test]
fn test_exit_codes() {
    let tmp = TempDir::new().unwrap();
    for (args, code) in [
        (vec!["filter", "worker", "id = x"], 2),
        (vec!["filter", "session", "session_id = string with space"], 3),
        (vec!["filter", "session", "unknown_field = x"], 4),
        (vec!["filter", "session", "status = walking"], 5),
        (vec!["filter", "session", "session_id = x", "-f", "xml"], 1),
    ] {
        let output = run(tmp.path(), &args);
        assert_eq!(output.status.code(), Some(code), "{:?}: {}", args, stderr(&output));
        assert!(stderr(&output).starts_with("Error: "), "{:?}", args);
    }
}

#[test]
fn test_debug_flag_overrides_rust_log() {
    let tmp = TempDir::new().unwrap();
    let args = ["filter", "session", "session_id = a", "-f", "text"];

    let output = armonik_cmd(tmp.path())
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .unwrap();
    assert!(stderr(&output).is_empty(), "{}", stderr(&output));

    let output = armonik_cmd(tmp.path())
        .env("RUST_LOG", "off")
        .arg("--debug")
        .args(args)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stderr(&output).contains("Compiled 1 conditions for"), "{}", stderr(&output));
}

#[test]
fn test_syntax_error_points_at_token() {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["filter", "session", "session_id = string with space"]);
    let err = stderr(&output);
    assert!(err.contains("unexpected 'with' at column 21"), "{}", err);
    assert!(err.contains("session_id = string with space\n                    ^"), "{}", err);
}

#[test]
fn test_grammar() {
    let tmp = TempDir::new().unwrap();
    let first = run(tmp.path(), &["grammar", "partition"]);
    let second = run(tmp.path(), &["grammar", "Partition"]);
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    let text = stdout(&first);
    assert!(text.contains("\"priority\" generic_comp SIGNED_INT -> priority"));
    assert!(!text.contains("pod_configuration"));
}

#[test]
fn test_fields_json() {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["fields", "session", "-f", "json"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let json: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let fields = json.as_array().unwrap();
    assert_eq!(fields[0]["name"], "session_id");
    let status = fields.iter().find(|f| f["name"] == "status").unwrap();
    assert_eq!(status["operators"], serde_json::json!(["=", "!="]));
    assert!(status["values"].as_array().unwrap().contains(&serde_json::json!("running")));
    assert!(fields.iter().all(|f| f["name"] != "partition_ids"));
    assert!(fields.iter().any(|f| f["name"] == "options.<key>"));
}

#[test]
fn test_fields_yaml() {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["fields", "session", "-f", "yaml"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let fields: serde_json::Value = serde_yaml_ng::from_str(&stdout(&output)).unwrap();
    let status = fields
        .as_array()
        .unwrap()
        .iter()
        .find(|f| f["name"] == "status")
        .unwrap();
    assert_eq!(status["operators"], serde_json::json!(["=", "!="]));
}

#[test]
fn test_fields_table() {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["fields", "result"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.lines().any(|l| l.starts_with("size") && l.contains("NUMBER")));
    assert!(text.contains("Status values: unspecified, created"));
}

#[test]
fn test_config_set_get() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["config", "set", "output", "text"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(tmp.path().join("config.toml").exists());

    let output = run(tmp.path(), &["config", "get", "output"]);
    assert_eq!(stdout(&output).trim(), "text");

    let output = run(tmp.path(), &["config", "list"]);
    assert_eq!(stdout(&output), "endpoint=\noutput=text\n");

    // Filter falls back to the configured format.
    let output = run(tmp.path(), &["filter", "session", "session_id = a"]);
    assert_eq!(stdout(&output).trim(), "session_id = a");

    let output = run(tmp.path(), &["config", "set", "output", "yaml"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let output = run(tmp.path(), &["filter", "session", "session_id = a"]);
    assert!(stdout(&output).contains("value: a"), "{}", stdout(&output));
}

#[test]
fn test_config_explicit_path() {
    let tmp = TempDir::new().unwrap();
    let custom = tmp.path().join("other/armonik.toml");
    let custom_arg = custom.to_str().unwrap();

    let output = run(
        tmp.path(),
        &["--config", custom_arg, "config", "set", "endpoint", "http://cp:5001"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(custom.exists());
    assert!(!tmp.path().join("config.toml").exists());

    let output = run(tmp.path(), &["config", "show", "-c", custom_arg]);
    let text = stdout(&output);
    assert!(text.contains("armonik.toml"));
    assert!(text.contains("http://cp:5001"));
}

#[test]
fn test_config_unknown_key() {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["config", "get", "colour"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Unknown config key 'colour'"));
}
