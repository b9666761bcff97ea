//! Integration tests for dfq CLI.

use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn dfq_cmd(root: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_dfq"));
    cmd.env("DOCFILTER_ROOT", root);
    cmd.env_remove("RUST_LOG");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn insert(root: &std::path::Path, collection: &str, input: &str) -> Output {
    let mut child = dfq_cmd(root)
        .args(["insert", collection])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn dfq insert");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().expect("failed to wait for dfq insert");
    assert!(output.status.success(), "dfq insert failed: {:?}", output);
    output
}

fn seed(root: &std::path::Path) {
    insert(
        root,
        "people",
        concat!(
            r#"{"name": "ada", "age": 36, "scores": [88, 92]}"#,
            "\n",
            r#"{"name": "bob", "age": 25, "scores": [70]}"#,
            "\n",
            r#"{"name": "cy", "age": 41}"#,
            "\n",
        ),
    );
}

#[test]
fn test_filter_prints_document() {
    let tmp = TempDir::new().unwrap();
    let output = dfq_cmd(tmp.path())
        .args(["filter", "age>=18 age<65 scores{>=80}"])
        .output()
        .expect("failed to run dfq filter");

    assert!(output.status.success());
    let printed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(
        printed,
        serde_json::json!({
            "age": {"$gte": 18, "$lt": 65},
            "scores": {"$elemMatch": {"$gte": 80}}
        })
    );
}

#[test]
fn test_filter_wire() {
    let tmp = TempDir::new().unwrap();
    let output = dfq_cmd(tmp.path())
        .args(["filter", "--wire", "age>1 tags==[a]"])
        .output()
        .expect("failed to run dfq filter");

    assert!(output.status.success());
    let lines: Vec<serde_json::Value> = stdout(&output)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(
        lines,
        vec![
            serde_json::json!({"key": "age", "value": {"$gt": 1}}),
            serde_json::json!({"key": "tags", "value": ["a"]}),
        ]
    );
}

#[test]
fn test_filter_parse_error_exits_nonzero() {
    let tmp = TempDir::new().unwrap();
    let output = dfq_cmd(tmp.path())
        .args(["filter", "age 5"])
        .output()
        .expect("failed to run dfq filter");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Parse error at offset 3"));
}

#[test]
fn test_insert_prints_ids() {
    let tmp = TempDir::new().unwrap();
    let output = insert(tmp.path(), "people", r#"[{"name": "a"}, {"name": "b"}]"#);
    assert_eq!(stdout(&output).lines().collect::<Vec<_>>(), vec!["1", "2"]);

    // Ids keep counting across runs
    let output = insert(tmp.path(), "people", r#"{"name": "c"}"#);
    assert_eq!(stdout(&output).trim(), "3");
    assert!(tmp.path().join("collections/people.jsonl").exists());
}

#[test]
fn test_find_with_sort_and_fields() {
    let tmp = TempDir::new().unwrap();
    seed(tmp.path());

    let output = dfq_cmd(tmp.path())
        .args(["find", "people", "age>30", "--sort", "-age", "--fields", "name"])
        .output()
        .expect("failed to run dfq find");

    assert!(output.status.success(), "{:?}", output);
    assert_eq!(
        stdout(&output).lines().collect::<Vec<_>>(),
        vec![r#"{"name":"cy"}"#, r#"{"name":"ada"}"#]
    );
}

#[test]
fn test_find_elem_match() {
    let tmp = TempDir::new().unwrap();
    seed(tmp.path());

    let output = dfq_cmd(tmp.path())
        .args(["find", "people", "scores{>=90}", "-f", "name", "--one"])
        .output()
        .expect("failed to run dfq find");

    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), r#"{"name":"ada"}"#);
}

#[test]
fn test_count() {
    let tmp = TempDir::new().unwrap();
    seed(tmp.path());

    let output = dfq_cmd(tmp.path())
        .args(["count", "people", "scores:exists=true"])
        .output()
        .expect("failed to run dfq count");
    assert_eq!(stdout(&output).trim(), "2");

    let output = dfq_cmd(tmp.path())
        .args(["count", "people"])
        .output()
        .expect("failed to run dfq count");
    assert_eq!(stdout(&output).trim(), "3");
}

#[test]
fn test_update_and_delete() {
    let tmp = TempDir::new().unwrap();
    seed(tmp.path());

    let output = dfq_cmd(tmp.path())
        .args(["update", "people", "age<30", "--set", r#"{"junior": true}"#])
        .output()
        .expect("failed to run dfq update");
    assert!(output.status.success());
    assert!(stdout(&output).contains("Updated 1"));

    let output = dfq_cmd(tmp.path())
        .args(["delete", "people", "junior=true"])
        .output()
        .expect("failed to run dfq delete");
    assert!(output.status.success());
    assert!(stdout(&output).contains("Deleted 1"));

    let output = dfq_cmd(tmp.path())
        .args(["count", "people"])
        .output()
        .expect("failed to run dfq count");
    assert_eq!(stdout(&output).trim(), "2");
}

#[test]
fn test_config_init() {
    let tmp = TempDir::new().unwrap();
    let output = dfq_cmd(tmp.path())
        .args(["config", "--init"])
        .output()
        .expect("failed to run dfq config");

    assert!(output.status.success());
    assert!(tmp.path().join("config.toml").exists());
    assert!(stdout(&output).contains("id_field = id"));
}

#[test]
fn test_insert_rejects_unsafe_collection_name() {
    let tmp = TempDir::new().unwrap();
    let mut child = dfq_cmd(tmp.path())
        .args(["insert", "a/b"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn dfq insert");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(br#"{"x": 1}"#)
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid collection name"));
    assert!(!tmp.path().join("collections").exists());
}
