//! End-to-end tests for the CLI commands.
//!
//! Each test runs the binary inside a temp directory so no stray
//! `.lingomark/config.toml` leaks between tests.

// Allow deprecated cargo_bin usage until assert_cmd updates API
#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Manifest directory (project root).
fn manifest_dir() -> &'static str {
    env!("CARGO_MANIFEST_DIR")
}

/// Copy the sample tutor reply into a fresh temp directory.
fn setup_reply() -> TempDir {
    let dir = tempfile::tempdir().expect("create tempdir");
    let fixture = format!("{}/fixtures/replies/sample_reply.md", manifest_dir());
    fs::copy(&fixture, dir.path().join("reply.md")).expect("copy fixture");
    dir
}

/// Build a command pointing at the tempdir.
fn lingomark(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("lingomark").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let out = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(out).expect("utf8 stdout")
}

// ─── parse ──────────────────────────────────────────────────────────────────

#[test]
fn e2e_parse_stdin_keeps_order() {
    let dir = tempfile::tempdir().unwrap();
    lingomark(&dir)
        .arg("parse")
        .write_stdin("Hello [ERROR:bad] world")
        .assert()
        .success()
        .stdout(
            r#"[{"type":"text","content":"Hello "},{"type":"error","content":"bad"},{"type":"text","content":" world"}]"#
                .to_string()
                + "\n",
        );
}

#[test]
fn e2e_parse_file_extracts_markers() {
    let dir = setup_reply();
    lingomark(&dir)
        .arg("parse")
        .arg("reply.md")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"type":"vocab_word","content":"market","metadata":{"word":"mercado"}}"#,
        ))
        .stdout(predicate::str::contains(
            r#"{"type":"translation","content":"Ayer fui al mercado","metadata":{"language":"Spanish"}}"#,
        ))
        .stdout(predicate::str::contains(
            r#"{"type":"story_element","content":"a stranger at the fruit stall"}"#,
        ))
        .stdout(predicate::str::contains("Feedback on your answer"))
        .stdout(predicate::str::contains("##").not())
        .stdout(predicate::str::contains("missing its language").not());
}

#[test]
fn e2e_parse_many_files_in_parallel() {
    let dir = setup_reply();
    fs::write(dir.path().join("short.txt"), "[TIP:rest]").unwrap();

    lingomark(&dir)
        .arg("parse")
        .arg("reply.md")
        .arg("short.txt")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""p":"reply.md""#))
        .stdout(predicate::str::contains(
            r#"{"p":"short.txt","s":[{"type":"tip","content":"rest"}]}"#,
        ));
}

#[test]
fn e2e_parse_empty_input_yields_one_text_segment() {
    let dir = tempfile::tempdir().unwrap();
    lingomark(&dir)
        .arg("parse")
        .write_stdin("   ")
        .assert()
        .success()
        .stdout("[{\"type\":\"text\",\"content\":\"\"}]\n");
}

#[test]
fn e2e_parse_missing_file_fails_with_json_error() {
    let dir = tempfile::tempdir().unwrap();
    lingomark(&dir)
        .arg("parse")
        .arg("nope.md")
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""))
        .stderr(predicate::str::contains("nope.md"));
}

// ─── format ─────────────────────────────────────────────────────────────────

#[test]
fn e2e_format_worker_matches_parse() {
    let dir = setup_reply();
    let parsed = stdout_of(lingomark(&dir).arg("parse").arg("reply.md"));
    let formatted = stdout_of(lingomark(&dir).arg("format").arg("reply.md"));
    let synced = stdout_of(lingomark(&dir).arg("format").arg("reply.md").arg("--sync"));
    assert_eq!(formatted, parsed);
    assert_eq!(synced, parsed);
}

#[test]
fn e2e_format_stream_prints_batches_then_summary() {
    let dir = setup_reply();
    let out = stdout_of(lingomark(&dir).arg("format").arg("reply.md").arg("--stream"));
    let lines: Vec<serde_json::Value> = out
        .lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect();
    assert!(lines.len() >= 2);

    let (summary, batches) = lines.split_last().unwrap();
    assert_eq!(summary["done"], true);
    let streamed: usize = batches
        .iter()
        .map(|b| {
            let batch = b.as_array().expect("batch array");
            assert!(!batch.is_empty() && batch.len() <= 6);
            batch.len()
        })
        .sum();
    assert_eq!(summary["count"], streamed);

    let parsed: Vec<serde_json::Value> =
        serde_json::from_str(&stdout_of(lingomark(&dir).arg("parse").arg("reply.md"))).unwrap();
    assert_eq!(parsed.len(), streamed);
}

#[test]
fn e2e_format_honours_batch_size_setting() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join(".lingomark")).unwrap();
    fs::write(
        dir.path().join(".lingomark/config.toml"),
        "[worker]\nbatch_size = 2\n",
    )
    .unwrap();

    let out = stdout_of(
        lingomark(&dir)
            .arg("format")
            .arg("--stream")
            .write_stdin("a [NOTE:b] c [TIP:d] e"),
    );
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"[{"type":"text","content":"a "},{"type":"note","content":"b"}]"#,
            r#"[{"type":"text","content":" c "},{"type":"tip","content":"d"}]"#,
            r#"[{"type":"text","content":" e"}]"#,
            r#"{"done":true,"count":5}"#,
        ]
    );
}

// ─── serve ──────────────────────────────────────────────────────────────────

#[test]
fn e2e_serve_speaks_line_protocol() {
    let dir = tempfile::tempdir().unwrap();
    let input = concat!(
        r#"{"id":1,"content":"Hi [NOTE:x]"}"#,
        "\n",
        r#"{"id":2,"content":["not","a","string"]}"#,
        "\n",
        "garbage\n",
    );
    let out = stdout_of(lingomark(&dir).arg("serve").write_stdin(input));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        r#"{"id":1,"segments":[{"type":"text","content":"Hi "},{"type":"note","content":"x"}]}"#
    );
    assert_eq!(lines[1], r#"{"id":1,"done":true}"#);
    assert_eq!(lines[2], r#"{"id":2,"error":"invalid_content"}"#);
    assert!(lines[3].starts_with(r#"{"id":null,"error":"#));
}

// ─── config ─────────────────────────────────────────────────────────────────

#[test]
fn e2e_config_shows_defaults() {
    let dir = tempfile::tempdir().unwrap();
    lingomark(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""batch_size":6"#))
        .stdout(predicate::str::contains(r#""timeout_ms":8000"#))
        .stdout(predicate::str::contains(r#""written":false"#));
    assert!(!dir.path().join(".lingomark").exists());
}

#[test]
fn e2e_config_write_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    lingomark(&dir)
        .arg("config")
        .arg("--write")
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""written":true"#));

    let saved = fs::read_to_string(dir.path().join(".lingomark/config.toml")).unwrap();
    assert!(saved.contains("[worker]"));
    assert!(saved.contains("batch_size = 6"));
}

#[test]
fn e2e_pretty_output_setting() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join(".lingomark")).unwrap();
    fs::write(
        dir.path().join(".lingomark/config.toml"),
        "[output]\nformat = \"pretty\"\n",
    )
    .unwrap();

    let out = stdout_of(lingomark(&dir).arg("parse").write_stdin("[TIP:x]"));
    assert!(out.lines().count() > 1);
    let value: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value[0]["type"], "tip");
}
