//! End-to-end CLI integration tests for the `lattice` binary.
//!
//! Each test creates its own temporary directory with a fresh database and
//! exercises the `lattice` binary as a subprocess via `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Build a `Command` targeting the cargo-built `lattice` binary, scoped to
/// a database under `tmp`.
fn lattice(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("lattice").unwrap();
    cmd.arg("--db").arg(tmp.path().join("store.db"));
    cmd
}

fn init_db(tmp: &TempDir) {
    lattice(tmp)
        .args(["init", &tmp.path().join("store.db").display().to_string()])
        .assert()
        .success();
}

/// Creates a collection with the given modes and returns its id.
fn create_collection(tmp: &TempDir, name: &str, enforcement: &str, indexing: &str) -> String {
    let output = lattice(tmp)
        .args([
            "--json",
            "collection",
            "create",
            "--name",
            name,
            "--enforcement",
            enforcement,
            "--indexing",
            indexing,
        ])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "collection create failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    json["id"].as_str().unwrap().to_string()
}

fn write_json_file(tmp: &TempDir, name: &str, body: &serde_json::Value) -> std::path::PathBuf {
    let path = tmp.path().join(name);
    std::fs::write(&path, body.to_string()).unwrap();
    path
}

#[test]
fn init_creates_empty_store() {
    let tmp = TempDir::new().unwrap();
    lattice(&tmp)
        .args(["init", &tmp.path().join("store.db").display().to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("initialized"));
}

#[test]
fn collection_lifecycle() {
    let tmp = TempDir::new().unwrap();
    init_db(&tmp);

    let id = create_collection(&tmp, "widgets", "none", "all");
    assert!(id.starts_with("col_"));

    lattice(&tmp)
        .args(["collection", "delete", &id])
        .assert()
        .success();

    lattice(&tmp)
        .args(["get", "doc_missing"])
        .assert()
        .failure();
}

#[test]
fn ingest_then_get_round_trips_metadata() {
    let tmp = TempDir::new().unwrap();
    init_db(&tmp);
    let collection_id = create_collection(&tmp, "widgets", "none", "all");

    let body = serde_json::json!({"email": "a@example.com", "age": 41});
    let file = write_json_file(&tmp, "doc.json", &body);

    let output = lattice(&tmp)
        .args([
            "--json",
            "ingest",
            &collection_id,
            &file.display().to_string(),
            "--name",
            "alice",
            "--label",
            "vip",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let doc: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let doc_id = doc["id"].as_str().unwrap().to_string();
    assert_eq!(doc["name"], "alice");

    lattice(&tmp)
        .args(["get", &doc_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice"))
        .stdout(predicate::str::contains("Labels: vip"));
}

#[test]
fn query_finds_matching_document() {
    let tmp = TempDir::new().unwrap();
    init_db(&tmp);
    let collection_id = create_collection(&tmp, "widgets", "none", "all");

    let file = write_json_file(&tmp, "doc.json", &serde_json::json!({"email": "a@example.com"}));
    lattice(&tmp)
        .args(["ingest", &collection_id, &file.display().to_string()])
        .assert()
        .success();

    let output = lattice(&tmp)
        .args([
            "--json",
            "query",
            &collection_id,
            "WHERE email = 'a@example.com'",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["total_records"], 1);
}

#[test]
fn rebuild_reports_document_count() {
    let tmp = TempDir::new().unwrap();
    init_db(&tmp);
    let collection_id = create_collection(&tmp, "widgets", "none", "all");

    for i in 0..3 {
        let file = write_json_file(&tmp, &format!("doc{i}.json"), &serde_json::json!({"n": i}));
        lattice(&tmp)
            .args(["ingest", &collection_id, &file.display().to_string()])
            .assert()
            .success();
    }

    lattice(&tmp)
        .args(["rebuild", &collection_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("rebuilt 3 document(s)"));
}

#[test]
fn ingest_into_unknown_collection_fails() {
    let tmp = TempDir::new().unwrap();
    init_db(&tmp);
    let file = write_json_file(&tmp, "doc.json", &serde_json::json!({"a": 1}));

    lattice(&tmp)
        .args(["ingest", "col_missing", &file.display().to_string()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
