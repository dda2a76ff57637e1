//! End-to-end tests for the scitree CLI.
//!
//! Tests invoke the `scitree` binary as a subprocess. None of them reach the
//! network: the commands under test either never build clients or fail
//! before any request is sent.

use std::path::Path;
use std::process::{Command, Output};

use ndarray::array;
use ndarray_npy::WriteNpyExt;
use tempfile::TempDir;

fn scitree_in(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_scitree"));
    cmd.current_dir(dir)
        .env_remove("OPENAI_API_KEY")
        .env_remove("ANTHROPIC_API_KEY")
        .env_remove("SCITREE_CORPUS_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const TREE_JSON: &str = r#"{
  "text": "Understand galaxy evolution",
  "papers": ["https://arxiv.org/abs/2301.00001"],
  "children": [
    {
      "text": "Measure quenching timescales",
      "papers": [],
      "children": [{"text": "Star formation rate", "papers": []}]
    }
  ]
}"#;

/// Writes a two-document corpus under `dir/vector_store`.
fn write_corpus(dir: &Path) {
    let store = dir.join("vector_store");
    std::fs::create_dir_all(&store).unwrap();
    array![[1.0f32, 0.0], [0.0, 1.0], [0.6, 0.8]]
        .write_npy(std::fs::File::create(store.join("embeddings_matrix.npy")).unwrap())
        .unwrap();
    std::fs::write(
        store.join("documents.json"),
        r#"[
          {"id": "2301.00001", "abstract": "Quenching.", "conclusions": "Rapid.", "source": "2301.00001", "title": "Quenching"},
          {"id": "1501.00002", "abstract": "Halos.", "source": "1501.00002", "title": "Halos"}
        ]"#,
    )
    .unwrap();
    std::fs::write(
        store.join("index_mapping.json"),
        r#"{"2301.00001": {"abstract": 0, "conclusions": 1}, "1501.00002": {"abstract": 2}}"#,
    )
    .unwrap();
}

// === Help and completions ===

#[test]
fn e2e_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    let output = scitree_in(dir.path()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let out = stdout(&output);
    for cmd in ["generate", "search", "show", "serve", "completions"] {
        assert!(out.contains(cmd), "help is missing {cmd}: {out}");
    }
}

#[test]
fn e2e_completions_for_bash() {
    let dir = TempDir::new().unwrap();
    let output = scitree_in(dir.path())
        .args(["completions", "bash"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(stdout(&output).contains("scitree"));
}

// === Show ===

#[test]
fn e2e_show_prints_outline() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tree.json");
    std::fs::write(&path, TREE_JSON).unwrap();

    let output = scitree_in(dir.path()).arg("show").arg(&path).output().unwrap();
    assert!(output.status.success(), "show failed: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "Science Goal: Understand galaxy evolution\n\
         \x20 - https://arxiv.org/abs/2301.00001\n\
         \x20 Science Objective: Measure quenching timescales\n\
         \x20   Physical Parameter: Star formation rate\n"
    );
}

#[test]
fn e2e_show_json_roundtrips_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tree.json");
    std::fs::write(&path, TREE_JSON).unwrap();

    let output = scitree_in(dir.path())
        .args(["show", "--json"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let original: serde_json::Value = serde_json::from_str(TREE_JSON).unwrap();
    assert_eq!(printed, original);
}

#[test]
fn e2e_show_rejects_malformed_tree() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, r#"{"papers": ["x"]"#).unwrap();

    let output = scitree_in(dir.path()).arg("show").arg(&path).output().unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("serialization error"));
}

#[test]
fn e2e_show_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let output = scitree_in(dir.path())
        .args(["show", "nope.json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("nope.json"));
}

// === Search / generate preconditions ===

#[test]
fn e2e_search_without_corpus_fails_at_load() {
    let dir = TempDir::new().unwrap();
    let output = scitree_in(dir.path())
        .args(["search", "galaxy quenching"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("loading corpus"), "{err}");
    assert!(err.contains("missing corpus artifact"), "{err}");
}

#[test]
fn e2e_search_without_api_key_reports_credentials() {
    let dir = TempDir::new().unwrap();
    write_corpus(dir.path());

    let output = scitree_in(dir.path())
        .args(["search", "galaxy quenching"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("credential error"), "{}", stderr(&output));
}

#[test]
fn e2e_search_rejects_bad_cutoff() {
    let dir = TempDir::new().unwrap();
    write_corpus(dir.path());

    let output = scitree_in(dir.path())
        .args(["search", "halos", "--cutoff", "someday"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid cutoff"));
}

#[test]
fn e2e_search_warns_when_cutoff_cannot_apply() {
    let dir = TempDir::new().unwrap();
    write_corpus(dir.path());

    let output = scitree_in(dir.path())
        .args(["search", "halos", "--cutoff", "2020"])
        .output()
        .unwrap();
    let err = stderr(&output);
    assert!(err.contains("date cutoff ignored"), "{err}");

    std::fs::write(dir.path().join("scitree.yaml"), "filters:\n  date: true\n").unwrap();
    let output = scitree_in(dir.path())
        .args(["search", "halos", "--cutoff", "2020"])
        .output()
        .unwrap();
    assert!(!stderr(&output).contains("date cutoff ignored"));
}

#[test]
fn e2e_generate_without_api_key_fails_preflight() {
    let dir = TempDir::new().unwrap();
    write_corpus(dir.path());

    let output = scitree_in(dir.path())
        .args(["generate", "Understand galaxy evolution", "--year", "2024"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("credential error"), "{}", stderr(&output));
    assert!(stdout(&output).is_empty());
}

#[test]
fn e2e_generate_rejects_zero_branching() {
    let dir = TempDir::new().unwrap();
    let output = scitree_in(dir.path())
        .args(["generate", "goal", "-n", "0"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("--branching"));
}

#[test]
fn e2e_malformed_config_is_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("scitree.yaml"), "filters: [not, a, map]\n").unwrap();

    let output = scitree_in(dir.path())
        .args(["search", "anything"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(stderr(&output).contains("loading configuration"));
}
