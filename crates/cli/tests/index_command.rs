use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{json, Map, Value};
use tempfile::{tempdir, TempDir};

const FAKE_OUTPUT_ENV: &str = "TRIAGE_SOLC_FAKE_OUTPUT";
const MISSING_SOLC: &str = "/nonexistent/bin/solc-for-tests";

const VAULT: &str = r#"pragma solidity ^0.8.0;

contract Vault {
    function sweep(address to) external {
        (bool ok, ) = to.call{value: address(this).balance}("");
        require(ok);
    }
    function total() external view returns (uint256) {
        return 1;
    }
}
"#;

struct Fixture {
    _dir: TempDir,
    root: PathBuf,
    vault: String,
}

/// A Foundry layout: one in-scope contract plus a dependency under lib/.
fn fixture() -> Fixture {
    let dir = tempdir().expect("tempdir");
    let root = fs::canonicalize(dir.path()).expect("canonical root");
    fs::write(root.join("foundry.toml"), "[profile.default]\n").unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::create_dir_all(root.join("lib/dep")).unwrap();
    fs::write(root.join("src/Vault.sol"), VAULT).unwrap();
    fs::write(root.join("lib/dep/Dep.sol"), "pragma solidity ^0.8.0;\ncontract Dep {}\n").unwrap();
    let vault = root.join("src/Vault.sol").display().to_string();
    Fixture { _dir: dir, root, vault }
}

fn range(header: &str) -> (usize, usize) {
    let start = VAULT.find(header).unwrap();
    let len = VAULT[start..].find("\n    }").unwrap() + "\n    }".len();
    (start, len)
}

fn write_solc_output(fixture: &Fixture) -> PathBuf {
    let (sweep_start, sweep_len) = range("function sweep");
    let (total_start, total_len) = range("function total");
    let tree = json!({
        "nodeType": "SourceUnit",
        "nodes": [{
            "nodeType": "ContractDefinition",
            "name": "Vault",
            "contractKind": "contract",
            "nodes": [
                {
                    "nodeType": "FunctionDefinition",
                    "name": "sweep",
                    "kind": "function",
                    "visibility": "external",
                    "stateMutability": "nonpayable",
                    "modifiers": [],
                    "parameters": {"parameters": [{"name": "to", "typeName": {"name": "address"}}]},
                    "returnParameters": {"parameters": []},
                    "src": format!("{sweep_start}:{sweep_len}:0")
                },
                {
                    "nodeType": "FunctionDefinition",
                    "name": "total",
                    "kind": "function",
                    "visibility": "external",
                    "stateMutability": "view",
                    "modifiers": [],
                    "parameters": {"parameters": []},
                    "returnParameters": {
                        "parameters": [{"name": "", "typeName": {"name": "uint256"}}]
                    },
                    "src": format!("{total_start}:{total_len}:0")
                }
            ]
        }]
    });
    let mut sources = Map::new();
    sources.insert(fixture.vault.clone(), json!({"id": 0, "ast": tree}));
    let path = fixture.root.join("solc-output.json");
    fs::write(&path, json!({"sources": Value::Object(sources)}).to_string()).unwrap();
    path
}

fn write_fallback_document(fixture: &Fixture) -> PathBuf {
    let (start, len) = range("function sweep");
    let document = json!([{
        "name": "Vault",
        "source_mapping": {"filename_absolute": fixture.vault},
        "functions": [{
            "name": "sweep",
            "full_name": "sweep(address)",
            "visibility": "external",
            "state_mutability": "nonpayable",
            "source_mapping": {
                "start": start,
                "length": len,
                "filename_absolute": fixture.vault,
                "lines": [4, 5, 6, 7]
            }
        }]
    }]);
    let path = fixture.root.join("fallback.json");
    fs::write(&path, document.to_string()).unwrap();
    path
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).expect("report written")).expect("report json")
}

#[test]
fn index_uses_solc_trees_and_skips_foundry_lib() {
    let fixture = fixture();
    let fake = write_solc_output(&fixture);
    let out = fixture.root.join("reports/index.json");

    cargo_bin_cmd!("contract-triage")
        .env(FAKE_OUTPUT_ENV, &fake)
        .args(["index", "--no-progress", "--scope"])
        .arg(&fixture.root)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let report = read_json(&out);
    assert_eq!(report["producer"], "solc");
    assert_eq!(report["directory"], fixture.root.display().to_string());
    let files = report["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["path"], fixture.vault.as_str());
    assert_eq!(files[0]["sha256"].as_str().unwrap().len(), 64);

    let functions = report["contracts"][0]["functions"].as_array().unwrap();
    let signatures: Vec<&str> =
        functions.iter().map(|f| f["signature"].as_str().unwrap()).collect();
    assert_eq!(signatures, vec!["total() returns (uint256)", "sweep(address to)"]);
    assert_eq!(functions[1]["line"], 4);
    assert!(report.get("entrypoints").is_none());
}

#[test]
fn entrypoints_markdown_goes_to_stdout() {
    let fixture = fixture();
    let fake = write_solc_output(&fixture);

    cargo_bin_cmd!("contract-triage")
        .env(FAKE_OUTPUT_ENV, &fake)
        .args(["index", "--no-progress", "--entrypoints", "--scope"])
        .arg(&fixture.root)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Contract Triage Entrypoints Report"))
        .stdout(predicate::str::contains("#### Vault (contract)"))
        .stdout(predicate::str::contains(
            "- `sweep(address to)` [external nonpayable] — line 4 — \
             `for-all`, `admin-ish (no-guard)`, `calls-out`",
        ));
}

#[test]
fn sinks_report_lists_outbound_calls() {
    let fixture = fixture();
    let fake = write_solc_output(&fixture);
    let out = fixture.root.join("sinks.json");

    cargo_bin_cmd!("contract-triage")
        .env(FAKE_OUTPUT_ENV, &fake)
        .args(["index", "--no-progress", "--sinks", "--scope"])
        .arg(&fixture.root)
        .arg("-o")
        .arg(&out)
        .assert()
        .success();

    let report = read_json(&out);
    let sinks = report["sinks"].as_array().unwrap();
    assert_eq!(sinks.len(), 1);
    assert_eq!(sinks[0]["name"], "sweep");
    assert_eq!(sinks[0]["tags"], json!(["calls-out"]));
}

#[test]
fn failing_solc_falls_back_to_the_fallback_document() {
    let fixture = fixture();
    let document = write_fallback_document(&fixture);
    let out = fixture.root.join("entrypoints.json");

    cargo_bin_cmd!("contract-triage")
        .env_remove(FAKE_OUTPUT_ENV)
        .args(["index", "--no-progress", "--entrypoints", "--solc", MISSING_SOLC, "--scope"])
        .arg(&fixture.root)
        .arg("--fallback-json")
        .arg(&document)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let report = read_json(&out);
    assert_eq!(report["producer"], "fallback");
    let entrypoints = report["entrypoints"].as_array().unwrap();
    assert_eq!(entrypoints.len(), 1);
    assert_eq!(entrypoints[0]["signature"], "sweep(address)");
    assert_eq!(entrypoints[0]["line"], 4);
    assert_eq!(entrypoints[0]["tags"], json!(["for-all", "admin-ish (no-guard)", "calls-out"]));
}

#[test]
fn sinks_without_solc_exit_with_code_two() {
    let fixture = fixture();
    let document = write_fallback_document(&fixture);
    let out = fixture.root.join("sinks.md");

    cargo_bin_cmd!("contract-triage")
        .env_remove(FAKE_OUTPUT_ENV)
        .args(["index", "--no-progress", "--sinks", "--solc", MISSING_SOLC, "--scope"])
        .arg(&fixture.root)
        .arg("--fallback-json")
        .arg(&document)
        .arg("--out")
        .arg(&out)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--sinks requires solc"));
    assert!(!out.exists());
}

#[test]
fn failing_solc_without_fallback_is_an_error() {
    let fixture = fixture();
    cargo_bin_cmd!("contract-triage")
        .env_remove(FAKE_OUTPUT_ENV)
        .args(["index", "--no-progress", "--solc", MISSING_SOLC, "--scope"])
        .arg(&fixture.root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no fallback producer is configured"));
}

#[test]
fn config_file_can_keep_foundry_lib_in_scope() {
    let fixture = fixture();
    let fake = write_solc_output(&fixture);
    fs::write(fixture.root.join("triage.yaml"), "foundry_default_excludes: false\n").unwrap();
    let out = fixture.root.join("index.json");

    cargo_bin_cmd!("contract-triage")
        .env(FAKE_OUTPUT_ENV, &fake)
        .args(["index", "--no-progress", "--scope"])
        .arg(&fixture.root)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let report = read_json(&out);
    assert_eq!(report["files"].as_array().unwrap().len(), 2);
    assert_eq!(report["contracts"].as_array().unwrap().len(), 1);
}

#[test]
fn empty_scope_prints_a_message() {
    let fixture = fixture();
    cargo_bin_cmd!("contract-triage")
        .args(["index", "--no-progress", "--scope"])
        .arg(&fixture.root)
        .arg("--oos")
        .arg(&fixture.root)
        .assert()
        .success()
        .stdout(predicate::str::contains("No .sol files in scope (after out-of-scope filtering)."));
}

#[test]
fn rejects_unknown_output_extension() {
    let fixture = fixture();
    cargo_bin_cmd!("contract-triage")
        .args(["index", "--no-progress", "--scope"])
        .arg(&fixture.root)
        .arg("--out")
        .arg(fixture.root.join("report.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains(".md or .json"));
}

#[test]
fn entrypoints_and_sinks_conflict() {
    let fixture = fixture();
    cargo_bin_cmd!("contract-triage")
        .args(["index", "--entrypoints", "--sinks", "--scope"])
        .arg(&fixture.root)
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn missing_scope_is_reported() {
    let fixture = fixture();
    cargo_bin_cmd!("contract-triage")
        .args(["index", "--no-progress", "--scope"])
        .arg(fixture.root.join("does-not-exist"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to resolve scope"));
}

#[test]
fn keep_flags_lift_each_drop_policy() {
    let fixture = fixture();
    let dep = fixture.root.join("lib/dep/Dep.sol").display().to_string();
    let document = json!([{
        "name": "Vault",
        "source_mapping": {"filename_absolute": fixture.vault},
        "functions": [{
            "name": "pull",
            "full_name": "pull()",
            "visibility": "external",
            "state_mutability": "nonpayable",
            "source_mapping": {"start": 24, "length": 15, "filename_absolute": dep, "lines": [2]}
        }]
    }]);
    let fallback = fixture.root.join("inherited.json");
    fs::write(&fallback, document.to_string()).unwrap();

    let run = |extra: &[&str]| {
        let out = fixture.root.join("entrypoints.json");
        cargo_bin_cmd!("contract-triage")
            .env_remove(FAKE_OUTPUT_ENV)
            .args(["index", "--no-progress", "--entrypoints", "--solc", MISSING_SOLC, "--scope"])
            .arg(&fixture.root)
            .arg("--fallback-json")
            .arg(&fallback)
            .args(extra)
            .arg("--out")
            .arg(&out)
            .assert()
            .success();
        read_json(&out)
    };

    let report = run(&[]);
    assert_eq!(report["entrypoints"], json!([]));
    assert_eq!(report["dropped"][0]["reason"], "cross_file_inherited");
    assert_eq!(report["dropped"][0]["declaring_file"], dep.as_str());

    // Dep.sol is out of scope, so its text is never loaded.
    let report = run(&["--keep-inherited"]);
    assert_eq!(report["entrypoints"], json!([]));
    assert_eq!(report["dropped"][0]["reason"], "unsliceable");

    let report = run(&["--keep-inherited", "--keep-unsliceable"]);
    assert!(report.get("dropped").is_none());
    let entrypoints = report["entrypoints"].as_array().unwrap();
    assert_eq!(entrypoints.len(), 1);
    assert_eq!(entrypoints[0]["signature"], "pull()");
    assert_eq!(entrypoints[0]["tags"], json!(["for-all"]));
}
