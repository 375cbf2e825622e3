use predicates::prelude::*;
use serde_json::Value;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const SITE: &str = r#"{
    "@type": "Site",
    "color": "red",
    "_owner": "admin",
    "docs": {
        "@type": "Folder",
        "title": "docs",
        "page": { "@type": "Page", "title": "page", "color": "@acquire" }
    },
    "archive": {
        "@mode": "explicit",
        "color": "grey"
    },
    "deep": { "a": { "b": {} } }
}"#;

struct SampleTree {
    _dir: TempDir,
    path: PathBuf,
}

fn build_sample_tree() -> Result<SampleTree, Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("site.json");
    fs::write(&path, SITE)?;
    Ok(SampleTree { _dir: dir, path })
}

fn acq() -> Result<assert_cmd::Command, Box<dyn Error>> {
    Ok(assert_cmd::Command::cargo_bin("acq")?)
}

#[test]
fn resolve_acquires_from_root() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_tree()?;
    acq()?
        .args(["resolve", sample.path.to_str().unwrap(), "/docs/page", "color"])
        .assert()
        .success()
        .stdout(predicate::eq("red\n"));
    Ok(())
}

#[test]
fn resolve_private_name_respects_implicit_only() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_tree()?;
    let file = sample.path.to_str().unwrap();
    acq()?
        .args(["resolve", file, "docs/page", "_owner"])
        .assert()
        .success()
        .stdout(predicate::eq("admin\n"));
    acq()?
        .args(["resolve", file, "docs/page", "_owner", "--implicit-only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("_owner"));
    acq()?
        .args([
            "resolve",
            file,
            "docs/page",
            "_owner",
            "--implicit-only",
            "--default",
            "\"nobody\"",
        ])
        .assert()
        .success()
        .stdout(predicate::eq("nobody\n"));
    Ok(())
}

#[test]
fn resolve_json_output_parses() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_tree()?;
    let output = acq()?
        .args([
            "resolve",
            sample.path.to_str().unwrap(),
            "docs",
            "page",
            "--format",
            "json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: Value = serde_json::from_slice(&output)?;
    assert_eq!(parsed["name"], "page");
    assert_eq!(parsed["state"]["@type"], "Page");
    assert_eq!(parsed["context"]["type_name"], "Folder");
    Ok(())
}

#[test]
fn chain_lists_contexts() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_tree()?;
    let output = acq()?
        .args([
            "chain",
            sample.path.to_str().unwrap(),
            "docs/page",
            "--format",
            "json",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: Value = serde_json::from_slice(&output)?;
    let types: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["type_name"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["Page", "Folder", "Site"]);

    acq()?
        .args(["chain", sample.path.to_str().unwrap(), "docs/page"])
        .assert()
        .success()
        .stdout(predicate::str::contains("wrapper").and(predicate::str::contains("Site")));
    Ok(())
}

#[test]
fn in_context_reports_membership() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_tree()?;
    let file = sample.path.to_str().unwrap();
    acq()?
        .args(["in-context", file, "docs/page", "docs"])
        .assert()
        .success()
        .stdout(predicate::eq("true\n"));
    acq()?
        .args(["in-context", file, "docs/page", "archive"])
        .assert()
        .success()
        .stdout(predicate::eq("false\n"));
    Ok(())
}

#[test]
fn dump_prints_state_and_refuses_wrappers() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_tree()?;
    let file = sample.path.to_str().unwrap();
    let output = acq()?
        .args(["dump", file, "docs"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parsed: Value = serde_json::from_slice(&output)?;
    assert_eq!(parsed["title"], "docs");
    assert_eq!(parsed["page"]["color"], "@acquire");

    acq()?
        .args(["dump", file, "docs", "--no-unwrap"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Can't serialize"));
    Ok(())
}

#[test]
fn explicit_node_needs_acquire_but_resolve_acquires() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_tree()?;
    acq()?
        .args(["resolve", sample.path.to_str().unwrap(), "archive", "_owner"])
        .assert()
        .success()
        .stdout(predicate::eq("admin\n"));
    Ok(())
}

#[test]
fn missing_path_fails_with_hint() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_tree()?;
    acq()?
        .args(["resolve", sample.path.to_str().unwrap(), "docs/nothing", "color"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Available names at this level: page, title"));
    Ok(())
}

#[test]
fn tight_max_depth_reports_recursion() -> Result<(), Box<dyn Error>> {
    let sample = build_sample_tree()?;
    acq()?
        .args([
            "--max-depth",
            "1",
            "resolve",
            sample.path.to_str().unwrap(),
            "deep/a/b",
            "color",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Recursion detected"));
    acq()?
        .args([
            "--max-depth",
            "1",
            "resolve",
            sample.path.to_str().unwrap(),
            "docs/page",
            "color",
        ])
        .assert()
        .success()
        .stdout(predicate::eq("red\n"));
    Ok(())
}

#[test]
fn unsupported_extension_is_rejected() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("site.yaml");
    fs::write(&path, "color: red")?;
    acq()?
        .args(["dump", path.to_str().unwrap(), "/"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported tree format"));
    Ok(())
}
