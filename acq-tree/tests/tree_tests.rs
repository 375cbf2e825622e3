//! Loading, traversal and capture over the story document

use acq_core::{
    acquire, base, chain, getattr, in_context_of, AcqError, AcquireOptions, Limits, Resolver,
};
use acq_test_utils::assertions::assert_not_found;
use acq_test_utils::Fixtures;
use acq_tree::{capture_state, describe_chain, load_json, load_path, Tree, TreeError};
use std::fs;

fn story() -> Tree {
    load_json(&Fixtures::story_json()).unwrap()
}

#[test]
fn test_marker_forces_acquisition_from_document() {
    let tree = story();
    let leaf = tree.resolve("/mid/leaf").unwrap();
    assert_eq!(getattr(&leaf, "color").unwrap().as_str(), Some("red"));
    assert_eq!(getattr(&leaf, "size").unwrap().as_int(), Some(2));
    assert_eq!(getattr(&leaf, "title").unwrap().as_str(), Some("leaf"));
}

#[test]
fn test_private_names_need_explicit_acquire() {
    let tree = story();
    let leaf = tree.resolve("mid/leaf").unwrap();
    assert_not_found(getattr(&leaf, "_secret"), "_secret");
    let secret = acquire(&leaf, "_secret", &AcquireOptions::new()).unwrap();
    assert_eq!(secret.as_str(), Some("hidden"));
}

#[test]
fn test_explicit_node_only_acquires_on_request() {
    let tree = story();
    let archive = tree.resolve("archive").unwrap();
    assert_eq!(
        archive.as_wrapper().unwrap().type_name(),
        "ExplicitAcquisitionWrapper"
    );
    assert_not_found(getattr(&archive, "color"), "color");

    // Implicit children still acquire through it.
    let old = tree.resolve("archive/old").unwrap();
    assert_eq!(getattr(&old, "color").unwrap().as_str(), Some("red"));
    assert!(!in_context_of(&old, &tree.resolve("mid").unwrap(), true));
    assert!(in_context_of(&old, tree.root(), true));
}

#[test]
fn test_parent_pointers_work_without_wrappers() {
    let tree = story();
    let raw_leaf = base(&tree.resolve("mid/leaf").unwrap());
    assert!(!raw_leaf.is_wrapper());
    let color = acquire(&raw_leaf, "color", &AcquireOptions::new()).unwrap();
    assert_eq!(color.as_str(), Some("red"));
    assert_eq!(chain(&raw_leaf, false).unwrap().len(), 3);
}

#[test]
fn test_chain_report_mirrors_path() {
    let tree = story();
    let leaf = tree.resolve("mid/leaf").unwrap();
    let entries = describe_chain(&chain(&leaf, false).unwrap());
    let types: Vec<&str> = entries.iter().map(|e| e.type_name.as_str()).collect();
    assert_eq!(types, vec!["Document", "Folder", "Site"]);
    assert_eq!(entries[2].kind, "object");
}

#[test]
fn test_capture_state() {
    let tree = story();
    let state = capture_state(tree.root()).unwrap();
    assert_eq!(state["_secret"], "hidden");
    assert_eq!(state["mid"]["leaf"]["color"], "@acquire");
    assert_eq!(state["archive"]["@mode"], "explicit");

    let leaf = tree.resolve("mid/leaf").unwrap();
    assert!(matches!(
        capture_state(&leaf),
        Err(TreeError::Acquisition(AcqError::NotSerializable))
    ));
}

#[test]
fn test_missing_path_message() {
    let tree = story();
    let err = tree.resolve("mid/nothing").unwrap_err();
    assert!(err.is_not_found());
    let message = err.to_string();
    assert!(message.contains("Reached: '/mid'"));
    assert!(message.contains("leaf, size, title"));
}

#[test]
fn test_resolve_with_tight_limits() {
    let tree = story();
    let resolver = Resolver::new(Limits {
        max_depth: 1,
        ..Limits::default()
    })
    .unwrap();
    let leaf = tree.resolve_with(&resolver, "mid/leaf").unwrap();
    assert_eq!(resolver.getattr(&leaf, "color").unwrap().as_str(), Some("red"));

    let deep = load_json(&serde_json::json!({
        "color": "red",
        "a": { "b": { "c": {} } }
    }))
    .unwrap();
    let c = deep.resolve_with(&resolver, "a/b/c").unwrap();
    let err = resolver.getattr(&c, "color").unwrap_err();
    assert!(matches!(err, AcqError::RecursionDetected { .. }));
    assert_eq!(
        acq_core::getattr(&c, "color").unwrap().as_str(),
        Some("red")
    );
}

#[test]
fn test_load_path_by_extension() {
    let dir = tempfile::tempdir().unwrap();

    let json_path = dir.path().join("site.json");
    fs::write(&json_path, Fixtures::story_json().to_string()).unwrap();
    let tree = load_path(&json_path).unwrap();
    assert_eq!(tree.len(), 5);

    let toml_path = dir.path().join("site.toml");
    fs::write(
        &toml_path,
        "color = \"green\"\n\n[docs]\n\"@type\" = \"Folder\"\n\n[docs.page]\ntitle = \"page\"\n",
    )
    .unwrap();
    let tree = load_path(&toml_path).unwrap();
    let page = tree.resolve("docs/page").unwrap();
    assert_eq!(getattr(&page, "color").unwrap().as_str(), Some("green"));

    let yaml_path = dir.path().join("site.yaml");
    fs::write(&yaml_path, "color: red").unwrap();
    assert!(matches!(load_path(&yaml_path), Err(TreeError::InvalidTree(_))));
    assert!(matches!(
        load_path(dir.path().join("absent.json")),
        Err(TreeError::Io(_))
    ));
}
