//! Manifest loading and query tests

#![allow(clippy::unwrap_used)]

use super::*;
use crate::error::{ErrorKind, ValidationIssue};
use crate::hash::hash_bytes;

fn manifest_json() -> String {
    let h = |s: &str| hash_bytes(s.as_bytes());
    format!(
        r#"{{
  "package_name": "default",
  "package_version": "2024.1",
  "bundles": [
    {{ "name": "base", "hash": "{}", "size": 4, "tags": ["core"] }},
    {{ "name": "shared", "hash": "{}", "size": 6, "dependencies": ["base"] }},
    {{ "name": "extra", "hash": "{}", "size": 5, "tags": ["dlc"], "dependencies": ["shared", "base"] }},
    {{ "name": "ui/common", "hash": "{}", "size": 2, "dependencies": ["base"] }}
  ],
  "assets": [
    {{ "path": "hero/texture", "bundle": "base", "tags": ["hero"] }},
    {{ "path": "level/boss", "bundle": "extra", "tags": ["dlc", "boss"] }},
    {{ "path": "ui/button", "bundle": "ui/common" }}
  ],
  "addresses": {{ "Hero": "hero/texture", "boss": "level/boss" }}
}}"#,
        h("base"),
        h("shared"),
        h("extra"),
        h("ui/common")
    )
}

fn load(case: AddressCase) -> Manifest {
    Manifest::load(manifest_json().as_bytes(), case).unwrap()
}

fn names(bundles: &[&PackageBundle]) -> Vec<String> {
    bundles.iter().map(|b| b.name.clone()).collect()
}

#[test]
fn test_load_builds_indices() {
    let m = load(AddressCase::Preserve);
    assert_eq!(m.package_name(), "default");
    assert_eq!(m.version(), "2024.1");
    assert_eq!(m.bundles().len(), 4);
    assert_eq!(m.assets().len(), 3);
    assert_eq!(m.owning_bundle("level/boss").unwrap().name, "extra");
    assert!(m.bundle("ghost").is_none());
    assert!(m.asset("ghost").is_none());
}

#[test]
fn test_dependency_closure_is_preorder_first_seen() {
    let m = load(AddressCase::Preserve);
    assert_eq!(names(&m.dependency_closure("extra")), vec!["shared", "base"]);
    assert!(m.dependency_closure("base").is_empty());
    assert!(m.dependency_closure("ghost").is_empty());
}

#[test]
fn test_closure_never_contains_root() {
    let m = load(AddressCase::Preserve);
    for bundle in m.bundles() {
        let closure = m.dependency_closure(&bundle.name);
        assert!(closure.iter().all(|b| b.name != bundle.name));
    }
}

#[test]
fn test_address_index_respects_case_mode() {
    let preserve = load(AddressCase::Preserve);
    assert_eq!(preserve.map_address("Hero"), Some("hero/texture"));
    assert_eq!(preserve.map_address("hero"), None);

    let lower = load(AddressCase::Lower);
    assert_eq!(lower.map_address("HERO"), Some("hero/texture"));
    assert_eq!(lower.map_address("hero"), Some("hero/texture"));
}

#[test]
fn test_tag_queries() {
    let m = load(AddressCase::Preserve);
    let dlc: Vec<&str> = m
        .assets_by_tags(&["dlc".to_string()])
        .iter()
        .map(|a| a.path.as_str())
        .collect();
    assert_eq!(dlc, vec!["level/boss"]);

    assert!(m.assets_by_tags(&[]).is_empty());
    assert!(m.bundles_by_tags(&[]).is_empty());
    assert_eq!(names(&m.bundles_by_tags(&["core".to_string()])), vec!["base"]);
}

#[test]
fn test_contains_bundle_file() {
    let m = load(AddressCase::Preserve);
    assert!(m.contains_bundle_file("ui-common.bundle"));
    assert!(m.contains_bundle_file("base.bundle"));
    assert!(!m.contains_bundle_file("ui/common"));
}

#[test]
fn test_cycle_is_rejected_at_load() {
    let h = hash_bytes(b"x");
    let json = format!(
        r#"{{"package_name":"p","package_version":"1","bundles":[
            {{"name":"A","hash":"{h}","size":1,"dependencies":["B"]}},
            {{"name":"B","hash":"{h}","size":1,"dependencies":["A"]}}]}}"#
    );
    let err = Manifest::load(json.as_bytes(), AddressCase::Preserve).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(
        err.validation_issue(),
        Some(&ValidationIssue::DependencyCycle {
            chain: "A -> B -> A".to_string()
        })
    );
}

/// Linear chain `b0 -> b1 -> ... -> b(n-1)`
fn chain_document(len: usize) -> ManifestDocument {
    let hash = hash_bytes(b"x");
    let bundles = (0..len)
        .map(|i| PackageBundle {
            name: format!("b{i}"),
            hash: hash.clone(),
            size: 1,
            tags: vec![],
            dependencies: if i + 1 < len {
                vec![format!("b{}", i + 1)]
            } else {
                vec![]
            },
        })
        .collect();
    ManifestDocument {
        package_name: "deep".to_string(),
        package_version: "1".to_string(),
        bundles,
        ..Default::default()
    }
}

#[test]
fn test_deep_chain_loads_without_recursion() {
    let m = Manifest::from_document(chain_document(100_000), AddressCase::Preserve).unwrap();
    let closure = m.dependency_closure("b0");
    assert_eq!(closure.len(), 99_999);
    assert_eq!(closure[0].name, "b1");
    assert_eq!(closure[99_998].name, "b99999");
}

#[test]
fn test_deep_cycle_reports_full_chain() {
    let mut doc = chain_document(50_000);
    doc.bundles[49_999].dependencies.push("b0".to_string());
    let err = Manifest::from_document(doc, AddressCase::Preserve).unwrap_err();
    let Some(ValidationIssue::DependencyCycle { chain }) = err.validation_issue() else {
        panic!("expected a cycle, got {err:?}");
    };
    assert!(chain.starts_with("b0 -> b1 -> "));
    assert!(chain.ends_with("b49999 -> b0"));
    assert_eq!(chain.matches(" -> ").count(), 50_000);
}

#[test]
fn test_malformed_bytes_are_not_coerced_to_empty() {
    let err = Manifest::load(b"{", AddressCase::Preserve).unwrap_err();
    assert!(matches!(
        err.validation_issue(),
        Some(ValidationIssue::Malformed { .. })
    ));
}

#[test]
fn test_document_roundtrip_keeps_normalized_addresses() {
    let m = load(AddressCase::Lower);
    let doc = m.to_document();
    assert_eq!(doc.addresses.get("hero").map(String::as_str), Some("hero/texture"));
    let again = Manifest::from_document(doc, AddressCase::Lower).unwrap();
    assert_eq!(again.version(), m.version());
}
