// ============================================================================
// Integration Tests - End-to-end package builds
// ============================================================================
//
// These tests verify that the builder correctly:
// 1. Attributes interface calls and CHA edges to the owning artifact
// 2. Keeps calls into unattributed classes in the unresolved half
// 3. Produces a persisted document that reloads to the same sets
// 4. Runs independent builds concurrently without shared state

use std::collections::BTreeSet;

use lapp::analysis::AnalysisBundle;
use lapp::builder::{build_bundle, build_package};
use lapp::document::{CallDocument, MethodDocument, PackageDocument};
use lapp::outputs::{PackageOutput, UnresolvedCallOutput};
use lapp::{
    ArtifactAnalysis, ArtifactIndex, ArtifactRecord, BuildError, CallEdge, CallGraph, CallType, ClassHierarchy,
    ClassModifiers, ClassNode, DispatchKind, MethodDeclaration, MethodReference, Scope, TypeReference,
};
use rayon::prelude::*;

mod common {
    use std::path::PathBuf;

    use lapp::analysis::AnalysisBundle;

    /// Helper to get the fixtures directory path
    pub fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    pub fn load(name: &str) -> AnalysisBundle {
        let path = fixtures_dir().join(name);
        AnalysisBundle::from_path(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
    }
}

fn method(namespace: &str, symbol: &str, artifact: Option<&str>) -> MethodDocument {
    MethodDocument {
        namespace: namespace.to_string(),
        symbol: symbol.to_string(),
        artifact: artifact.map(String::from),
    }
}

// ============================================================================
// Interface call resolved into the owning artifact
// ============================================================================

#[test]
fn test_interface_call_and_implements_edge() {
    let bundle = common::load("scenario-a.json");
    let package = build_bundle(&bundle).expect("Build should succeed");
    let document = PackageDocument::of(&package);

    let p1 = "com.example:p1:1.0";
    assert_eq!(document.artifacts.len(), 1);
    assert_eq!(document.class_records.len(), 3);

    let expected_call = CallDocument {
        source: method("com.example.C", "main([Ljava/lang/String;)V", Some(p1)),
        target: method("com.example.A", "m1()V", Some(p1)),
        call_type: CallType::Interface,
    };
    assert_eq!(document.resolved_calls, BTreeSet::from([expected_call]));
    assert!(document.unresolved_calls.is_empty());

    let b = document
        .class_records
        .iter()
        .find(|r| r.name == "com.example.B")
        .expect("B should have a class record");
    assert_eq!(b.artifact.as_deref(), Some(p1));
    assert_eq!(b.super_class.as_deref(), Some("java.lang.Object"));
    assert!(b.interfaces.contains("com.example.A"));
    assert_eq!(b.expected_calls.len(), 1);

    let edge = b.expected_calls.iter().next().unwrap();
    assert_eq!(edge.source, method("com.example.A", "m1()V", Some(p1)));
    assert_eq!(edge.target, method("com.example.B", "m1()V", Some(p1)));

    let a = package.class_record("com.example.A").unwrap();
    assert!(a.is_interface);
    assert!(a.expected_calls.is_empty());
}

// ============================================================================
// Call into an extension class stays unresolved
// ============================================================================

#[test]
fn test_static_call_to_extension_class_is_unresolved() {
    let app = TypeReference::new("Lcom/example/App", Scope::Application);
    let ext = TypeReference::new("Lorg/ext/Util", Scope::Extension);

    let hierarchy = ClassHierarchy::new(vec![ClassNode::new(app.clone())
        .with_modifiers(ClassModifiers {
            public: true,
            ..ClassModifiers::default()
        })
        .with_method(MethodDeclaration::new("run()V"))]);
    let calls = CallGraph::new(vec![CallEdge::new(
        MethodReference::new(app, "run()V"),
        MethodReference::new(ext, "helper()V"),
        DispatchKind::Static,
    )]);

    // Even a mapping for the extension class must not attribute it
    let index = ArtifactIndex::new()
        .with_class("com.example.App", "g:app:1")
        .with_class("org.ext.Util", "g:ext:1");
    let analysis = ArtifactAnalysis::new(ArtifactRecord::new("g", "app", "1"), hierarchy, calls);
    let package = build_package(&index, &[analysis]).unwrap();
    let document = PackageDocument::of(&package);

    assert!(document.resolved_calls.is_empty());
    assert_eq!(
        document.unresolved_calls,
        BTreeSet::from([CallDocument {
            source: method("com.example.App", "run()V", Some("g:app:1")),
            target: method("org.ext.Util", "helper()V", None),
            call_type: CallType::Static,
        }])
    );

    let json = serde_json::to_value(&document).unwrap();
    let target = &json["unresolvedCalls"][0]["target"];
    assert!(target.get("artifact").is_none());
    assert_eq!(json["unresolvedCalls"][0]["callType"], "STATIC");
}

// ============================================================================
// Two artifacts, mixed calls, persisted and reloaded
// ============================================================================

#[test]
fn test_two_artifacts_round_trip() {
    let bundle = common::load("two-artifacts.yaml");
    let package = build_bundle(&bundle).expect("Build should succeed");

    assert_eq!(package.artifacts().len(), 2);
    assert_eq!(package.class_records().count(), 3);
    assert_eq!(package.resolved_calls().len(), 2);
    assert_eq!(package.unresolved_calls().len(), 3);

    let service_impl = package.class_record("com.example.core.ServiceImpl").unwrap();
    assert_eq!(service_impl.artifact.as_deref(), Some("com.example:core:1.0"));
    assert_eq!(service_impl.expected_calls.len(), 1);

    let document = PackageDocument::of(&package);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("two-artifacts.lapp.json");
    document.write_to_path(&path, true).unwrap();

    let reloaded = PackageDocument::from_path(&path).unwrap();
    assert_eq!(reloaded, document);
    assert_eq!(reloaded.artifacts, document.artifacts);
    assert_eq!(reloaded.class_records, document.class_records);
    assert_eq!(reloaded.resolved_calls, document.resolved_calls);
    assert_eq!(reloaded.unresolved_calls, document.unresolved_calls);
}

#[test]
fn test_document_equality_ignores_array_order() {
    let bundle = common::load("two-artifacts.yaml");
    let document = PackageDocument::of(&build_bundle(&bundle).unwrap());

    let mut json = serde_json::to_value(&document).unwrap();
    for key in ["artifacts", "classRecords", "resolvedCalls", "unresolvedCalls"] {
        json[key].as_array_mut().unwrap().reverse();
    }
    let reordered: PackageDocument = serde_json::from_value(json).unwrap();

    assert_eq!(reordered, document);
}

#[test]
fn test_no_duplicate_calls() {
    let bundle = common::load("two-artifacts.yaml");
    let package = build_bundle(&bundle).unwrap();

    // The fixture lists Main.main -> Service.handle twice
    let interface_calls = package
        .resolved_calls()
        .iter()
        .filter(|c| c.call_type == CallType::Interface)
        .count();
    assert_eq!(interface_calls, 1);

    let text = UnresolvedCallOutput.render(&package).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.contains("org.ext.Helper.help()V :STATIC"));
}

#[test]
fn test_unresolved_calls_have_unattributed_targets() {
    let bundle = common::load("two-artifacts.yaml");
    let package = build_bundle(&bundle).unwrap();

    for call in package.unresolved_calls() {
        assert!(!package.method(call.target).is_resolved());
    }
    for call in package.resolved_calls() {
        assert!(package.method(call.target).is_resolved());
    }
}

// ============================================================================
// Input validation
// ============================================================================

#[test]
fn test_missing_call_graph_is_fatal() {
    let mut bundle = common::load("two-artifacts.yaml");
    bundle.analyses[1].call_graph = None;

    match build_bundle(&bundle) {
        Err(BuildError::MissingCallGraph(artifact)) => assert_eq!(artifact.name, "app"),
        other => panic!("Expected MissingCallGraph, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_yaml_and_json_bundles_agree() {
    let yaml = common::load("two-artifacts.yaml");
    let json_text = serde_json::to_string(&yaml).unwrap();
    let json = AnalysisBundle::from_json(&json_text).unwrap();

    let from_yaml = PackageDocument::of(&build_bundle(&yaml).unwrap());
    let from_json = PackageDocument::of(&build_bundle(&json).unwrap());
    assert_eq!(from_yaml, from_json);
}

// ============================================================================
// Independent builds in parallel
// ============================================================================

#[test]
fn test_concurrent_builds_are_independent() {
    let bundles = vec![
        common::load("scenario-a.json"),
        common::load("two-artifacts.yaml"),
        common::load("scenario-a.json"),
        common::load("two-artifacts.yaml"),
    ];

    let documents: Vec<PackageDocument> = bundles
        .par_iter()
        .map(|bundle| PackageDocument::of(&build_bundle(bundle).unwrap()))
        .collect();

    let sequential: Vec<PackageDocument> = bundles
        .iter()
        .map(|bundle| PackageDocument::of(&build_bundle(bundle).unwrap()))
        .collect();

    assert_eq!(documents, sequential);
    assert_eq!(documents[0], documents[2]);
    assert_eq!(documents[1], documents[3]);
    assert_ne!(documents[0], documents[1]);
}

// ============================================================================
// CLI build
// ============================================================================

#[test]
fn test_cli_build_writes_package_files() {
    let dir = tempfile::tempdir().unwrap();
    let command = lapp::cli::Command::Build {
        inputs: vec![
            common::fixtures_dir().join("scenario-a.json"),
            common::fixtures_dir().join("two-artifacts.yaml"),
        ],
        output: dir.path().to_path_buf(),
        compact: true,
    };

    lapp::cli::handle_command(command, false).unwrap();

    let scenario_a = PackageDocument::from_path(&dir.path().join("scenario-a.lapp.json")).unwrap();
    assert_eq!(scenario_a.resolved_calls.len(), 1);

    let two = PackageDocument::from_path(&dir.path().join("two-artifacts.lapp.json")).unwrap();
    assert_eq!(two.class_records.len(), 3);
}

#[test]
fn test_cli_build_rejects_inputs_sharing_a_stem() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a").join("app.json");
    let second = dir.path().join("b").join("app.yaml");
    for (source, target) in [("scenario-a.json", &first), ("two-artifacts.yaml", &second)] {
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();
        std::fs::copy(common::fixtures_dir().join(source), target).unwrap();
    }
    let output = dir.path().join("out");

    let command = lapp::cli::Command::Build {
        inputs: vec![first, second],
        output: output.clone(),
        compact: true,
    };
    let err = lapp::cli::handle_command(command, false).unwrap_err();

    assert!(err.to_string().contains("app.lapp.json"));
    assert!(!output.join("app.lapp.json").exists());
}

// ============================================================================
// Default-package classes in internal form
// ============================================================================

#[test]
fn test_default_package_internal_names_share_identity() {
    let yaml = r#"
classArtifacts:
  Main: "g:app:1"
analyses:
  - artifact: { group: g, name: app, version: "1" }
    hierarchy:
      classes:
        - reference: { name: "LMain;", scope: APPLICATION }
          methods:
            - { selector: "run()V" }
    callGraph:
      edges:
        - caller: { declaringClass: { name: Main, scope: APPLICATION }, selector: "run()V" }
          callee: { declaringClass: { name: "LMain;", scope: APPLICATION }, selector: "run()V" }
          dispatch: invokevirtual
"#;
    let bundle = AnalysisBundle::from_yaml(yaml).unwrap();
    let package = build_bundle(&bundle).unwrap();

    assert!(package.class_record("Main").is_some());
    assert_eq!(package.methods().len(), 1);
    assert!(package.unresolved_calls().is_empty());

    let call = package.resolved_calls().iter().next().unwrap();
    assert_eq!(call.source, call.target);
    assert_eq!(package.method(call.target).artifact(), Some("g:app:1"));
}
