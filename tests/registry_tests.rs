//! Registry-level scenarios: prefixes, namespaces, revisions, rpc
//! matching, and warning suppression.

use rstest::rstest;
use yangc::link::MapSourceProvider;
use yangc::{Context, ErrorCode, Severity};

fn ctx_with(sources: MapSourceProvider) -> Context {
    Context::with_provider(Box::new(sources))
}

#[test]
fn test_prefix_collision_remaps_xml_prefix() {
    let sources = MapSourceProvider::new()
        .with("x", "module x { namespace urn:x:x; prefix p; }")
        .with("y", "module y { namespace urn:x:y; prefix p; }");
    let mut ctx = ctx_with(sources);
    let x = ctx.load("x", None).unwrap();
    let y = ctx.load("y", None).unwrap();

    let module_x = ctx.module(x).unwrap();
    assert_eq!(module_x.prefix, "p");
    assert_eq!(module_x.xml_prefix, "p");

    let module_y = ctx.module(y).unwrap();
    assert_eq!(module_y.prefix, "p", "the YANG prefix never changes");
    assert_eq!(module_y.xml_prefix, "p1", "the XML prefix gets a suffix");

    let warnings: Vec<_> = ctx
        .diagnostics()
        .iter()
        .filter(|d| d.code == ErrorCode::DuplicatePrefix)
        .collect();
    assert_eq!(warnings.len(), 1, "exactly one duplicate-prefix warning");
    assert_eq!(warnings[0].severity, Severity::Warning);
}

#[test]
fn test_namespace_bijection_after_load() {
    let sources = MapSourceProvider::new()
        .with("a", "module a { namespace urn:x:a; prefix a; }")
        .with("b", "module b { namespace urn:x:b; prefix b; }");
    let mut ctx = ctx_with(sources);
    ctx.load("a", None).unwrap();
    ctx.load("b", None).unwrap();

    let namespaces = ctx.namespace_registry();
    for uri in ["urn:x:a", "urn:x:b"] {
        let id = namespaces.find_by_uri(uri).expect("uri registered");
        assert_eq!(namespaces.uri(id), Some(uri), "id maps back to its uri");
    }
    assert_ne!(
        namespaces.find_by_uri("urn:x:a"),
        namespaces.find_by_uri("urn:x:b")
    );
}

#[test]
fn test_duplicate_namespace_rejected() {
    let sources = MapSourceProvider::new()
        .with("a", "module a { namespace urn:x:same; prefix a; }")
        .with("b", "module b { namespace urn:x:same; prefix b; }");
    let mut ctx = ctx_with(sources);
    ctx.load("a", None).unwrap();
    assert!(
        ctx.load("b", None).is_err(),
        "two modules cannot claim one namespace URI"
    );
}

#[test]
fn test_unique_default_revision() {
    let mut sources = MapSourceProvider::new();
    sources.insert(
        "a",
        Some("2023-01-01"),
        "module a { namespace urn:x:a; prefix a; revision 2023-01-01; }",
    );
    sources.insert(
        "a",
        Some("2024-06-01"),
        "module a { namespace urn:x:a; prefix a; revision 2024-06-01; }",
    );
    let mut ctx = ctx_with(sources);
    ctx.load("a", Some("2023-01-01")).unwrap();
    ctx.load("a", Some("2024-06-01")).unwrap();

    let registry = ctx.module_registry();
    assert_eq!(registry.revision_count("a"), 2);
    let defaults: Vec<_> = registry
        .iter_default_current()
        .filter(|(_, m)| m.name == "a")
        .collect();
    assert_eq!(defaults.len(), 1, "exactly one default revision per name");
    assert_eq!(
        defaults[0].1.revision.as_deref(),
        Some("2024-06-01"),
        "the newest revision is the default"
    );

    let found = ctx.find_module("a", None).unwrap();
    assert_eq!(found.revision.as_deref(), Some("2024-06-01"));
}

#[test]
fn test_session_scope_shadows_global() {
    let sources = MapSourceProvider::new()
        .with("a", "module a { namespace urn:x:a; prefix a; leaf global-leaf { type string; } }");
    let mut ctx = ctx_with(sources);
    let a = ctx.load("a", None).unwrap();

    ctx.set_session_scope(vec![a]);
    assert!(ctx.find_module("a", None).is_some());
    assert!(ctx.find_object_anywhere("global-leaf").is_some());
    ctx.clear_session_scope();
    assert!(ctx.find_module("a", None).is_some());
}

#[test]
fn test_rpc_ambiguity_reported() {
    let sources = MapSourceProvider::new().with(
        "m",
        "module m { namespace urn:x:m; prefix m; rpc get-config; rpc get-state; }",
    );
    let mut ctx = ctx_with(sources);
    ctx.load("m", None).unwrap();

    let (first, count) = ctx.match_any_rpc(Some("m"), "get-");
    assert_eq!(count, 2);
    assert_eq!(first.unwrap().name, "get-config");

    ctx.report_rpc_ambiguity(Some("m"), "get-");
    let diag = ctx
        .diagnostics()
        .iter()
        .find(|d| d.code == ErrorCode::AmbiguousCommand)
        .expect("ambiguity diagnostic emitted");
    assert!(diag.message.contains("get-config"));
    assert!(diag.message.contains("get-state"));
}

#[rstest]
#[case(63, 0)]
#[case(64, 0)]
#[case(65, 1)]
fn test_idlen_warning_boundary(#[case] length: usize, #[case] expected_warnings: usize) {
    let name = "a".repeat(length);
    let sources = MapSourceProvider::new().with(
        "m",
        &format!("module m {{ namespace urn:x:m; prefix m; leaf {name} {{ type string; }} }}"),
    );
    let mut ctx = ctx_with(sources);
    ctx.load("m", None).unwrap();

    let idlen_warnings = ctx
        .diagnostics()
        .iter()
        .filter(|d| d.code == ErrorCode::IdlenExceeded)
        .count();
    assert_eq!(
        idlen_warnings, expected_warnings,
        "only identifiers past the limit warn"
    );
}

#[test]
fn test_idlen_warning_suppressed() {
    let over_limit = "b".repeat(65);
    let sources = MapSourceProvider::new().with(
        "m",
        &format!(
            "module m {{ namespace urn:x:m; prefix m; leaf {over_limit} {{ type string; }} }}"
        ),
    );
    let mut ctx = ctx_with(sources);
    assert!(ctx.suppress_warning(ErrorCode::IdlenExceeded));
    ctx.load("m", None).unwrap();
    assert!(
        !ctx.diagnostics()
            .iter()
            .any(|d| d.code == ErrorCode::IdlenExceeded),
        "suppressed warnings are dropped silently"
    );
}

#[test]
fn test_warning_suppression_round_trip() {
    let mut ctx = ctx_with(MapSourceProvider::new());
    assert!(ctx.warning_enabled(ErrorCode::LinelenExceeded));
    ctx.suppress_warning(ErrorCode::LinelenExceeded);
    assert!(!ctx.warning_enabled(ErrorCode::LinelenExceeded));
    ctx.unsuppress_warning(ErrorCode::LinelenExceeded);
    assert!(ctx.warning_enabled(ErrorCode::LinelenExceeded));
    // errors can never be suppressed
    assert!(!ctx.suppress_warning(ErrorCode::DefNotFound));
}

#[test]
fn test_find_by_namespace_id() {
    let sources = MapSourceProvider::new()
        .with("a", "module a { namespace urn:x:a; prefix a; }")
        .with("b", "module b { namespace urn:x:b; prefix b; }");
    let mut ctx = ctx_with(sources);
    let a = ctx.load("a", None).unwrap();
    ctx.load("b", None).unwrap();

    let nsid = ctx.module(a).unwrap().namespace_id;
    let found = ctx.module_registry().find_by_nsid(nsid).unwrap();
    assert_eq!(found.name, "a");
}
