//! Feature conditioning, augment splicing, and deviation scenarios.

use yangc::link::MapSourceProvider;
use yangc::{BaseType, Context, ErrorCode, IterFilter, Severity};

fn ctx_with(sources: MapSourceProvider) -> Context {
    Context::with_provider(Box::new(sources))
}

#[test]
fn test_feature_gate_toggling() {
    let sources = MapSourceProvider::new().with(
        "a",
        "module a { namespace urn:x:a; prefix a; \
         feature x; \
         leaf l { if-feature x; type string; } }",
    );
    let mut ctx = ctx_with(sources);
    let id = ctx.load("a", None).unwrap();
    ctx.set_feature_runtime("a", "x", false).unwrap();

    let module = ctx.module(id).unwrap();
    assert!(
        ctx.first_data_object(module).is_none(),
        "the default filter must skip a feature-disabled leaf"
    );

    ctx.set_feature_runtime("a", "x", true).unwrap();
    let module = ctx.module(id).unwrap();
    let first = ctx.first_data_object(module).expect("leaf visible again");
    assert_eq!(first.name, "l");
}

#[test]
fn test_feature_gate_chain() {
    let sources = MapSourceProvider::new().with(
        "a",
        "module a { namespace urn:x:a; prefix a; \
         feature base; \
         feature extended { if-feature base; } \
         leaf l { if-feature extended; type string; } }",
    );
    let mut ctx = ctx_with(sources);
    let id = ctx.load("a", None).unwrap();

    // disabling the ancestor disables the dependent feature's subtree
    ctx.set_feature_runtime("a", "base", false).unwrap();
    let module = ctx.module(id).unwrap();
    assert!(!ctx.feature_effective(module, "extended"));
    assert!(ctx.first_data_object(module).is_none());

    ctx.set_feature_runtime("a", "base", true).unwrap();
    let module = ctx.module(id).unwrap();
    assert!(ctx.feature_effective(module, "extended"));
    assert!(ctx.first_data_object(module).is_some());
}

#[test]
fn test_iterator_snapshots_feature_state() {
    let sources = MapSourceProvider::new().with(
        "a",
        "module a { namespace urn:x:a; prefix a; \
         feature x; \
         leaf l { if-feature x; type string; } \
         leaf plain { type string; } }",
    );
    let mut ctx = ctx_with(sources);
    let id = ctx.load("a", None).unwrap();

    let module = ctx.module(id).unwrap();
    let names: Vec<&str> = ctx
        .data_objects(module, IterFilter::default())
        .map(|n| n.name.as_str())
        .collect();
    assert_eq!(names, vec!["l", "plain"]);
}

#[test]
fn test_augment_then_deviation_prunes_target() {
    let sources = MapSourceProvider::new()
        .with(
            "a",
            "module a { namespace urn:x:a; prefix a; container c { leaf base { type string; } } }",
        )
        .with(
            "b",
            "module b { namespace urn:x:b; prefix b; import a { prefix a; } \
             augment /a:c { leaf q { type uint8; } } }",
        )
        .with(
            "c",
            "module c { namespace urn:x:c; prefix c; \
             import a { prefix a; } import b { prefix b; } \
             deviation /a:c/b:q { deviate not-supported; } }",
        );
    let mut ctx = ctx_with(sources);
    let a = ctx.load("a", None).unwrap();
    ctx.load("b", None).unwrap();

    // after the augment, q exists in a's tree with b's namespace
    {
        let module_a = ctx.module(a).unwrap();
        let container = ctx.find_object_top(module_a, "c").unwrap();
        let q = container.child("q").expect("augmented leaf spliced in");
        let module_b = ctx.find_module("b", None).unwrap();
        assert_eq!(q.namespace_id, module_b.namespace_id);
        assert_eq!(q.type_spec().unwrap().base, Some(BaseType::Uint8));
    }

    ctx.load("c", None).unwrap();

    // after the deviation, q is pruned
    let module_a = ctx.module(a).unwrap();
    let container = ctx.find_object_top(module_a, "c").unwrap();
    assert!(container.child("q").is_none(), "not-supported node pruned");
    assert!(container.child("base").is_some(), "sibling unaffected");
}

#[test]
fn test_augment_choice_synthesizes_case() {
    let sources = MapSourceProvider::new()
        .with(
            "a",
            "module a { namespace urn:x:a; prefix a; \
             choice transport { case tcp { leaf tcp-port { type uint16; } } } }",
        )
        .with(
            "b",
            "module b { namespace urn:x:b; prefix b; import a { prefix a; } \
             augment /a:transport { leaf tls-port { type uint16; } } }",
        );
    let mut ctx = ctx_with(sources);
    let a = ctx.load("a", None).unwrap();
    ctx.load("b", None).unwrap();

    let module_a = ctx.module(a).unwrap();
    let choice = module_a.find_node("transport").unwrap();
    let case = choice
        .children()
        .iter()
        .find(|c| c.name == "tls-port")
        .expect("augmented child present");
    assert!(
        matches!(case.kind, yangc::schema::NodeKind::Case(_)),
        "non-case augment children get a wrapping case"
    );
}

#[test]
fn test_deviation_unknown_target_nonfatal() {
    let sources = MapSourceProvider::new()
        .with(
            "a",
            "module a { namespace urn:x:a; prefix a; container c; }",
        )
        .with(
            "d",
            "module d { namespace urn:x:d; prefix d; import a { prefix a; } \
             deviation /a:c/a:ghost { deviate not-supported; } }",
        );
    let mut ctx = ctx_with(sources);
    ctx.load("a", None).unwrap();
    ctx.load("d", None).expect("unknown deviation target is non-fatal");
    assert!(ctx
        .diagnostics()
        .iter()
        .any(|d| d.code == ErrorCode::DeviationTargetMissing
            && d.severity == Severity::Warning));
}

#[test]
fn test_deviation_replace_edits() {
    let sources = MapSourceProvider::new()
        .with(
            "a",
            "module a { namespace urn:x:a; prefix a; \
             leaf timeout { type uint32; default 30; } }",
        )
        .with(
            "d",
            "module d { namespace urn:x:d; prefix d; import a { prefix a; } \
             deviation /a:timeout { deviate replace { default 60; } } }",
        );
    let mut ctx = ctx_with(sources);
    let a = ctx.load("a", None).unwrap();
    ctx.load("d", None).unwrap();

    let module_a = ctx.module(a).unwrap();
    let timeout = ctx.find_object_top(module_a, "timeout").unwrap();
    match &timeout.kind {
        yangc::schema::NodeKind::Leaf(leaf) => {
            assert_eq!(leaf.default.as_deref(), Some("60"));
        }
        _ => panic!("expected leaf"),
    }
}

#[test]
fn test_disabling_feature_never_enables() {
    // if-feature monotonicity: flipping one feature off only ever shrinks
    // the visible set
    let sources = MapSourceProvider::new().with(
        "a",
        "module a { namespace urn:x:a; prefix a; \
         feature f1; feature f2; \
         leaf a1 { if-feature f1; type string; } \
         leaf a2 { if-feature f2; type string; } \
         leaf a3 { type string; } }",
    );
    let mut ctx = ctx_with(sources);
    let id = ctx.load("a", None).unwrap();

    let visible = |ctx: &Context| -> Vec<String> {
        let module = ctx.module(id).unwrap();
        ctx.data_objects(module, IterFilter::default())
            .map(|n| n.name.to_string())
            .collect()
    };

    let before = visible(&ctx);
    ctx.set_feature_runtime("a", "f1", false).unwrap();
    let after = visible(&ctx);
    assert!(
        after.iter().all(|name| before.contains(name)),
        "disabling must not reveal new nodes"
    );
    assert!(!after.contains(&"a1".to_string()));
    assert!(after.contains(&"a3".to_string()));
}
