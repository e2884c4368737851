//! End-to-end load and resolution scenarios.

use yangc::link::MapSourceProvider;
use yangc::schema::NodeKind;
use yangc::{BaseType, Context, ErrorCode};

fn ctx_with(sources: MapSourceProvider) -> Context {
    Context::with_provider(Box::new(sources))
}

#[test]
fn test_simple_load() {
    let sources = MapSourceProvider::new().with(
        "a",
        "module a { namespace urn:x:a; prefix a; leaf foo { type uint32; } }",
    );
    let mut ctx = ctx_with(sources);
    let id = ctx.load("a", None).expect("load should succeed");
    let module = ctx.module(id).unwrap();

    let foo = ctx
        .find_object_top(module, "foo")
        .expect("foo should be found at top level");
    assert_eq!(foo.type_spec().unwrap().base, Some(BaseType::Uint32));
    assert!(foo.effective_config(true), "config inherits true");
    assert!(foo.if_features.is_empty());
    assert_eq!(module.errors, 0);
}

#[test]
fn test_import_resolution_clones_grouping() {
    let sources = MapSourceProvider::new()
        .with(
            "a",
            "module a { namespace urn:x:a; prefix a; \
             grouping foo { leaf name { type string; } leaf size { type uint16; } } }",
        )
        .with(
            "b",
            "module b { namespace urn:x:b; prefix b; import a { prefix p; } \
             container holder { uses p:foo; } }",
        );
    let mut ctx = ctx_with(sources);
    let b = ctx.load("b", None).expect("b should load");
    let module_b = ctx.module(b).unwrap();
    assert_eq!(module_b.errors, 0, "b should resolve cleanly");

    let module_a = ctx.find_module("a", None).expect("a loaded via import");
    assert!(
        ctx.find_grouping_in(module_a, "foo", true).is_some(),
        "a's grouping stays findable"
    );

    let holder = ctx.find_object_top(module_b, "holder").unwrap();
    let name = holder.child("name").expect("cloned leaf present");
    assert_eq!(
        name.namespace_id, module_b.namespace_id,
        "cloned children take the using module's namespace"
    );
    assert_eq!(name.type_spec().unwrap().base, Some(BaseType::String));
}

#[test]
fn test_grouping_clone_matches_inline() {
    // `uses g` must yield the same subtree as writing g's body inline
    let grouping_body = "leaf host { type string; } leaf-list ports { type uint16; }";
    let sources = MapSourceProvider::new()
        .with(
            "used",
            &format!(
                "module used {{ namespace urn:x:used; prefix u; \
                 grouping g {{ {grouping_body} }} container c {{ uses g; }} }}"
            ),
        )
        .with(
            "inline",
            &format!(
                "module inline {{ namespace urn:x:inline; prefix i; \
                 container c {{ {grouping_body} }} }}"
            ),
        );
    let mut ctx = ctx_with(sources);
    let used = ctx.load("used", None).unwrap();
    let inline = ctx.load("inline", None).unwrap();

    let expanded = ctx
        .find_object_top(ctx.module(used).unwrap(), "c")
        .unwrap();
    let reference = ctx
        .find_object_top(ctx.module(inline).unwrap(), "c")
        .unwrap();

    let expanded_names: Vec<&str> = expanded.children().iter().map(|n| n.name.as_str()).collect();
    let reference_names: Vec<&str> =
        reference.children().iter().map(|n| n.name.as_str()).collect();
    assert_eq!(expanded_names, reference_names);
    for (a, b) in expanded.children().iter().zip(reference.children()) {
        assert_eq!(a.type_spec().unwrap().base, b.type_spec().unwrap().base);
    }
}

#[test]
fn test_typedef_chain_binds_base() {
    let sources = MapSourceProvider::new().with(
        "m",
        "module m { namespace urn:x:m; prefix m; \
         typedef percent { type uint8 { range 0..100; } } \
         typedef load { type percent; } \
         leaf cpu { type load; } }",
    );
    let mut ctx = ctx_with(sources);
    let id = ctx.load("m", None).unwrap();
    let module = ctx.module(id).unwrap();
    assert_eq!(module.errors, 0);

    let cpu = ctx.find_object_top(module, "cpu").unwrap();
    let spec = cpu.type_spec().unwrap();
    assert_eq!(spec.base, Some(BaseType::Uint8));
    assert_eq!(
        spec.resolved_typedef.as_ref().map(|(m, t)| (m.as_str(), t.as_str())),
        Some(("m", "load"))
    );
}

#[test]
fn test_cross_module_typedef() {
    let sources = MapSourceProvider::new()
        .with(
            "base-types",
            "module base-types { namespace urn:x:bt; prefix bt; \
             typedef counter { type uint64; } }",
        )
        .with(
            "user",
            "module user { namespace urn:x:user; prefix u; \
             import base-types { prefix bt; } \
             leaf hits { type bt:counter; } }",
        );
    let mut ctx = ctx_with(sources);
    let id = ctx.load("user", None).unwrap();
    let module = ctx.module(id).unwrap();
    assert_eq!(module.errors, 0);
    let hits = ctx.find_object_top(module, "hits").unwrap();
    assert_eq!(hits.type_spec().unwrap().base, Some(BaseType::Uint64));
}

#[test]
fn test_unresolved_type_reported() {
    let sources = MapSourceProvider::new().with(
        "m",
        "module m { namespace urn:x:m; prefix m; leaf x { type no-such-type; } }",
    );
    let mut ctx = ctx_with(sources);
    let id = ctx.load("m", None).expect("imperfect module still registers");
    let module = ctx.module(id).unwrap();
    assert!(module.errors > 0);
    assert!(
        ctx.diagnostics()
            .iter()
            .any(|d| d.message.contains("no-such-type")),
        "the unresolved name should be reported"
    );
}

#[test]
fn test_leafref_dereference() {
    let sources = MapSourceProvider::new().with(
        "m",
        "module m { namespace urn:x:m; prefix m; \
         container servers { list server { key name; \
           leaf name { type string; } } } \
         leaf active { type leafref { path /m:servers/m:server/m:name; } } \
         leaf broken { type leafref { path /m:servers/m:missing; } } }",
    );
    let mut ctx = ctx_with(sources);
    let id = ctx.load("m", None).unwrap();
    let module = ctx.module(id).unwrap();
    assert_eq!(module.errors, 1, "only the broken leafref should error");
    assert!(ctx
        .diagnostics()
        .iter()
        .any(|d| d.message.contains("/m:servers/m:missing")));
}

#[test]
fn test_relative_leafref() {
    let sources = MapSourceProvider::new().with(
        "m",
        "module m { namespace urn:x:m; prefix m; \
         container c { leaf name { type string; } \
           leaf alias { type leafref { path ../name; } } } }",
    );
    let mut ctx = ctx_with(sources);
    let id = ctx.load("m", None).unwrap();
    assert_eq!(ctx.module(id).unwrap().errors, 0);
}

#[test]
fn test_identity_linkage() {
    let sources = MapSourceProvider::new()
        .with(
            "crypto-base",
            "module crypto-base { namespace urn:x:cb; prefix cb; \
             identity hash-algorithm; }",
        )
        .with(
            "crypto",
            "module crypto { namespace urn:x:c; prefix c; \
             import crypto-base { prefix cb; } \
             identity sha-256 { base cb:hash-algorithm; } \
             identity sha-512 { base cb:hash-algorithm; } }",
        );
    let mut ctx = ctx_with(sources);
    ctx.load("crypto", None).unwrap();

    let base_module = ctx.find_module("crypto-base", None).unwrap();
    let root = base_module.find_identity("hash-algorithm").unwrap();
    let derived: Vec<&str> = root.derived.iter().map(|(_, name)| name.as_str()).collect();
    assert_eq!(derived, vec!["sha-256", "sha-512"]);

    let crypto = ctx.find_module("crypto", None).unwrap();
    let sha = crypto.find_identity("sha-256").unwrap();
    assert_eq!(
        sha.base_resolved.as_ref().map(|(m, n)| (m.as_str(), n.as_str())),
        Some(("crypto-base", "hash-algorithm"))
    );
}

#[test]
fn test_identity_cycle_is_fatal() {
    let sources = MapSourceProvider::new().with(
        "m",
        "module m { namespace urn:x:m; prefix m; \
         identity a { base b; } identity b { base a; } }",
    );
    let mut ctx = ctx_with(sources);
    assert!(ctx.load("m", None).is_err(), "identity cycles abort the load");
}

#[test]
fn test_deprecated_typedef_reference_warns() {
    let sources = MapSourceProvider::new().with(
        "m",
        "module m { namespace urn:x:m; prefix m; \
         typedef old-type { type string; status deprecated; } \
         leaf l { type old-type; } }",
    );
    let mut ctx = ctx_with(sources);
    let id = ctx.load("m", None).unwrap();
    assert_eq!(ctx.module(id).unwrap().errors, 0);
    assert!(ctx
        .diagnostics()
        .iter()
        .any(|d| d.code == ErrorCode::UsingDeprecated));
}

#[test]
fn test_obsolete_nodes_pruned() {
    let sources = MapSourceProvider::new().with(
        "m",
        "module m { namespace urn:x:m; prefix m; \
         leaf current { type string; } \
         leaf gone { type string; status obsolete; } }",
    );
    let mut ctx = ctx_with(sources);
    let id = ctx.load("m", None).unwrap();
    let module = ctx.module(id).unwrap();
    assert!(ctx.find_object_top(module, "current").is_some());
    assert!(
        ctx.find_object_top(module, "gone").is_none(),
        "obsolete nodes are removed from the registered tree"
    );
}

#[test]
fn test_choice_in_tree() {
    let sources = MapSourceProvider::new().with(
        "m",
        "module m { namespace urn:x:m; prefix m; \
         choice proto { default tcp; \
           case tcp { leaf tcp-port { type uint16; } } \
           case udp { leaf udp-port { type uint16; } } } }",
    );
    let mut ctx = ctx_with(sources);
    let id = ctx.load("m", None).unwrap();
    let module = ctx.module(id).unwrap();
    let choice = module.find_node("proto").unwrap();
    match &choice.kind {
        NodeKind::Choice(c) => {
            assert_eq!(c.default_case.as_deref(), Some("tcp"));
            assert_eq!(c.children.len(), 2);
        }
        other => panic!("expected choice, got {}", other.keyword()),
    }
}
