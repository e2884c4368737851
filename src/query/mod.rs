//! The walker and query API.
//!
//! Everything here hands out shared references into the registry; nothing
//! transfers ownership. Iterators that honor feature gates snapshot the
//! feature state when they are created, so toggling a feature between
//! queries is safe and toggling mid-iteration has no effect on a live
//! iterator.

use smol_str::SmolStr;

use crate::diag::{Error, ErrorCode, Result};
use crate::link::find_data_child;
use crate::schema::{Grouping, Module, NodeKind, SchemaNode, Typedef};
use crate::Context;

/// Visitor verdict for [`walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    Stop,
}

/// Filter flags for data-object iteration.
#[derive(Debug, Clone, Copy)]
pub struct IterFilter {
    /// Skip nodes disabled by an if-feature gate.
    pub skip_disabled: bool,
    /// Descend through choice/case pseudo-nodes and yield their real
    /// data children instead.
    pub skip_pseudo: bool,
}

impl Default for IterFilter {
    fn default() -> Self {
        Self {
            skip_disabled: true,
            skip_pseudo: true,
        }
    }
}

impl Context {
    // ============================================================
    // Module lookup
    // ============================================================

    /// Find a registered module: session scope first, then current.
    pub fn find_module(&self, name: &str, revision: Option<&str>) -> Option<&Module> {
        self.modules.find(name, revision)
    }

    /// Find a typedef in a module, optionally searching its submodules.
    pub fn find_typedef_in<'a>(
        &'a self,
        module: &'a Module,
        name: &str,
        search_submodules: bool,
    ) -> Option<&'a Typedef> {
        if let Some(typedef) = module.find_typedef(name) {
            return Some(typedef);
        }
        if !search_submodules {
            return None;
        }
        module
            .all_includes
            .iter()
            .filter_map(|include| self.modules.find_submodule(include))
            .find_map(|sub| sub.find_typedef(name))
    }

    /// Find a grouping in a module, optionally searching its submodules.
    pub fn find_grouping_in<'a>(
        &'a self,
        module: &'a Module,
        name: &str,
        search_submodules: bool,
    ) -> Option<&'a Grouping> {
        if let Some(grouping) = module.find_grouping(name) {
            return Some(grouping);
        }
        if !search_submodules {
            return None;
        }
        module
            .all_includes
            .iter()
            .filter_map(|include| self.modules.find_submodule(include))
            .find_map(|sub| sub.find_grouping(name))
    }

    // ============================================================
    // Object lookup
    // ============================================================

    /// Find a top-level object of a module by local name.
    pub fn find_object_top<'a>(
        &self,
        module: &'a Module,
        name: &str,
    ) -> Option<&'a SchemaNode> {
        find_data_child(&module.nodes, name)
    }

    /// Find an object by local name anywhere: session scope first, then
    /// the current scope, first match wins.
    pub fn find_object_anywhere(&self, name: &str) -> Option<(&Module, &SchemaNode)> {
        self.modules
            .iter_default()
            .find_map(|(_, module)| find_data_child(&module.nodes, name).map(|n| (module, n)))
    }

    /// Like [`find_object_anywhere`](Self::find_object_anywhere), but
    /// requires the name to be unique across modules.
    pub fn find_object_distinct(&self, name: &str) -> Result<(&Module, &SchemaNode)> {
        let mut found: Option<(&Module, &SchemaNode)> = None;
        for (_, module) in self.modules.iter_default() {
            if let Some(node) = find_data_child(&module.nodes, name) {
                if let Some((first, _)) = found {
                    if first.name != module.name {
                        return Err(Error::MultipleMatches { name: name.into() });
                    }
                } else {
                    found = Some((module, node));
                }
            }
        }
        found.ok_or_else(|| Error::DefNotFound { name: name.into() })
    }

    // ============================================================
    // RPC lookup
    // ============================================================

    /// Find an rpc by exact name.
    pub fn find_rpc<'a>(&self, module: &'a Module, name: &str) -> Option<&'a SchemaNode> {
        module.nodes.iter().find(|n| n.is_rpc() && n.name == name)
    }

    /// Byte-wise prefix match over a module's rpcs. Returns the first
    /// match in insertion order and the total match count.
    pub fn match_rpc<'a>(
        &self,
        module: &'a Module,
        name_prefix: &str,
    ) -> (Option<&'a SchemaNode>, usize) {
        let mut first = None;
        let mut count = 0;
        for node in &module.nodes {
            if node.is_rpc() && node.name.as_bytes().starts_with(name_prefix.as_bytes()) {
                if first.is_none() {
                    first = Some(node);
                }
                count += 1;
            }
        }
        (first, count)
    }

    /// Prefix match across the registry, or one module when named.
    pub fn match_any_rpc(
        &self,
        module_name: Option<&str>,
        name_prefix: &str,
    ) -> (Option<&SchemaNode>, usize) {
        match module_name {
            Some(name) => match self.modules.find(name, None) {
                Some(module) => self.match_rpc(module, name_prefix),
                None => (None, 0),
            },
            None => {
                let mut first = None;
                let mut count = 0;
                for (_, module) in self.modules.iter_default() {
                    let (hit, module_count) = self.match_rpc(module, name_prefix);
                    if first.is_none() {
                        first = hit;
                    }
                    count += module_count;
                }
                (first, count)
            }
        }
    }

    /// Report an ambiguous rpc prefix, listing every candidate.
    pub fn report_rpc_ambiguity(&mut self, module_name: Option<&str>, name_prefix: &str) {
        let mut candidates: Vec<String> = Vec::new();
        for (_, module) in self.modules.iter_default() {
            if module_name.is_some_and(|name| name != module.name) {
                continue;
            }
            for node in &module.nodes {
                if node.is_rpc() && node.name.as_bytes().starts_with(name_prefix.as_bytes()) {
                    candidates.push(format!("{}:{}", module.name, node.name));
                }
            }
        }
        let location = crate::base::SourceLocation::default();
        self.diags.emit(
            location,
            ErrorCode::AmbiguousCommand,
            format!(
                "ambiguous partial command name '{}': matches {}",
                name_prefix,
                candidates.join(", ")
            ),
        );
    }

    // ============================================================
    // Feature state
    // ============================================================

    /// A feature's effective state: its own compile and runtime flags and
    /// every ancestor gate, across modules.
    pub fn feature_effective(&self, module: &Module, feature_name: &str) -> bool {
        let mut visited = Vec::new();
        self.feature_effective_inner(module, feature_name, &mut visited)
    }

    fn feature_effective_inner(
        &self,
        module: &Module,
        feature_name: &str,
        visited: &mut Vec<(SmolStr, SmolStr)>,
    ) -> bool {
        let key = (module.name.clone(), SmolStr::new(feature_name));
        if visited.contains(&key) {
            return true; // gate cycles were rejected at resolve time
        }
        visited.push(key);

        let Some(feature) = module.find_feature(feature_name).or_else(|| {
            module
                .all_includes
                .iter()
                .filter_map(|include| self.modules.find_submodule(include))
                .find_map(|sub| sub.find_feature(feature_name))
        }) else {
            return false;
        };
        if !feature.self_enabled() {
            return false;
        }
        feature.if_features.iter().all(|gate| {
            let Some(owner) = &gate.resolved_module else {
                return false;
            };
            let owner_module = if *owner == module.name {
                Some(module)
            } else {
                self.modules.find(owner, None)
            };
            owner_module
                .is_some_and(|m| self.feature_effective_inner(m, &gate.name, visited))
        })
    }

    /// Whether a node passes all of its if-feature gates.
    pub fn node_enabled(&self, module: &Module, node: &SchemaNode) -> bool {
        node.if_features.iter().all(|gate| {
            let Some(owner) = &gate.resolved_module else {
                return false;
            };
            let owner_module = if *owner == module.name {
                Some(module)
            } else {
                self.modules.find(owner, None)
            };
            owner_module.is_some_and(|m| self.feature_effective(m, &gate.name))
        })
    }

    // ============================================================
    // Iteration
    // ============================================================

    /// Iterate a module's top-level data objects under a filter. The
    /// feature state is evaluated once, here, not per step.
    pub fn data_objects<'a>(
        &self,
        module: &'a Module,
        filter: IterFilter,
    ) -> DataObjectIter<'a> {
        let mut snapshot = Vec::new();
        self.collect_data_objects(module, &module.nodes, filter, &mut snapshot);
        DataObjectIter {
            nodes: snapshot,
            cursor: 0,
        }
    }

    /// First top-level data object under the default filter.
    pub fn first_data_object<'a>(&self, module: &'a Module) -> Option<&'a SchemaNode> {
        self.data_objects(module, IterFilter::default()).next()
    }

    fn collect_data_objects<'a>(
        &self,
        module: &Module,
        nodes: &'a [SchemaNode],
        filter: IterFilter,
        out: &mut Vec<&'a SchemaNode>,
    ) {
        for node in nodes {
            if node.is_rpc() || node.is_notification() || !node.is_data_node() {
                continue;
            }
            if filter.skip_disabled && !self.node_enabled(module, node) {
                continue;
            }
            if filter.skip_pseudo && node.is_pseudo_node() {
                self.collect_data_objects(module, node.children(), filter, out);
                continue;
            }
            out.push(node);
        }
    }

    // ============================================================
    // Key traversal
    // ============================================================

    /// Walk the key leaves of every list on the path from the module root
    /// down to `node_path`, in root-to-leaf order. Code generators use
    /// this to emit key parameter lists.
    pub fn traverse_keys(
        &self,
        module: &Module,
        node_path: &[SmolStr],
        visitor: &mut dyn FnMut(&SchemaNode),
    ) {
        let mut nodes: &[SchemaNode] = &module.nodes;
        for step in node_path {
            let Some(node) = find_data_child(nodes, step) else {
                return;
            };
            if let NodeKind::List(list) = &node.kind {
                for key in &list.keys {
                    if let Some(key_leaf) = find_data_child(node.children(), key) {
                        visitor(key_leaf);
                    }
                }
            }
            nodes = node.children();
        }
    }
}

/// Snapshot iterator over top-level data objects.
pub struct DataObjectIter<'a> {
    nodes: Vec<&'a SchemaNode>,
    cursor: usize,
}

impl<'a> Iterator for DataObjectIter<'a> {
    type Item = &'a SchemaNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.nodes.get(self.cursor)?;
        self.cursor += 1;
        Some(node)
    }
}

/// Depth-first pre-order walk with a visitor. The visitor can stop the
/// walk early.
pub fn walk<S>(
    nodes: &[SchemaNode],
    state: &mut S,
    visitor: &mut impl FnMut(&SchemaNode, &mut S) -> Walk,
) -> Walk {
    for node in nodes {
        if visitor(node, state) == Walk::Stop {
            return Walk::Stop;
        }
        if walk(node.children(), state, visitor) == Walk::Stop {
            return Walk::Stop;
        }
    }
    Walk::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::MapSourceProvider;

    fn ctx_with(sources: MapSourceProvider) -> Context {
        Context::with_provider(Box::new(sources))
    }

    #[test]
    fn test_match_rpc_counts() {
        let sources = MapSourceProvider::new().with(
            "m",
            "module m { namespace urn:x:m; prefix m; \
             rpc get-config { input { leaf source { type string; } } } \
             rpc get-state; rpc kill-session; }",
        );
        let mut ctx = ctx_with(sources);
        let id = ctx.load("m", None).unwrap();
        let module = ctx.module(id).unwrap();

        let (first, count) = ctx.match_rpc(module, "get-");
        assert_eq!(count, 2);
        assert_eq!(first.unwrap().name, "get-config");

        let (first, count) = ctx.match_rpc(module, "get-c");
        assert_eq!(count, 1);
        assert_eq!(first.unwrap().name, "get-config");

        let (first, count) = ctx.match_rpc(module, "nope");
        assert!(first.is_none());
        assert_eq!(count, 0);
    }

    #[test]
    fn test_match_any_rpc_across_modules() {
        let sources = MapSourceProvider::new()
            .with("a", "module a { namespace urn:x:a; prefix a; rpc run-job; }")
            .with("b", "module b { namespace urn:x:b; prefix b; rpc run-check; }");
        let mut ctx = ctx_with(sources);
        ctx.load("a", None).unwrap();
        ctx.load("b", None).unwrap();

        let (first, count) = ctx.match_any_rpc(None, "run-");
        assert_eq!(count, 2);
        assert!(first.is_some());

        let (_, count) = ctx.match_any_rpc(Some("a"), "run-");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_find_object_distinct() {
        let sources = MapSourceProvider::new()
            .with("a", "module a { namespace urn:x:a; prefix a; leaf shared { type string; } }")
            .with("b", "module b { namespace urn:x:b; prefix b; leaf shared { type string; } leaf only { type string; } }");
        let mut ctx = ctx_with(sources);
        ctx.load("a", None).unwrap();
        ctx.load("b", None).unwrap();

        assert!(ctx.find_object_anywhere("shared").is_some());
        assert!(matches!(
            ctx.find_object_distinct("shared"),
            Err(Error::MultipleMatches { .. })
        ));
        assert!(ctx.find_object_distinct("only").is_ok());
        assert!(matches!(
            ctx.find_object_distinct("ghost"),
            Err(Error::DefNotFound { .. })
        ));
    }

    #[test]
    fn test_data_object_iteration_skips_rpcs() {
        let sources = MapSourceProvider::new().with(
            "m",
            "module m { namespace urn:x:m; prefix m; \
             leaf a { type string; } rpc act; notification alarm; \
             container c { leaf inner { type string; } } }",
        );
        let mut ctx = ctx_with(sources);
        let id = ctx.load("m", None).unwrap();
        let module = ctx.module(id).unwrap();
        let names: Vec<&str> = ctx
            .data_objects(module, IterFilter::default())
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_choice_flattening() {
        let sources = MapSourceProvider::new().with(
            "m",
            "module m { namespace urn:x:m; prefix m; \
             choice transport { leaf tcp { type empty; } leaf tls { type empty; } } }",
        );
        let mut ctx = ctx_with(sources);
        let id = ctx.load("m", None).unwrap();
        let module = ctx.module(id).unwrap();

        let flattened: Vec<&str> = ctx
            .data_objects(module, IterFilter::default())
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(flattened, vec!["tcp", "tls"]);

        let raw: Vec<&str> = ctx
            .data_objects(
                module,
                IterFilter {
                    skip_pseudo: false,
                    ..Default::default()
                },
            )
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(raw, vec!["transport"]);
    }

    #[test]
    fn test_traverse_keys() {
        let sources = MapSourceProvider::new().with(
            "m",
            "module m { namespace urn:x:m; prefix m; \
             list outer { key name; leaf name { type string; } \
               list inner { key \"id sub\"; leaf id { type uint32; } leaf sub { type uint8; } \
                 leaf payload { type string; } } } }",
        );
        let mut ctx = ctx_with(sources);
        let id = ctx.load("m", None).unwrap();
        let module = ctx.module(id).unwrap();

        let mut keys = Vec::new();
        ctx.traverse_keys(
            module,
            &["outer".into(), "inner".into(), "payload".into()],
            &mut |key| keys.push(key.name.to_string()),
        );
        assert_eq!(keys, vec!["name", "id", "sub"]);
    }

    #[test]
    fn test_walk_stops_early() {
        let sources = MapSourceProvider::new().with(
            "m",
            "module m { namespace urn:x:m; prefix m; \
             container c { leaf a { type string; } leaf b { type string; } } }",
        );
        let mut ctx = ctx_with(sources);
        let id = ctx.load("m", None).unwrap();
        let module = ctx.module(id).unwrap();

        let mut seen = 0usize;
        let verdict = walk(&module.nodes, &mut seen, &mut |node, seen| {
            *seen += 1;
            if node.name == "a" {
                Walk::Stop
            } else {
                Walk::Continue
            }
        });
        assert_eq!(verdict, Walk::Stop);
        assert_eq!(seen, 2);
    }
}
