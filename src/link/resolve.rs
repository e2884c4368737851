//! The multi-pass reference resolver.
//!
//! Resolution runs stages in order until a pass makes no progress or the
//! pass budget runs out: base-type binding, grouping expansion, augment
//! splicing, identity linkage, if-feature resolution, deviation
//! application. The leafref dereference check and unresolved-reference
//! reporting run once at the end, when every node that will ever exist
//! does.
//!
//! The module under resolution is taken out of the registry for the
//! duration of a pass; edits against *other* modules (augment splices,
//! identity back-pointers, deviations) are queued as ops and applied
//! after the module goes back.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::base::constants::MAX_RESOLVE_PASSES;
use crate::base::{ModuleId, SourceLocation};
use crate::diag::{Error, ErrorCode, Result};
use crate::registry::ModuleRegistry;
use crate::schema::{
    CaseNode, Deviate, DeviateEdits, Module, NodeKind, QualifiedRef, SchemaNode, TypeSpec,
};
use crate::types::BaseType;
use crate::Context;

/// What a prefix denotes inside one module's source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PrefixTarget {
    SelfModule,
    Other(ModuleId),
}

/// Resolve a source-spelled prefix against a module's own prefix and its
/// imports. `None` means the prefix is unknown (or its import failed).
pub(crate) fn resolve_prefix(module: &Module, prefix: Option<&str>) -> Option<PrefixTarget> {
    match prefix {
        None => Some(PrefixTarget::SelfModule),
        Some(p) if p == module.prefix => Some(PrefixTarget::SelfModule),
        Some(p) => module
            .import_by_prefix(p)
            .and_then(|imp| imp.resolved)
            .map(PrefixTarget::Other),
    }
}

/// Find a direct child by name, descending transparently through choice
/// and case pseudo-nodes the way data-tree paths do.
pub(crate) fn find_data_child<'a>(nodes: &'a [SchemaNode], name: &str) -> Option<&'a SchemaNode> {
    for node in nodes {
        if node.name == name && !matches!(node.kind, NodeKind::Augment(_)) {
            return Some(node);
        }
        if node.is_pseudo_node() {
            if let Some(found) = find_data_child(node.children(), name) {
                return Some(found);
            }
        }
    }
    None
}

fn find_data_child_mut<'a>(
    nodes: &'a mut Vec<SchemaNode>,
    name: &str,
) -> Option<&'a mut SchemaNode> {
    // index first: the borrow checker cannot split the recursive search
    let position = nodes
        .iter()
        .position(|n| n.name == name && !matches!(n.kind, NodeKind::Augment(_)));
    if let Some(index) = position {
        return nodes.get_mut(index);
    }
    for node in nodes {
        if node.is_pseudo_node() {
            if let Some(children) = node.children_mut() {
                if let Some(found) = find_data_child_mut(children, name) {
                    return Some(found);
                }
            }
        }
    }
    None
}

/// Walk a name path from a set of top-level nodes.
pub(crate) fn navigate<'a>(nodes: &'a [SchemaNode], steps: &[SmolStr]) -> Option<&'a SchemaNode> {
    let (first, rest) = steps.split_first()?;
    let mut node = find_data_child(nodes, first)?;
    for step in rest {
        node = find_data_child(node.children(), step)?;
    }
    Some(node)
}

fn navigate_mut<'a>(
    nodes: &'a mut Vec<SchemaNode>,
    steps: &[SmolStr],
) -> Option<&'a mut SchemaNode> {
    let (first, rest) = steps.split_first()?;
    let mut node = find_data_child_mut(nodes, first)?;
    for step in rest {
        node = find_data_child_mut(node.children_mut()?, step)?;
    }
    Some(node)
}

/// Split an absolute schema-node path into prefixed steps.
fn parse_path(path: &str) -> Option<Vec<QualifiedRef>> {
    if !path.starts_with('/') {
        return None;
    }
    let steps: Vec<QualifiedRef> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(QualifiedRef::parse)
        .collect();
    (!steps.is_empty()).then_some(steps)
}

/// Append children to a target node. Choice targets only take cases; a
/// wrapping case is synthesized for anything else.
fn splice_children(target: &mut SchemaNode, children: Vec<SchemaNode>) -> bool {
    let is_choice = matches!(target.kind, NodeKind::Choice(_));
    let Some(slot) = target.children_mut() else {
        return false;
    };
    for child in children {
        if slot.iter().any(|c| c.name == child.name) {
            continue;
        }
        if is_choice && !matches!(child.kind, NodeKind::Case(_)) {
            let mut case = SchemaNode::new(
                child.name.clone(),
                NodeKind::Case(CaseNode {
                    children: vec![child],
                }),
            );
            case.namespace_id = case.children()[0].namespace_id;
            slot.push(case);
        } else {
            slot.push(child);
        }
    }
    true
}

/// A cross-module edit queued during a pass.
enum CrossOp {
    Splice {
        target: ModuleId,
        path: Vec<SmolStr>,
        children: Vec<SchemaNode>,
    },
    PushDerived {
        target: ModuleId,
        identity: SmolStr,
        derived: (SmolStr, SmolStr),
    },
    Deviate {
        target: ModuleId,
        path: Vec<SmolStr>,
        deviate: Deviate,
        location: SourceLocation,
    },
}

/// The effective binding a typedef chase produced.
#[derive(Debug, Clone)]
struct Bound {
    base: BaseType,
    module_name: SmolStr,
    typedef_name: SmolStr,
    enums: Vec<crate::types::EnumValue>,
    bits: Vec<crate::types::Bit>,
    leafref_path: Option<String>,
    fraction_digits: Option<u8>,
}

impl Bound {
    fn from_spec(spec: &TypeSpec, module_name: SmolStr, typedef_name: SmolStr) -> Option<Self> {
        Some(Self {
            base: spec.base?,
            module_name,
            typedef_name,
            enums: spec.enums.clone(),
            bits: spec.bits.clone(),
            leafref_path: spec.leafref_path.clone(),
            fraction_digits: spec.fraction_digits,
        })
    }

    /// Nearer restrictions shadow deeper ones.
    fn overlay(mut self, spec: &TypeSpec) -> Self {
        if !spec.enums.is_empty() {
            self.enums = spec.enums.clone();
        }
        if !spec.bits.is_empty() {
            self.bits = spec.bits.clone();
        }
        if spec.leafref_path.is_some() {
            self.leafref_path = spec.leafref_path.clone();
        }
        if spec.fraction_digits.is_some() {
            self.fraction_digits = spec.fraction_digits;
        }
        self
    }
}

impl Context {
    /// Run resolution to fixpoint on a parked module.
    pub(crate) fn resolve_parked(&mut self, id: ModuleId) -> Result<()> {
        for pass in 0..MAX_RESOLVE_PASSES {
            let mut module = self
                .modules
                .take(id)
                .ok_or_else(|| Error::Internal("vacant module slot in resolve".into()))?;

            let mut pass_state = Pass {
                registry: &self.modules,
                progress: false,
                ops: Vec::new(),
                deferred: Vec::new(),
                fatal: None,
            };
            pass_state.run(&mut module);

            let Pass {
                progress,
                ops,
                deferred,
                fatal,
                ..
            } = pass_state;

            for (location, code, message) in deferred {
                if self.diags.emit(location, code, message) {
                    if code.is_error() {
                        module.inc_errors();
                    } else {
                        module.inc_warnings();
                    }
                }
            }
            self.modules.put_back(id, module);
            self.apply_ops(ops);

            if let Some(err) = fatal {
                return Err(err);
            }
            if !progress {
                tracing::trace!("resolution fixpoint after {} passes", pass + 1);
                break;
            }
        }

        // final stage: leafref dereference + unresolved reporting
        let mut module = self
            .modules
            .take(id)
            .ok_or_else(|| Error::Internal("vacant module slot in final checks".into()))?;
        let deferred = final_checks(&self.modules, &module);
        for (location, code, message) in deferred {
            if self.diags.emit(location, code, message) {
                if code.is_error() {
                    module.inc_errors();
                } else {
                    module.inc_warnings();
                }
            }
        }
        self.modules.put_back(id, module);
        Ok(())
    }

    fn apply_ops(&mut self, ops: Vec<CrossOp>) {
        let mut deviated: Vec<ModuleId> = Vec::new();
        for op in ops {
            match op {
                CrossOp::Splice {
                    target,
                    path,
                    children,
                } => {
                    if let Some(module) = self.modules.get_mut(target) {
                        if let Some(node) = navigate_mut(&mut module.nodes, &path) {
                            splice_children(node, children);
                        }
                    }
                }
                CrossOp::PushDerived {
                    target,
                    identity,
                    derived,
                } => {
                    if let Some(module) = self.modules.get_mut(target) {
                        if let Some(base) =
                            module.identities.iter_mut().find(|i| i.name == identity)
                        {
                            if !base.derived.contains(&derived) {
                                base.derived.push(derived);
                            }
                        }
                    }
                }
                CrossOp::Deviate {
                    target,
                    path,
                    deviate,
                    location,
                } => {
                    let applied = self
                        .modules
                        .get_mut(target)
                        .and_then(|module| navigate_mut(&mut module.nodes, &path))
                        .map(|node| {
                            apply_deviate(node, &deviate);
                        })
                        .is_some();
                    if applied {
                        if !deviated.contains(&target) {
                            deviated.push(target);
                        }
                    } else {
                        self.diags.emit(
                            location,
                            ErrorCode::DeviationTargetMissing,
                            "deviation target disappeared before application",
                        );
                    }
                }
            }
        }
        // not-supported marks on an already-registered target only take
        // effect once its tree is pruned again
        for target in deviated {
            if let Some(module) = self.modules.get_mut(target) {
                crate::link::prune_module(module);
            }
        }
    }
}

/// One resolution pass over one module.
struct Pass<'a> {
    registry: &'a ModuleRegistry,
    progress: bool,
    ops: Vec<CrossOp>,
    /// Diagnostics to emit once the module is back in its slot.
    deferred: Vec<(SourceLocation, ErrorCode, String)>,
    fatal: Option<Error>,
}

impl Pass<'_> {
    fn run(&mut self, module: &mut Module) {
        self.bind_types(module);
        self.expand_uses(module);
        self.splice_augments(module);
        self.link_identities(module);
        self.resolve_if_features(module);
        self.apply_deviations(module);
    }

    fn defer(&mut self, location: SourceLocation, code: ErrorCode, message: String) {
        self.deferred.push((location, code, message));
    }

    // ============================================================
    // Stage 1: base type binding
    // ============================================================

    fn bind_types(&mut self, module: &mut Module) {
        let own_typedefs: FxHashMap<SmolStr, TypeSpec> = module
            .typedefs
            .iter()
            .map(|td| (td.name.clone(), td.type_spec.clone()))
            .collect();
        let chaser = TypeChaser {
            registry: self.registry,
            own_typedefs: &own_typedefs,
            own_name: module.name.clone(),
            own_prefix: module.prefix.clone(),
            imports: module
                .imports
                .iter()
                .filter_map(|imp| Some((imp.prefix.clone(), imp.resolved?)))
                .collect(),
            all_includes: module.all_includes.clone(),
        };

        let mut progress = false;
        let mut errors: Vec<(SourceLocation, ErrorCode, String)> = Vec::new();
        {
            let mut bind = |spec: &mut TypeSpec, location: &SourceLocation| {
                bind_spec(&chaser, spec, location, &mut progress, &mut errors);
            };
            for typedef in &mut module.typedefs {
                let location = typedef.location.clone();
                bind(&mut typedef.type_spec, &location);
            }
            for grouping in &mut module.groupings {
                walk_specs_mut(&mut grouping.children, &mut bind);
            }
            walk_specs_mut(&mut module.nodes, &mut bind);
        }
        self.progress |= progress;
        self.deferred.extend(errors);
    }

    // ============================================================
    // Stage 2: grouping expansion
    // ============================================================

    fn expand_uses(&mut self, module: &mut Module) {
        let own_groupings: FxHashMap<SmolStr, Vec<SchemaNode>> = module
            .groupings
            .iter()
            .map(|g| (g.name.clone(), g.children.clone()))
            .collect();

        let nsid = module.namespace_id;
        let mut work = Expander {
            registry: self.registry,
            module_prefix: module.prefix.clone(),
            imports: module
                .imports
                .iter()
                .filter_map(|imp| Some((imp.prefix.clone(), imp.resolved?)))
                .collect(),
            all_includes: module.all_includes.clone(),
            own_groupings: &own_groupings,
            nsid,
            progress: false,
            deferred: Vec::new(),
        };
        // uses inside grouping bodies expand after the body is cloned
        // into the tree, one nesting level per pass
        work.expand_in(&mut module.nodes);
        self.progress |= work.progress;
        self.deferred.extend(work.deferred);
    }

    // ============================================================
    // Stage 3: augment splicing
    // ============================================================

    fn splice_augments(&mut self, module: &mut Module) {
        let nsid = module.namespace_id;
        for index in 0..module.nodes.len() {
            let (target_path, applied) = match &module.nodes[index].kind {
                NodeKind::Augment(a) => (a.target_path.clone(), a.applied),
                _ => continue,
            };
            if applied {
                continue;
            }
            let location = module.nodes[index].location.clone();
            let Some(steps) = parse_path(&target_path) else {
                self.defer(
                    location,
                    ErrorCode::InvalidValue,
                    format!("malformed augment target '{target_path}'"),
                );
                if let NodeKind::Augment(a) = &mut module.nodes[index].kind {
                    a.applied = true;
                }
                continue;
            };
            let names: Vec<SmolStr> = steps.iter().map(|s| s.name.clone()).collect();

            match resolve_prefix(module, steps[0].prefix.as_deref()) {
                Some(PrefixTarget::SelfModule) => {
                    if navigate(&module.nodes, &names).is_none() {
                        continue; // target may appear in a later pass
                    }
                    let NodeKind::Augment(augment) = &mut module.nodes[index].kind else {
                        continue;
                    };
                    augment.applied = true;
                    let children = std::mem::take(&mut augment.children);
                    if let Some(target) = navigate_mut(&mut module.nodes, &names) {
                        splice_children(target, children);
                    }
                    self.progress = true;
                }
                Some(PrefixTarget::Other(mid)) => {
                    let Some(target_module) = self.registry.get(mid) else {
                        continue;
                    };
                    if navigate(&target_module.nodes, &names).is_none() {
                        continue;
                    }
                    let NodeKind::Augment(augment) = &mut module.nodes[index].kind else {
                        continue;
                    };
                    augment.applied = true;
                    let mut children = std::mem::take(&mut augment.children);
                    // foreign targets carry the augmenting module's namespace
                    for child in &mut children {
                        child.set_namespace_recursive(nsid);
                    }
                    self.ops.push(CrossOp::Splice {
                        target: mid,
                        path: names,
                        children,
                    });
                    self.progress = true;
                }
                None => {} // unknown prefix: reported by the final check
            }
        }
    }

    // ============================================================
    // Stage 4: identity linkage
    // ============================================================

    fn link_identities(&mut self, module: &mut Module) {
        let mut local_pushes: Vec<(SmolStr, (SmolStr, SmolStr))> = Vec::new();

        for index in 0..module.identities.len() {
            let (base, resolved, location, name) = {
                let identity = &module.identities[index];
                (
                    identity.base.clone(),
                    identity.base_resolved.clone(),
                    identity.location.clone(),
                    identity.name.clone(),
                )
            };
            let Some(base) = base else { continue };
            if resolved.is_some() {
                continue;
            }

            let found = match resolve_prefix(module, base.prefix.as_deref()) {
                Some(PrefixTarget::SelfModule) => module
                    .find_identity(&base.name)
                    .map(|_| (module.name.clone(), None)),
                Some(PrefixTarget::Other(mid)) => self.registry.get(mid).and_then(|m| {
                    m.find_identity(&base.name).map(|_| (m.name.clone(), Some(mid)))
                }),
                None => None,
            };
            let Some((base_module_name, other)) = found else {
                continue;
            };

            if let Some(cycle) = self.identity_cycle(module, &name, &base_module_name, &base.name) {
                self.defer(
                    location,
                    ErrorCode::Cycle,
                    format!("identity base cycle through '{cycle}'"),
                );
                self.fatal = Some(Error::IdentityCycle { name: cycle });
                return;
            }

            module.identities[index].base_resolved =
                Some((base_module_name.clone(), base.name.clone()));
            let derived = (module.name.clone(), name);
            match other {
                None => local_pushes.push((base.name.clone(), derived)),
                Some(mid) => self.ops.push(CrossOp::PushDerived {
                    target: mid,
                    identity: base.name.clone(),
                    derived,
                }),
            }
            self.progress = true;
        }

        for (base_name, derived) in local_pushes {
            if let Some(base) = module.identities.iter_mut().find(|i| i.name == base_name) {
                if !base.derived.contains(&derived) {
                    base.derived.push(derived);
                }
            }
        }
    }

    /// Follow the base chain from `(base_module, base_name)`; returns the
    /// identity name closing a cycle back to `(module, start)`.
    fn identity_cycle(
        &self,
        module: &Module,
        start: &str,
        base_module: &str,
        base_name: &str,
    ) -> Option<SmolStr> {
        let mut visited: FxHashSet<(SmolStr, SmolStr)> = FxHashSet::default();
        let mut current = (SmolStr::new(base_module), SmolStr::new(base_name));
        loop {
            if current.0 == module.name && current.1 == start {
                return Some(current.1);
            }
            if !visited.insert(current.clone()) {
                return None; // cycle not through us; its owner reports it
            }
            let owner = if current.0 == module.name {
                Some(module)
            } else {
                self.registry.find(&current.0, None)
            };
            let identity = owner.and_then(|m| m.find_identity(&current.1))?;
            match &identity.base_resolved {
                Some(next) => current = next.clone(),
                None => match &identity.base {
                    // unresolved link ends the walk
                    Some(base) if current.0 == module.name => {
                        let target = match resolve_prefix(module, base.prefix.as_deref()) {
                            Some(PrefixTarget::SelfModule) => module.name.clone(),
                            Some(PrefixTarget::Other(mid)) => {
                                self.registry.get(mid)?.name.clone()
                            }
                            None => return None,
                        };
                        current = (target, base.name.clone());
                    }
                    _ => return None,
                },
            }
        }
    }

    // ============================================================
    // Stage 5: if-feature resolution
    // ============================================================

    fn resolve_if_features(&mut self, module: &mut Module) {
        let own_name = module.name.clone();
        let own_prefix = module.prefix.clone();
        let imports: FxHashMap<SmolStr, ModuleId> = module
            .imports
            .iter()
            .filter_map(|imp| Some((imp.prefix.clone(), imp.resolved?)))
            .collect();
        let own_features: FxHashSet<SmolStr> =
            module.features.iter().map(|f| f.name.clone()).collect();
        let submodule_features: FxHashSet<SmolStr> = module
            .all_includes
            .iter()
            .filter_map(|name| self.registry.find_submodule(name))
            .flat_map(|sub| sub.features.iter().map(|f| f.name.clone()))
            .collect();

        let registry = self.registry;
        let mut progress = false;
        let mut resolve_ref = |gate: &mut crate::schema::IfFeatureRef| {
            if gate.resolved_module.is_some() {
                return;
            }
            let prefix = gate.prefix.as_deref();
            let target = match prefix {
                None => Some(own_name.clone()),
                Some(p) if p == own_prefix => Some(own_name.clone()),
                Some(p) => imports
                    .get(p)
                    .and_then(|&mid| registry.get(mid))
                    .map(|m| m.name.clone()),
            };
            let Some(target_name) = target else { return };
            let exists = if target_name == own_name {
                own_features.contains(&gate.name) || submodule_features.contains(&gate.name)
            } else {
                registry
                    .find(&target_name, None)
                    .is_some_and(|m| m.find_feature(&gate.name).is_some())
            };
            if exists {
                gate.resolved_module = Some(target_name);
                progress = true;
            }
        };

        for index in 0..module.features.len() {
            let mut gates = std::mem::take(&mut module.features[index].if_features);
            for gate in &mut gates {
                resolve_ref(gate);
            }
            module.features[index].if_features = gates;
        }
        walk_gates_mut(&mut module.nodes, &mut resolve_ref);
        self.progress |= progress;

        // compile-enabled is the conjunction over resolved gates; own
        // features form a DAG, so iterate to a local fixpoint
        for _ in 0..module.features.len().max(1) {
            let snapshot: FxHashMap<SmolStr, bool> = module
                .features
                .iter()
                .map(|f| (f.name.clone(), f.compile_enabled))
                .collect();
            let mut changed = false;
            for feature in &mut module.features {
                let mut enabled = true;
                for gate in &feature.if_features {
                    let Some(target) = &gate.resolved_module else {
                        continue;
                    };
                    let gate_enabled = if *target == own_name {
                        snapshot.get(&gate.name).copied().unwrap_or(true)
                    } else {
                        self.registry
                            .find(target, None)
                            .and_then(|m| m.find_feature(&gate.name))
                            .map(|f| f.compile_enabled)
                            .unwrap_or(true)
                    };
                    enabled &= gate_enabled;
                }
                if feature.compile_enabled != enabled {
                    feature.compile_enabled = enabled;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    // ============================================================
    // Stage 6: deviation application
    // ============================================================

    fn apply_deviations(&mut self, module: &mut Module) {
        for index in 0..module.deviations.len() {
            let (target_path, applied, location) = {
                let deviation = &module.deviations[index];
                (
                    deviation.target_path.clone(),
                    deviation.applied,
                    deviation.location.clone(),
                )
            };
            if applied {
                continue;
            }

            let steps = parse_path(&target_path);
            let target = steps.as_ref().and_then(|steps| {
                resolve_prefix(module, steps[0].prefix.as_deref()).map(|t| (t, steps))
            });

            let outcome = match target {
                None => None,
                Some((PrefixTarget::SelfModule, steps)) => {
                    let names: Vec<SmolStr> = steps.iter().map(|s| s.name.clone()).collect();
                    if navigate(&module.nodes, &names).is_some() {
                        let deviates = module.deviations[index].deviates.clone();
                        if let Some(node) = navigate_mut(&mut module.nodes, &names) {
                            for deviate in &deviates {
                                apply_deviate(node, deviate);
                            }
                        }
                        Some(())
                    } else {
                        None
                    }
                }
                Some((PrefixTarget::Other(mid), steps)) => {
                    let names: Vec<SmolStr> = steps.iter().map(|s| s.name.clone()).collect();
                    let exists = self
                        .registry
                        .get(mid)
                        .is_some_and(|m| navigate(&m.nodes, &names).is_some());
                    if exists {
                        for deviate in module.deviations[index].deviates.clone() {
                            self.ops.push(CrossOp::Deviate {
                                target: mid,
                                path: names.clone(),
                                deviate,
                                location: location.clone(),
                            });
                        }
                        Some(())
                    } else {
                        None
                    }
                }
            };

            match outcome {
                Some(()) => {
                    module.deviations[index].applied = true;
                    self.progress = true;
                }
                None => {
                    // unknown target: reported, non-fatal, and never retried
                    self.defer(
                        location,
                        ErrorCode::DeviationTargetMissing,
                        format!("deviation target '{target_path}' not found"),
                    );
                    module.deviations[index].applied = true;
                }
            }
        }
    }
}

/// Apply one deviate edit to its target node.
fn apply_deviate(node: &mut SchemaNode, deviate: &Deviate) {
    match deviate {
        Deviate::NotSupported => node.not_supported = true,
        Deviate::Add(edits) | Deviate::Replace(edits) => apply_edits(node, edits),
        Deviate::Delete(edits) => delete_edits(node, edits),
    }
}

fn apply_edits(node: &mut SchemaNode, edits: &DeviateEdits) {
    if let Some(config) = edits.config {
        node.config = Some(config);
    }
    match &mut node.kind {
        NodeKind::Leaf(leaf) => {
            if let Some(mandatory) = edits.mandatory {
                leaf.mandatory = mandatory;
            }
            if let Some(default) = &edits.default {
                leaf.default = Some(default.clone());
            }
            if let Some(units) = &edits.units {
                leaf.units = Some(units.clone());
            }
            leaf.musts.extend(edits.musts.iter().cloned());
        }
        NodeKind::LeafList(leaf_list) => {
            if let Some(min) = edits.min_elements {
                leaf_list.min_elements = Some(min);
            }
            if let Some(max) = edits.max_elements {
                leaf_list.max_elements = Some(max);
            }
            if let Some(units) = &edits.units {
                leaf_list.units = Some(units.clone());
            }
            leaf_list.musts.extend(edits.musts.iter().cloned());
        }
        NodeKind::List(list) => {
            if let Some(min) = edits.min_elements {
                list.min_elements = Some(min);
            }
            if let Some(max) = edits.max_elements {
                list.max_elements = Some(max);
            }
            for unique in &edits.unique {
                if !list.unique.contains(unique) {
                    list.unique.push(unique.clone());
                }
            }
            list.musts.extend(edits.musts.iter().cloned());
        }
        NodeKind::Container(container) => {
            container.musts.extend(edits.musts.iter().cloned());
        }
        NodeKind::Choice(choice) => {
            if let Some(mandatory) = edits.mandatory {
                choice.mandatory = mandatory;
            }
            if let Some(default) = &edits.default {
                choice.default_case = Some(default.clone());
            }
        }
        _ => {}
    }
}

fn delete_edits(node: &mut SchemaNode, edits: &DeviateEdits) {
    match &mut node.kind {
        NodeKind::Leaf(leaf) => {
            if edits.default.is_some() {
                leaf.default = None;
            }
            if edits.units.is_some() {
                leaf.units = None;
            }
            leaf.musts
                .retain(|m| !edits.musts.iter().any(|e| e.expression == m.expression));
        }
        NodeKind::LeafList(leaf_list) => {
            if edits.units.is_some() {
                leaf_list.units = None;
            }
            leaf_list
                .musts
                .retain(|m| !edits.musts.iter().any(|e| e.expression == m.expression));
        }
        NodeKind::List(list) => {
            list.unique.retain(|u| !edits.unique.contains(u));
            list.musts
                .retain(|m| !edits.musts.iter().any(|e| e.expression == m.expression));
        }
        NodeKind::Container(container) => {
            container
                .musts
                .retain(|m| !edits.musts.iter().any(|e| e.expression == m.expression));
        }
        _ => {}
    }
}

// ============================================================
// Type chasing
// ============================================================

struct TypeChaser<'a> {
    registry: &'a ModuleRegistry,
    own_typedefs: &'a FxHashMap<SmolStr, TypeSpec>,
    own_name: SmolStr,
    own_prefix: SmolStr,
    imports: FxHashMap<SmolStr, ModuleId>,
    all_includes: Vec<SmolStr>,
}

impl TypeChaser<'_> {
    /// Resolve a spelled typedef reference to its effective binding.
    fn chase(&self, qref: &QualifiedRef, visited: &mut FxHashSet<SmolStr>) -> Option<Bound> {
        let in_self = match qref.prefix.as_deref() {
            None => true,
            Some(p) => p == self.own_prefix,
        };

        if in_self {
            if !visited.insert(qref.name.clone()) {
                return None; // circular typedef chain
            }
            if let Some(spec) = self.own_typedefs.get(&qref.name) {
                return self.bound_from(spec, self.own_name.clone(), qref.name.clone(), visited);
            }
            // fall through to submodule typedefs
            for include in &self.all_includes {
                if let Some(sub) = self.registry.find_submodule(include) {
                    if let Some(td) = sub.find_typedef(&qref.name) {
                        return self.bound_from(
                            &td.type_spec,
                            sub.name.clone(),
                            qref.name.clone(),
                            visited,
                        );
                    }
                }
            }
            return None;
        }

        let mid = *self.imports.get(qref.prefix.as_deref()?)?;
        let target = self.registry.get(mid)?;
        let typedef = target.find_typedef(&qref.name).or_else(|| {
            target
                .all_includes
                .iter()
                .filter_map(|name| self.registry.find_submodule(name))
                .find_map(|sub| sub.find_typedef(&qref.name))
        })?;
        // an imported module has finished its own resolution; an unbound
        // spec here means it failed and the final check will say so
        Bound::from_spec(&typedef.type_spec, target.name.clone(), qref.name.clone())
    }

    fn bound_from(
        &self,
        spec: &TypeSpec,
        module_name: SmolStr,
        typedef_name: SmolStr,
        visited: &mut FxHashSet<SmolStr>,
    ) -> Option<Bound> {
        if spec.base.is_some() {
            return Bound::from_spec(spec, module_name, typedef_name);
        }
        let next = spec.spelled.as_ref()?;
        let deeper = self.chase(next, visited)?;
        let mut bound = deeper.overlay(spec);
        // the reference binds to the nearest typedef, not the chain's end
        bound.module_name = module_name;
        bound.typedef_name = typedef_name;
        Some(bound)
    }
}

fn bind_spec(
    chaser: &TypeChaser<'_>,
    spec: &mut TypeSpec,
    location: &SourceLocation,
    progress: &mut bool,
    errors: &mut Vec<(SourceLocation, ErrorCode, String)>,
) {
    if spec.base.is_none() {
        if let Some(qref) = spec.spelled.clone() {
            let mut visited = FxHashSet::default();
            if let Some(bound) = chaser.chase(&qref, &mut visited) {
                spec.base = Some(bound.base);
                spec.resolved_typedef = Some((bound.module_name, bound.typedef_name));
                if spec.enums.is_empty() {
                    spec.enums = bound.enums;
                }
                if spec.bits.is_empty() {
                    spec.bits = bound.bits;
                }
                if spec.leafref_path.is_none() {
                    spec.leafref_path = bound.leafref_path;
                }
                if spec.fraction_digits.is_none() {
                    spec.fraction_digits = bound.fraction_digits;
                }
                *progress = true;
            }
        }
    }

    if spec.base == Some(BaseType::Leafref)
        && spec.leafref_steps.is_empty()
        && spec.leafref_path.is_some()
        && !spec.parse_leafref_path()
    {
        errors.push((
            location.clone(),
            ErrorCode::InvalidValue,
            format!(
                "malformed leafref path '{}'",
                spec.leafref_path.as_deref().unwrap_or("")
            ),
        ));
        spec.leafref_path = None;
        spec.leafref_steps.clear();
    }

    for member in &mut spec.union_members {
        bind_spec(chaser, member, location, progress, errors);
    }
}

fn walk_specs_mut(
    nodes: &mut [SchemaNode],
    f: &mut impl FnMut(&mut TypeSpec, &SourceLocation),
) {
    for node in nodes {
        let location = node.location.clone();
        match &mut node.kind {
            NodeKind::Leaf(leaf) => f(&mut leaf.type_spec, &location),
            NodeKind::LeafList(leaf_list) => f(&mut leaf_list.type_spec, &location),
            NodeKind::Uses(uses) => {
                for augment in &mut uses.augments {
                    if let Some(children) = augment.children_mut() {
                        walk_specs_mut(children, f);
                    }
                }
            }
            _ => {}
        }
        if let Some(children) = node.children_mut() {
            walk_specs_mut(children, f);
        }
    }
}

fn walk_gates_mut(
    nodes: &mut [SchemaNode],
    f: &mut impl FnMut(&mut crate::schema::IfFeatureRef),
) {
    for node in nodes {
        for gate in &mut node.if_features {
            f(gate);
        }
        if let Some(children) = node.children_mut() {
            walk_gates_mut(children, f);
        }
    }
}

// ============================================================
// Grouping expansion
// ============================================================

struct Expander<'a> {
    registry: &'a ModuleRegistry,
    module_prefix: SmolStr,
    imports: FxHashMap<SmolStr, ModuleId>,
    all_includes: Vec<SmolStr>,
    own_groupings: &'a FxHashMap<SmolStr, Vec<SchemaNode>>,
    nsid: crate::base::NamespaceId,
    progress: bool,
    deferred: Vec<(SourceLocation, ErrorCode, String)>,
}

impl Expander<'_> {
    fn lookup_grouping(&self, qref: &QualifiedRef) -> Option<Vec<SchemaNode>> {
        let in_self = match qref.prefix.as_deref() {
            None => true,
            Some(p) => p == self.module_prefix,
        };
        if in_self {
            if let Some(children) = self.own_groupings.get(&qref.name) {
                return Some(children.clone());
            }
            for include in &self.all_includes {
                if let Some(sub) = self.registry.find_submodule(include) {
                    if let Some(grouping) = sub.find_grouping(&qref.name) {
                        return Some(grouping.children.clone());
                    }
                }
            }
            return None;
        }
        let mid = *self.imports.get(qref.prefix.as_deref()?)?;
        let target = self.registry.get(mid)?;
        target
            .find_grouping(&qref.name)
            .map(|g| g.children.clone())
            .or_else(|| {
                target
                    .all_includes
                    .iter()
                    .filter_map(|name| self.registry.find_submodule(name))
                    .find_map(|sub| sub.find_grouping(&qref.name).map(|g| g.children.clone()))
            })
    }

    fn expand_in(&mut self, children: &mut Vec<SchemaNode>) {
        let mut index = 0;
        while index < children.len() {
            let uses = match &children[index].kind {
                NodeKind::Uses(uses) => uses.clone(),
                _ => {
                    if let Some(grandchildren) = children[index].children_mut() {
                        self.expand_in(grandchildren);
                    }
                    index += 1;
                    continue;
                }
            };
            let location = children[index].location.clone();
            let gates = children[index].if_features.clone();
            let when = children[index].when.clone();

            let Some(mut cloned) = self.lookup_grouping(&uses.grouping) else {
                index += 1; // grouping may appear later; final check reports
                continue;
            };

            // cloned nodes take the new parent's namespace; gates on the
            // uses itself condition every cloned root
            for node in &mut cloned {
                node.set_namespace_recursive(self.nsid);
                node.if_features.extend(gates.iter().cloned());
                if node.when.is_none() {
                    node.when = when.clone();
                }
            }
            self.apply_refines(&mut cloned, &uses, &location);
            self.apply_uses_augments(&mut cloned, &uses, &location);

            let count = cloned.len();
            children.splice(index..=index, cloned);
            self.progress = true;
            // nested uses inside the clone are expanded on the next pass,
            // which also bounds self-referential groupings
            index += count;
        }
    }

    fn apply_refines(
        &mut self,
        cloned: &mut Vec<SchemaNode>,
        uses: &crate::schema::UsesNode,
        location: &SourceLocation,
    ) {
        for refine in &uses.refines {
            let steps: Vec<SmolStr> = refine
                .target
                .split('/')
                .filter(|s| !s.is_empty())
                .map(|s| QualifiedRef::parse(s).name)
                .collect();
            let Some(node) = navigate_mut(cloned, &steps) else {
                self.deferred.push((
                    location.clone(),
                    ErrorCode::DefNotFound,
                    format!("refine target '{}' not found in grouping", refine.target),
                ));
                continue;
            };
            if let Some(description) = &refine.description {
                node.description = Some(description.clone());
            }
            if let Some(reference) = &refine.reference {
                node.reference = Some(reference.clone());
            }
            if let Some(config) = refine.config {
                node.config = Some(config);
            }
            match &mut node.kind {
                NodeKind::Leaf(leaf) => {
                    if let Some(mandatory) = refine.mandatory {
                        leaf.mandatory = mandatory;
                    }
                    if let Some(default) = &refine.default {
                        leaf.default = Some(default.clone());
                    }
                    leaf.musts.extend(refine.musts.iter().cloned());
                }
                NodeKind::LeafList(leaf_list) => {
                    if let Some(min) = refine.min_elements {
                        leaf_list.min_elements = Some(min);
                    }
                    if let Some(max) = refine.max_elements {
                        leaf_list.max_elements = Some(max);
                    }
                    leaf_list.musts.extend(refine.musts.iter().cloned());
                }
                NodeKind::List(list) => {
                    if let Some(min) = refine.min_elements {
                        list.min_elements = Some(min);
                    }
                    if let Some(max) = refine.max_elements {
                        list.max_elements = Some(max);
                    }
                    list.musts.extend(refine.musts.iter().cloned());
                }
                NodeKind::Container(container) => {
                    if let Some(presence) = &refine.presence {
                        container.presence = Some(presence.clone());
                    }
                    container.musts.extend(refine.musts.iter().cloned());
                }
                NodeKind::Choice(choice) => {
                    if let Some(mandatory) = refine.mandatory {
                        choice.mandatory = mandatory;
                    }
                    if let Some(default) = &refine.default {
                        choice.default_case = Some(default.clone());
                    }
                }
                _ => {}
            }
        }
    }

    fn apply_uses_augments(
        &mut self,
        cloned: &mut Vec<SchemaNode>,
        uses: &crate::schema::UsesNode,
        location: &SourceLocation,
    ) {
        for augment in &uses.augments {
            let NodeKind::Augment(payload) = &augment.kind else {
                continue;
            };
            let steps: Vec<SmolStr> = payload
                .target_path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(|s| QualifiedRef::parse(s).name)
                .collect();
            let mut children = payload.children.clone();
            for child in &mut children {
                child.set_namespace_recursive(self.nsid);
            }
            match navigate_mut(cloned, &steps) {
                Some(target) => {
                    splice_children(target, children);
                }
                None => self.deferred.push((
                    location.clone(),
                    ErrorCode::DefNotFound,
                    format!(
                        "augment target '{}' not found in grouping",
                        payload.target_path
                    ),
                )),
            }
        }
    }
}

// ============================================================
// Final checks
// ============================================================

/// Post-fixpoint reporting: anything still unresolved is an error, and
/// leafref paths are dereferenced now that every node exists.
fn final_checks(
    registry: &ModuleRegistry,
    module: &Module,
) -> Vec<(SourceLocation, ErrorCode, String)> {
    let mut out = Vec::new();

    for typedef in &module.typedefs {
        report_unbound(&typedef.type_spec, &typedef.location, &mut out);
    }
    report_tree(&module.nodes, &mut out);

    for identity in &module.identities {
        if let (Some(base), None) = (&identity.base, &identity.base_resolved) {
            out.push((
                identity.location.clone(),
                ErrorCode::DefNotFound,
                format!("base identity '{}' of '{}' not found", base, identity.name),
            ));
        }
    }
    for feature in &module.features {
        for gate in &feature.if_features {
            if gate.resolved_module.is_none() {
                out.push((
                    feature.location.clone(),
                    ErrorCode::DefNotFound,
                    format!("if-feature '{}' not found", gate.name),
                ));
            }
        }
    }

    let mut leafrefs: Vec<(Vec<SmolStr>, TypeSpec, SourceLocation)> = Vec::new();
    collect_leafrefs(&module.nodes, &mut Vec::new(), &mut leafrefs);
    for (node_path, spec, location) in leafrefs {
        check_leafref(registry, module, &node_path, &spec, &location, &mut out);
    }

    let mut status_refs: Vec<((SmolStr, SmolStr), SourceLocation)> = Vec::new();
    collect_typedef_refs(&module.nodes, &mut status_refs);
    for typedef in &module.typedefs {
        if let Some(target) = &typedef.type_spec.resolved_typedef {
            if target.1 != typedef.name {
                status_refs.push((target.clone(), typedef.location.clone()));
            }
        }
    }
    for ((owner_name, typedef_name), location) in status_refs {
        let owner = if owner_name == module.name {
            Some(module)
        } else {
            registry.find(&owner_name, None)
        };
        let Some(target) = owner.and_then(|m| m.find_typedef(&typedef_name)) else {
            continue;
        };
        match target.status {
            crate::schema::Status::Deprecated => out.push((
                location,
                ErrorCode::UsingDeprecated,
                format!("reference to deprecated typedef '{typedef_name}'"),
            )),
            crate::schema::Status::Obsolete => out.push((
                location,
                ErrorCode::UsingObsolete,
                format!("reference to obsolete typedef '{typedef_name}'"),
            )),
            crate::schema::Status::Current => {}
        }
    }
    out
}

fn collect_typedef_refs(
    nodes: &[SchemaNode],
    out: &mut Vec<((SmolStr, SmolStr), SourceLocation)>,
) {
    for node in nodes {
        if let Some(spec) = node.type_spec() {
            if let Some(target) = &spec.resolved_typedef {
                out.push((target.clone(), node.location.clone()));
            }
        }
        collect_typedef_refs(node.children(), out);
    }
}

fn report_unbound(
    spec: &TypeSpec,
    location: &SourceLocation,
    out: &mut Vec<(SourceLocation, ErrorCode, String)>,
) {
    if spec.base.is_none() {
        let spelled = spec
            .spelled
            .as_ref()
            .map(|q| q.to_string())
            .unwrap_or_else(|| "?".into());
        out.push((
            location.clone(),
            ErrorCode::DefNotFound,
            format!("type '{spelled}' not resolved"),
        ));
    }
    for member in &spec.union_members {
        report_unbound(member, location, out);
    }
}

fn report_tree(nodes: &[SchemaNode], out: &mut Vec<(SourceLocation, ErrorCode, String)>) {
    for node in nodes {
        match &node.kind {
            NodeKind::Uses(uses) => out.push((
                node.location.clone(),
                ErrorCode::DefNotFound,
                format!("grouping '{}' not found", uses.grouping),
            )),
            NodeKind::Augment(augment) if !augment.applied => out.push((
                node.location.clone(),
                ErrorCode::DefNotFound,
                format!("augment target '{}' not found", augment.target_path),
            )),
            _ => {
                if let Some(spec) = node.type_spec() {
                    report_unbound(spec, &node.location, out);
                }
            }
        }
        report_tree(node.children(), out);
    }
}

fn collect_leafrefs(
    nodes: &[SchemaNode],
    path: &mut Vec<SmolStr>,
    out: &mut Vec<(Vec<SmolStr>, TypeSpec, SourceLocation)>,
) {
    for node in nodes {
        path.push(node.name.clone());
        if let Some(spec) = node.type_spec() {
            if spec.base == Some(BaseType::Leafref) && !spec.leafref_steps.is_empty() {
                out.push((path.clone(), spec.clone(), node.location.clone()));
            }
        }
        collect_leafrefs(node.children(), path, out);
        path.pop();
    }
}

fn check_leafref(
    registry: &ModuleRegistry,
    module: &Module,
    node_path: &[SmolStr],
    spec: &TypeSpec,
    location: &SourceLocation,
    out: &mut Vec<(SourceLocation, ErrorCode, String)>,
) {
    let display = spec.leafref_path.as_deref().unwrap_or("");
    let step_names: Vec<SmolStr> = spec
        .leafref_steps
        .iter()
        .map(|s| s.node.name.clone())
        .collect();

    let target = if spec.leafref_up == 0 {
        // absolute: the first step's prefix picks the module tree
        let first_prefix = spec.leafref_steps[0].node.prefix.as_deref();
        let tree = match resolve_prefix(module, first_prefix) {
            Some(PrefixTarget::SelfModule) => Some(&module.nodes),
            Some(PrefixTarget::Other(mid)) => registry.get(mid).map(|m| &m.nodes),
            None => None,
        };
        tree.and_then(|nodes| navigate(nodes, &step_names))
    } else {
        // relative: each `..` climbs one ancestor starting from the leaf
        let up = spec.leafref_up as usize;
        if up > node_path.len() {
            None
        } else {
            let anchor = &node_path[..node_path.len() - up];
            if anchor.is_empty() {
                navigate(&module.nodes, &step_names)
            } else {
                navigate(&module.nodes, anchor)
                    .and_then(|n| navigate(n.children(), &step_names))
            }
        }
    };

    match target {
        None => out.push((
            location.clone(),
            ErrorCode::DefNotFound,
            format!("leafref path '{display}' does not reach a node"),
        )),
        Some(node) if !matches!(node.kind, NodeKind::Leaf(_) | NodeKind::LeafList(_)) => {
            out.push((
                location.clone(),
                ErrorCode::WrongType,
                format!("leafref path '{display}' targets a {}", node.kind.keyword()),
            ))
        }
        Some(_) => {}
    }
}
