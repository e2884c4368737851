//! The obsolete/not-supported pruner.
//!
//! One depth-first post-order walk after resolution drops every node
//! whose status is obsolete or that a deviation marked not-supported, so
//! downstream consumers never see them. Running the pruner again on an
//! already-pruned tree changes nothing.

use crate::schema::{Module, SchemaNode};

/// Remove pruned nodes from a module's tree and definition lists.
pub(crate) fn prune_module(module: &mut Module) {
    prune_nodes(&mut module.nodes);
    module.typedefs.retain(|td| !td.status.is_obsolete());
    module.groupings.retain(|g| !g.status.is_obsolete());
    module.identities.retain(|i| !i.status.is_obsolete());
    module.features.retain(|f| !f.status.is_obsolete());
    module.extensions.retain(|e| !e.status.is_obsolete());
}

fn prune_nodes(nodes: &mut Vec<SchemaNode>) {
    for node in nodes.iter_mut() {
        if let Some(children) = node.children_mut() {
            prune_nodes(children);
        }
    }
    nodes.retain(keep);
}

fn keep(node: &SchemaNode) -> bool {
    let kept = !node.status.is_obsolete() && !node.not_supported;
    if !kept {
        tracing::debug!("pruning {} '{}'", node.kind.keyword(), node.name);
    }
    kept
}
