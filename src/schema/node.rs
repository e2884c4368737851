//! Schema node variants.
//!
//! One tagged node type covers data nodes, RPCs, notifications, and the
//! expansion placeholders (`uses`, `augment`). Children live in the
//! variant payloads; [`SchemaNode::children`] gives uniform access.

use smol_str::SmolStr;

use crate::base::{NamespaceId, SourceLocation};

use super::feature::IfFeatureRef;
use super::typespec::TypeSpec;
use super::{Must, QualifiedRef, Status};

/// `leaf` payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LeafNode {
    pub type_spec: TypeSpec,
    pub default: Option<SmolStr>,
    pub units: Option<SmolStr>,
    pub mandatory: bool,
    pub musts: Vec<Must>,
}

/// `leaf-list` payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LeafListNode {
    pub type_spec: TypeSpec,
    pub defaults: Vec<SmolStr>,
    pub units: Option<SmolStr>,
    pub min_elements: Option<u32>,
    pub max_elements: Option<u32>,
    pub ordered_by_user: bool,
    pub musts: Vec<Must>,
}

/// `list` payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListNode {
    /// Key leaf names in declaration order.
    pub keys: Vec<SmolStr>,
    /// Each `unique` statement as its list of descendant leaf names.
    pub unique: Vec<Vec<SmolStr>>,
    pub min_elements: Option<u32>,
    pub max_elements: Option<u32>,
    pub ordered_by_user: bool,
    pub musts: Vec<Must>,
    pub children: Vec<SchemaNode>,
}

/// `container` payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContainerNode {
    pub presence: Option<String>,
    pub musts: Vec<Must>,
    pub children: Vec<SchemaNode>,
}

/// `choice` payload; children are always cases (shorthand data-node
/// children get a wrapping case synthesized during build).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChoiceNode {
    pub default_case: Option<SmolStr>,
    pub mandatory: bool,
    pub children: Vec<SchemaNode>,
}

/// `case` payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaseNode {
    pub children: Vec<SchemaNode>,
}

/// A `refine` edit applied by a `uses` to one cloned descendant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Refine {
    /// Descendant path relative to the grouping root (`a/b/c`).
    pub target: SmolStr,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub config: Option<bool>,
    pub mandatory: Option<bool>,
    pub presence: Option<String>,
    pub default: Option<SmolStr>,
    pub min_elements: Option<u32>,
    pub max_elements: Option<u32>,
    pub musts: Vec<Must>,
}

/// `uses` payload. The grouping's children are cloned in place of this
/// node during expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsesNode {
    pub grouping: QualifiedRef,
    pub refines: Vec<Refine>,
    /// Descendant augments declared inside the uses.
    pub augments: Vec<SchemaNode>,
}

/// `augment` payload. Top-level augments carry an absolute target path;
/// uses-scoped augments carry a descendant path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AugmentNode {
    pub target_path: SmolStr,
    pub children: Vec<SchemaNode>,
    /// Set once the splice has been applied.
    pub applied: bool,
}

/// `rpc` payload; children are the input/output [`RpcIoNode`]s.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RpcNode {
    pub children: Vec<SchemaNode>,
}

/// `input` or `output` payload under an rpc.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RpcIoNode {
    pub is_output: bool,
    pub children: Vec<SchemaNode>,
}

/// `notification` payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationNode {
    pub children: Vec<SchemaNode>,
}

/// The discriminant of a schema node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    AnyXml,
    Leaf(LeafNode),
    LeafList(LeafListNode),
    List(ListNode),
    Container(ContainerNode),
    Choice(ChoiceNode),
    Case(CaseNode),
    Uses(UsesNode),
    Augment(AugmentNode),
    Rpc(RpcNode),
    RpcIo(RpcIoNode),
    Notification(NotificationNode),
}

impl NodeKind {
    /// Short keyword for messages.
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::AnyXml => "anyxml",
            Self::Leaf(_) => "leaf",
            Self::LeafList(_) => "leaf-list",
            Self::List(_) => "list",
            Self::Container(_) => "container",
            Self::Choice(_) => "choice",
            Self::Case(_) => "case",
            Self::Uses(_) => "uses",
            Self::Augment(_) => "augment",
            Self::Rpc(_) => "rpc",
            Self::RpcIo(_) => "rpc-io",
            Self::Notification(_) => "notification",
        }
    }
}

/// A node in the schema tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
    /// Local name. Augments use their target path; input/output use the
    /// fixed statement keyword.
    pub name: SmolStr,
    pub namespace_id: NamespaceId,
    /// Explicit `config` statement; `None` inherits from the parent.
    pub config: Option<bool>,
    pub if_features: Vec<IfFeatureRef>,
    pub status: Status,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub when: Option<String>,
    pub location: SourceLocation,
    /// Marked by a `not-supported` deviation; removed by the pruner.
    pub not_supported: bool,
    pub kind: NodeKind,
}

impl SchemaNode {
    pub fn new(name: impl Into<SmolStr>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            namespace_id: NamespaceId::NONE,
            config: None,
            if_features: Vec::new(),
            status: Status::Current,
            description: None,
            reference: None,
            when: None,
            location: SourceLocation::default(),
            not_supported: false,
            kind,
        }
    }

    /// Child nodes, empty for leaf-like variants.
    pub fn children(&self) -> &[SchemaNode] {
        match &self.kind {
            NodeKind::List(n) => &n.children,
            NodeKind::Container(n) => &n.children,
            NodeKind::Choice(n) => &n.children,
            NodeKind::Case(n) => &n.children,
            NodeKind::Augment(n) => &n.children,
            NodeKind::Rpc(n) => &n.children,
            NodeKind::RpcIo(n) => &n.children,
            NodeKind::Notification(n) => &n.children,
            NodeKind::Uses(_)
            | NodeKind::AnyXml
            | NodeKind::Leaf(_)
            | NodeKind::LeafList(_) => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<SchemaNode>> {
        match &mut self.kind {
            NodeKind::List(n) => Some(&mut n.children),
            NodeKind::Container(n) => Some(&mut n.children),
            NodeKind::Choice(n) => Some(&mut n.children),
            NodeKind::Case(n) => Some(&mut n.children),
            NodeKind::Augment(n) => Some(&mut n.children),
            NodeKind::Rpc(n) => Some(&mut n.children),
            NodeKind::RpcIo(n) => Some(&mut n.children),
            NodeKind::Notification(n) => Some(&mut n.children),
            NodeKind::Uses(_)
            | NodeKind::AnyXml
            | NodeKind::Leaf(_)
            | NodeKind::LeafList(_) => None,
        }
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        self.children().iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut SchemaNode> {
        self.children_mut()?.iter_mut().find(|c| c.name == name)
    }

    /// The type spec for leaf and leaf-list nodes.
    pub fn type_spec(&self) -> Option<&TypeSpec> {
        match &self.kind {
            NodeKind::Leaf(n) => Some(&n.type_spec),
            NodeKind::LeafList(n) => Some(&n.type_spec),
            _ => None,
        }
    }

    /// True for the node kinds that carry instance data (everything except
    /// the expansion placeholders).
    pub fn is_data_node(&self) -> bool {
        !matches!(self.kind, NodeKind::Uses(_) | NodeKind::Augment(_))
    }

    /// Choice and case never appear in instance documents.
    pub fn is_pseudo_node(&self) -> bool {
        matches!(self.kind, NodeKind::Choice(_) | NodeKind::Case(_))
    }

    pub fn is_rpc(&self) -> bool {
        matches!(self.kind, NodeKind::Rpc(_))
    }

    pub fn is_notification(&self) -> bool {
        matches!(self.kind, NodeKind::Notification(_))
    }

    /// Effective config flag given the parent's effective flag.
    /// RPC and notification subtrees are never config.
    pub fn effective_config(&self, inherited: bool) -> bool {
        if self.is_rpc() || self.is_notification() || matches!(self.kind, NodeKind::RpcIo(_)) {
            return false;
        }
        self.config.unwrap_or(inherited)
    }

    /// Recursively stamp a namespace id onto this node and its subtree.
    /// Used when cloning grouping children into a different module and
    /// when splicing augments.
    pub fn set_namespace_recursive(&mut self, nsid: NamespaceId) {
        self.namespace_id = nsid;
        if let Some(children) = self.children_mut() {
            for child in children {
                child.set_namespace_recursive(nsid);
            }
        }
    }
}
