//! The schema object tree.
//!
//! A [`Module`] owns its top-level typedefs, groupings, identities,
//! features, deviations, and schema nodes. Cross-module references are
//! carried as name triples until the resolver binds them; bound references
//! are module names or [`crate::base::ModuleId`] handles, never pointers.

mod deviation;
mod feature;
mod grouping;
mod identity;
mod module;
mod node;
mod typedef;
mod typespec;

pub use deviation::{Deviate, DeviateEdits, Deviation};
pub use feature::{Feature, IfFeatureRef};
pub use grouping::Grouping;
pub use identity::Identity;
pub use module::{
    compare_revisions, Extension, Import, Include, LifecycleState, Module, ModuleKind,
    ParseStatus, Revision,
};
pub use node::{
    AugmentNode, CaseNode, ChoiceNode, ContainerNode, LeafListNode, LeafNode, ListNode, NodeKind,
    NotificationNode, Refine, RpcIoNode, RpcNode, SchemaNode, UsesNode,
};
pub use typedef::Typedef;
pub use typespec::{LeafrefStep, TypeSpec};

use smol_str::SmolStr;

use crate::types::ErrInfo;

/// Definition status per the `status` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Current,
    Deprecated,
    Obsolete,
}

impl Status {
    pub fn from_arg(arg: &str) -> Option<Self> {
        Some(match arg {
            "current" => Self::Current,
            "deprecated" => Self::Deprecated,
            "obsolete" => Self::Obsolete,
            _ => return None,
        })
    }

    pub fn is_obsolete(&self) -> bool {
        matches!(self, Self::Obsolete)
    }
}

/// A possibly-prefixed reference as spelled in source (`p:name` or `name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedRef {
    pub prefix: Option<SmolStr>,
    pub name: SmolStr,
}

impl QualifiedRef {
    pub fn parse(spelled: &str) -> Self {
        match spelled.split_once(':') {
            Some((prefix, name)) => Self {
                prefix: Some(prefix.into()),
                name: name.into(),
            },
            None => Self {
                prefix: None,
                name: spelled.into(),
            },
        }
    }

    pub fn local(name: impl Into<SmolStr>) -> Self {
        Self {
            prefix: None,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for QualifiedRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A `must` constraint: the expression text plus error annotations.
/// The expression is preserved verbatim; evaluation is out of scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Must {
    pub expression: String,
    pub errinfo: ErrInfo,
}

impl Must {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            errinfo: ErrInfo::default(),
        }
    }
}
