//! Identities and their single-rooted DAG.

use smol_str::SmolStr;

use crate::base::SourceLocation;

use super::{QualifiedRef, Status};

/// An `identity`. `derived` collects back-pointers, as
/// `(module-name, identity-name)` pairs, to identities naming this one as
/// their base; the resolver fills it during identity linkage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: SmolStr,
    pub base: Option<QualifiedRef>,
    /// `(module-name, identity-name)` the base resolved to.
    pub base_resolved: Option<(SmolStr, SmolStr)>,
    pub derived: Vec<(SmolStr, SmolStr)>,
    pub status: Status,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub location: SourceLocation,
}

impl Identity {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            base: None,
            base_resolved: None,
            derived: Vec::new(),
            status: Status::Current,
            description: None,
            reference: None,
            location: SourceLocation::default(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.base.is_none()
    }
}
