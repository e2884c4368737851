//! Deviations: post-hoc edits against another module's schema tree.

use smol_str::SmolStr;

use crate::base::SourceLocation;

use super::Must;

/// Property edits carried by `deviate add`, `replace`, and `delete`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviateEdits {
    pub config: Option<bool>,
    pub mandatory: Option<bool>,
    pub default: Option<SmolStr>,
    pub units: Option<SmolStr>,
    pub min_elements: Option<u32>,
    pub max_elements: Option<u32>,
    pub musts: Vec<Must>,
    pub unique: Vec<Vec<SmolStr>>,
}

/// One `deviate` sub-statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deviate {
    NotSupported,
    Add(DeviateEdits),
    Replace(DeviateEdits),
    Delete(DeviateEdits),
}

/// A `deviation` statement: an absolute target path plus its deviate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deviation {
    pub target_path: SmolStr,
    pub deviates: Vec<Deviate>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub location: SourceLocation,
    /// Set once applied, so re-running resolution is a no-op.
    pub applied: bool,
}

impl Deviation {
    pub fn new(target_path: impl Into<SmolStr>) -> Self {
        Self {
            target_path: target_path.into(),
            deviates: Vec::new(),
            description: None,
            reference: None,
            location: SourceLocation::default(),
            applied: false,
        }
    }
}
