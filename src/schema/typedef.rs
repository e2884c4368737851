//! Named reusable type definitions.

use smol_str::SmolStr;

use crate::base::SourceLocation;

use super::typespec::TypeSpec;
use super::Status;

/// A `typedef`, owned by its defining module or submodule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typedef {
    pub name: SmolStr,
    pub type_spec: TypeSpec,
    pub default: Option<SmolStr>,
    pub units: Option<SmolStr>,
    pub status: Status,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub location: SourceLocation,
}

impl Typedef {
    pub fn new(name: impl Into<SmolStr>, type_spec: TypeSpec) -> Self {
        Self {
            name: name.into(),
            type_spec,
            default: None,
            units: None,
            status: Status::Current,
            description: None,
            reference: None,
            location: SourceLocation::default(),
        }
    }
}
