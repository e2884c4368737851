//! Node templates instantiated by `uses`.

use smol_str::SmolStr;

use crate::base::SourceLocation;

use super::node::SchemaNode;
use super::Status;

/// A `grouping`. Never appears in the data tree itself; each `uses`
/// clones its children into the referring parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grouping {
    pub name: SmolStr,
    pub children: Vec<SchemaNode>,
    pub status: Status,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub location: SourceLocation,
    /// Guard against self-referential expansion.
    pub expanding: bool,
}

impl Grouping {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
            status: Status::Current,
            description: None,
            reference: None,
            location: SourceLocation::default(),
            expanding: false,
        }
    }
}
