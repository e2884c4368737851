//! Features and if-feature gates.

use smol_str::SmolStr;

use crate::base::SourceLocation;

use super::Status;

/// One token of an `if-feature` conjunction, resolved by the resolver to
/// the owning module's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfFeatureRef {
    pub prefix: Option<SmolStr>,
    pub name: SmolStr,
    /// Module name the feature was found in.
    pub resolved_module: Option<SmolStr>,
}

impl IfFeatureRef {
    pub fn parse(spelled: &str) -> Self {
        match spelled.split_once(':') {
            Some((prefix, name)) => Self {
                prefix: Some(prefix.into()),
                name: name.into(),
                resolved_module: None,
            },
            None => Self {
                prefix: None,
                name: spelled.into(),
                resolved_module: None,
            },
        }
    }
}

/// A `feature`. Compile-enabled comes out of resolution (a feature whose
/// own gates fail is compile-disabled); runtime-enabled may be toggled by
/// policy after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub name: SmolStr,
    pub if_features: Vec<IfFeatureRef>,
    pub compile_enabled: bool,
    pub runtime_enabled: bool,
    pub status: Status,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub location: SourceLocation,
}

impl Feature {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            if_features: Vec::new(),
            compile_enabled: true,
            runtime_enabled: true,
            status: Status::Current,
            description: None,
            reference: None,
            location: SourceLocation::default(),
        }
    }

    /// Enabled from this feature's own flags; ancestor gates are factored
    /// in by the feature-conditioning walk, which needs registry access.
    pub fn self_enabled(&self) -> bool {
        self.compile_enabled && self.runtime_enabled
    }
}
