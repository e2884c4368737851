//! Type references and their restrictions.

use smol_str::SmolStr;

use crate::types::{Bit, EnumValue, ErrInfo};
use crate::types::BaseType;

use super::QualifiedRef;

/// One step of a parsed leafref path: a child name, optionally prefixed.
/// Predicates are not modeled; the dereference check follows names only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafrefStep {
    pub node: QualifiedRef,
}

/// A `type` statement: the spelled reference, restrictions, and the
/// binding the resolver fills in.
///
/// `base` stays `None` until the base-type binding pass runs; a spelled
/// built-in binds directly, a typedef reference binds through the typedef
/// chain.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeSpec {
    /// The reference as spelled in source (`uint32`, `p:counter`, ...).
    pub spelled: Option<QualifiedRef>,
    /// Resolved base type.
    pub base: Option<BaseType>,
    /// Module name and typedef name the reference bound to, when it was a
    /// typedef rather than a built-in.
    pub resolved_typedef: Option<(SmolStr, SmolStr)>,

    // restrictions
    pub range: Option<(String, ErrInfo)>,
    pub length: Option<(String, ErrInfo)>,
    pub patterns: Vec<(String, ErrInfo)>,
    pub fraction_digits: Option<u8>,
    pub enums: Vec<EnumValue>,
    pub bits: Vec<Bit>,
    pub union_members: Vec<TypeSpec>,
    /// Leafref path text, preserved verbatim for round-tripping.
    pub leafref_path: Option<String>,
    /// Leafref path parsed to steps; `..` steps are counted in
    /// `leafref_up`, the rest descend.
    pub leafref_steps: Vec<LeafrefStep>,
    pub leafref_up: u32,
    /// Base identity for identityref types.
    pub identity_base: Option<QualifiedRef>,
    pub require_instance: Option<bool>,
}

impl TypeSpec {
    /// A reference to a spelled type name, unresolved.
    pub fn named(spelled: &str) -> Self {
        Self {
            spelled: Some(QualifiedRef::parse(spelled)),
            ..Default::default()
        }
    }

    /// A spec already bound to a built-in base type.
    pub fn of_base(base: BaseType) -> Self {
        Self {
            base: Some(base),
            ..Default::default()
        }
    }

    /// Whether the base-type binding pass has completed for this spec and
    /// all union members.
    pub fn is_bound(&self) -> bool {
        self.base.is_some()
            && (self.base != Some(BaseType::Union)
                || self.union_members.iter().all(TypeSpec::is_bound))
    }

    /// Parse the stored leafref path text into steps. Returns false on a
    /// malformed path. Accepted forms: absolute (`/a:b/c`) and relative
    /// (`../a/b`); predicates between `[` and `]` are skipped.
    pub fn parse_leafref_path(&mut self) -> bool {
        let Some(path) = self.leafref_path.clone() else {
            return false;
        };
        let mut text = path.as_str().trim();
        self.leafref_steps.clear();
        self.leafref_up = 0;
        while let Some(rest) = text.strip_prefix("../") {
            self.leafref_up += 1;
            text = rest;
        }
        let absolute = text.starts_with('/');
        if absolute && self.leafref_up > 0 {
            return false;
        }
        for segment in text.split('/').filter(|s| !s.is_empty()) {
            let name = match segment.find('[') {
                Some(idx) => &segment[..idx],
                None => segment,
            };
            if name.is_empty() {
                return false;
            }
            self.leafref_steps.push(LeafrefStep {
                node: QualifiedRef::parse(name),
            });
        }
        !self.leafref_steps.is_empty()
    }
}
