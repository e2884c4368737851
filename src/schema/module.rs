//! The module entity and its linkage records.

use smol_str::SmolStr;

use crate::base::{ModuleId, NamespaceId, SourceLocation};

use super::deviation::Deviation;
use super::feature::Feature;
use super::grouping::Grouping;
use super::identity::Identity;
use super::node::SchemaNode;
use super::typedef::Typedef;

/// Module vs submodule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    Module,
    Submodule,
}

/// Aggregate outcome of parse + resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseStatus {
    #[default]
    Ok,
    HasWarnings,
    HasErrors,
}

/// Lifecycle of a module through the load pipeline.
///
/// ```text
/// New -> Parsing -> Parsed -> Resolving -> Resolved
///     -> Registered -> Frozen -> Unloaded
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    New,
    Parsing,
    Parsed,
    Resolving,
    Resolved,
    Registered,
    Frozen,
    Unloaded,
}

impl LifecycleState {
    /// Whether `next` is a legal successor state.
    pub fn can_advance_to(&self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (New, Parsing)
                | (Parsing, Parsed)
                | (Parsed, Resolving)
                | (Resolving, Resolved)
                | (Resolved, Registered)
                | (Registered, Frozen)
                | (Frozen, Unloaded)
                | (Registered, Unloaded)
        )
    }
}

/// An `import`: unresolved until the linker binds `resolved`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub module_name: SmolStr,
    pub revision: Option<SmolStr>,
    pub prefix: SmolStr,
    /// Registry handle, cached on first successful lookup.
    pub resolved: Option<ModuleId>,
    /// Set when the linker gave up on this import.
    pub failed: bool,
    pub location: SourceLocation,
}

impl Import {
    pub fn new(module_name: impl Into<SmolStr>, prefix: impl Into<SmolStr>) -> Self {
        Self {
            module_name: module_name.into(),
            revision: None,
            prefix: prefix.into(),
            resolved: None,
            failed: false,
            location: SourceLocation::default(),
        }
    }
}

/// An `include` of a submodule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub submodule_name: SmolStr,
    pub revision: Option<SmolStr>,
    pub resolved: Option<ModuleId>,
    pub location: SourceLocation,
}

impl Include {
    pub fn new(submodule_name: impl Into<SmolStr>) -> Self {
        Self {
            submodule_name: submodule_name.into(),
            revision: None,
            resolved: None,
            location: SourceLocation::default(),
        }
    }
}

/// One `revision` history entry. The list on the module is ordered
/// newest-first; dates compare lexicographically as ISO-8601.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub date: SmolStr,
    pub description: Option<String>,
    pub reference: Option<String>,
}

/// An `extension` definition. Extension *uses* are skipped during build;
/// the definition is kept so tooling can list what a module declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub name: SmolStr,
    /// Name of the `argument` the extension takes, if any.
    pub argument: Option<SmolStr>,
    pub status: super::Status,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub location: SourceLocation,
}

/// A parsed YANG module or submodule and everything it owns.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: SmolStr,
    /// Newest revision date, if any revision statements were present.
    pub revision: Option<SmolStr>,
    /// `yang-version` argument; "1" when absent.
    pub yang_version: SmolStr,
    pub kind: ModuleKind,
    /// Module only.
    pub namespace_uri: Option<SmolStr>,
    /// Submodule only.
    pub belongs_to: Option<SmolStr>,
    pub prefix: SmolStr,
    /// Equals `prefix` unless the namespace registry remapped it to avoid
    /// a collision.
    pub xml_prefix: SmolStr,
    pub namespace_id: NamespaceId,
    pub organization: Option<String>,
    pub contact: Option<String>,
    pub description: Option<String>,
    pub reference: Option<String>,
    pub source_filespec: Option<SmolStr>,

    pub imports: Vec<Import>,
    pub includes: Vec<Include>,
    /// Transitive include closure (submodule names).
    pub all_includes: Vec<SmolStr>,
    pub revisions: Vec<Revision>,
    pub extensions: Vec<Extension>,
    pub typedefs: Vec<Typedef>,
    pub groupings: Vec<Grouping>,
    pub identities: Vec<Identity>,
    pub features: Vec<Feature>,
    pub deviations: Vec<Deviation>,
    /// Data nodes, rpcs, notifications, and top-level augments, in source
    /// order.
    pub nodes: Vec<SchemaNode>,

    pub state: LifecycleState,
    pub registered: bool,
    pub default_revision: bool,
    pub errors: u32,
    pub warnings: u32,
}

impl Module {
    pub fn new(name: impl Into<SmolStr>, kind: ModuleKind) -> Self {
        Self {
            name: name.into(),
            revision: None,
            yang_version: SmolStr::new_static("1"),
            kind,
            namespace_uri: None,
            belongs_to: None,
            prefix: SmolStr::default(),
            xml_prefix: SmolStr::default(),
            namespace_id: NamespaceId::NONE,
            organization: None,
            contact: None,
            description: None,
            reference: None,
            source_filespec: None,
            imports: Vec::new(),
            includes: Vec::new(),
            all_includes: Vec::new(),
            revisions: Vec::new(),
            extensions: Vec::new(),
            typedefs: Vec::new(),
            groupings: Vec::new(),
            identities: Vec::new(),
            features: Vec::new(),
            deviations: Vec::new(),
            nodes: Vec::new(),
            state: LifecycleState::New,
            registered: false,
            default_revision: false,
            errors: 0,
            warnings: 0,
        }
    }

    pub fn is_module(&self) -> bool {
        self.kind == ModuleKind::Module
    }

    pub fn is_submodule(&self) -> bool {
        self.kind == ModuleKind::Submodule
    }

    /// Advance the lifecycle state; illegal transitions are internal bugs
    /// and reported as false.
    pub fn advance(&mut self, next: LifecycleState) -> bool {
        if self.state.can_advance_to(next) {
            self.state = next;
            true
        } else {
            tracing::error!(
                "module '{}': illegal lifecycle transition {:?} -> {:?}",
                self.name,
                self.state,
                next
            );
            false
        }
    }

    /// Aggregate parse status from the diagnostic counters.
    pub fn parse_status(&self) -> ParseStatus {
        if self.errors > 0 {
            ParseStatus::HasErrors
        } else if self.warnings > 0 {
            ParseStatus::HasWarnings
        } else {
            ParseStatus::Ok
        }
    }

    pub fn inc_errors(&mut self) {
        self.errors += 1;
    }

    pub fn inc_warnings(&mut self) {
        self.warnings += 1;
    }

    /// Diagnostic location for this module with an optional position.
    pub fn location(&self, line: u32, col: u32) -> SourceLocation {
        SourceLocation {
            filespec: self.source_filespec.clone(),
            line,
            col,
        }
    }

    /// Find an import by its local prefix.
    pub fn import_by_prefix(&self, prefix: &str) -> Option<&Import> {
        self.imports.iter().find(|imp| imp.prefix == prefix)
    }

    /// Find a revision history entry by date.
    pub fn find_revision(&self, date: &str) -> Option<&Revision> {
        self.revisions.iter().find(|rev| rev.date == date)
    }

    /// Search the module's own typedefs.
    pub fn find_typedef(&self, name: &str) -> Option<&Typedef> {
        self.typedefs.iter().find(|td| td.name == name)
    }

    /// Search the module's own groupings.
    pub fn find_grouping(&self, name: &str) -> Option<&Grouping> {
        self.groupings.iter().find(|g| g.name == name)
    }

    pub fn find_identity(&self, name: &str) -> Option<&Identity> {
        self.identities.iter().find(|i| i.name == name)
    }

    pub fn find_feature(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn find_extension(&self, name: &str) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.name == name)
    }

    /// A top-level definition name already taken by a typedef or rpc.
    /// Used while a module is still in progress, before registration.
    pub fn is_duplicate(&self, defname: &str) -> bool {
        self.find_typedef(defname).is_some()
            || self
                .nodes
                .iter()
                .any(|n| n.is_rpc() && n.name == defname)
    }

    /// Top-level node by name.
    pub fn find_node(&self, name: &str) -> Option<&SchemaNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

/// Compare two optional revision dates; empty/absent collates below all
/// real dates. ISO-8601 dates compare correctly as strings.
pub fn compare_revisions(a: Option<&str>, b: Option<&str>) -> std::cmp::Ordering {
    let a = a.unwrap_or("");
    let b = b.unwrap_or("");
    a.cmp(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        let mut module = Module::new("m", ModuleKind::Module);
        assert!(module.advance(LifecycleState::Parsing));
        assert!(module.advance(LifecycleState::Parsed));
        assert!(!module.advance(LifecycleState::Registered));
        assert_eq!(module.state, LifecycleState::Parsed);
        assert!(module.advance(LifecycleState::Resolving));
        assert!(module.advance(LifecycleState::Resolved));
        assert!(module.advance(LifecycleState::Registered));
        assert!(module.advance(LifecycleState::Frozen));
        assert!(module.advance(LifecycleState::Unloaded));
        assert!(!module.advance(LifecycleState::New));
    }

    #[test]
    fn test_parse_status() {
        let mut module = Module::new("m", ModuleKind::Module);
        assert_eq!(module.parse_status(), ParseStatus::Ok);
        module.inc_warnings();
        assert_eq!(module.parse_status(), ParseStatus::HasWarnings);
        module.inc_errors();
        assert_eq!(module.parse_status(), ParseStatus::HasErrors);
    }

    #[test]
    fn test_revision_compare() {
        use std::cmp::Ordering;
        assert_eq!(
            compare_revisions(Some("2024-01-15"), Some("2023-12-31")),
            Ordering::Greater
        );
        assert_eq!(compare_revisions(None, Some("0001-01-01")), Ordering::Less);
        assert_eq!(compare_revisions(None, None), Ordering::Equal);
    }
}
