//! Build an unresolved [`Module`] from raw statements.
//!
//! Everything name-shaped is validated here; everything reference-shaped
//! (types, uses, augments, bases, if-features) is stored spelled and left
//! for the resolver.

use smol_str::SmolStr;

use crate::base::constants::DEF_WARN_IDLEN;
use crate::base::{check_yang_identifier, IdentCheck, SourceLocation};
use crate::diag::{DiagnosticCollector, Error, ErrorCode, Result};
use crate::schema::{
    AugmentNode, CaseNode, ChoiceNode, ContainerNode, Deviate, DeviateEdits, Deviation, Extension,
    Feature, Grouping, Identity, IfFeatureRef, Import, Include, LeafListNode, LeafNode, ListNode,
    Module, ModuleKind, Must, NodeKind, NotificationNode, QualifiedRef, Refine, Revision,
    RpcIoNode, RpcNode, SchemaNode, Status, Typedef, TypeSpec, UsesNode,
};
use crate::types::{BaseType, Bit, EnumValue, ErrInfo};

use super::stmt::RawStmt;

/// Build a module from the top-level statements of one source file.
///
/// Parse problems inside the body are reported through `diags` and
/// counted on the module; only a missing or multiple module statement is
/// an outright error.
pub fn build_module(
    stmts: &[RawStmt],
    source_filespec: Option<&str>,
    diags: &mut DiagnosticCollector,
) -> Result<Module> {
    let root = match stmts {
        [one] if one.keyword == "module" || one.keyword == "submodule" => one,
        [] => {
            return Err(Error::Syntax {
                line: 1,
                col: 1,
                message: "empty source: expected a module or submodule statement".into(),
            })
        }
        [first, ..] => {
            return Err(Error::Syntax {
                line: first.line,
                col: first.col,
                message: "expected exactly one module or submodule statement".into(),
            })
        }
    };

    let kind = if root.keyword == "module" {
        ModuleKind::Module
    } else {
        ModuleKind::Submodule
    };
    let name: SmolStr = root.arg.clone().unwrap_or_default();

    let mut builder = ModuleBuilder {
        module: Module::new(name, kind),
        diags,
    };
    builder.module.source_filespec = source_filespec.map(SmolStr::from);
    let module_name = builder.module.name.clone();
    builder.check_identifier(&module_name, root);
    builder.build(root);
    Ok(builder.module)
}

struct ModuleBuilder<'a> {
    module: Module,
    diags: &'a mut DiagnosticCollector,
}

impl ModuleBuilder<'_> {
    fn loc(&self, stmt: &RawStmt) -> SourceLocation {
        SourceLocation {
            filespec: self.module.source_filespec.clone(),
            line: stmt.line,
            col: stmt.col,
        }
    }

    fn emit(&mut self, stmt: &RawStmt, code: ErrorCode, message: impl Into<String>) {
        if self.diags.emit(self.loc(stmt), code, message) {
            if code.is_error() {
                self.module.inc_errors();
            } else {
                self.module.inc_warnings();
            }
        }
    }

    fn check_identifier(&mut self, name: &str, stmt: &RawStmt) {
        match check_yang_identifier(name, DEF_WARN_IDLEN) {
            IdentCheck::Ok => {}
            IdentCheck::OverSoftLimit => {
                self.emit(
                    stmt,
                    ErrorCode::IdlenExceeded,
                    format!("identifier '{}' exceeds {} characters", name, DEF_WARN_IDLEN),
                );
            }
            IdentCheck::Invalid => {
                self.emit(
                    stmt,
                    ErrorCode::InvalidValue,
                    format!("invalid identifier '{name}'"),
                );
            }
        }
    }

    fn require_arg(&mut self, stmt: &RawStmt, what: &str) -> SmolStr {
        match &stmt.arg {
            Some(arg) => arg.clone(),
            None => {
                self.emit(
                    stmt,
                    ErrorCode::DataMissing,
                    format!("'{}' requires {what}", stmt.keyword),
                );
                SmolStr::default()
            }
        }
    }

    // ============================================================
    // Module level
    // ============================================================

    fn build(&mut self, root: &RawStmt) {
        for stmt in &root.substmts {
            if stmt.prefix.is_some() {
                // extension statement from another module; not modeled
                tracing::debug!(
                    "ignoring extension statement '{}:{}'",
                    stmt.prefix.as_deref().unwrap_or(""),
                    stmt.keyword
                );
                continue;
            }
            match stmt.keyword.as_str() {
                "yang-version" => self.on_yang_version(stmt),
                "namespace" => self.module.namespace_uri = stmt.arg.clone(),
                "prefix" => {
                    let prefix = self.require_arg(stmt, "a prefix");
                    self.module.prefix = prefix.clone();
                    self.module.xml_prefix = prefix;
                }
                "belongs-to" => self.on_belongs_to(stmt),
                "organization" => self.module.organization = stmt.arg.as_deref().map(String::from),
                "contact" => self.module.contact = stmt.arg.as_deref().map(String::from),
                "description" => self.module.description = stmt.arg.as_deref().map(String::from),
                "reference" => self.module.reference = stmt.arg.as_deref().map(String::from),
                "revision" => self.on_revision(stmt),
                "import" => self.on_import(stmt),
                "include" => self.on_include(stmt),
                "typedef" => self.on_typedef(stmt),
                "grouping" => self.on_grouping(stmt),
                "identity" => self.on_identity(stmt),
                "feature" => self.on_feature(stmt),
                "deviation" => self.on_deviation(stmt),
                "extension" => self.on_extension(stmt),
                _ => {
                    if let Some(node) = self.build_node(stmt) {
                        self.module.nodes.push(node);
                    }
                }
            }
        }
        self.finish_header(root);
    }

    fn finish_header(&mut self, root: &RawStmt) {
        if self.module.is_module() {
            if self.module.namespace_uri.is_none() {
                self.emit(root, ErrorCode::DataMissing, "module requires a namespace");
            }
            if self.module.prefix.is_empty() {
                self.emit(root, ErrorCode::DataMissing, "module requires a prefix");
            }
        } else if self.module.belongs_to.is_none() {
            self.emit(root, ErrorCode::DataMissing, "submodule requires belongs-to");
        }
        // newest revision first; dates are lexicographic ISO-8601
        self.module
            .revisions
            .sort_by(|a, b| b.date.cmp(&a.date));
        self.module.revision = self.module.revisions.first().map(|r| r.date.clone());
    }

    fn on_yang_version(&mut self, stmt: &RawStmt) {
        match stmt.arg.as_deref() {
            Some("1") | Some("1.1") => {
                self.module.yang_version = stmt.arg.clone().unwrap_or_default();
            }
            other => {
                self.emit(
                    stmt,
                    ErrorCode::InvalidValue,
                    format!("unsupported yang-version '{}'", other.unwrap_or("")),
                );
            }
        }
    }

    fn on_belongs_to(&mut self, stmt: &RawStmt) {
        self.module.belongs_to = Some(self.require_arg(stmt, "a module name"));
        if let Some(prefix) = stmt.arg_of("prefix") {
            self.module.prefix = prefix.into();
            self.module.xml_prefix = prefix.into();
        }
    }

    fn on_revision(&mut self, stmt: &RawStmt) {
        let date = self.require_arg(stmt, "a revision date");
        self.module.revisions.push(Revision {
            date,
            description: stmt.arg_of("description").map(String::from),
            reference: stmt.arg_of("reference").map(String::from),
        });
    }

    fn on_import(&mut self, stmt: &RawStmt) {
        let name = self.require_arg(stmt, "a module name");
        let mut import = Import::new(name, "");
        import.location = self.loc(stmt);
        match stmt.arg_of("prefix") {
            Some(prefix) => import.prefix = prefix.into(),
            None => self.emit(stmt, ErrorCode::DataMissing, "import requires a prefix"),
        }
        import.revision = stmt.arg_of("revision-date").map(SmolStr::from);
        self.module.imports.push(import);
    }

    fn on_include(&mut self, stmt: &RawStmt) {
        let name = self.require_arg(stmt, "a submodule name");
        let mut include = Include::new(name);
        include.location = self.loc(stmt);
        include.revision = stmt.arg_of("revision-date").map(SmolStr::from);
        self.module.includes.push(include);
    }

    fn on_typedef(&mut self, stmt: &RawStmt) {
        let name = self.require_arg(stmt, "a name");
        self.check_identifier(&name, stmt);
        if self.module.is_duplicate(&name) {
            self.emit(
                stmt,
                ErrorCode::DuplicateDef,
                format!("typedef '{name}' duplicates an existing definition"),
            );
        }
        let type_spec = match stmt.find("type") {
            Some(type_stmt) => self.build_typespec(type_stmt),
            None => {
                self.emit(stmt, ErrorCode::DataMissing, "typedef requires a type");
                TypeSpec::default()
            }
        };
        let mut typedef = Typedef::new(name, type_spec);
        typedef.default = stmt.arg_of("default").map(SmolStr::from);
        typedef.units = stmt.arg_of("units").map(SmolStr::from);
        typedef.status = self.read_status(stmt);
        typedef.description = stmt.arg_of("description").map(String::from);
        typedef.reference = stmt.arg_of("reference").map(String::from);
        typedef.location = self.loc(stmt);
        self.module.typedefs.push(typedef);
    }

    fn on_grouping(&mut self, stmt: &RawStmt) {
        let name = self.require_arg(stmt, "a name");
        self.check_identifier(&name, stmt);
        let mut grouping = Grouping::new(name);
        grouping.status = self.read_status(stmt);
        grouping.description = stmt.arg_of("description").map(String::from);
        grouping.reference = stmt.arg_of("reference").map(String::from);
        grouping.location = self.loc(stmt);
        grouping.children = self.build_children(stmt);
        self.module.groupings.push(grouping);
    }

    fn on_identity(&mut self, stmt: &RawStmt) {
        let name = self.require_arg(stmt, "a name");
        self.check_identifier(&name, stmt);
        let mut identity = Identity::new(name);
        identity.base = stmt.arg_of("base").map(QualifiedRef::parse);
        identity.status = self.read_status(stmt);
        identity.description = stmt.arg_of("description").map(String::from);
        identity.reference = stmt.arg_of("reference").map(String::from);
        identity.location = self.loc(stmt);
        self.module.identities.push(identity);
    }

    fn on_feature(&mut self, stmt: &RawStmt) {
        let name = self.require_arg(stmt, "a name");
        self.check_identifier(&name, stmt);
        let mut feature = Feature::new(name);
        feature.if_features = self.read_if_features(stmt);
        feature.status = self.read_status(stmt);
        feature.description = stmt.arg_of("description").map(String::from);
        feature.reference = stmt.arg_of("reference").map(String::from);
        feature.location = self.loc(stmt);
        self.module.features.push(feature);
    }

    fn on_extension(&mut self, stmt: &RawStmt) {
        let name = self.require_arg(stmt, "a name");
        self.check_identifier(&name, stmt);
        let argument = stmt.arg_of("argument").map(SmolStr::from);
        let status = self.read_status(stmt);
        let description = stmt.arg_of("description").map(String::from);
        let reference = stmt.arg_of("reference").map(String::from);
        let location = self.loc(stmt);
        self.module.extensions.push(Extension {
            name,
            argument,
            status,
            description,
            reference,
            location,
        });
    }

    fn on_deviation(&mut self, stmt: &RawStmt) {
        let target = self.require_arg(stmt, "a target path");
        let mut deviation = Deviation::new(target);
        deviation.description = stmt.arg_of("description").map(String::from);
        deviation.reference = stmt.arg_of("reference").map(String::from);
        deviation.location = self.loc(stmt);
        for deviate in stmt.find_all("deviate") {
            match deviate.arg.as_deref() {
                Some("not-supported") => deviation.deviates.push(Deviate::NotSupported),
                Some("add") => deviation.deviates.push(Deviate::Add(self.read_edits(deviate))),
                Some("replace") => {
                    deviation.deviates.push(Deviate::Replace(self.read_edits(deviate)))
                }
                Some("delete") => {
                    deviation.deviates.push(Deviate::Delete(self.read_edits(deviate)))
                }
                other => self.emit(
                    deviate,
                    ErrorCode::InvalidValue,
                    format!("invalid deviate argument '{}'", other.unwrap_or("")),
                ),
            }
        }
        self.module.deviations.push(deviation);
    }

    fn read_edits(&mut self, stmt: &RawStmt) -> DeviateEdits {
        DeviateEdits {
            config: self.read_bool_arg(stmt, "config"),
            mandatory: self.read_bool_arg(stmt, "mandatory"),
            default: stmt.arg_of("default").map(SmolStr::from),
            units: stmt.arg_of("units").map(SmolStr::from),
            min_elements: self.read_count(stmt, "min-elements"),
            max_elements: self.read_count(stmt, "max-elements"),
            musts: self.read_musts(stmt),
            unique: stmt
                .find_all("unique")
                .filter_map(|u| u.arg.as_deref())
                .map(split_names)
                .collect(),
        }
    }

    // ============================================================
    // Shared attribute readers
    // ============================================================

    fn read_status(&mut self, stmt: &RawStmt) -> Status {
        match stmt.find("status") {
            None => Status::Current,
            Some(status_stmt) => match status_stmt.arg.as_deref().and_then(Status::from_arg) {
                Some(status) => status,
                None => {
                    self.emit(
                        status_stmt,
                        ErrorCode::InvalidValue,
                        format!(
                            "invalid status '{}'",
                            status_stmt.arg.as_deref().unwrap_or("")
                        ),
                    );
                    Status::Current
                }
            },
        }
    }

    fn read_if_features(&mut self, stmt: &RawStmt) -> Vec<IfFeatureRef> {
        stmt.find_all("if-feature")
            .filter_map(|s| s.arg.as_deref())
            .map(IfFeatureRef::parse)
            .collect()
    }

    fn read_bool_arg(&mut self, stmt: &RawStmt, keyword: &str) -> Option<bool> {
        let sub = stmt.find(keyword)?;
        match sub.arg.as_deref() {
            Some("true") => Some(true),
            Some("false") => Some(false),
            other => {
                self.emit(
                    sub,
                    ErrorCode::InvalidValue,
                    format!("'{keyword}' expects true or false, got '{}'", other.unwrap_or("")),
                );
                None
            }
        }
    }

    fn read_count(&mut self, stmt: &RawStmt, keyword: &str) -> Option<u32> {
        let sub = stmt.find(keyword)?;
        match sub.arg.as_deref() {
            Some("unbounded") if keyword == "max-elements" => None,
            Some(text) => match text.parse::<u32>() {
                Ok(value) => Some(value),
                Err(_) => {
                    self.emit(
                        sub,
                        ErrorCode::InvalidValue,
                        format!("'{keyword}' expects a number, got '{text}'"),
                    );
                    None
                }
            },
            None => None,
        }
    }

    fn read_musts(&mut self, stmt: &RawStmt) -> Vec<Must> {
        stmt.find_all("must")
            .map(|m| {
                let mut must = Must::new(m.arg.as_deref().unwrap_or(""));
                must.errinfo = ErrInfo {
                    description: m.arg_of("description").map(String::from),
                    reference: m.arg_of("reference").map(String::from),
                    error_app_tag: m.arg_of("error-app-tag").map(SmolStr::from),
                    error_message: m.arg_of("error-message").map(String::from),
                };
                must
            })
            .collect()
    }

    // ============================================================
    // Type specs
    // ============================================================

    fn build_typespec(&mut self, stmt: &RawStmt) -> TypeSpec {
        let spelled = self.require_arg(stmt, "a type name");
        let mut spec = match BaseType::from_type_name(&spelled) {
            Some(base) => TypeSpec::of_base(base),
            None => TypeSpec::named(&spelled),
        };

        if let Some((range, errinfo)) = self.read_restriction(stmt, "range") {
            spec.range = Some((range, errinfo));
        }
        if let Some((length, errinfo)) = self.read_restriction(stmt, "length") {
            spec.length = Some((length, errinfo));
        }
        for pattern in stmt.find_all("pattern") {
            let errinfo = ErrInfo {
                description: pattern.arg_of("description").map(String::from),
                reference: pattern.arg_of("reference").map(String::from),
                error_app_tag: pattern.arg_of("error-app-tag").map(SmolStr::from),
                error_message: pattern.arg_of("error-message").map(String::from),
            };
            spec.patterns
                .push((pattern.arg.as_deref().unwrap_or("").to_string(), errinfo));
        }
        if let Some(digits) = self.read_count(stmt, "fraction-digits") {
            spec.fraction_digits = Some(digits.min(18) as u8);
        }
        spec.leafref_path = stmt.arg_of("path").map(String::from);
        spec.identity_base = stmt.arg_of("base").map(QualifiedRef::parse);
        spec.require_instance = self.read_bool_arg(stmt, "require-instance");

        self.read_enums(stmt, &mut spec);
        self.read_bits(stmt, &mut spec);
        for member in stmt.find_all("type") {
            let member_spec = self.build_typespec(member);
            spec.union_members.push(member_spec);
        }

        if spec.base == Some(BaseType::Leafref) && spec.leafref_path.is_none() {
            self.emit(stmt, ErrorCode::DataMissing, "leafref requires a path");
        }
        if spec.base == Some(BaseType::Union) && spec.union_members.is_empty() {
            self.emit(stmt, ErrorCode::DataMissing, "union requires member types");
        }
        spec
    }

    fn read_restriction(&mut self, stmt: &RawStmt, keyword: &str) -> Option<(String, ErrInfo)> {
        let sub = stmt.find(keyword)?;
        let errinfo = ErrInfo {
            description: sub.arg_of("description").map(String::from),
            reference: sub.arg_of("reference").map(String::from),
            error_app_tag: sub.arg_of("error-app-tag").map(SmolStr::from),
            error_message: sub.arg_of("error-message").map(String::from),
        };
        Some((sub.arg.as_deref().unwrap_or("").to_string(), errinfo))
    }

    fn read_enums(&mut self, stmt: &RawStmt, spec: &mut TypeSpec) {
        // auto-assignment: one past the highest value so far, from 0
        let mut next_value: i64 = 0;
        for enum_stmt in stmt.find_all("enum") {
            let name = self.require_arg(enum_stmt, "a name");
            let value = match enum_stmt.arg_of("value") {
                Some(text) => match text.parse::<i32>() {
                    Ok(value) => value,
                    Err(_) => {
                        self.emit(
                            enum_stmt,
                            ErrorCode::InvalidValue,
                            format!("invalid enum value '{text}'"),
                        );
                        next_value as i32
                    }
                },
                None => {
                    if next_value > i32::MAX as i64 {
                        self.emit(enum_stmt, ErrorCode::InvalidValue, "enum value overflow");
                    }
                    next_value as i32
                }
            };
            next_value = value as i64 + 1;
            if spec.enums.iter().any(|e| e.name == name) {
                self.emit(
                    enum_stmt,
                    ErrorCode::DuplicateDef,
                    format!("duplicate enum name '{name}'"),
                );
                continue;
            }
            spec.enums.push(EnumValue::new(name, value));
        }
    }

    fn read_bits(&mut self, stmt: &RawStmt, spec: &mut TypeSpec) {
        let mut next_position: u64 = 0;
        for bit_stmt in stmt.find_all("bit") {
            let name = self.require_arg(bit_stmt, "a name");
            let position = match bit_stmt.arg_of("position") {
                Some(text) => match text.parse::<u32>() {
                    Ok(position) => position,
                    Err(_) => {
                        self.emit(
                            bit_stmt,
                            ErrorCode::InvalidValue,
                            format!("invalid bit position '{text}'"),
                        );
                        next_position as u32
                    }
                },
                None => next_position as u32,
            };
            next_position = position as u64 + 1;
            if spec.bits.iter().any(|b| b.name == name || b.position == position) {
                self.emit(
                    bit_stmt,
                    ErrorCode::DuplicateDef,
                    format!("duplicate bit '{name}'"),
                );
                continue;
            }
            spec.bits.push(Bit::new(name, position));
        }
    }

    // ============================================================
    // Schema nodes
    // ============================================================

    fn build_children(&mut self, stmt: &RawStmt) -> Vec<SchemaNode> {
        let mut children = Vec::new();
        for sub in &stmt.substmts {
            if sub.prefix.is_some() {
                continue;
            }
            if let Some(node) = self.build_node(sub) {
                if children.iter().any(|c: &SchemaNode| c.name == node.name) {
                    self.emit(
                        sub,
                        ErrorCode::DuplicateDef,
                        format!("duplicate node '{}'", node.name),
                    );
                    continue;
                }
                children.push(node);
            }
        }
        children
    }

    /// Build one schema node; returns `None` for keywords that are node
    /// attributes rather than nodes.
    fn build_node(&mut self, stmt: &RawStmt) -> Option<SchemaNode> {
        let kind = match stmt.keyword.as_str() {
            "leaf" => NodeKind::Leaf(LeafNode {
                type_spec: self.node_typespec(stmt),
                default: stmt.arg_of("default").map(SmolStr::from),
                units: stmt.arg_of("units").map(SmolStr::from),
                mandatory: self.read_bool_arg(stmt, "mandatory").unwrap_or(false),
                musts: self.read_musts(stmt),
            }),
            "leaf-list" => NodeKind::LeafList(LeafListNode {
                type_spec: self.node_typespec(stmt),
                defaults: stmt
                    .find_all("default")
                    .filter_map(|d| d.arg.clone())
                    .collect(),
                units: stmt.arg_of("units").map(SmolStr::from),
                min_elements: self.read_count(stmt, "min-elements"),
                max_elements: self.read_count(stmt, "max-elements"),
                ordered_by_user: stmt.arg_of("ordered-by") == Some("user"),
                musts: self.read_musts(stmt),
            }),
            "list" => NodeKind::List(ListNode {
                keys: stmt.arg_of("key").map(split_names).unwrap_or_default(),
                unique: stmt
                    .find_all("unique")
                    .filter_map(|u| u.arg.as_deref())
                    .map(split_names)
                    .collect(),
                min_elements: self.read_count(stmt, "min-elements"),
                max_elements: self.read_count(stmt, "max-elements"),
                ordered_by_user: stmt.arg_of("ordered-by") == Some("user"),
                musts: self.read_musts(stmt),
                children: self.build_children(stmt),
            }),
            "container" => NodeKind::Container(ContainerNode {
                presence: stmt.arg_of("presence").map(String::from),
                musts: self.read_musts(stmt),
                children: self.build_children(stmt),
            }),
            "choice" => self.build_choice(stmt),
            "case" => NodeKind::Case(CaseNode {
                children: self.build_children(stmt),
            }),
            "uses" => NodeKind::Uses(UsesNode {
                grouping: QualifiedRef::parse(&self.require_arg(stmt, "a grouping name")),
                refines: self.read_refines(stmt),
                augments: stmt
                    .find_all("augment")
                    .filter_map(|a| self.build_node(a))
                    .collect(),
            }),
            "augment" => NodeKind::Augment(AugmentNode {
                target_path: self.require_arg(stmt, "a target path"),
                children: self.build_children(stmt),
                applied: false,
            }),
            "rpc" => {
                let mut children = Vec::new();
                for io in &stmt.substmts {
                    let is_output = match io.keyword.as_str() {
                        "input" => false,
                        "output" => true,
                        _ => continue,
                    };
                    let mut node = SchemaNode::new(
                        io.keyword.clone(),
                        NodeKind::RpcIo(RpcIoNode {
                            is_output,
                            children: self.build_children(io),
                        }),
                    );
                    node.location = self.loc(io);
                    children.push(node);
                }
                NodeKind::Rpc(RpcNode { children })
            }
            "notification" => NodeKind::Notification(NotificationNode {
                children: self.build_children(stmt),
            }),
            "anyxml" | "anydata" => NodeKind::AnyXml,
            // node attributes handled by the callers above
            "key" | "unique" | "type" | "default" | "units" | "config" | "mandatory"
            | "status" | "description" | "reference" | "when" | "must" | "presence"
            | "min-elements" | "max-elements" | "ordered-by" | "if-feature" | "refine"
            | "input" | "output" | "enum" | "bit" | "base" | "error-message"
            | "error-app-tag" => return None,
            // scoped definitions are not modeled; references to them
            // surface later as unresolved names
            "typedef" | "grouping" | "action" => {
                tracing::debug!("skipping scoped '{}' definition", stmt.keyword);
                return None;
            }
            other => {
                self.emit(
                    stmt,
                    ErrorCode::InvalidValue,
                    format!("unknown statement '{other}'"),
                );
                return None;
            }
        };

        let name = match stmt.keyword.as_str() {
            // an augment's name slot carries its target path, a uses
            // carries its (possibly prefixed) grouping name
            "augment" | "uses" => stmt.arg.clone().unwrap_or_default(),
            _ => {
                let name = self.require_arg(stmt, "a name");
                self.check_identifier(&name, stmt);
                name
            }
        };

        let mut node = SchemaNode::new(name, kind);
        node.config = self.read_bool_arg(stmt, "config");
        node.if_features = self.read_if_features(stmt);
        node.status = self.read_status(stmt);
        node.description = stmt.arg_of("description").map(String::from);
        node.reference = stmt.arg_of("reference").map(String::from);
        node.when = stmt.arg_of("when").map(String::from);
        node.location = self.loc(stmt);
        Some(node)
    }

    fn node_typespec(&mut self, stmt: &RawStmt) -> TypeSpec {
        match stmt.find("type") {
            Some(type_stmt) => self.build_typespec(type_stmt),
            None => {
                self.emit(
                    stmt,
                    ErrorCode::DataMissing,
                    format!("'{}' requires a type", stmt.keyword),
                );
                TypeSpec::default()
            }
        }
    }

    /// Choice children are cases; shorthand data nodes get a synthesized
    /// wrapping case of the same name.
    fn build_choice(&mut self, stmt: &RawStmt) -> NodeKind {
        let mut cases = Vec::new();
        for sub in &stmt.substmts {
            if sub.prefix.is_some() {
                continue;
            }
            let Some(node) = self.build_node(sub) else {
                continue;
            };
            let case = if matches!(node.kind, NodeKind::Case(_)) {
                node
            } else {
                let mut case = SchemaNode::new(
                    node.name.clone(),
                    NodeKind::Case(CaseNode {
                        children: vec![node],
                    }),
                );
                case.location = self.loc(sub);
                case
            };
            cases.push(case);
        }
        NodeKind::Choice(ChoiceNode {
            default_case: stmt.arg_of("default").map(SmolStr::from),
            mandatory: self.read_bool_arg(stmt, "mandatory").unwrap_or(false),
            children: cases,
        })
    }

    fn read_refines(&mut self, stmt: &RawStmt) -> Vec<Refine> {
        stmt.find_all("refine")
            .map(|r| Refine {
                target: r.arg.clone().unwrap_or_default(),
                description: r.arg_of("description").map(String::from),
                reference: r.arg_of("reference").map(String::from),
                config: self.read_bool_arg(r, "config"),
                mandatory: self.read_bool_arg(r, "mandatory"),
                presence: r.arg_of("presence").map(String::from),
                default: r.arg_of("default").map(SmolStr::from),
                min_elements: self.read_count(r, "min-elements"),
                max_elements: self.read_count(r, "max-elements"),
                musts: self.read_musts(r),
            })
            .collect()
    }
}

fn split_names(arg: &str) -> Vec<SmolStr> {
    arg.split_whitespace().map(SmolStr::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::Scanner;
    use crate::parser::stmt::parse_statements;

    fn build(source: &str) -> (Module, DiagnosticCollector) {
        let stmts = parse_statements(&mut Scanner::new(source)).unwrap();
        let mut diags = DiagnosticCollector::new();
        let module = build_module(&stmts, Some("test.yang"), &mut diags).unwrap();
        (module, diags)
    }

    #[test]
    fn test_minimal_module() {
        let (module, diags) = build(
            "module a { namespace urn:x:a; prefix a; leaf foo { type uint32; } }",
        );
        assert!(!diags.has_errors());
        assert_eq!(module.name, "a");
        assert_eq!(module.namespace_uri.as_deref(), Some("urn:x:a"));
        assert_eq!(module.prefix, "a");
        let leaf = module.find_node("foo").unwrap();
        assert_eq!(
            leaf.type_spec().unwrap().base,
            Some(BaseType::Uint32)
        );
    }

    #[test]
    fn test_missing_namespace_reported() {
        let (module, diags) = build("module a { prefix a; }");
        assert!(diags.has_errors());
        assert_eq!(module.errors, 1);
    }

    #[test]
    fn test_revisions_newest_first() {
        let (module, _) = build(
            "module a { namespace urn:x:a; prefix a; \
             revision 2023-01-01; revision 2024-06-01; revision 2022-03-05; }",
        );
        let dates: Vec<&str> = module.revisions.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-06-01", "2023-01-01", "2022-03-05"]);
        assert_eq!(module.revision.as_deref(), Some("2024-06-01"));
    }

    #[test]
    fn test_import_and_include() {
        let (module, _) = build(
            "module a { namespace urn:x:a; prefix a; \
             import b { prefix bp; revision-date 2024-01-01; } \
             include a-sub; }",
        );
        assert_eq!(module.imports.len(), 1);
        assert_eq!(module.imports[0].prefix, "bp");
        assert_eq!(module.imports[0].revision.as_deref(), Some("2024-01-01"));
        assert_eq!(module.includes[0].submodule_name, "a-sub");
    }

    #[test]
    fn test_enum_auto_values() {
        let (module, _) = build(
            "module a { namespace urn:x:a; prefix a; \
             leaf l { type enumeration { enum zero; enum five { value 5; } enum six; } } }",
        );
        let spec = module.find_node("l").unwrap().type_spec().unwrap();
        let values: Vec<i32> = spec.enums.iter().map(|e| e.value).collect();
        assert_eq!(values, vec![0, 5, 6]);
    }

    #[test]
    fn test_choice_shorthand_gets_case() {
        let (module, _) = build(
            "module a { namespace urn:x:a; prefix a; \
             choice ch { leaf direct { type string; } case wrapped { leaf w { type string; } } } }",
        );
        let choice = module.find_node("ch").unwrap();
        assert_eq!(choice.children().len(), 2);
        assert!(choice
            .children()
            .iter()
            .all(|c| matches!(c.kind, NodeKind::Case(_))));
        assert_eq!(choice.children()[0].name, "direct");
    }

    #[test]
    fn test_rpc_io() {
        let (module, _) = build(
            "module a { namespace urn:x:a; prefix a; \
             rpc get-config { input { leaf source { type string; } } output { leaf data { type string; } } } }",
        );
        let rpc = module.find_node("get-config").unwrap();
        assert!(rpc.is_rpc());
        assert_eq!(rpc.children().len(), 2);
        assert_eq!(rpc.children()[1].name, "output");
    }

    #[test]
    fn test_list_keys() {
        let (module, _) = build(
            "module a { namespace urn:x:a; prefix a; \
             list servers { key \"name port\"; leaf name { type string; } leaf port { type uint16; } } }",
        );
        let list = module.find_node("servers").unwrap();
        match &list.kind {
            NodeKind::List(l) => assert_eq!(l.keys, vec!["name", "port"]),
            _ => panic!("expected list"),
        }
    }

    #[test]
    fn test_deviation_parsed() {
        let (module, _) = build(
            "module c { namespace urn:x:c; prefix c; import a { prefix a; } \
             deviation /a:c/a:q { deviate not-supported; } }",
        );
        assert_eq!(module.deviations.len(), 1);
        assert_eq!(module.deviations[0].target_path, "/a:c/a:q");
        assert_eq!(module.deviations[0].deviates, vec![Deviate::NotSupported]);
    }

    #[test]
    fn test_extension_definition_recorded() {
        let (module, diags) = build(
            "module a { namespace urn:x:a; prefix a; \
             extension metadata { argument name; description \"annotation hook\"; } }",
        );
        assert!(!diags.has_errors());
        let ext = module.find_extension("metadata").unwrap();
        assert_eq!(ext.argument.as_deref(), Some("name"));
    }

    #[test]
    fn test_submodule_belongs_to() {
        let stmts = parse_statements(&mut Scanner::new(
            "submodule a-sub { belongs-to a { prefix a; } }",
        ))
        .unwrap();
        let mut diags = DiagnosticCollector::new();
        let module = build_module(&stmts, None, &mut diags).unwrap();
        assert!(module.is_submodule());
        assert_eq!(module.belongs_to.as_deref(), Some("a"));
        assert_eq!(module.prefix, "a");
    }

    #[test]
    fn test_unknown_statement_reported() {
        let (module, diags) = build("module a { namespace urn:x:a; prefix a; nonsense x; }");
        assert!(diags.has_errors());
        assert!(module.errors > 0);
    }
}
