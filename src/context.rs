//! The compiler context.
//!
//! All shared state lives here: the module and namespace registries, the
//! diagnostic collector, the filter pool, and the loader configuration.
//! Every public entry point is a method on [`Context`], so tests get full
//! isolation and nothing is process-global. Access is single-threaded by
//! construction (`&mut self` throughout); callers serialize.

use smol_str::SmolStr;

use crate::base::constants::DEF_WARN_LINELEN;
use crate::base::{ModuleId, SourceLocation};
use crate::diag::{Diagnostic, DiagnosticCollector, Error, ErrorCode, Result};
use crate::filter::FilterPool;
use crate::link::{FsSourceProvider, ModuleSource, SearchPaths, SourceProvider};
use crate::parser::{build_module, parse_statements, Scanner};
use crate::registry::{ModuleRegistry, NamespaceRegistry};
use crate::schema::{LifecycleState, Module, ModuleKind};

/// Hook invoked after a module enters the registered state. The callback
/// receives a shared reference and cannot re-enter the context.
pub type LoadCallback = Box<dyn Fn(&Module)>;

pub struct Context {
    pub(crate) modules: ModuleRegistry,
    pub(crate) namespaces: NamespaceRegistry,
    pub(crate) diags: DiagnosticCollector,
    pub(crate) filters: FilterPool,
    pub(crate) search_paths: SearchPaths,
    pub(crate) sources: Box<dyn SourceProvider>,
    pub(crate) load_callback: Option<LoadCallback>,
    /// Deviation-module names loaded after every top-level load so their
    /// deviations reach freshly loaded targets.
    pub(crate) saved_deviations: Vec<SmolStr>,
    /// Names currently being loaded, for import/include cycle detection.
    pub(crate) load_stack: Vec<SmolStr>,
    /// Register modules whose resolution left non-fatal errors.
    pub(crate) accept_imperfect: bool,
    /// Batch-teardown quarantine; `Some` while the mode is on.
    pub(crate) dead_modules: Option<Vec<Module>>,
}

impl Context {
    /// Context with the filesystem source provider.
    pub fn new() -> Self {
        Self::with_provider(Box::new(FsSourceProvider))
    }

    /// Context with a custom source provider.
    pub fn with_provider(sources: Box<dyn SourceProvider>) -> Self {
        Self {
            modules: ModuleRegistry::new(),
            namespaces: NamespaceRegistry::new(),
            diags: DiagnosticCollector::new(),
            filters: FilterPool::new(),
            search_paths: SearchPaths::default(),
            sources,
            load_callback: None,
            saved_deviations: Vec::new(),
            load_stack: Vec::new(),
            accept_imperfect: true,
            dead_modules: None,
        }
    }

    // ============================================================
    // Configuration
    // ============================================================

    pub fn set_home_dir(&mut self, dir: impl Into<String>) {
        self.search_paths.home_dir = Some(dir.into());
    }

    pub fn set_module_search_paths(&mut self, paths: Vec<String>) {
        self.search_paths.module_paths = paths;
    }

    pub fn set_install_root(&mut self, dir: impl Into<String>) {
        self.search_paths.install_root = Some(dir.into());
    }

    pub fn set_load_callback(&mut self, callback: LoadCallback) {
        self.load_callback = Some(callback);
    }

    pub fn set_saved_deviations(&mut self, modules: Vec<String>) {
        self.saved_deviations = modules.into_iter().map(SmolStr::new).collect();
    }

    /// Whether modules with non-fatal resolution errors are still
    /// registered (with a warning). Defaults to true.
    pub fn set_accept_imperfect(&mut self, accept: bool) {
        self.accept_imperfect = accept;
    }

    // ============================================================
    // Diagnostics
    // ============================================================

    pub fn suppress_warning(&mut self, code: ErrorCode) -> bool {
        self.diags.suppress(code)
    }

    pub fn unsuppress_warning(&mut self, code: ErrorCode) {
        self.diags.unsuppress(code)
    }

    pub fn warning_enabled(&self, code: ErrorCode) -> bool {
        self.diags.is_enabled(code)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diags.diagnostics()
    }

    pub fn error_count(&self) -> u32 {
        self.diags.error_count()
    }

    pub fn warning_count(&self) -> u32 {
        self.diags.warning_count()
    }

    // ============================================================
    // Registry access
    // ============================================================

    pub fn module_registry(&self) -> &ModuleRegistry {
        &self.modules
    }

    pub fn namespace_registry(&self) -> &NamespaceRegistry {
        &self.namespaces
    }

    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id)
    }

    pub fn filter_pool(&mut self) -> &mut FilterPool {
        &mut self.filters
    }

    /// Install a session scope shadowing the global module set.
    pub fn set_session_scope(&mut self, ids: Vec<ModuleId>) {
        self.modules.set_session_scope(ids);
    }

    pub fn clear_session_scope(&mut self) {
        self.modules.clear_session_scope();
    }

    /// Swap the authoritative current scope, returning the previous one.
    pub fn swap_current_scope(&mut self, ids: Vec<ModuleId>) -> Vec<ModuleId> {
        self.modules.swap_current_scope(ids)
    }

    // ============================================================
    // Feature toggling
    // ============================================================

    /// Toggle a feature's runtime-enabled flag. Not legal mid-iteration;
    /// iterators snapshot feature state at creation.
    pub fn set_feature_runtime(
        &mut self,
        module_name: &str,
        feature_name: &str,
        enabled: bool,
    ) -> Result<()> {
        let id = self
            .modules
            .find_id(module_name, None)
            .ok_or_else(|| Error::ModuleNotFound {
                name: module_name.into(),
            })?;
        let module = self
            .modules
            .get_mut(id)
            .ok_or_else(|| Error::Internal("vacant module slot".into()))?;
        let feature = module
            .features
            .iter_mut()
            .find(|f| f.name == feature_name)
            .ok_or_else(|| Error::DefNotFound {
                name: feature_name.into(),
            })?;
        feature.runtime_enabled = enabled;
        Ok(())
    }

    // ============================================================
    // Loading
    // ============================================================

    /// Load a module by name, optionally pinned to a revision.
    ///
    /// Already-loaded modules are returned as-is. A fresh load recursively
    /// loads imports and includes, resolves to fixpoint, prunes, registers,
    /// and fires the load callback. Saved deviation modules are loaded
    /// afterwards so their deviations apply.
    pub fn load(&mut self, name: &str, revision: Option<&str>) -> Result<ModuleId> {
        if let Some(id) = self.modules.find_id(name, revision) {
            return Ok(id);
        }
        let id = self.load_internal(name, revision)?;

        for deviation_module in self.saved_deviations.clone() {
            if deviation_module == name
                || self.modules.find_id(&deviation_module, None).is_some()
            {
                continue;
            }
            if let Err(err) = self.load_internal(&deviation_module, None) {
                tracing::warn!(
                    "saved deviation module '{}' failed to load: {}",
                    deviation_module,
                    err
                );
            }
        }
        Ok(id)
    }

    pub(crate) fn load_internal(&mut self, name: &str, revision: Option<&str>) -> Result<ModuleId> {
        if self.load_stack.iter().any(|loading| loading == name) {
            return Err(Error::DependencyCycle { name: name.into() });
        }
        let source = self.sources.locate(&self.search_paths, name, revision)?;
        let id = self.parse_source(&source, Some(name), revision)?;

        self.load_stack.push(name.into());
        let outcome = self.link_pipeline(id);
        self.load_stack.pop();
        outcome?;
        Ok(id)
    }

    /// Parse one located source into a parked module.
    pub(crate) fn parse_source(
        &mut self,
        source: &ModuleSource,
        expect_name: Option<&str>,
        expect_revision: Option<&str>,
    ) -> Result<ModuleId> {
        let mut scanner = Scanner::new(&source.text);
        let stmts = parse_statements(&mut scanner)?;
        let mut module = build_module(&stmts, source.filespec.as_deref(), &mut self.diags)?;
        module.advance(LifecycleState::Parsing);
        self.scan_line_lengths(&source.text, &mut module);
        module.advance(LifecycleState::Parsed);

        if let Some(expected) = expect_name {
            if module.name != expected {
                let location = module.location(1, 1);
                if self.diags.emit(
                    location,
                    ErrorCode::InvalidValue,
                    format!("source declares module '{}', expected '{expected}'", module.name),
                ) {
                    module.inc_errors();
                }
            }
        }
        if let Some(requested) = expect_revision {
            if module.revision.as_deref() != Some(requested) {
                return Err(Error::WrongVersion {
                    name: module.name.clone(),
                    requested: requested.into(),
                });
            }
        }
        Ok(self.modules.park(module))
    }

    fn scan_line_lengths(&mut self, text: &str, module: &mut Module) {
        for (index, line) in text.lines().enumerate() {
            if line.chars().count() > DEF_WARN_LINELEN {
                let location = module.location(index as u32 + 1, 1);
                if self.diags.emit(
                    location,
                    ErrorCode::LinelenExceeded,
                    format!("line exceeds {DEF_WARN_LINELEN} characters"),
                ) {
                    module.inc_warnings();
                }
            }
        }
    }

    /// Post-parse pipeline: namespace, imports, includes, resolution,
    /// pruning, registration.
    fn link_pipeline(&mut self, id: ModuleId) -> Result<()> {
        self.assign_namespace(id)?;
        self.link_imports(id)?;
        self.link_includes(id)?;

        self.advance_state(id, LifecycleState::Resolving);
        self.resolve_parked(id)?;
        self.advance_state(id, LifecycleState::Resolved);

        if let Some(module) = self.modules.get_mut(id) {
            crate::link::prune_module(module);
        }

        let (name, errors, kind) = {
            let module = self
                .modules
                .get(id)
                .ok_or_else(|| Error::Internal("vacant module slot after resolve".into()))?;
            (module.name.clone(), module.errors, module.kind)
        };

        if kind == ModuleKind::Submodule {
            self.modules.register_submodule(id)?;
            self.advance_state(id, LifecycleState::Registered);
            self.advance_state(id, LifecycleState::Frozen);
            return Ok(());
        }

        if errors > 0 {
            if !self.accept_imperfect {
                return Err(Error::OperationFailed(format!(
                    "module '{name}' has {errors} errors"
                )));
            }
            let location = self
                .modules
                .get(id)
                .map(|m| m.location(0, 0))
                .unwrap_or_else(|| SourceLocation::at(0, 0));
            if self.diags.emit(
                location,
                ErrorCode::ImperfectModule,
                format!("adding module '{name}' to registry with {errors} errors"),
            ) {
                if let Some(module) = self.modules.get_mut(id) {
                    module.inc_warnings();
                }
            }
        }

        let registered = self.modules.register(id)?;
        self.advance_state(registered, LifecycleState::Registered);
        if let Some(callback) = &self.load_callback {
            if let Some(module) = self.modules.get(registered) {
                callback(module);
            }
        }
        self.advance_state(registered, LifecycleState::Frozen);
        Ok(())
    }

    pub(crate) fn advance_state(&mut self, id: ModuleId, state: LifecycleState) {
        if let Some(module) = self.modules.get_mut(id) {
            module.advance(state);
        }
    }

    /// Register the module's namespace, remapping the XML prefix on a
    /// collision with another module's prefix.
    fn assign_namespace(&mut self, id: ModuleId) -> Result<()> {
        let (kind, name, prefix, uri, location) = {
            let module = self
                .modules
                .get(id)
                .ok_or_else(|| Error::Internal("vacant module slot".into()))?;
            (
                module.kind,
                module.name.clone(),
                module.prefix.clone(),
                module.namespace_uri.clone(),
                module.location(1, 1),
            )
        };
        if kind == ModuleKind::Submodule {
            return Ok(());
        }
        let Some(uri) = uri else {
            // already reported as data-missing during build
            return Ok(());
        };

        let mut xml_prefix = prefix.clone();
        if let Some(existing) = self.namespaces.find_by_prefix(&prefix) {
            let owner = self
                .namespaces
                .record(existing)
                .and_then(|r| r.owner_module.clone());
            if owner.as_deref() != Some(name.as_str()) {
                if self.diags.emit(
                    location.clone(),
                    ErrorCode::DuplicatePrefix,
                    format!(
                        "prefix '{}' already in use by module '{}'",
                        prefix,
                        owner.as_deref().unwrap_or("--")
                    ),
                ) {
                    if let Some(module) = self.modules.get_mut(id) {
                        module.inc_warnings();
                    }
                }
                xml_prefix = self.namespaces.remap_prefix(&prefix)?;
            }
        }

        let nsid = match self.namespaces.register(&uri, &xml_prefix, Some(&name)) {
            Ok(nsid) => nsid,
            Err(err) => {
                if self
                    .diags
                    .emit(location, err.code(), err.to_string())
                {
                    if let Some(module) = self.modules.get_mut(id) {
                        module.inc_errors();
                    }
                }
                return Err(err);
            }
        };

        if let Some(module) = self.modules.get_mut(id) {
            module.xml_prefix = xml_prefix;
            module.namespace_id = nsid;
            for node in &mut module.nodes {
                node.set_namespace_recursive(nsid);
            }
            for grouping in &mut module.groupings {
                for child in &mut grouping.children {
                    child.set_namespace_recursive(nsid);
                }
            }
        }
        Ok(())
    }

    // ============================================================
    // Unload and teardown
    // ============================================================

    /// Enter batch-teardown mode: unloaded modules are quarantined until
    /// [`drain_dead_modules`](Self::drain_dead_modules) runs.
    pub fn enable_batch_teardown(&mut self) {
        if self.dead_modules.is_none() {
            self.dead_modules = Some(Vec::new());
        }
    }

    /// Drain the quarantine queue and leave batch mode. Returns how many
    /// modules were released.
    pub fn drain_dead_modules(&mut self) -> usize {
        self.dead_modules.take().map_or(0, |dead| dead.len())
    }

    /// Remove a module from the registry. In batch-teardown mode the
    /// module is quarantined instead of dropped.
    pub fn unload(&mut self, name: &str, revision: Option<&str>) -> Result<()> {
        let id = self
            .modules
            .find_id(name, revision)
            .ok_or_else(|| Error::ModuleNotFound { name: name.into() })?;
        let mut module = self
            .modules
            .unload(id)
            .ok_or_else(|| Error::Internal("vacant module slot on unload".into()))?;
        module.advance(LifecycleState::Unloaded);
        if let Some(dead) = &mut self.dead_modules {
            dead.push(module);
        }
        Ok(())
    }

    /// Tear the whole context down: every module is unloaded in reverse
    /// load order. The context stays usable afterwards.
    pub fn cleanup(&mut self) {
        self.load_callback = None;
        let ids: Vec<ModuleId> = self.modules.all_ids().collect();
        for id in ids.into_iter().rev() {
            if let Some(mut module) = self.modules.unload(id) {
                module.advance(LifecycleState::Unloaded);
                if let Some(dead) = &mut self.dead_modules {
                    dead.push(module);
                }
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::MapSourceProvider;

    fn ctx_with(sources: MapSourceProvider) -> Context {
        Context::with_provider(Box::new(sources))
    }

    #[test]
    fn test_load_simple_module() {
        let sources = MapSourceProvider::new()
            .with("a", "module a { namespace urn:x:a; prefix a; leaf foo { type uint32; } }");
        let mut ctx = ctx_with(sources);
        let id = ctx.load("a", None).unwrap();
        let module = ctx.module(id).unwrap();
        assert_eq!(module.state, LifecycleState::Frozen);
        assert!(module.default_revision);
        assert_eq!(module.errors, 0);
    }

    #[test]
    fn test_load_missing_module() {
        let mut ctx = ctx_with(MapSourceProvider::new());
        assert!(matches!(
            ctx.load("ghost", None),
            Err(Error::ModuleNotFound { .. })
        ));
    }

    #[test]
    fn test_load_callback_fires() {
        use std::cell::Cell;
        use std::rc::Rc;

        let sources =
            MapSourceProvider::new().with("a", "module a { namespace urn:x:a; prefix a; }");
        let mut ctx = ctx_with(sources);
        let fired = Rc::new(Cell::new(0));
        let seen = fired.clone();
        ctx.set_load_callback(Box::new(move |module| {
            assert_eq!(module.name, "a");
            seen.set(seen.get() + 1);
        }));
        ctx.load("a", None).unwrap();
        assert_eq!(fired.get(), 1);
        // second load is a cache hit; no second callback
        ctx.load("a", None).unwrap();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_wrong_revision_request() {
        let sources = MapSourceProvider::new().with(
            "a",
            "module a { namespace urn:x:a; prefix a; revision 2024-01-01; }",
        );
        let mut ctx = ctx_with(sources);
        assert!(matches!(
            ctx.load("a", Some("2020-05-05")),
            Err(Error::WrongVersion { .. })
        ));
        ctx.load("a", Some("2024-01-01")).unwrap();
    }

    #[test]
    fn test_import_cycle_detected() {
        let sources = MapSourceProvider::new()
            .with(
                "a",
                "module a { namespace urn:x:a; prefix a; import b { prefix b; } }",
            )
            .with(
                "b",
                "module b { namespace urn:x:b; prefix b; import a { prefix a; } }",
            );
        let mut ctx = ctx_with(sources);
        // the cycle is reported on the importing module, not fatal to the load
        let id = ctx.load("a", None).unwrap();
        assert!(ctx.module(id).unwrap().errors > 0);
    }

    #[test]
    fn test_unload_and_batch_teardown() {
        let sources =
            MapSourceProvider::new().with("a", "module a { namespace urn:x:a; prefix a; }");
        let mut ctx = ctx_with(sources);
        ctx.load("a", None).unwrap();
        ctx.enable_batch_teardown();
        ctx.unload("a", None).unwrap();
        assert!(ctx.module_registry().find("a", None).is_none());
        assert_eq!(ctx.drain_dead_modules(), 1);
        assert_eq!(ctx.drain_dead_modules(), 0);
    }
}
