//! The module registry.
//!
//! Modules live in an arena of slots addressed by [`ModuleId`]. Two
//! lookup scopes are stacked: an optional session scope searched first,
//! then the current (global) scope. The session scope lets a protocol
//! session shadow the global module set without mutating it.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::{ModuleId, NamespaceId};
use crate::diag::{Error, Result};
use crate::schema::{compare_revisions, Module};

#[derive(Debug, Default)]
pub struct ModuleRegistry {
    /// Arena; unloading leaves a vacant slot so ids stay stable.
    slots: Vec<Option<Module>>,
    /// Current scope, kept grouped by name ascending with the newest
    /// revision first within a name.
    current: Vec<ModuleId>,
    /// Session scope, searched before `current` when set.
    session: Option<Vec<ModuleId>>,
    /// Name index over the current scope, newest revision first.
    by_name: FxHashMap<SmolStr, Vec<ModuleId>>,
    /// Submodules, kept out of the module scopes and found only by name.
    submodules: FxHashMap<SmolStr, ModuleId>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================
    // Arena access
    // ============================================================

    pub fn get(&self, id: ModuleId) -> Option<&Module> {
        self.slots.get(id.index())?.as_ref()
    }

    pub fn get_mut(&mut self, id: ModuleId) -> Option<&mut Module> {
        self.slots.get_mut(id.index())?.as_mut()
    }

    /// Take a module out of its slot for a resolution pass that needs the
    /// rest of the registry immutable. Must be paired with
    /// [`put_back`](Self::put_back).
    pub fn take(&mut self, id: ModuleId) -> Option<Module> {
        self.slots.get_mut(id.index())?.take()
    }

    pub fn put_back(&mut self, id: ModuleId, module: Module) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            *slot = Some(module);
        }
    }

    /// Park a module in the arena without entering any scope. The loader
    /// uses this for modules still moving through the pipeline.
    pub fn park(&mut self, module: Module) -> ModuleId {
        let id = ModuleId::new(self.slots.len());
        self.slots.push(Some(module));
        id
    }

    // ============================================================
    // Registration
    // ============================================================

    /// Enter a parked module into the current scope.
    ///
    /// An identical `(name, revision)` from the same source is a no-op
    /// (logged at info); from a different source it is a
    /// `module-conflict`. After insertion exactly one revision of the name
    /// holds the default flag: the newest.
    pub fn register(&mut self, id: ModuleId) -> Result<ModuleId> {
        let (name, revision, filespec) = {
            let module = self
                .get(id)
                .ok_or_else(|| Error::Internal("register of vacant module slot".into()))?;
            (
                module.name.clone(),
                module.revision.clone(),
                module.source_filespec.clone(),
            )
        };

        if let Some(existing) = self.find_exact_id(&name, revision.as_deref()) {
            if existing != id {
                let same_source =
                    self.get(existing).and_then(|m| m.source_filespec.clone()) == filespec;
                if same_source {
                    tracing::info!(
                        "module '{}' revision {:?} already registered; ignoring duplicate load",
                        name,
                        revision
                    );
                    return Ok(existing);
                }
                return Err(Error::ModuleConflict { name, revision });
            }
            return Ok(id);
        }

        // grouped by name ascending, newest revision first within a name
        let insert_at = self.current.partition_point(|&other| {
            match self.get(other) {
                None => false,
                Some(m) => match m.name.as_str().cmp(name.as_str()) {
                    std::cmp::Ordering::Less => true,
                    std::cmp::Ordering::Greater => false,
                    std::cmp::Ordering::Equal => {
                        compare_revisions(m.revision.as_deref(), revision.as_deref()).is_gt()
                    }
                },
            }
        });
        self.current.insert(insert_at, id);

        let slots = &self.slots;
        let ids = self.by_name.entry(name.clone()).or_default();
        let pos = ids.partition_point(|&other| {
            slots
                .get(other.index())
                .and_then(|slot| slot.as_ref())
                .is_some_and(|m| {
                    compare_revisions(m.revision.as_deref(), revision.as_deref()).is_gt()
                })
        });
        ids.insert(pos, id);

        if let Some(module) = self.get_mut(id) {
            module.registered = true;
        }
        self.refresh_default(&name);
        tracing::debug!("registered module '{}' revision {:?}", name, revision);
        Ok(id)
    }

    /// Re-establish the unique-default invariant for a name: the newest
    /// registered revision holds the flag.
    fn refresh_default(&mut self, name: &str) {
        let Some(ids) = self.by_name.get(name).cloned() else {
            return;
        };
        for (index, id) in ids.iter().enumerate() {
            if let Some(module) = self.get_mut(*id) {
                module.default_revision = index == 0;
            }
        }
    }

    /// Record a parked submodule so later includes find it.
    pub fn register_submodule(&mut self, id: ModuleId) -> Result<ModuleId> {
        let name = self
            .get(id)
            .ok_or_else(|| Error::Internal("register of vacant submodule slot".into()))?
            .name
            .clone();
        match self.submodules.get(&name) {
            Some(&existing) => Ok(existing),
            None => {
                self.submodules.insert(name, id);
                Ok(id)
            }
        }
    }

    pub fn find_submodule_id(&self, name: &str) -> Option<ModuleId> {
        self.submodules.get(name).copied()
    }

    pub fn find_submodule(&self, name: &str) -> Option<&Module> {
        self.find_submodule_id(name).and_then(|id| self.get(id))
    }

    /// Drop a module from every scope and vacate its slot.
    pub fn unload(&mut self, id: ModuleId) -> Option<Module> {
        let module = self.slots.get_mut(id.index())?.take()?;
        self.current.retain(|&other| other != id);
        if let Some(session) = &mut self.session {
            session.retain(|&other| other != id);
        }
        if let Some(ids) = self.by_name.get_mut(&module.name) {
            ids.retain(|&other| other != id);
            if ids.is_empty() {
                self.by_name.remove(&module.name);
            }
        }
        self.submodules.retain(|_, other| *other != id);
        self.refresh_default(&module.name);
        Some(module)
    }

    // ============================================================
    // Lookup
    // ============================================================

    fn find_exact_id(&self, name: &str, revision: Option<&str>) -> Option<ModuleId> {
        let ids = self.by_name.get(name)?;
        ids.iter()
            .copied()
            .find(|&id| self.get(id).map(|m| m.revision.as_deref()) == Some(revision))
    }

    fn find_in_scope(
        &self,
        scope: &[ModuleId],
        name: &str,
        revision: Option<&str>,
    ) -> Option<ModuleId> {
        match revision {
            None => scope.iter().copied().find(|&id| {
                self.get(id)
                    .is_some_and(|m| m.name == name && m.default_revision)
            }),
            Some(rev) => scope.iter().copied().find(|&id| {
                self.get(id)
                    .is_some_and(|m| m.name == name && m.revision.as_deref() == Some(rev))
            }),
        }
    }

    /// Find a module: session scope first, then current. With no revision
    /// the default-revision entry wins; with one, only an exact match.
    pub fn find_id(&self, name: &str, revision: Option<&str>) -> Option<ModuleId> {
        if let Some(session) = &self.session {
            if let Some(id) = self.find_in_scope(session, name, revision) {
                return Some(id);
            }
        }
        // the name index covers the current scope and avoids a scan
        match revision {
            None => self
                .by_name
                .get(name)
                .and_then(|ids| ids.first())
                .copied(),
            Some(rev) => self.find_exact_id(name, Some(rev)),
        }
    }

    pub fn find(&self, name: &str, revision: Option<&str>) -> Option<&Module> {
        self.find_id(name, revision).and_then(|id| self.get(id))
    }

    /// O(n) search of the current scope by namespace id.
    pub fn find_by_nsid(&self, nsid: NamespaceId) -> Option<&Module> {
        self.current
            .iter()
            .filter_map(|&id| self.get(id))
            .find(|m| m.namespace_id == nsid)
    }

    /// Modules of the current scope whose namespace URI matches.
    pub fn find_by_namespace_uri(&self, uri: &str) -> Option<&Module> {
        self.current
            .iter()
            .filter_map(|&id| self.get(id))
            .find(|m| m.namespace_uri.as_deref() == Some(uri))
    }

    /// Default-revision modules in canonical scope order. Session scope
    /// entries come first when a session is set.
    pub fn iter_default(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        let session = self.session.as_deref().unwrap_or(&[]);
        session
            .iter()
            .chain(self.current.iter())
            .copied()
            .filter_map(|id| self.get(id).map(|m| (id, m)))
            .filter(|(_, m)| m.default_revision)
    }

    /// Default-revision modules of the current scope only.
    pub fn iter_default_current(&self) -> impl Iterator<Item = (ModuleId, &Module)> {
        self.current
            .iter()
            .copied()
            .filter_map(|id| self.get(id).map(|m| (id, m)))
            .filter(|(_, m)| m.default_revision)
    }

    /// Count of registered revisions sharing a name.
    pub fn revision_count(&self, name: &str) -> usize {
        self.by_name.get(name).map_or(0, Vec::len)
    }

    /// Parent module of a submodule, by its `belongs-to` name.
    pub fn parent_of(&self, submodule: &Module) -> Option<&Module> {
        self.find(submodule.belongs_to.as_deref()?, None)
    }

    // ============================================================
    // Scope swapping
    // ============================================================

    /// Swap the authoritative current scope, returning the old one so a
    /// tool juggling several module trees can restore it. Callers are
    /// responsible for handing back ids that came from this registry.
    pub fn swap_current_scope(&mut self, ids: Vec<ModuleId>) -> Vec<ModuleId> {
        let old = std::mem::replace(&mut self.current, ids);

        let mut grouped: FxHashMap<SmolStr, Vec<(Option<SmolStr>, ModuleId)>> =
            FxHashMap::default();
        for &id in &self.current {
            if let Some(module) = self.get(id) {
                grouped
                    .entry(module.name.clone())
                    .or_default()
                    .push((module.revision.clone(), id));
            }
        }

        self.by_name.clear();
        let names: Vec<SmolStr> = grouped.keys().cloned().collect();
        for (name, mut entries) in grouped {
            entries.sort_by(|a, b| compare_revisions(b.0.as_deref(), a.0.as_deref()));
            self.by_name
                .insert(name, entries.into_iter().map(|(_, id)| id).collect());
        }
        for name in names {
            self.refresh_default(&name);
        }
        old
    }

    /// Install a session scope searched before the current scope.
    /// Single-threaded contract: the swap is atomic because all access is
    /// through `&mut self`.
    pub fn set_session_scope(&mut self, ids: Vec<ModuleId>) {
        self.session = Some(ids);
    }

    pub fn clear_session_scope(&mut self) {
        self.session = None;
    }

    pub fn has_session_scope(&self) -> bool {
        self.session.is_some()
    }

    /// Ids of every occupied slot, registered or parked.
    pub fn all_ids(&self) -> impl Iterator<Item = ModuleId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| ModuleId::new(index))
    }

    /// Registered ids of the current scope in canonical order.
    pub fn current_ids(&self) -> &[ModuleId] {
        &self.current
    }
}
