//! Import and include linking.
//!
//! Imports bind to registered modules, loading them on demand. Includes
//! pull submodules in, validate `belongs-to`, merge the submodule's data
//! tree into the including module, and build the transitive include
//! closure. Include back-edges are fatal; import failures are recorded on
//! the importing module and the load continues.

use smol_str::SmolStr;

use crate::base::ModuleId;
use crate::diag::{Error, ErrorCode, Result};
use crate::Context;

impl Context {
    /// Bind every import of a parked module, loading absent modules
    /// through the source provider.
    pub(crate) fn link_imports(&mut self, id: ModuleId) -> Result<()> {
        let imports: Vec<(usize, SmolStr, Option<SmolStr>)> = self
            .modules
            .get(id)
            .ok_or_else(|| Error::Internal("vacant module slot in link_imports".into()))?
            .imports
            .iter()
            .enumerate()
            .map(|(index, imp)| (index, imp.module_name.clone(), imp.revision.clone()))
            .collect();

        for (index, module_name, revision) in imports {
            let found = match self.modules.find_id(&module_name, revision.as_deref()) {
                Some(found) => Some(found),
                None => match self.load_internal(&module_name, revision.as_deref()) {
                    Ok(found) => Some(found),
                    Err(err) => {
                        // surfaced on the importing module, never dropped
                        let location = self
                            .modules
                            .get(id)
                            .map(|m| m.imports[index].location.clone())
                            .unwrap_or_default();
                        let code = err.code();
                        if self.diags.emit(
                            location,
                            code,
                            format!("import of '{module_name}' failed: {err}"),
                        ) {
                            if let Some(module) = self.modules.get_mut(id) {
                                module.inc_errors();
                            }
                        }
                        None
                    }
                },
            };
            if let Some(module) = self.modules.get_mut(id) {
                let import = &mut module.imports[index];
                import.resolved = found;
                import.failed = found.is_none();
            }
        }
        Ok(())
    }

    /// Bind every include, merging submodule content upward. Returns an
    /// error only for include cycles, which abort the load.
    pub(crate) fn link_includes(&mut self, id: ModuleId) -> Result<()> {
        let (includes, expected_parent): (Vec<(usize, SmolStr, Option<SmolStr>)>, SmolStr) = {
            let module = self
                .modules
                .get(id)
                .ok_or_else(|| Error::Internal("vacant module slot in link_includes".into()))?;
            (
                module
                    .includes
                    .iter()
                    .enumerate()
                    .map(|(index, inc)| {
                        (index, inc.submodule_name.clone(), inc.revision.clone())
                    })
                    .collect(),
                // submodules of a submodule still belong to the top module
                module.belongs_to.clone().unwrap_or_else(|| module.name.clone()),
            )
        };

        for (index, submodule_name, revision) in includes {
            let found = match self.modules.find_submodule_id(&submodule_name) {
                Some(found) => Some(found),
                None => match self.load_internal(&submodule_name, revision.as_deref()) {
                    Ok(found) => Some(found),
                    Err(err @ Error::DependencyCycle { .. }) => return Err(err),
                    Err(err) => {
                        let location = self
                            .modules
                            .get(id)
                            .map(|m| m.includes[index].location.clone())
                            .unwrap_or_default();
                        let code = err.code();
                        if self.diags.emit(
                            location,
                            code,
                            format!("include of '{submodule_name}' failed: {err}"),
                        ) {
                            if let Some(module) = self.modules.get_mut(id) {
                                module.inc_errors();
                            }
                        }
                        None
                    }
                },
            };

            let accepted = match found {
                None => None,
                Some(sid) => {
                    let belongs_to = self
                        .modules
                        .get(sid)
                        .and_then(|sub| sub.belongs_to.clone());
                    if belongs_to.as_deref() == Some(expected_parent.as_str()) {
                        Some(sid)
                    } else {
                        let location = self
                            .modules
                            .get(id)
                            .map(|m| m.includes[index].location.clone())
                            .unwrap_or_default();
                        if self.diags.emit(
                            location,
                            ErrorCode::WrongBelongsTo,
                            format!(
                                "submodule '{submodule_name}' belongs to '{}', not '{expected_parent}'",
                                belongs_to.as_deref().unwrap_or("--")
                            ),
                        ) {
                            if let Some(module) = self.modules.get_mut(id) {
                                module.inc_errors();
                            }
                        }
                        None
                    }
                }
            };

            if let Some(sid) = accepted {
                self.merge_submodule(id, sid, &submodule_name);
            }
            if let Some(module) = self.modules.get_mut(id) {
                module.includes[index].resolved = accepted;
            }
        }
        Ok(())
    }

    /// Move a submodule's data tree, augments, and deviations into the
    /// including module, and extend the include closure.
    fn merge_submodule(&mut self, id: ModuleId, sid: ModuleId, submodule_name: &str) {
        let Some(sub) = self.modules.get_mut(sid) else {
            return;
        };
        let mut nodes = std::mem::take(&mut sub.nodes);
        let deviations = std::mem::take(&mut sub.deviations);
        let sub_includes = sub.all_includes.clone();

        let Some(module) = self.modules.get_mut(id) else {
            return;
        };
        if !module.namespace_id.is_none() {
            for node in &mut nodes {
                node.set_namespace_recursive(module.namespace_id);
            }
        }
        module.nodes.extend(nodes);
        module.deviations.extend(deviations);

        if !module.all_includes.iter().any(|n| n == submodule_name) {
            module.all_includes.push(submodule_name.into());
        }
        for nested in sub_includes {
            if !module.all_includes.iter().any(|n| n == &nested) {
                module.all_includes.push(nested);
            }
        }
    }
}
