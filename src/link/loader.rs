//! Module source lookup.
//!
//! The loader proper lives on [`crate::Context`]; this file holds the
//! collaborator contract it calls out to: something that can turn
//! `(module-name, revision?)` into source text. The filesystem provider
//! is the production implementation; the map provider backs tests and
//! embedded use.

use std::fs;
use std::path::PathBuf;

use smol_str::SmolStr;

use crate::base::constants::{REVISION_SEPARATOR, YANG_SUFFIX};
use crate::diag::{Error, Result};

/// Search locations for module sources, recorded by the context and
/// interpreted only here.
#[derive(Debug, Clone, Default)]
pub struct SearchPaths {
    pub home_dir: Option<String>,
    pub module_paths: Vec<String>,
    pub install_root: Option<String>,
}

impl SearchPaths {
    /// Directories in search order: explicit module paths, then the home
    /// dir, then the install root.
    pub fn candidate_dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.module_paths.iter().map(PathBuf::from).collect();
        if let Some(home) = &self.home_dir {
            dirs.push(PathBuf::from(home));
        }
        if let Some(root) = &self.install_root {
            dirs.push(PathBuf::from(root));
        }
        dirs
    }
}

/// A located module source.
#[derive(Debug, Clone)]
pub struct ModuleSource {
    pub text: String,
    pub filespec: Option<SmolStr>,
}

/// The file-loader collaborator contract.
pub trait SourceProvider {
    /// Locate the source for `(name, revision?)`. A plain miss is
    /// `module-not-found`; an unreadable file is `source-unavailable`.
    fn locate(
        &self,
        paths: &SearchPaths,
        name: &str,
        revision: Option<&str>,
    ) -> Result<ModuleSource>;
}

/// Filesystem provider: looks for `name@revision.yang`, then `name.yang`,
/// in each search directory.
#[derive(Debug, Default)]
pub struct FsSourceProvider;

impl FsSourceProvider {
    fn read(path: PathBuf, name: &str) -> Result<ModuleSource> {
        match fs::read_to_string(&path) {
            Ok(text) => Ok(ModuleSource {
                text,
                filespec: Some(SmolStr::new(path.to_string_lossy())),
            }),
            Err(err) => Err(Error::SourceUnavailable {
                name: name.into(),
                detail: err.to_string(),
            }),
        }
    }
}

impl SourceProvider for FsSourceProvider {
    fn locate(
        &self,
        paths: &SearchPaths,
        name: &str,
        revision: Option<&str>,
    ) -> Result<ModuleSource> {
        let mut filenames = Vec::new();
        if let Some(rev) = revision {
            filenames.push(format!("{name}{REVISION_SEPARATOR}{rev}.{YANG_SUFFIX}"));
        }
        filenames.push(format!("{name}.{YANG_SUFFIX}"));

        for dir in paths.candidate_dirs() {
            for filename in &filenames {
                let path = dir.join(filename);
                if path.is_file() {
                    tracing::debug!("loading module '{}' from {}", name, path.display());
                    return Self::read(path, name);
                }
            }
        }
        Err(Error::ModuleNotFound { name: name.into() })
    }
}

/// In-memory provider keyed by `(name, revision?)`.
#[derive(Debug, Default)]
pub struct MapSourceProvider {
    entries: Vec<(SmolStr, Option<SmolStr>, String)>,
}

impl MapSourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, revision: Option<&str>, text: &str) {
        self.entries
            .push((name.into(), revision.map(SmolStr::from), text.to_string()));
    }

    /// Builder-style insert for test setup.
    pub fn with(mut self, name: &str, text: &str) -> Self {
        self.insert(name, None, text);
        self
    }
}

impl SourceProvider for MapSourceProvider {
    fn locate(
        &self,
        _paths: &SearchPaths,
        name: &str,
        revision: Option<&str>,
    ) -> Result<ModuleSource> {
        // exact revision first, then the unrevisioned entry, mirroring
        // the filesystem provider's name@rev.yang -> name.yang fallback
        let hit = match revision {
            Some(rev) => self
                .entries
                .iter()
                .find(|(n, r, _)| n == name && r.as_deref() == Some(rev))
                .or_else(|| self.entries.iter().find(|(n, r, _)| n == name && r.is_none())),
            None => self.entries.iter().find(|(n, _, _)| n == name),
        };
        match hit {
            Some((n, r, text)) => Ok(ModuleSource {
                text: text.clone(),
                filespec: Some(match r {
                    Some(rev) => format!("{n}{REVISION_SEPARATOR}{rev}.{YANG_SUFFIX}").into(),
                    None => format!("{n}.{YANG_SUFFIX}").into(),
                }),
            }),
            None => Err(Error::ModuleNotFound { name: name.into() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_map_provider_revision_match() {
        let mut provider = MapSourceProvider::new();
        provider.insert("a", Some("2024-01-01"), "module a;");
        let paths = SearchPaths::default();
        assert!(provider.locate(&paths, "a", Some("2024-01-01")).is_ok());
        assert!(matches!(
            provider.locate(&paths, "a", Some("2023-01-01")),
            Err(Error::ModuleNotFound { .. })
        ));
        assert!(provider.locate(&paths, "a", None).is_ok());
    }

    #[test]
    fn test_fs_provider_revision_filename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a@2024-01-01.yang");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "module a {{ namespace urn:x:a; prefix a; }}").unwrap();

        let paths = SearchPaths {
            module_paths: vec![dir.path().to_string_lossy().to_string()],
            ..Default::default()
        };
        let provider = FsSourceProvider;
        let source = provider.locate(&paths, "a", Some("2024-01-01")).unwrap();
        assert!(source.text.contains("module a"));
        assert!(provider.locate(&paths, "a", None).is_err());
    }

    #[test]
    fn test_search_dir_order() {
        let paths = SearchPaths {
            home_dir: Some("/home/user/.yang".into()),
            module_paths: vec!["/opt/modules".into()],
            install_root: Some("/usr/share/yang".into()),
        };
        let dirs = paths.candidate_dirs();
        assert_eq!(dirs[0], PathBuf::from("/opt/modules"));
        assert_eq!(dirs[1], PathBuf::from("/home/user/.yang"));
        assert_eq!(dirs[2], PathBuf::from("/usr/share/yang"));
    }
}
