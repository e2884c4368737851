//! The namespace registry.
//!
//! A bijection between URI strings, short prefixes, and small integer
//! namespace ids. Well-known ids are reserved at construction so XML
//! machinery can refer to them without lookups.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::constants::{
    INVALID_URI, MAX_PREFIX_SUFFIX, NETCONF_URI, WILDCARD_URI, WITH_DEFAULTS_URI, XMLNS_URI,
    XML_URI, XSD_URI, XSI_URI, YANG_URI, YIN_URI,
};
use crate::base::NamespaceId;
use crate::diag::{Error, Result};

/// One registered namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRecord {
    pub id: NamespaceId,
    pub uri: SmolStr,
    pub prefix: SmolStr,
    /// Name of the owning module; `None` for the reserved entries and
    /// temporary registrations, back-filled when the real owner loads.
    pub owner_module: Option<SmolStr>,
}

/// Ids reserved at init.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WellKnownIds {
    pub invalid: NamespaceId,
    pub wildcard: NamespaceId,
    pub netconf: NamespaceId,
    pub yang: NamespaceId,
    pub yin: NamespaceId,
    pub xmlns: NamespaceId,
    pub xsd: NamespaceId,
    pub xsi: NamespaceId,
    pub xml: NamespaceId,
    pub with_defaults: NamespaceId,
}

/// URI <-> prefix <-> id registry.
#[derive(Debug)]
pub struct NamespaceRegistry {
    /// Records keyed by URI. Insertion order doubles as id allocation:
    /// id N is the record at map index N-1.
    records: IndexMap<SmolStr, NamespaceRecord>,
    by_prefix: FxHashMap<SmolStr, NamespaceId>,
    well_known: WellKnownIds,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            records: IndexMap::new(),
            by_prefix: FxHashMap::default(),
            well_known: WellKnownIds {
                invalid: NamespaceId::NONE,
                wildcard: NamespaceId::NONE,
                netconf: NamespaceId::NONE,
                yang: NamespaceId::NONE,
                yin: NamespaceId::NONE,
                xmlns: NamespaceId::NONE,
                xsd: NamespaceId::NONE,
                xsi: NamespaceId::NONE,
                xml: NamespaceId::NONE,
                with_defaults: NamespaceId::NONE,
            },
        };
        // reserved entries; allocation cannot fail on an empty registry
        registry.well_known = WellKnownIds {
            invalid: registry.reserve(INVALID_URI, "inv"),
            wildcard: registry.reserve(WILDCARD_URI, "wc"),
            netconf: registry.reserve(NETCONF_URI, "nc"),
            yang: registry.reserve(YANG_URI, "yang"),
            yin: registry.reserve(YIN_URI, "yin"),
            xmlns: registry.reserve(XMLNS_URI, "xmlns"),
            xsd: registry.reserve(XSD_URI, "xs"),
            xsi: registry.reserve(XSI_URI, "xsi"),
            xml: registry.reserve(XML_URI, "xml"),
            with_defaults: registry.reserve(WITH_DEFAULTS_URI, "wd"),
        };
        registry
    }

    fn reserve(&mut self, uri: &str, prefix: &str) -> NamespaceId {
        let id = NamespaceId::new(self.records.len() as u32 + 1);
        self.records.insert(
            uri.into(),
            NamespaceRecord {
                id,
                uri: uri.into(),
                prefix: prefix.into(),
                owner_module: None,
            },
        );
        self.by_prefix.insert(prefix.into(), id);
        id
    }

    pub fn well_known(&self) -> &WellKnownIds {
        &self.well_known
    }

    /// Register a URI under a prefix, returning its id.
    ///
    /// A URI that is already present returns the existing id. If the new
    /// registration names an owner, the existing record has none, and the
    /// URIs match, the owner is back-filled; a different existing owner is
    /// a `duplicate-namespace` error.
    pub fn register(
        &mut self,
        uri: &str,
        prefix: &str,
        owner_module: Option<&str>,
    ) -> Result<NamespaceId> {
        if let Some(record) = self.records.get_mut(uri) {
            match (&record.owner_module, owner_module) {
                (None, Some(owner)) => {
                    record.owner_module = Some(owner.into());
                    Ok(record.id)
                }
                (Some(existing), Some(owner)) if existing != owner => {
                    Err(Error::DuplicateNamespace {
                        uri: uri.into(),
                        owner: existing.clone(),
                    })
                }
                _ => Ok(record.id),
            }
        } else {
            let id = NamespaceId::new(self.records.len() as u32 + 1);
            self.records.insert(
                uri.into(),
                NamespaceRecord {
                    id,
                    uri: uri.into(),
                    prefix: prefix.into(),
                    owner_module: owner_module.map(SmolStr::from),
                },
            );
            self.by_prefix.entry(prefix.into()).or_insert(id);
            tracing::debug!("registered namespace {} -> id {}", uri, id.raw());
            Ok(id)
        }
    }

    pub fn find_by_uri(&self, uri: &str) -> Option<NamespaceId> {
        self.records.get(uri).map(|r| r.id)
    }

    pub fn find_by_prefix(&self, prefix: &str) -> Option<NamespaceId> {
        self.by_prefix.get(prefix).copied()
    }

    pub fn find_by_module_name(&self, name: &str) -> Option<NamespaceId> {
        self.records
            .values()
            .find(|r| r.owner_module.as_deref() == Some(name))
            .map(|r| r.id)
    }

    pub fn record(&self, id: NamespaceId) -> Option<&NamespaceRecord> {
        if id.is_none() {
            return None;
        }
        self.records
            .get_index(id.raw() as usize - 1)
            .map(|(_, record)| record)
    }

    /// Records in id order (the registration order).
    pub fn iter(&self) -> impl Iterator<Item = &NamespaceRecord> {
        self.records.values()
    }

    pub fn uri(&self, id: NamespaceId) -> Option<&str> {
        self.record(id).map(|r| r.uri.as_str())
    }

    pub fn prefix(&self, id: NamespaceId) -> Option<&str> {
        self.record(id).map(|r| r.prefix.as_str())
    }

    /// Number of registered namespaces, reserved entries included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Pick an unused XML prefix by appending the first free integer
    /// suffix in 1..=9999 to `prefix`. Fails at saturation.
    pub fn remap_prefix(&self, prefix: &str) -> Result<SmolStr> {
        for suffix in 1..=MAX_PREFIX_SUFFIX {
            let candidate = format!("{prefix}{suffix}");
            if !self.by_prefix.contains_key(candidate.as_str()) {
                return Ok(candidate.into());
            }
        }
        Err(Error::OperationFailed(format!(
            "could not assign a free prefix for '{prefix}'"
        )))
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_reserved() {
        let registry = NamespaceRegistry::new();
        assert_eq!(registry.find_by_uri(NETCONF_URI), Some(registry.well_known().netconf));
        assert_eq!(registry.find_by_prefix("yang"), Some(registry.well_known().yang));
        assert!(!registry.well_known().with_defaults.is_none());
    }

    #[test]
    fn test_register_bijection() {
        let mut registry = NamespaceRegistry::new();
        let id = registry.register("urn:x:a", "a", Some("mod-a")).unwrap();
        assert_eq!(registry.find_by_uri("urn:x:a"), Some(id));
        assert_eq!(registry.uri(id), Some("urn:x:a"));
        assert_eq!(registry.prefix(id), Some("a"));
        assert_eq!(registry.find_by_module_name("mod-a"), Some(id));
    }

    #[test]
    fn test_owner_backfill() {
        let mut registry = NamespaceRegistry::new();
        let id = registry.register("urn:x:a", "a", None).unwrap();
        let again = registry.register("urn:x:a", "a", Some("mod-a")).unwrap();
        assert_eq!(id, again);
        assert_eq!(
            registry.record(id).unwrap().owner_module.as_deref(),
            Some("mod-a")
        );
    }

    #[test]
    fn test_duplicate_owner_conflict() {
        let mut registry = NamespaceRegistry::new();
        registry.register("urn:x:a", "a", Some("mod-a")).unwrap();
        let err = registry.register("urn:x:a", "b", Some("mod-b")).unwrap_err();
        assert!(matches!(err, Error::DuplicateNamespace { .. }));
    }

    #[test]
    fn test_ids_follow_registration_order() {
        let mut registry = NamespaceRegistry::new();
        let a = registry.register("urn:x:a", "a", None).unwrap();
        let b = registry.register("urn:x:b", "b", None).unwrap();
        assert_eq!(b.raw(), a.raw() + 1);
        let ids: Vec<u32> = registry.iter().map(|r| r.id.raw()).collect();
        assert_eq!(ids, (1..=registry.len() as u32).collect::<Vec<_>>());
    }

    #[test]
    fn test_remap_prefix() {
        let mut registry = NamespaceRegistry::new();
        registry.register("urn:x:a", "p", Some("mod-a")).unwrap();
        let remapped = registry.remap_prefix("p").unwrap();
        assert_eq!(remapped.as_str(), "p1");
        registry.register("urn:x:b", "p1", Some("mod-b")).unwrap();
        assert_eq!(registry.remap_prefix("p").unwrap().as_str(), "p2");
    }
}
