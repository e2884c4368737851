//! Pooled filter-pointer records for subtree-filter evaluation.
//!
//! Filter evaluation builds short-lived trees of node pointers at high
//! rate; the pool recycles the records through a bounded free list
//! instead of hitting the allocator each time. No concurrent access:
//! callers serialize, like the rest of the context.

use smol_str::SmolStr;

use crate::base::constants::DEF_FILTER_CACHE_SIZE;
use crate::base::ModuleId;

/// Weak reference to a schema node: owning module plus the name path from
/// the module root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeRef {
    pub module: Option<ModuleId>,
    pub path: Vec<SmolStr>,
}

/// One filter-pointer record.
#[derive(Debug, Default)]
pub struct FilterPtr {
    pub node: NodeRef,
    pub children: Vec<FilterPtr>,
}

impl FilterPtr {
    fn reset(&mut self) {
        self.node = NodeRef::default();
        self.children.clear();
    }
}

/// Bounded free-list of filter-pointer records.
#[derive(Debug)]
pub struct FilterPool {
    free: Vec<FilterPtr>,
    max_cached: usize,
}

impl FilterPool {
    pub fn new() -> Self {
        Self::with_capacity(DEF_FILTER_CACHE_SIZE)
    }

    pub fn with_capacity(max_cached: usize) -> Self {
        Self {
            free: Vec::new(),
            max_cached,
        }
    }

    /// Get a record from the cache, or a fresh one when the cache is
    /// empty.
    pub fn new_filter(&mut self) -> FilterPtr {
        self.free.pop().unwrap_or_default()
    }

    /// Release a record, child list first. Records over the cache bound
    /// are dropped.
    pub fn release_filter(&mut self, mut filter: FilterPtr) {
        for child in filter.children.drain(..) {
            self.release_filter(child);
        }
        if self.free.len() < self.max_cached {
            filter.reset();
            self.free.push(filter);
        }
    }

    /// Current number of cached records.
    pub fn cached(&self) -> usize {
        self.free.len()
    }
}

impl Default for FilterPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recycles_records() {
        let mut pool = FilterPool::new();
        let filter = pool.new_filter();
        assert_eq!(pool.cached(), 0);
        pool.release_filter(filter);
        assert_eq!(pool.cached(), 1);
        let _again = pool.new_filter();
        assert_eq!(pool.cached(), 0);
    }

    #[test]
    fn test_children_released_first() {
        let mut pool = FilterPool::new();
        let mut parent = pool.new_filter();
        parent.children.push(FilterPtr::default());
        parent.children.push(FilterPtr::default());
        pool.release_filter(parent);
        assert_eq!(pool.cached(), 3);
    }

    #[test]
    fn test_bounded_cache() {
        let mut pool = FilterPool::with_capacity(2);
        for _ in 0..5 {
            pool.release_filter(FilterPtr::default());
        }
        assert_eq!(pool.cached(), 2);
    }
}
