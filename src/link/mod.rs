//! Linking: module loading, import/include binding, the multi-pass
//! reference resolver, and the obsolete/not-supported pruner.

mod imports;
mod loader;
mod prune;
mod resolve;

pub use loader::{FsSourceProvider, MapSourceProvider, ModuleSource, SearchPaths, SourceProvider};
pub(crate) use prune::prune_module;
pub(crate) use resolve::find_data_child;
