//! Process-wide registries owned by the compiler context.

mod modules;
mod namespaces;

pub use modules::ModuleRegistry;
pub use namespaces::{NamespaceRecord, NamespaceRegistry, WellKnownIds};
