//! # yangc-base
//!
//! Core library for YANG module parsing, schema tree construction, and
//! multi-pass resolution.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! query     → lookup, matching, iteration, key traversal
//!   ↓
//! link      → loader, import/include binding, resolver, pruner
//!   ↓
//! registry  → module registry, namespace registry
//!   ↓
//! parser    → Logos lexer, statement parser, module builder
//!   ↓
//! schema    → Module, SchemaNode variants, typedefs, groupings
//!   ↓
//! types     → base type catalog, typed value model
//!   ↓
//! diag      → error taxonomy, collector, suppression
//!   ↓
//! base      → primitives (ids, locations, identifier rules)
//! ```
//!
//! The [`Context`] owns all shared state; every public entry point is a
//! method on it. Loading a module recursively loads its imports and
//! includes, resolves references to fixpoint, prunes obsolete and
//! not-supported nodes, and registers the result:
//!
//! ```
//! use yangc::link::MapSourceProvider;
//! use yangc::Context;
//!
//! let sources = MapSourceProvider::new()
//!     .with("a", "module a { namespace urn:x:a; prefix a; leaf foo { type uint32; } }");
//! let mut ctx = Context::with_provider(Box::new(sources));
//! let id = ctx.load("a", None).unwrap();
//! let module = ctx.module(id).unwrap();
//! assert!(ctx.find_object_top(module, "foo").is_some());
//! ```

// ============================================================================
// MODULES (dependency order: base → diag → types → schema → parser →
// registry → link → query)
// ============================================================================

/// Foundation types: ids, source locations, identifier rules
pub mod base;

/// Diagnostics: error taxonomy, collector, warning suppression
pub mod diag;

/// Type system: base type catalog, typed value model
pub mod types;

/// Schema model: modules, nodes, typedefs, groupings, identities
pub mod schema;

/// Parser: Logos lexer, statement parser, module builder
pub mod parser;

/// Registries: modules keyed by (name, revision), namespaces by URI
pub mod registry;

/// Linking: loader, import/include binding, resolver, pruner
pub mod link;

/// Queries: lookup, rpc matching, iteration, key traversal
pub mod query;

/// Pooled filter-pointer records
pub mod filter;

mod context;

// Re-export the context and the types almost every consumer touches
pub use context::{Context, LoadCallback};

pub use base::{ModuleId, NamespaceId, SourceLocation};
pub use diag::{Diagnostic, Error, ErrorCode, Result, Severity};
pub use query::{walk, IterFilter, Walk};
pub use schema::{Module, SchemaNode};
pub use types::BaseType;
