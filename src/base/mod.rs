//! Foundation types for the yangc toolchain.
//!
//! This module provides fundamental types used throughout the compiler:
//! - [`ModuleId`], [`NamespaceId`] - small integer handles into registries
//! - [`SourceLocation`] - module/line/column records carried by diagnostics
//! - Identifier validation (YANG identifier rules, XML name rules)
//! - Domain constants (well-known namespace URIs, default limits)
//!
//! This module has NO dependencies on other yangc modules.

pub mod constants;
mod ident;
mod ids;
mod location;

pub use ident::{check_xml_name, check_yang_identifier, IdentCheck};
pub use ids::{ModuleId, NamespaceId};
pub use location::SourceLocation;
