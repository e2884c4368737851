//! Diagnostics: error taxonomy, emit policy, warning suppression.
//!
//! Every user-visible message from the compiler core goes through the
//! [`DiagnosticCollector`]. `tracing` is the log sink; the collector is
//! what downstream tooling reads.

pub mod codes;
mod collector;
mod error;

pub use codes::{ErrorCode, Severity, WARN_BASE};
pub use collector::{Diagnostic, DiagnosticCollector};
pub use error::{Error, Result};
