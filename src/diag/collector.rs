//! Diagnostic collection and warning suppression.

use rustc_hash::FxHashSet;

use crate::base::SourceLocation;

use super::codes::{ErrorCode, Severity};

/// A single emitted diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: SourceLocation,
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    /// Format for display: `sourcefile:line.col: severity(code): message`.
    pub fn format(&self) -> String {
        format!(
            "{}: {}({}): {}",
            self.location,
            self.severity.as_str(),
            self.code,
            self.message
        )
    }
}

/// Collects diagnostics for a whole compiler context.
///
/// Emit policy (spec order):
/// 1. errors are always recorded;
/// 2. suppressed warnings are dropped silently;
/// 3. everything else is recorded.
///
/// A pinned location, when set, wins over the location passed to
/// [`emit`](Self::emit); the statement parser pins the current token
/// position while expanding multi-token constructs.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    suppressed: FxHashSet<u32>,
    pinned: Option<SourceLocation>,
    errors: u32,
    warnings: u32,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppress a warning code. Error codes are refused.
    pub fn suppress(&mut self, code: ErrorCode) -> bool {
        if code.is_error() {
            return false;
        }
        self.suppressed.insert(code.as_u32());
        true
    }

    /// Remove a suppression entry if present.
    pub fn unsuppress(&mut self, code: ErrorCode) {
        self.suppressed.remove(&code.as_u32());
    }

    /// Check whether a code would currently be emitted.
    pub fn is_enabled(&self, code: ErrorCode) -> bool {
        code.is_error() || !self.suppressed.contains(&code.as_u32())
    }

    /// Pin a location that overrides the one passed to `emit`.
    pub fn pin_location(&mut self, location: SourceLocation) {
        self.pinned = Some(location);
    }

    /// Clear any pinned location.
    pub fn clear_pinned(&mut self) {
        self.pinned = None;
    }

    /// Emit a diagnostic. Returns true if it was recorded, so callers can
    /// bump the owning module's counters.
    pub fn emit(
        &mut self,
        location: SourceLocation,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> bool {
        let location = self.pinned.clone().unwrap_or(location);
        let severity = code.severity();
        if !severity.is_error() && !self.is_enabled(code) {
            return false;
        }
        let diag = Diagnostic {
            location,
            code,
            severity,
            message: message.into(),
        };
        match severity {
            Severity::Error => {
                self.errors += 1;
                tracing::error!("{}", diag.format());
            }
            Severity::Warning => {
                self.warnings += 1;
                tracing::warn!("{}", diag.format());
            }
            Severity::Info => {
                tracing::info!("{}", diag.format());
            }
        }
        self.diagnostics.push(diag);
        true
    }

    /// Emit with the code's default message.
    pub fn emit_default(&mut self, location: SourceLocation, code: ErrorCode) -> bool {
        self.emit(location, code, code.default_message())
    }

    /// All recorded diagnostics, in emission order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Total recorded errors.
    pub fn error_count(&self) -> u32 {
        self.errors
    }

    /// Total recorded warnings.
    pub fn warning_count(&self) -> u32 {
        self.warnings
    }

    /// Check if any error has been recorded.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// Take all diagnostics, leaving the collector empty but keeping the
    /// suppression set.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        self.errors = 0;
        self.warnings = 0;
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_always_emitted() {
        let mut collector = DiagnosticCollector::new();
        assert!(!collector.suppress(ErrorCode::DefNotFound));
        assert!(collector.emit_default(SourceLocation::at(1, 1), ErrorCode::DefNotFound));
        assert_eq!(collector.error_count(), 1);
    }

    #[test]
    fn test_suppressed_warning_dropped() {
        let mut collector = DiagnosticCollector::new();
        assert!(collector.suppress(ErrorCode::DuplicatePrefix));
        assert!(!collector.is_enabled(ErrorCode::DuplicatePrefix));
        assert!(!collector.emit_default(SourceLocation::at(1, 1), ErrorCode::DuplicatePrefix));
        assert_eq!(collector.warning_count(), 0);
        assert!(collector.diagnostics().is_empty());

        collector.unsuppress(ErrorCode::DuplicatePrefix);
        assert!(collector.emit_default(SourceLocation::at(1, 1), ErrorCode::DuplicatePrefix));
        assert_eq!(collector.warning_count(), 1);
    }

    #[test]
    fn test_pinned_location_wins() {
        let mut collector = DiagnosticCollector::new();
        collector.pin_location(SourceLocation::new("pinned.yang", 7, 2));
        collector.emit_default(SourceLocation::at(1, 1), ErrorCode::InvalidValue);
        assert_eq!(
            collector.diagnostics()[0].location,
            SourceLocation::new("pinned.yang", 7, 2)
        );
        collector.clear_pinned();
        collector.emit_default(SourceLocation::at(1, 1), ErrorCode::InvalidValue);
        assert_eq!(collector.diagnostics()[1].location, SourceLocation::at(1, 1));
    }

    #[test]
    fn test_format() {
        let diag = Diagnostic {
            location: SourceLocation::new("a.yang", 3, 9),
            code: ErrorCode::DefNotFound,
            severity: Severity::Error,
            message: "definition 'x' not found".into(),
        };
        assert_eq!(diag.format(), "a.yang:3.9: error(103): definition 'x' not found");
    }
}
