//! Source locations for diagnostics.

use std::fmt;

use smol_str::SmolStr;

/// Where a diagnostic points: the owning module's source file plus a
/// 1-based line and column.
///
/// A location with no known source file displays the file as `--`, which
/// is what command-line consumers print for synthesized input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// Source file spec, if known.
    pub filespec: Option<SmolStr>,
    /// 1-based line number; 0 when unknown.
    pub line: u32,
    /// 1-based column number; 0 when unknown.
    pub col: u32,
}

impl SourceLocation {
    /// Location with a known file and position.
    pub fn new(filespec: impl Into<SmolStr>, line: u32, col: u32) -> Self {
        Self {
            filespec: Some(filespec.into()),
            line,
            col,
        }
    }

    /// Location with a position but no file (synthesized input).
    pub fn at(line: u32, col: u32) -> Self {
        Self {
            filespec: None,
            line,
            col,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.filespec.as_deref().unwrap_or("--");
        write!(f, "{}:{}.{}", file, self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_file() {
        let loc = SourceLocation::new("mod-a.yang", 12, 3);
        assert_eq!(loc.to_string(), "mod-a.yang:12.3");
    }

    #[test]
    fn test_display_without_file() {
        let loc = SourceLocation::at(1, 1);
        assert_eq!(loc.to_string(), "--:1.1");
    }
}
