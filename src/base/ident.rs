//! Identifier validation.
//!
//! YANG identifiers follow the RFC 6020 grammar: an ASCII letter or
//! underscore followed by letters, digits, underscores, hyphens, and dots.
//! XML names are checked with the same ASCII subset plus the colon, which
//! is enough for the prefixed names this compiler deals in.

use super::constants::{DEF_WARN_IDLEN, MAX_IDLEN};

/// Outcome of an identifier check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentCheck {
    /// Well-formed and under the soft length limit.
    Ok,
    /// Well-formed but longer than the soft limit.
    OverSoftLimit,
    /// Not a valid identifier.
    Invalid,
}

impl IdentCheck {
    /// True unless the identifier is malformed.
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Check a string against the YANG identifier grammar.
///
/// `soft_limit` is the configured warning threshold; pass
/// [`DEF_WARN_IDLEN`] for the default. Identifiers over [`MAX_IDLEN`]
/// are invalid outright.
pub fn check_yang_identifier(name: &str, soft_limit: usize) -> IdentCheck {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => {}
        _ => return IdentCheck::Invalid,
    }
    if !chars.all(is_ident_continue) {
        return IdentCheck::Invalid;
    }
    // "xml" in any case is reserved by the XML spec
    if name.len() >= 3 && name[..3].eq_ignore_ascii_case("xml") {
        return IdentCheck::Invalid;
    }
    if name.len() > MAX_IDLEN {
        return IdentCheck::Invalid;
    }
    if name.len() > soft_limit {
        return IdentCheck::OverSoftLimit;
    }
    IdentCheck::Ok
}

/// Check a string as an XML name, allowing one colon for a prefix.
pub fn check_xml_name(name: &str) -> IdentCheck {
    let mut colons = 0usize;
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => {}
        _ => return IdentCheck::Invalid,
    }
    for c in chars {
        if c == ':' {
            colons += 1;
            if colons > 1 {
                return IdentCheck::Invalid;
            }
        } else if !is_ident_continue(c) {
            return IdentCheck::Invalid;
        }
    }
    if name.ends_with(':') {
        return IdentCheck::Invalid;
    }
    if name.len() > DEF_WARN_IDLEN {
        return IdentCheck::OverSoftLimit;
    }
    IdentCheck::Ok
}
