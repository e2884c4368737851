//! Domain constants shared across the compiler.
//!
//! Well-known namespace URIs reserved at context init, and the default
//! soft limits applied during parsing.

/// Placeholder URI for the invalid-filter namespace id.
pub const INVALID_URI: &str = "INVALID";

/// base:1.1 subtree wildcard namespace (the empty URI).
pub const WILDCARD_URI: &str = "";

/// NETCONF base namespace.
pub const NETCONF_URI: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

/// YANG module namespace.
pub const YANG_URI: &str = "urn:ietf:params:xml:ns:yang:1";

/// YIN (XML form of YANG) namespace.
pub const YIN_URI: &str = "urn:ietf:params:xml:ns:yang:yin:1";

/// The xmlns attribute namespace.
pub const XMLNS_URI: &str = "http://www.w3.org/2000/xmlns/";

/// XML Schema namespace.
pub const XSD_URI: &str = "http://www.w3.org/2001/XMLSchema";

/// XML Schema instance namespace.
pub const XSI_URI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// The xml: prefix namespace.
pub const XML_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// with-defaults 'default' XML attribute namespace.
pub const WITH_DEFAULTS_URI: &str =
    "urn:ietf:params:xml:ns:netconf:default:1.0";

/// Soft limit on identifier length before a warning is emitted.
pub const DEF_WARN_IDLEN: usize = 64;

/// Soft limit on source line length before a warning is emitted.
pub const DEF_WARN_LINELEN: usize = 72;

/// Hard ceiling on identifier length.
pub const MAX_IDLEN: usize = 255;

/// Default bound on the filter-pointer free list.
pub const DEF_FILTER_CACHE_SIZE: usize = 300;

/// Highest integer suffix tried when remapping a colliding XML prefix.
pub const MAX_PREFIX_SUFFIX: u32 = 9999;

/// Maximum number of resolution passes before unresolved references
/// become hard errors.
pub const MAX_RESOLVE_PASSES: usize = 8;

/// Filename separator between module name and revision date
/// (`module@2024-01-15.yang`).
pub const REVISION_SEPARATOR: char = '@';

/// Source file extension for YANG modules.
pub const YANG_SUFFIX: &str = "yang";
