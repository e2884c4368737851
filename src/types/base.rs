//! The fixed catalog of built-in YANG base types.

use std::fmt;

/// Every YANG built-in base type, plus the structural pseudo-types the
/// schema tree uses for non-leaf nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Decimal64,
    String,
    Binary,
    Boolean,
    Empty,
    Enumeration,
    Bits,
    Leafref,
    IdentityRef,
    InstanceId,
    Union,
    // structural kinds carried by non-leaf schema nodes
    Container,
    List,
    Choice,
    Case,
    AnyXml,
}

impl BaseType {
    /// Parse a built-in type name as it appears in a `type` statement.
    /// Structural kinds are never spelled in source and return `None`.
    pub fn from_type_name(name: &str) -> Option<Self> {
        Some(match name {
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint8" => Self::Uint8,
            "uint16" => Self::Uint16,
            "uint32" => Self::Uint32,
            "uint64" => Self::Uint64,
            "decimal64" => Self::Decimal64,
            "string" => Self::String,
            "binary" => Self::Binary,
            "boolean" => Self::Boolean,
            "empty" => Self::Empty,
            "enumeration" => Self::Enumeration,
            "bits" => Self::Bits,
            "leafref" => Self::Leafref,
            "identityref" => Self::IdentityRef,
            "instance-identifier" => Self::InstanceId,
            "union" => Self::Union,
            _ => return None,
        })
    }

    /// The spelling used in YANG source, or a canonical name for
    /// structural kinds.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Uint8 => "uint8",
            Self::Uint16 => "uint16",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
            Self::Decimal64 => "decimal64",
            Self::String => "string",
            Self::Binary => "binary",
            Self::Boolean => "boolean",
            Self::Empty => "empty",
            Self::Enumeration => "enumeration",
            Self::Bits => "bits",
            Self::Leafref => "leafref",
            Self::IdentityRef => "identityref",
            Self::InstanceId => "instance-identifier",
            Self::Union => "union",
            Self::Container => "container",
            Self::List => "list",
            Self::Choice => "choice",
            Self::Case => "case",
            Self::AnyXml => "anyxml",
        }
    }

    /// Signed or unsigned integer, or decimal64.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Uint8
                | Self::Uint16
                | Self::Uint32
                | Self::Uint64
                | Self::Decimal64
        )
    }

    pub fn is_signed(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Self::Uint8 | Self::Uint16 | Self::Uint32 | Self::Uint64
        )
    }

    /// Types whose lexical form is an arbitrary string (string, binary,
    /// leafref, instance-identifier).
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            Self::String | Self::Binary | Self::Leafref | Self::InstanceId
        )
    }

    /// Enumeration-style types with a closed name set (enum, bits,
    /// identityref).
    pub fn is_enum_like(&self) -> bool {
        matches!(self, Self::Enumeration | Self::Bits | Self::IdentityRef)
    }

    /// Structural node kinds (never carried by a leaf value).
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Container | Self::List | Self::Choice | Self::Case | Self::AnyXml
        )
    }

    /// Types that may legally carry a `default` statement.
    pub fn supports_default(&self) -> bool {
        !self.is_structural() && !matches!(self, Self::Empty | Self::Leafref)
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
