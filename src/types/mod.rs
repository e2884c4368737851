//! Type system: the built-in base type catalog and the typed value model.

mod base;
mod errinfo;
mod value;

pub use base::BaseType;
pub use errinfo::ErrInfo;
pub use value::{Bit, EnumValue, ListValue, MergeOrder, TypedValue};
