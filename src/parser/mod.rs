//! Parser: logos lexer, the generic statement parser, and the module
//! builder that turns raw statements into an unresolved [`crate::schema::Module`].
//!
//! The scanner is a thin interface ([`TokenSource`]): anything that can
//! produce the token stream works; [`Scanner`] is the provided
//! implementation.

mod build;
mod lexer;
mod stmt;

pub use build::build_module;
pub use lexer::{tokenize, Scanner, Token, TokenKind, TokenSource};
pub use stmt::{parse_statements, RawStmt};
