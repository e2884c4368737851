//! The generic statement parser.
//!
//! Every YANG construct is one shape: a keyword, an optional argument,
//! then either `;` or a `{ ... }` block of sub-statements. The parser
//! produces that shape verbatim; the module builder gives it meaning.

use smol_str::SmolStr;

use crate::diag::{Error, Result};

use super::lexer::{Token, TokenKind, TokenSource};

/// One raw statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStmt {
    /// Extension prefix, when the keyword was spelled `prefix:keyword`.
    pub prefix: Option<SmolStr>,
    pub keyword: SmolStr,
    pub arg: Option<SmolStr>,
    pub substmts: Vec<RawStmt>,
    pub line: u32,
    pub col: u32,
}

impl RawStmt {
    /// First sub-statement with the given keyword.
    pub fn find(&self, keyword: &str) -> Option<&RawStmt> {
        self.substmts
            .iter()
            .find(|s| s.prefix.is_none() && s.keyword == keyword)
    }

    /// All sub-statements with the given keyword, in source order.
    pub fn find_all<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = &'a RawStmt> {
        self.substmts
            .iter()
            .filter(move |s| s.prefix.is_none() && s.keyword == keyword)
    }

    /// Argument of the first matching sub-statement.
    pub fn arg_of(&self, keyword: &str) -> Option<&str> {
        self.find(keyword)?.arg.as_deref()
    }
}

/// Parse a whole token stream into top-level statements.
pub fn parse_statements<S: TokenSource>(source: &mut S) -> Result<Vec<RawStmt>> {
    let mut parser = StmtParser { source };
    let mut stmts = Vec::new();
    while parser.source.peek().is_some() {
        stmts.push(parser.parse_stmt()?);
    }
    Ok(stmts)
}

struct StmtParser<'a, S: TokenSource> {
    source: &'a mut S,
}

impl<S: TokenSource> StmtParser<'_, S> {
    fn unexpected_end() -> Error {
        Error::Syntax {
            line: 0,
            col: 0,
            message: "unexpected end of input".into(),
        }
    }

    fn unexpected(token: &Token, expected: &str) -> Error {
        Error::Syntax {
            line: token.line,
            col: token.col,
            message: format!("expected {expected}, found '{}'", token.text),
        }
    }

    /// Consume a token of the given kind.
    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        let token = self.source.advance().ok_or_else(Self::unexpected_end)?;
        if token.kind == kind {
            Ok(token)
        } else {
            Err(Self::unexpected(&token, &format!("{kind:?}")))
        }
    }

    /// Consume the next token and require it to be a specific identifier.
    fn expect_identifier(&mut self, name: &str) -> Result<Token> {
        let token = self.expect(TokenKind::Ident)?;
        if token.text == name {
            Ok(token)
        } else {
            self.source.backup_one();
            Err(Self::unexpected(&token, &format!("'{name}'")))
        }
    }

    /// Consume `name <value>` and return the value string.
    /// Kept for collaborators that read simple name/value pairs.
    #[allow(dead_code)]
    fn expect_name_then_value(&mut self, name: &str) -> Result<SmolStr> {
        self.expect_identifier(name)?;
        self.parse_arg()?
            .ok_or_else(|| Error::Syntax {
                line: 0,
                col: 0,
                message: format!("'{name}' requires a value"),
            })
    }

    /// Parse an optional argument: an unquoted string, or quoted strings
    /// joined with `+`.
    fn parse_arg(&mut self) -> Result<Option<SmolStr>> {
        let Some(token) = self.source.peek() else {
            return Ok(None);
        };
        match token.kind {
            TokenKind::Ident => {
                let token = self.source.advance().ok_or_else(Self::unexpected_end)?;
                Ok(Some(token.text))
            }
            TokenKind::QuotedString => {
                let first = self.source.advance().ok_or_else(Self::unexpected_end)?;
                let mut value = first.text.to_string();
                let mut joined = false;
                while matches!(self.source.peek().map(|t| t.kind), Some(TokenKind::Plus)) {
                    self.source.advance();
                    let next = self.expect(TokenKind::QuotedString)?;
                    value.push_str(&next.text);
                    joined = true;
                }
                Ok(Some(if joined {
                    SmolStr::new(value)
                } else {
                    first.text
                }))
            }
            _ => Ok(None),
        }
    }

    fn parse_stmt(&mut self) -> Result<RawStmt> {
        let keyword_token = self.expect(TokenKind::Ident)?;
        let (prefix, keyword) = match keyword_token.text.split_once(':') {
            Some((prefix, keyword)) => (Some(SmolStr::new(prefix)), SmolStr::new(keyword)),
            None => (None, keyword_token.text.clone()),
        };
        let arg = self.parse_arg()?;

        let mut stmt = RawStmt {
            prefix,
            keyword,
            arg,
            substmts: Vec::new(),
            line: keyword_token.line,
            col: keyword_token.col,
        };

        let next = self.source.advance().ok_or_else(Self::unexpected_end)?;
        match next.kind {
            TokenKind::Semicolon => Ok(stmt),
            TokenKind::LeftBrace => {
                loop {
                    match self.source.peek() {
                        None => return Err(Self::unexpected_end()),
                        Some(token) if token.kind == TokenKind::RightBrace => {
                            self.source.advance();
                            break;
                        }
                        Some(_) => stmt.substmts.push(self.parse_stmt()?),
                    }
                }
                Ok(stmt)
            }
            _ => Err(Self::unexpected(&next, "';' or '{'")),
        }
    }
}
