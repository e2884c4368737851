//! Logos-based lexer for YANG source.
//!
//! YANG has an unusually small lexical surface: four punctuation tokens,
//! three string forms, and comments. Keywords are ordinary unquoted
//! strings; the statement parser decides what they mean.

use logos::Logos;
use smol_str::SmolStr;

/// Token kinds delivered to the statement parser. Trivia never reaches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    LeftBrace,
    RightBrace,
    Semicolon,
    Plus,
    /// Unquoted string: keywords, identifiers, bare arguments.
    Ident,
    /// Quoted string with quotes stripped and escapes applied.
    QuotedString,
    Error,
}

/// A token with its kind, text, and 1-based position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: SmolStr,
    pub line: u32,
    pub col: u32,
}

/// The thin scanner interface the compiler core consumes.
pub trait TokenSource {
    /// Look at the next token without consuming it.
    fn peek(&mut self) -> Option<&Token>;
    /// Consume and return the next token.
    fn advance(&mut self) -> Option<Token>;
    /// Push the most recently consumed token back.
    fn backup_one(&mut self);
}

/// Logos token enum over raw source.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
pub(crate) enum LogosToken {
    // =========================================================================
    // TRIVIA
    // =========================================================================
    #[regex(r"[ \t\r\n]+")]
    Whitespace,

    #[regex(r"//[^\n]*")]
    LineComment,

    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    BlockComment,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("{")]
    LeftBrace,

    #[token("}")]
    RightBrace,

    #[token(";")]
    Semicolon,

    #[token("+")]
    Plus,

    // =========================================================================
    // STRINGS
    // =========================================================================
    #[regex(r#""([^"\\]|\\.)*""#)]
    DoubleQuoted,

    #[regex(r"'[^']*'")]
    SingleQuoted,

    /// Everything else up to whitespace or punctuation. A leading slash
    /// is only an unquoted string when it does not open a comment, which
    /// keeps schema-node paths like `/a:c/b:q` one token.
    #[regex(r#"[^ \t\r\n;{}"'+/][^ \t\r\n;{}"']*"#)]
    #[regex(r#"/[^/* \t\r\n;{}"'][^ \t\r\n;{}"']*"#)]
    Unquoted,
}

/// Apply the double-quote escape rules: `\n`, `\t`, `\"`, `\\`.
fn unescape(text: &str) -> SmolStr {
    if !text.contains('\\') {
        return SmolStr::new(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    SmolStr::new(out)
}

/// Tokenize a whole source string, dropping trivia. Positions are 1-based.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = LogosToken::lexer(input);
    let mut tokens = Vec::new();
    let mut line: u32 = 1;
    let mut line_start: usize = 0;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let slice = lexer.slice();
        let col = (span.start - line_start) as u32 + 1;

        let kind = match result {
            Ok(LogosToken::Whitespace)
            | Ok(LogosToken::LineComment)
            | Ok(LogosToken::BlockComment) => {
                for (offset, byte) in slice.bytes().enumerate() {
                    if byte == b'\n' {
                        line += 1;
                        line_start = span.start + offset + 1;
                    }
                }
                continue;
            }
            Ok(LogosToken::LeftBrace) => TokenKind::LeftBrace,
            Ok(LogosToken::RightBrace) => TokenKind::RightBrace,
            Ok(LogosToken::Semicolon) => TokenKind::Semicolon,
            Ok(LogosToken::Plus) => TokenKind::Plus,
            Ok(LogosToken::DoubleQuoted) => TokenKind::QuotedString,
            Ok(LogosToken::SingleQuoted) => TokenKind::QuotedString,
            Ok(LogosToken::Unquoted) => TokenKind::Ident,
            Err(()) => TokenKind::Error,
        };

        let text = match result {
            Ok(LogosToken::DoubleQuoted) => unescape(&slice[1..slice.len() - 1]),
            Ok(LogosToken::SingleQuoted) => SmolStr::new(&slice[1..slice.len() - 1]),
            _ => SmolStr::new(slice),
        };

        tokens.push(Token {
            kind,
            text,
            line,
            col,
        });
    }
    tokens
}

/// The provided [`TokenSource`]: lexes eagerly, then cursors over the
/// token vector.
pub struct Scanner {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Scanner {
    pub fn new(input: &str) -> Self {
        Self {
            tokens: tokenize(input),
            cursor: 0,
        }
    }

    /// Position of the last consumed token, for error reporting.
    pub fn last_position(&self) -> (u32, u32) {
        if self.cursor == 0 {
            return (1, 1);
        }
        self.tokens
            .get(self.cursor - 1)
            .map(|t| (t.line, t.col))
            .unwrap_or((1, 1))
    }
}

impl TokenSource for Scanner {
    fn peek(&mut self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(token)
    }

    fn backup_one(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_simple_module() {
        let tokens = tokenize("module a { leaf foo; }");
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::LeftBrace,
                TokenKind::Ident,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::RightBrace,
            ]
        );
        assert_eq!(tokens[0].text, "module");
        assert_eq!(tokens[1].text, "a");
    }

    #[test]
    fn test_positions() {
        let tokens = tokenize("module a {\n  leaf foo;\n}");
        let leaf = tokens.iter().find(|t| t.text == "leaf").unwrap();
        assert_eq!((leaf.line, leaf.col), (2, 3));
    }

    #[test]
    fn test_comments_skipped() {
        let tokens = tokenize("// header\nmodule /* inline */ a;");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].text, "module");
        assert_eq!(tokens[0].line, 2);
    }

    #[test]
    fn test_quoted_strings() {
        let tokens = tokenize(r#"description "a \"quoted\" word";"#);
        assert_eq!(tokens[1].kind, TokenKind::QuotedString);
        assert_eq!(tokens[1].text, "a \"quoted\" word");

        let tokens = tokenize("pattern '[a-z]+';");
        assert_eq!(tokens[1].text, "[a-z]+");
    }

    #[test]
    fn test_path_argument() {
        let tokens = tokenize("augment /a:c/b:q;");
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].text, "/a:c/b:q");
    }

    #[test]
    fn test_scanner_backup() {
        let mut scanner = Scanner::new("a b");
        let first = scanner.advance().unwrap();
        assert_eq!(first.text, "a");
        scanner.backup_one();
        assert_eq!(scanner.advance().unwrap().text, "a");
        assert_eq!(scanner.advance().unwrap().text, "b");
        assert!(scanner.advance().is_none());
    }
}
