//! Script tokenizer
//!
//! Splits script source into structural tokens:
//! - `::name` / `;;` at the start of a line (scene declaration / beat separator)
//! - quoted strings `#"…"` `#'…'` `@"…"` `@'…'`
//! - embedded expressions `{…}` `%{…}` `#{…}` `@{…}`
//! - plain text runs and single newlines
//!
//! Tokens borrow their text from the source.

use std::fmt;

use patter_config::Phase;
use thiserror::Error;
use tracing::{debug, trace};

use crate::position::SourcePosition;

const TARGET: &str = Phase::Tokenizer.target();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `::name`, text is the trimmed name
    SceneDecl,
    /// `;;`
    BeatSeparator,
    /// Plain text run, or a lone `"\n"`
    Text,
    /// `#"…"` / `#'…'`, text is the raw content between the quotes
    InstantString,
    /// `@"…"` / `@'…'`
    TypewriterString,
    /// `{…}`, text is the trimmed content between the braces
    InlineExpr,
    /// `%{…}`
    DeferredExpr,
    /// `#{…}`
    InstantExpr,
    /// `@{…}`
    TypewriterExpr,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::SceneDecl => "scene declaration",
            TokenKind::BeatSeparator => "beat separator",
            TokenKind::Text => "text",
            TokenKind::InstantString => "instant string",
            TokenKind::TypewriterString => "typewriter string",
            TokenKind::InlineExpr => "inline expression",
            TokenKind::DeferredExpr => "deferred expression",
            TokenKind::InstantExpr => "instant expression",
            TokenKind::TypewriterExpr => "typewriter expression",
            TokenKind::Eof => "end of input",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub position: SourcePosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexerErrorKind {
    UnclosedString,
    UnclosedBrace,
    EmptySceneName,
}

/// 词法错误，包含错误类型和起始位置
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} at {position}", describe(.kind))]
pub struct LexerError {
    pub kind: LexerErrorKind,
    pub position: SourcePosition,
}

fn describe(kind: &LexerErrorKind) -> &'static str {
    match kind {
        LexerErrorKind::UnclosedString => "unclosed string",
        LexerErrorKind::UnclosedBrace => "unclosed brace",
        LexerErrorKind::EmptySceneName => "empty scene name",
    }
}

impl LexerError {
    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }
}

/// Tokenize a whole script. The last token is always [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexerError> {
    let mut tokenizer = Tokenizer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = tokenizer.next_token()?;
        trace!(target: TARGET, kind = %token.kind, text = token.text, at = %token.position, "token");
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            break;
        }
    }
    debug!(target: TARGET, count = tokens.len(), "tokenized script");
    Ok(tokens)
}

pub struct Tokenizer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    position: SourcePosition,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            position: SourcePosition::start(),
        }
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(&b) = self.bytes.get(self.pos) {
            self.position.advance_byte(b);
            self.pos += 1;
        }
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.bytes[self.pos - 1] == b'\n'
    }

    /// `\n` or `\r\n`
    fn at_newline(&self) -> bool {
        match self.peek_at(0) {
            Some(b'\n') => true,
            Some(b'\r') => self.peek_at(1) == Some(b'\n'),
            _ => false,
        }
    }

    fn starts_with(&self, pattern: &[u8]) -> bool {
        self.bytes[self.pos..].starts_with(pattern)
    }

    /// Token kind if a prefix+follower combination starts here
    fn prefixed_start(&self) -> Option<TokenKind> {
        let first = self.peek_at(0)?;
        if first == b'{' {
            return Some(TokenKind::InlineExpr);
        }
        let follower = self.peek_at(1)?;
        let kind = match (first, follower) {
            (b'%', b'{') => TokenKind::DeferredExpr,
            (b'#', b'{') => TokenKind::InstantExpr,
            (b'@', b'{') => TokenKind::TypewriterExpr,
            (b'#', b'"' | b'\'') => TokenKind::InstantString,
            (b'@', b'"' | b'\'') => TokenKind::TypewriterString,
            _ => return None,
        };
        Some(kind)
    }

    pub fn next_token(&mut self) -> Result<Token<'a>, LexerError> {
        let start = self.position;

        if self.pos >= self.bytes.len() {
            return Ok(Token {
                kind: TokenKind::Eof,
                text: "",
                position: start,
            });
        }

        if self.at_line_start() && self.starts_with(b"::") {
            return self.scene_decl();
        }

        if self.at_line_start() && self.starts_with(b";;") {
            let text_start = self.pos;
            self.advance_by(2);
            let text = &self.src[text_start..self.pos];
            self.skip_line();
            return Ok(Token {
                kind: TokenKind::BeatSeparator,
                text,
                position: start,
            });
        }

        if self.at_newline() {
            // "\r\n" 折叠为单个 "\n"
            if self.peek_at(0) == Some(b'\r') {
                self.advance();
            }
            let text_start = self.pos;
            self.advance();
            return Ok(Token {
                kind: TokenKind::Text,
                text: &self.src[text_start..self.pos],
                position: start,
            });
        }

        if let Some(kind) = self.prefixed_start() {
            // 跳过前缀字符，引号/括号由后续扫描消费
            if kind != TokenKind::InlineExpr {
                self.advance();
            }
            return match kind {
                TokenKind::InstantString | TokenKind::TypewriterString => self.string(kind, start),
                _ => self.braced(kind, start),
            };
        }

        Ok(self.text_run(start))
    }

    fn skip_line(&mut self) {
        while let Some(b) = self.peek_at(0) {
            self.advance();
            if b == b'\n' {
                break;
            }
        }
    }

    fn scene_decl(&mut self) -> Result<Token<'a>, LexerError> {
        let start = self.position;
        self.advance_by(2);
        let name_start = self.pos;
        while matches!(self.peek_at(0), Some(b) if b != b'\n') {
            self.advance();
        }
        let name = self.src[name_start..self.pos].trim();
        // 连同行尾换行一起消费
        self.advance();

        if name.is_empty() {
            return Err(LexerError {
                kind: LexerErrorKind::EmptySceneName,
                position: start,
            });
        }
        Ok(Token {
            kind: TokenKind::SceneDecl,
            text: name,
            position: start,
        })
    }

    /// Quoted string; positioned on the opening quote
    fn string(&mut self, kind: TokenKind, start: SourcePosition) -> Result<Token<'a>, LexerError> {
        let unclosed = LexerError {
            kind: LexerErrorKind::UnclosedString,
            position: start,
        };
        let quote = self.peek_at(0).ok_or(unclosed.clone())?;
        self.advance();

        let content_start = self.pos;
        loop {
            match self.peek_at(0) {
                None => return Err(unclosed),
                Some(b'\\') => self.advance_by(2),
                Some(b) if b == quote => {
                    let text = &self.src[content_start..self.pos];
                    self.advance();
                    return Ok(Token {
                        kind,
                        text,
                        position: start,
                    });
                }
                Some(_) => self.advance(),
            }
        }
    }

    /// Brace-delimited expression; positioned on the opening brace
    fn braced(&mut self, kind: TokenKind, start: SourcePosition) -> Result<Token<'a>, LexerError> {
        let unclosed = LexerError {
            kind: LexerErrorKind::UnclosedBrace,
            position: start,
        };
        self.advance();
        let content_start = self.pos;
        let mut depth = 1usize;

        loop {
            match self.peek_at(0) {
                None => return Err(unclosed),
                Some(b'{') => {
                    depth += 1;
                    self.advance();
                }
                Some(b'}') => {
                    depth -= 1;
                    if depth == 0 {
                        let text = self.src[content_start..self.pos].trim();
                        self.advance();
                        return Ok(Token {
                            kind,
                            text,
                            position: start,
                        });
                    }
                    self.advance();
                }
                Some(quote @ (b'"' | b'\'')) => {
                    // 引号内的括号不计入深度
                    self.advance();
                    loop {
                        match self.peek_at(0) {
                            None => return Err(unclosed),
                            Some(b'\\') => self.advance_by(2),
                            Some(b) if b == quote => {
                                self.advance();
                                break;
                            }
                            Some(_) => self.advance(),
                        }
                    }
                }
                Some(_) => self.advance(),
            }
        }
    }

    /// Plain text up to a newline, `{` or a prefixed token
    fn text_run(&mut self, start: SourcePosition) -> Token<'a> {
        let text_start = self.pos;
        self.advance();
        while self.peek_at(0).is_some() {
            if self.at_newline() || self.prefixed_start().is_some() {
                break;
            }
            self.advance();
        }
        Token {
            kind: TokenKind::Text,
            text: &self.src[text_start..self.pos],
            position: start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().iter().map(|t| t.kind).collect()
    }

    fn texts(src: &str) -> Vec<&str> {
        tokenize(src).unwrap().iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_scene_and_separator() {
        let tokens = tokenize("::  main  \nHello\n;; rest ignored\nBye").unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::SceneDecl,
                TokenKind::Text,
                TokenKind::Text,
                TokenKind::BeatSeparator,
                TokenKind::Text,
                TokenKind::Eof
            ]
        );
        assert_eq!(tokens[0].text, "main");
        assert_eq!(tokens[1].text, "Hello");
        assert_eq!(tokens[2].text, "\n");
        assert_eq!(tokens[4].text, "Bye");
        assert_eq!(tokens[4].position, SourcePosition::new(4, 1));
    }

    #[test]
    fn test_crlf_folds_into_newline() {
        let tokens = tokenize("::main\r\nHello\r\n;;\r\nBye\r\n").unwrap();
        assert_eq!(
            texts_of(&tokens),
            vec!["main", "Hello", "\n", ";;", "Bye", "\n", ""]
        );
        assert_eq!(tokens[2].position, SourcePosition::new(2, 6));
        assert_eq!(tokens[4].position, SourcePosition::new(4, 1));
        // 单独的 \r 仍是普通文本
        assert_eq!(texts("a\rb"), vec!["a\rb", ""]);
    }

    fn texts_of<'a>(tokens: &[Token<'a>]) -> Vec<&'a str> {
        tokens.iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_sigils_only_at_line_start() {
        assert_eq!(texts("a :: b ;; c"), vec!["a :: b ;; c", ""]);
    }

    #[test]
    fn test_empty_scene_name() {
        let err = tokenize("::   \n").unwrap_err();
        assert_eq!(err.kind, LexerErrorKind::EmptySceneName);
        assert_eq!(err.position, SourcePosition::new(1, 1));
    }

    #[test]
    fn test_expression_flavors() {
        assert_eq!(
            kinds("{a}%{b}#{c}@{d}"),
            vec![
                TokenKind::InlineExpr,
                TokenKind::DeferredExpr,
                TokenKind::InstantExpr,
                TokenKind::TypewriterExpr,
                TokenKind::Eof
            ]
        );
        assert_eq!(texts("{ a }%{b}"), vec!["a", "b", ""]);
    }

    #[test]
    fn test_string_flavors() {
        let tokens = tokenize(r#"#"one"@'two'"#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::InstantString);
        assert_eq!(tokens[0].text, "one");
        assert_eq!(tokens[1].kind, TokenKind::TypewriterString);
        assert_eq!(tokens[1].text, "two");
    }

    #[test]
    fn test_escaped_quote_kept_raw() {
        let tokens = tokenize(r#"#"say \"hi\"""#).unwrap();
        assert_eq!(tokens[0].text, r#"say \"hi\""#);
    }

    #[test]
    fn test_bare_prefix_is_text() {
        assert_eq!(texts("100% sure # @ end"), vec!["100% sure # @ end", ""]);
    }

    #[test]
    fn test_text_stops_at_brace() {
        assert_eq!(texts("Hi {name}!"), vec!["Hi ", "name", "!", ""]);
    }

    #[test]
    fn test_nested_braces_and_quoted_braces() {
        let tokens = tokenize("{f({x}) + '}'}tail").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::InlineExpr);
        assert_eq!(tokens[0].text, "f({x}) + '}'");
        assert_eq!(tokens[1].text, "tail");
    }

    #[test]
    fn test_brace_across_lines_tracks_position() {
        let tokens = tokenize("{a +\n b}x").unwrap();
        assert_eq!(tokens[0].text, "a +\n b");
        assert_eq!(tokens[1].position, SourcePosition::new(2, 4));
    }

    #[test]
    fn test_unclosed_string() {
        let err = tokenize("ok\n#\"never").unwrap_err();
        assert_eq!(err.kind, LexerErrorKind::UnclosedString);
        assert_eq!(err.position, SourcePosition::new(2, 1));
    }

    #[test]
    fn test_unclosed_brace() {
        let err = tokenize("x {a {b}").unwrap_err();
        assert_eq!(err.kind, LexerErrorKind::UnclosedBrace);
        assert_eq!(err.position, SourcePosition::new(1, 3));
        assert_eq!(err.to_string(), "unclosed brace at 1:3");
    }

    #[test]
    fn test_unicode_columns() {
        let tokens = tokenize("héllo{x}").unwrap();
        assert_eq!(tokens[1].position, SourcePosition::new(1, 6));
    }
}
