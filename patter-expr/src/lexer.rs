//! Expression lexer
//!
//! Splits embedded expression text into tokens. Columns are 1-based and
//! count characters within the expression text.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // 字面量
    Int,
    Float,
    Str,
    Identifier,
    True,
    False,
    Null,

    // 分隔符
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Comma,
    Semicolon,

    // 运算符
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Equal,
    DoubleEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AndAnd,
    OrOr,

    // 错误/状态
    Invalid,
    UnterminatedString,
    Eof,
}

/// A token borrowing its text from the expression source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw text; for strings this excludes the quotes
    pub text: &'a str,
    pub column: usize,
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            column: 1,
        }
    }

    /// Tokenize the whole input; the last token is always `Eof`
    pub fn tokenize(mut self) -> Vec<Token<'a>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.src[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        self.column += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace();

        let start = self.pos;
        let column = self.column;
        let Some(c) = self.bump() else {
            return Token {
                kind: TokenKind::Eof,
                text: "",
                column,
            };
        };

        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '!' => self.pair('=', TokenKind::BangEqual, TokenKind::Bang),
            '=' => self.pair('=', TokenKind::DoubleEqual, TokenKind::Equal),
            '<' => self.pair('=', TokenKind::LessEqual, TokenKind::Less),
            '>' => self.pair('=', TokenKind::GreaterEqual, TokenKind::Greater),
            '&' => self.pair('&', TokenKind::AndAnd, TokenKind::Invalid),
            '|' => self.pair('|', TokenKind::OrOr, TokenKind::Invalid),
            '"' | '\'' => return self.string(c, column),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => {
                while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
                    self.bump();
                }
                keyword(&self.src[start..self.pos])
            }
            _ => TokenKind::Invalid,
        };

        Token {
            kind,
            text: &self.src[start..self.pos],
            column,
        }
    }

    /// Two-character operator if `second` follows, otherwise the single form
    fn pair(&mut self, second: char, double: TokenKind, single: TokenKind) -> TokenKind {
        if self.peek() == Some(second) {
            self.bump();
            double
        } else {
            single
        }
    }

    fn number(&mut self) -> TokenKind {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '_') {
            self.bump();
        }
        let is_float = self.peek() == Some('.') && matches!(self.peek_second(), Some(c) if c.is_ascii_digit());
        if !is_float {
            return TokenKind::Int;
        }
        self.bump();
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '_') {
            self.bump();
        }
        TokenKind::Float
    }

    fn string(&mut self, quote: char, column: usize) -> Token<'a> {
        let content_start = self.pos;
        loop {
            match self.bump() {
                None => {
                    return Token {
                        kind: TokenKind::UnterminatedString,
                        text: &self.src[content_start..],
                        column,
                    }
                }
                Some('\\') => {
                    self.bump();
                }
                Some(c) if c == quote => {
                    let content_end = self.pos - quote.len_utf8();
                    return Token {
                        kind: TokenKind::Str,
                        text: &self.src[content_start..content_end],
                        column,
                    };
                }
                Some(_) => {}
            }
        }
    }
}

fn keyword(text: &str) -> TokenKind {
    match text {
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        _ => TokenKind::Identifier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_call_tokens() {
        assert_eq!(
            kinds("speed(\"fast\")"),
            vec![
                TokenKind::Identifier,
                TokenKind::LeftParen,
                TokenKind::Str,
                TokenKind::RightParen,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a == b != c <= d >= e && f || !g"),
            vec![
                TokenKind::Identifier,
                TokenKind::DoubleEqual,
                TokenKind::Identifier,
                TokenKind::BangEqual,
                TokenKind::Identifier,
                TokenKind::LessEqual,
                TokenKind::Identifier,
                TokenKind::GreaterEqual,
                TokenKind::Identifier,
                TokenKind::AndAnd,
                TokenKind::Identifier,
                TokenKind::OrOr,
                TokenKind::Bang,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = Lexer::new("12 3.5 1_000 7.").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Int);
        assert_eq!(tokens[1].kind, TokenKind::Float);
        assert_eq!(tokens[1].text, "3.5");
        assert_eq!(tokens[2].kind, TokenKind::Int);
        assert_eq!(tokens[2].text, "1_000");
        // "7." 不是浮点数
        assert_eq!(tokens[3].kind, TokenKind::Int);
        assert_eq!(tokens[4].kind, TokenKind::Invalid);
    }

    #[test]
    fn test_string_content_and_escaped_quote() {
        let tokens = Lexer::new(r#"'it\'s' "x""#).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].text, r"it\'s");
        assert_eq!(tokens[1].text, "x");
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = Lexer::new("\"abc").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::UnterminatedString);
        assert_eq!(tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn test_columns() {
        let tokens = Lexer::new("a +  bc").tokenize();
        assert_eq!(tokens[0].column, 1);
        assert_eq!(tokens[1].column, 3);
        assert_eq!(tokens[2].column, 6);
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("true false null nullable"),
            vec![
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }
}
