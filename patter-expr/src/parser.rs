//! Expression parser (precedence climbing)

use crate::ast::{Ast, AstKind, AstNode, BinaryOp, SyntaxIssue, UnaryOp};
use crate::lexer::{Lexer, Token, TokenKind};

/// Deepest nesting of sub-expressions accepted in one expression
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parse expression text into an [`Ast`]. Never fails; see [`Ast::issues`].
pub fn parse(source: &str) -> Ast {
    let tokens = Lexer::new(source).tokenize();
    let mut parser = Parser {
        tokens,
        current: 0,
        depth: 0,
    };

    if parser.check(TokenKind::Eof) {
        return Ast::new(source.to_string(), None, Vec::new());
    }

    match parser.parse_program() {
        Ok(root) => Ast::new(source.to_string(), Some(root), Vec::new()),
        Err(issue) => Ast::new(source.to_string(), None, vec![issue]),
    }
}

type ParseResult<T> = Result<T, SyntaxIssue>;

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    current: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Token<'a> {
        // tokenize() 保证末尾总有 Eof
        self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    fn consume(&mut self) -> Token<'a> {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.current += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.consume();
            true
        } else {
            false
        }
    }

    fn error_here(&self, message: impl Into<String>) -> SyntaxIssue {
        let token = self.peek();
        let message = message.into();
        let found = match token.kind {
            TokenKind::Eof => "end of expression".to_string(),
            _ => format!("'{}'", token.text),
        };
        SyntaxIssue {
            column: token.column,
            message: format!("{message}, found {found}"),
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> ParseResult<Token<'a>> {
        if self.check(kind) {
            Ok(self.consume())
        } else {
            Err(self.error_here(format!("expected {what}")))
        }
    }

    /// program := expr (';' expr)* ';'?
    fn parse_program(&mut self) -> ParseResult<AstNode> {
        let column = self.peek().column;
        let mut items = vec![self.parse_expression(0)?];

        while self.match_token(TokenKind::Semicolon) {
            if self.check(TokenKind::Eof) {
                break;
            }
            items.push(self.parse_expression(0)?);
        }

        if !self.check(TokenKind::Eof) {
            return Err(self.error_here("expected ';' or end of expression"));
        }

        if items.len() == 1 {
            Ok(items.remove(0))
        } else {
            Ok(AstNode::new(AstKind::Sequence(items), column))
        }
    }

    /// Every nested sub-expression passes through here or through a unary operator
    fn enter(&mut self) -> ParseResult<()> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(SyntaxIssue {
                column: self.peek().column,
                message: format!("expression nested too deeply (limit {MAX_NESTING_DEPTH})"),
            });
        }
        Ok(())
    }

    fn parse_expression(&mut self, min_precedence: i32) -> ParseResult<AstNode> {
        self.enter()?;
        let result = self.parse_binary(min_precedence);
        self.depth -= 1;
        result
    }

    fn parse_binary(&mut self, min_precedence: i32) -> ParseResult<AstNode> {
        let mut left = self.parse_unary()?;

        loop {
            let token = self.peek();
            let precedence = get_precedence(token.kind);
            if precedence <= min_precedence {
                break;
            }
            self.consume();

            let next_precedence = if is_left_associative(token.kind) {
                precedence
            } else {
                precedence - 1
            };
            let right = self.parse_expression(next_precedence)?;
            let column = left.column;

            let kind = match binary_op(token.kind) {
                Some(op) => AstKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                None => AstKind::Assign {
                    target: Box::new(left),
                    value: Box::new(right),
                },
            };
            left = AstNode::new(kind, column);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<AstNode> {
        let token = self.peek();
        let op = match token.kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        self.consume();
        self.enter()?;
        let operand = self.parse_unary();
        self.depth -= 1;
        let operand = operand?;
        Ok(AstNode::new(
            AstKind::Unary {
                op,
                operand: Box::new(operand),
            },
            token.column,
        ))
    }

    fn parse_postfix(&mut self) -> ParseResult<AstNode> {
        let mut node = self.parse_primary()?;
        while self.check(TokenKind::LeftParen) {
            self.consume();
            let args = self.parse_arguments(TokenKind::RightParen, "')'")?;
            let column = node.column;
            node = AstNode::new(
                AstKind::Call {
                    callee: Box::new(node),
                    args,
                },
                column,
            );
        }
        Ok(node)
    }

    /// Comma separated expressions up to and including `close`
    fn parse_arguments(&mut self, close: TokenKind, what: &str) -> ParseResult<Vec<AstNode>> {
        let mut args = Vec::new();
        if self.match_token(close) {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression(0)?);
            if self.match_token(TokenKind::Comma) {
                // 允许尾随逗号
                if self.match_token(close) {
                    return Ok(args);
                }
                continue;
            }
            self.expect(close, &format!("',' or {what}"))?;
            return Ok(args);
        }
    }

    fn parse_primary(&mut self) -> ParseResult<AstNode> {
        let token = self.peek();
        let kind = match token.kind {
            TokenKind::Int => AstKind::Int(token.text.to_string()),
            TokenKind::Float => AstKind::Float(token.text.to_string()),
            TokenKind::Str => AstKind::Str(token.text.to_string()),
            TokenKind::True => AstKind::Bool(true),
            TokenKind::False => AstKind::Bool(false),
            TokenKind::Null => AstKind::Null,
            TokenKind::Identifier => AstKind::Identifier(token.text.to_string()),
            TokenKind::LeftBracket => {
                self.consume();
                let items = self.parse_arguments(TokenKind::RightBracket, "']'")?;
                return Ok(AstNode::new(AstKind::List(items), token.column));
            }
            TokenKind::LeftParen => {
                self.consume();
                let inner = self.parse_expression(0)?;
                self.expect(TokenKind::RightParen, "')'")?;
                return Ok(inner);
            }
            TokenKind::UnterminatedString => {
                return Err(SyntaxIssue {
                    column: token.column,
                    message: "unterminated string literal".to_string(),
                })
            }
            _ => return Err(self.error_here("expected expression")),
        };
        self.consume();
        Ok(AstNode::new(kind, token.column))
    }
}

fn get_precedence(kind: TokenKind) -> i32 {
    match kind {
        TokenKind::Equal => 50,
        TokenKind::OrOr => 60,
        TokenKind::AndAnd => 80,
        TokenKind::DoubleEqual | TokenKind::BangEqual => 100,
        TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => 150,
        TokenKind::Plus | TokenKind::Minus => 200,
        TokenKind::Star | TokenKind::Slash | TokenKind::Percent => 300,
        _ => 0,
    }
}

/// Assignment is the only right-associative operator
fn is_left_associative(kind: TokenKind) -> bool {
    kind != TokenKind::Equal
}

fn binary_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Percent => BinaryOp::Mod,
        TokenKind::DoubleEqual => BinaryOp::Eq,
        TokenKind::BangEqual => BinaryOp::Ne,
        TokenKind::Less => BinaryOp::Lt,
        TokenKind::LessEqual => BinaryOp::Le,
        TokenKind::Greater => BinaryOp::Gt,
        TokenKind::GreaterEqual => BinaryOp::Ge,
        TokenKind::AndAnd => BinaryOp::And,
        TokenKind::OrOr => BinaryOp::Or,
        _ => return None,
    };
    Some(op)
}
