//! Syntax tree builder
//!
//! Groups tokens into scenes made of beats. The resulting [`Script`] borrows
//! every piece of text from the source; expression tokens are pre-parsed into
//! expression ASTs.

use std::collections::HashMap;

use patter_config::Phase;
use patter_expr::Ast;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::position::SourcePosition;
use crate::tokenizer::{tokenize, LexerError, Token, TokenKind};

const TARGET: &str = Phase::Parser.target();

/// Name of the scene every script must declare
pub const MAIN_SCENE: &str = "main";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error("script has no 'main' scene")]
    MissingMain,
}

/// Structural error: the script could not be turned into a syntax tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parser(#[from] ParserError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind<'a> {
    Text(&'a str),
    InstantString(&'a str),
    TypewriterString(&'a str),
    InlineExpr(Ast),
    DeferredExpr(Ast),
    InstantExpr(Ast),
    TypewriterExpr(Ast),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node<'a> {
    pub kind: NodeKind<'a>,
    pub position: SourcePosition,
}

impl Node<'_> {
    /// A node holding exactly one newline
    fn is_newline(&self) -> bool {
        matches!(self.kind, NodeKind::Text("\n"))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Beat<'a> {
    pub nodes: Vec<Node<'a>>,
}

impl<'a> Beat<'a> {
    /// Close a node list, trimming single-newline nodes at both ends
    fn close(mut nodes: Vec<Node<'a>>) -> Self {
        while nodes.last().is_some_and(Node::is_newline) {
            nodes.pop();
        }
        let leading = nodes.iter().take_while(|n| n.is_newline()).count();
        nodes.drain(..leading);
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene<'a> {
    pub name: &'a str,
    pub position: SourcePosition,
    pub beats: Vec<Beat<'a>>,
}

/// 脚本语法树：场景名 -> 场景
#[derive(Debug, Clone, PartialEq)]
pub struct Script<'a> {
    scenes: Vec<Scene<'a>>,
    index: HashMap<&'a str, usize>,
}

impl<'a> Script<'a> {
    pub fn scene(&self, name: &str) -> Option<&Scene<'a>> {
        self.index.get(name).map(|&i| &self.scenes[i])
    }

    /// Scene names in declaration order
    pub fn scene_names(&self) -> Vec<&'a str> {
        self.scenes.iter().map(|s| s.name).collect()
    }

    pub fn scenes(&self) -> impl Iterator<Item = &Scene<'a>> {
        self.scenes.iter()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

/// Tokenize and build in one step
pub fn parse_source(source: &str) -> Result<Script<'_>, SyntaxError> {
    let tokens = tokenize(source)?;
    Ok(build(&tokens)?)
}

/// Build a script from a token stream
pub fn build<'a>(tokens: &[Token<'a>]) -> Result<Script<'a>, ParserError> {
    let mut builder = Builder::default();

    for token in tokens {
        match token.kind {
            TokenKind::SceneDecl => builder.start_scene(token.text, token.position),
            TokenKind::BeatSeparator => builder.close_beat(),
            TokenKind::Eof => break,
            _ => builder.push(token),
        }
    }
    builder.finish_scene();

    let script = Script {
        scenes: builder.scenes,
        index: builder.index,
    };
    if script.scene(MAIN_SCENE).is_none() {
        return Err(ParserError::MissingMain);
    }
    debug!(target: TARGET, scenes = script.len(), "built script");
    Ok(script)
}

#[derive(Default)]
struct Builder<'a> {
    current: Option<(&'a str, SourcePosition)>,
    beats: Vec<Beat<'a>>,
    open: Vec<Node<'a>>,
    scenes: Vec<Scene<'a>>,
    index: HashMap<&'a str, usize>,
}

impl<'a> Builder<'a> {
    fn start_scene(&mut self, name: &'a str, position: SourcePosition) {
        self.finish_scene();
        self.current = Some((name, position));
    }

    fn close_beat(&mut self) {
        // 第一个场景声明之前的内容直接丢弃
        if self.current.is_none() {
            self.open.clear();
            return;
        }
        let nodes = std::mem::take(&mut self.open);
        self.beats.push(Beat::close(nodes));
    }

    fn push(&mut self, token: &Token<'a>) {
        if self.current.is_none() {
            return;
        }
        let kind = match token.kind {
            TokenKind::Text => NodeKind::Text(token.text),
            TokenKind::InstantString => NodeKind::InstantString(token.text),
            TokenKind::TypewriterString => NodeKind::TypewriterString(token.text),
            TokenKind::InlineExpr => NodeKind::InlineExpr(patter_expr::parse(token.text)),
            TokenKind::DeferredExpr => NodeKind::DeferredExpr(patter_expr::parse(token.text)),
            TokenKind::InstantExpr => NodeKind::InstantExpr(patter_expr::parse(token.text)),
            TokenKind::TypewriterExpr => NodeKind::TypewriterExpr(patter_expr::parse(token.text)),
            TokenKind::SceneDecl | TokenKind::BeatSeparator | TokenKind::Eof => return,
        };
        self.open.push(Node {
            kind,
            position: token.position,
        });
    }

    fn finish_scene(&mut self) {
        let Some((name, position)) = self.current.take() else {
            self.open.clear();
            return;
        };

        let trailing = Beat::close(std::mem::take(&mut self.open));
        if !trailing.is_empty() {
            self.beats.push(trailing);
        }
        let scene = Scene {
            name,
            position,
            beats: std::mem::take(&mut self.beats),
        };
        trace!(target: TARGET, scene = name, beats = scene.beats.len(), "scene finished");

        match self.index.get(name) {
            Some(&existing) => {
                warn!(target: TARGET, scene = name, at = %position, "scene declared again, replacing earlier content");
                self.scenes[existing] = scene;
            }
            None => {
                self.index.insert(name, self.scenes.len());
                self.scenes.push(scene);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::LexerErrorKind;

    fn texts<'a>(beat: &Beat<'a>) -> Vec<&'a str> {
        beat.nodes
            .iter()
            .map(|n| match n.kind {
                NodeKind::Text(t) => t,
                _ => "<node>",
            })
            .collect()
    }

    #[test]
    fn test_single_scene_two_beats() {
        let script = parse_source("::main\nHello\nthere\n;;\nBye\n").unwrap();
        let main = script.scene("main").unwrap();
        assert_eq!(main.beats.len(), 2);
        assert_eq!(texts(&main.beats[0]), vec!["Hello", "\n", "there"]);
        assert_eq!(texts(&main.beats[1]), vec!["Bye"]);
    }

    #[test]
    fn test_missing_main() {
        let err = parse_source("::intro\nHi").unwrap_err();
        assert_eq!(err, SyntaxError::Parser(ParserError::MissingMain));
    }

    #[test]
    fn test_lexer_error_surfaces() {
        let err = parse_source("::main\n{oops").unwrap_err();
        match err {
            SyntaxError::Lexer(e) => assert_eq!(e.kind, LexerErrorKind::UnclosedBrace),
            other => panic!("expected lexer error, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_separator_yields_empty_beat() {
        let script = parse_source("::main\n;;\n\n;;\nEnd").unwrap();
        let main = script.scene("main").unwrap();
        assert_eq!(main.beats.len(), 3);
        assert!(main.beats[0].is_empty());
        assert!(main.beats[1].is_empty());
        assert_eq!(texts(&main.beats[2]), vec!["End"]);
    }

    #[test]
    fn test_trailing_whitespace_only_content_is_not_a_beat() {
        let script = parse_source("::main\nA\n;;\n\n\n").unwrap();
        assert_eq!(script.scene("main").unwrap().beats.len(), 1);
    }

    #[test]
    fn test_empty_scene_has_no_beats() {
        let script = parse_source("::empty\n::main\nx").unwrap();
        assert!(script.scene("empty").unwrap().beats.is_empty());
        assert_eq!(script.scene_names(), vec!["empty", "main"]);
    }

    #[test]
    fn test_content_before_first_scene_dropped() {
        let script = parse_source("preamble {x}\n;;\n::main\nbody").unwrap();
        let main = script.scene("main").unwrap();
        assert_eq!(main.beats.len(), 1);
        assert_eq!(texts(&main.beats[0]), vec!["body"]);
    }

    #[test]
    fn test_node_kinds_and_positions() {
        let script = parse_source("::main\nA{x}%{y}#{z}@{w}#'s'@\"t\"").unwrap();
        let nodes = &script.scene("main").unwrap().beats[0].nodes;
        assert_eq!(nodes.len(), 7);
        assert!(matches!(nodes[1].kind, NodeKind::InlineExpr(_)));
        assert!(matches!(nodes[2].kind, NodeKind::DeferredExpr(_)));
        assert!(matches!(nodes[3].kind, NodeKind::InstantExpr(_)));
        assert!(matches!(nodes[4].kind, NodeKind::TypewriterExpr(_)));
        assert_eq!(nodes[5].kind, NodeKind::InstantString("s"));
        assert_eq!(nodes[6].kind, NodeKind::TypewriterString("t"));
        assert_eq!(nodes[1].position, SourcePosition::new(2, 2));
    }

    #[test]
    fn test_expression_pre_parsed() {
        let script = parse_source("::main\n{speed('fast')}").unwrap();
        match &script.scene("main").unwrap().beats[0].nodes[0].kind {
            NodeKind::InlineExpr(ast) => {
                assert_eq!(ast.source(), "speed('fast')");
                assert!(!ast.has_issues());
            }
            other => panic!("expected inline expression, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_scene_replaces() {
        let script = parse_source("::main\nfirst\n::other\no\n::main\nsecond").unwrap();
        assert_eq!(script.len(), 2);
        assert_eq!(script.scene_names(), vec!["main", "other"]);
        let main = script.scene("main").unwrap();
        assert_eq!(texts(&main.beats[0]), vec!["second"]);
    }
}
