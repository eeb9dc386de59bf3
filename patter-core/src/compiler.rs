//! Compiler: [`Script`] -> [`Programme`]
//!
//! Resolves string escapes, validates every embedded expression and copies
//! all text into freshly owned storage. Never stops at the first problem:
//! every failing node contributes one entry to the [`CompileReport`].

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use patter_config::Phase;
use patter_expr::{escape::unescape, validate, Ast, Expr};
use thiserror::Error;
use tracing::debug;

use crate::position::SourcePosition;
use crate::syntax::{self, NodeKind, Script};

const TARGET: &str = Phase::Compiler.target();

/// Executable node. Expressions are shared so the runner can queue them cheaply.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    InstantString(String),
    TypewriterString(String),
    InlineExpr(Rc<Expr>),
    DeferredExpr(Rc<Expr>),
    InstantExpr(Rc<Expr>),
    TypewriterExpr(Rc<Expr>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Beat {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub name: String,
    pub beats: Vec<Beat>,
}

/// Compiled script, independent of the source it came from
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Programme {
    scenes: Vec<Scene>,
    index: HashMap<String, usize>,
}

impl Programme {
    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scene_index(name).map(|i| &self.scenes[i])
    }

    pub fn scene_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn scene_at(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    pub fn contains_scene(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Scene names in declaration order
    pub fn scene_names(&self) -> Vec<&str> {
        self.scenes.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn beat_count(&self, scene: &str) -> Option<usize> {
        self.scene(scene).map(|s| s.beats.len())
    }

    pub fn node_count(&self, scene: &str, beat: usize) -> Option<usize> {
        self.scene(scene)
            .and_then(|s| s.beats.get(beat))
            .map(|b| b.nodes.len())
    }

    /// Node lookup by indices
    pub fn node(&self, scene: usize, beat: usize, node: usize) -> Option<&Node> {
        self.scenes.get(scene)?.beats.get(beat)?.nodes.get(node)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

/// One failing node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub scene: String,
    pub beat: usize,
    pub node: usize,
    pub position: SourcePosition,
    pub messages: Vec<String>,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{} [{}] {}",
            self.scene,
            self.beat,
            self.node,
            self.position,
            self.messages.join("; ")
        )
    }
}

/// Every compile error of a script, in scene/beat/node order, one per line
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", join_lines(.errors))]
pub struct CompileReport {
    pub errors: Vec<CompileError>,
}

impl CompileReport {
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompileError> {
        self.errors.iter()
    }
}

fn join_lines(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Compile a script. The programme shares no memory with `script`.
pub fn compile(script: &Script<'_>) -> Result<Programme, CompileReport> {
    let mut programme = Programme::default();
    let mut report = CompileReport::default();

    for scene in script.scenes() {
        let mut beats = Vec::with_capacity(scene.beats.len());
        for (beat_index, beat) in scene.beats.iter().enumerate() {
            let mut nodes = Vec::with_capacity(beat.nodes.len());
            for (node_index, node) in beat.nodes.iter().enumerate() {
                match compile_node(node) {
                    Ok(compiled) => nodes.push(compiled),
                    Err(messages) => report.errors.push(CompileError {
                        scene: scene.name.to_string(),
                        beat: beat_index,
                        node: node_index,
                        position: node.position,
                        messages,
                    }),
                }
            }
            beats.push(Beat { nodes });
        }

        programme
            .index
            .insert(scene.name.to_string(), programme.scenes.len());
        programme.scenes.push(Scene {
            name: scene.name.to_string(),
            beats,
        });
    }

    if !report.is_empty() {
        debug!(target: TARGET, errors = report.len(), "compilation failed");
        return Err(report);
    }
    debug!(target: TARGET, scenes = programme.len(), "compiled programme");
    Ok(programme)
}

fn compile_node(node: &syntax::Node<'_>) -> Result<Node, Vec<String>> {
    let compiled = match &node.kind {
        NodeKind::Text(text) => Node::Text(text.to_string()),
        NodeKind::InstantString(raw) => Node::InstantString(unescape(raw)?),
        NodeKind::TypewriterString(raw) => Node::TypewriterString(unescape(raw)?),
        NodeKind::InlineExpr(ast) => Node::InlineExpr(compile_expr(ast)?),
        NodeKind::DeferredExpr(ast) => Node::DeferredExpr(compile_expr(ast)?),
        NodeKind::InstantExpr(ast) => Node::InstantExpr(compile_expr(ast)?),
        NodeKind::TypewriterExpr(ast) => Node::TypewriterExpr(compile_expr(ast)?),
    };
    Ok(compiled)
}

fn compile_expr(ast: &Ast) -> Result<Rc<Expr>, Vec<String>> {
    validate(ast).map(Rc::new).map_err(|diagnostics| {
        diagnostics
            .iter()
            .map(|d| format!("in '{}': {d}", ast.source()))
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_source;

    fn compile_src(src: &str) -> Result<Programme, CompileReport> {
        compile(&parse_source(src).expect("script should parse"))
    }

    #[test]
    fn test_compile_simple() {
        let programme = compile_src("::main\nHello\n;;\n{x = 1}#'a\\nb'").unwrap();
        assert_eq!(programme.scene_names(), vec!["main"]);
        assert_eq!(programme.beat_count("main"), Some(2));
        assert_eq!(programme.node_count("main", 1), Some(2));
        assert_eq!(
            programme.node(0, 1, 1),
            Some(&Node::InstantString("a\nb".to_string()))
        );
        assert!(matches!(programme.node(0, 1, 0), Some(Node::InlineExpr(_))));
    }

    #[test]
    fn test_unknown_escape_reported_once() {
        let report = compile_src("::main\nok @'bad \\q' fine").unwrap_err();
        assert_eq!(report.len(), 1);
        let error = &report.errors[0];
        assert_eq!((error.scene.as_str(), error.beat, error.node), ("main", 0, 1));
        assert_eq!(error.messages.len(), 1);
        assert!(error.messages[0].contains("\\q"));
        assert_eq!(error.position, SourcePosition::new(2, 4));
    }

    #[test]
    fn test_errors_aggregated_across_scenes() {
        let src = "::main\n{1 +}\n;;\n#'\\z'\n::other\n%{f()()}";
        let report = compile_src(src).unwrap_err();
        assert_eq!(report.len(), 3);
        let keys: Vec<_> = report
            .iter()
            .map(|e| (e.scene.as_str(), e.beat, e.node))
            .collect();
        assert_eq!(keys, vec![("main", 0, 0), ("main", 1, 0), ("other", 0, 0)]);
    }

    #[test]
    fn test_multiple_diagnostics_fold_into_one_entry() {
        let report = compile_src("::main\n{['\\q', '\\w']}").unwrap_err();
        assert_eq!(report.len(), 1);
        assert_eq!(report.errors[0].messages.len(), 2);
    }

    #[test]
    fn test_report_display() {
        let report = compile_src("::main\nhi {}").unwrap_err();
        assert_eq!(report.to_string(), "main:0:1 [2:4] in '': empty expression");

        let report = compile_src("::main\n{}\n;;\n{}").unwrap_err();
        assert_eq!(
            report.to_string(),
            "main:0:0 [2:1] in '': empty expression\nmain:1:0 [4:1] in '': empty expression"
        );
        let as_error: &dyn std::error::Error = &report;
        assert!(as_error.source().is_none());
    }

    #[test]
    fn test_programme_outlives_source() {
        let programme = {
            let source = String::from("::main\nowned text");
            compile_src(&source).unwrap()
        };
        assert_eq!(
            programme.node(0, 0, 0),
            Some(&Node::Text("owned text".to_string()))
        );
    }
}
