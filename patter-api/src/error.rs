//! API 错误类型
//!
//! 提供统一的错误类型和结构化错误报告。

use patter_config::Phase;
use serde::Serialize;
use thiserror::Error;

pub use patter_core::{CompileReport, LexerError, ParserError, SyntaxError};

/// Patter 错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatterError {
    /// 词法分析错误
    #[error("{0}")]
    Lexer(#[from] LexerError),

    /// 结构错误
    #[error("{0}")]
    Parser(#[from] ParserError),

    /// 编译错误，可能包含多条
    #[error("Compile error:\n{0}")]
    Compile(#[from] CompileReport),

    #[error("unknown scene '{0}'")]
    UnknownScene(String),
}

impl From<SyntaxError> for PatterError {
    fn from(error: SyntaxError) -> Self {
        match error {
            SyntaxError::Lexer(e) => PatterError::Lexer(e),
            SyntaxError::Parser(e) => PatterError::Parser(e),
        }
    }
}

impl PatterError {
    /// 错误所属阶段
    pub fn phase(&self) -> Phase {
        match self {
            PatterError::Lexer(_) => Phase::Tokenizer,
            PatterError::Parser(_) => Phase::Parser,
            PatterError::Compile(_) => Phase::Compiler,
            PatterError::UnknownScene(_) => Phase::Runner,
        }
    }

    /// 转换为结构化错误报告
    ///
    /// 编译错误每个失败节点一条，其余错误恰好一条。
    pub fn to_reports(&self) -> Vec<ErrorReport> {
        let phase = self.phase();
        match self {
            PatterError::Lexer(e) => vec![ErrorReport {
                line: Some(e.line()),
                column: Some(e.column()),
                error_kind: format!("{:?}", e.kind),
                message: e.to_string(),
                ..ErrorReport::new(phase)
            }],
            PatterError::Parser(e) => vec![ErrorReport {
                error_kind: format!("{e:?}"),
                message: e.to_string(),
                ..ErrorReport::new(phase)
            }],
            PatterError::Compile(report) => report
                .iter()
                .map(|e| ErrorReport {
                    scene: Some(e.scene.clone()),
                    beat: Some(e.beat),
                    node: Some(e.node),
                    line: Some(e.position.line),
                    column: Some(e.position.column),
                    error_kind: "CompileError".to_string(),
                    message: e.messages.join("; "),
                    ..ErrorReport::new(phase)
                })
                .collect(),
            PatterError::UnknownScene(name) => vec![ErrorReport {
                scene: Some(name.clone()),
                error_kind: "UnknownScene".to_string(),
                message: self.to_string(),
                ..ErrorReport::new(phase)
            }],
        }
    }
}

/// 结构化错误报告
///
/// 上层应用（CLI、编辑器插件）可以直接打印，也可以序列化为 JSON。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub phase: Phase,
    pub scene: Option<String>,
    pub beat: Option<usize>,
    pub node: Option<usize>,
    /// 1-based
    pub line: Option<usize>,
    /// 1-based
    pub column: Option<usize>,
    /// 错误类型（可用于程序化处理）
    pub error_kind: String,
    pub message: String,
}

impl ErrorReport {
    fn new(phase: Phase) -> Self {
        Self {
            phase,
            scene: None,
            beat: None,
            node: None,
            line: None,
            column: None,
            error_kind: String::new(),
            message: String::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// 简洁格式（适合终端）
    pub fn to_short(&self) -> String {
        format!("{}: {}", self.phase.as_str(), self.message)
    }
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let phase = self.phase.as_str();
        match (self.line, self.column) {
            (Some(line), Some(col)) => {
                write!(f, "[{line}:{col}] {phase} error: {}", self.message)
            }
            _ => write!(f, "[{phase}] {phase} error: {}", self.message),
        }
    }
}

/// 一组报告序列化为 JSON 数组
pub fn reports_to_json(reports: &[ErrorReport]) -> serde_json::Result<String> {
    serde_json::to_string(reports)
}
