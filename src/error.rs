//! Compiler error type.
//!
//! Every fatal condition the pipeline can hit collapses into one of four
//! kinds (see the frontend's error-reporting contract). The optimiser and
//! code generator are not expected to produce errors: they only run on
//! trees that already passed type checking.

use std::fmt;
use std::path::Path;

#[derive(Debug, Clone)]
pub enum CompileError {
    /// Illegal character, unterminated string/comment, malformed number.
    Lexical { line: usize, message: String },
    /// Unexpected token, missing punctuator, grammar rule failure.
    Syntax { line: usize, message: String },
    /// Undeclared name, duplicate declaration, type mismatch, bad
    /// coercion, l-value violation, array-length mismatch, OOB index.
    Semantic { line: usize, message: String },
    /// Source could not be read, or output could not be written.
    Io(String),
    /// The C toolchain could not be invoked or failed to compile/link.
    Toolchain(String),
}

impl CompileError {
    pub fn lexical(line: usize, message: impl Into<String>) -> Self {
        CompileError::Lexical {
            line,
            message: message.into(),
        }
    }

    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        CompileError::Syntax {
            line,
            message: message.into(),
        }
    }

    pub fn semantic(line: usize, message: impl Into<String>) -> Self {
        CompileError::Semantic {
            line,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        CompileError::Io(message.into())
    }

    pub fn toolchain(message: impl Into<String>) -> Self {
        CompileError::Toolchain(message.into())
    }

    /// The process exit code this error kind maps to (see the CLI's
    /// documented exit-code contract).
    pub fn exit_code(&self) -> i32 {
        match self {
            CompileError::Lexical { .. }
            | CompileError::Syntax { .. }
            | CompileError::Semantic { .. } => 1,
            CompileError::Io(_) => 2,
            CompileError::Toolchain(_) => 3,
        }
    }

    /// Render the single stderr line for this error: `<filename>:<line>:
    /// <message>`, or `<filename>: <message>` for errors with no source
    /// position.
    pub fn report(&self, filename: &Path) -> String {
        match self {
            CompileError::Lexical { line, message } => {
                format!("{}:{}: lexical error: {}", filename.display(), line, message)
            }
            CompileError::Syntax { line, message } => {
                format!("{}:{}: syntax error: {}", filename.display(), line, message)
            }
            CompileError::Semantic { line, message } => {
                format!("{}:{}: {}", filename.display(), line, message)
            }
            CompileError::Io(message) => format!("{}: {}", filename.display(), message),
            CompileError::Toolchain(message) => format!("{}: {}", filename.display(), message),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::Lexical { line, message } => {
                write!(f, "lexical error at line {}: {}", line, message)
            }
            CompileError::Syntax { line, message } => {
                write!(f, "syntax error at line {}: {}", line, message)
            }
            CompileError::Semantic { line, message } => {
                write!(f, "at line {}: {}", line, message)
            }
            CompileError::Io(message) => write!(f, "{}", message),
            CompileError::Toolchain(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CompileError {}
