// src/error.rs

use std::fmt;
use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, NanoError>;

#[derive(Debug, Error)]
pub enum NanoError {
    /// Invalid construction parameters (negative lengths, bad scaling matrix, ...).
    #[error("invalid {param}: {reason}")]
    Configuration { param: String, reason: String },

    #[error("selection parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("type mismatch for attribute '{attribute}': expected {expected}, found {found}")]
    TypeMismatch {
        attribute: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("unknown atom attribute '{0}'")]
    UnknownAttribute(String),

    #[error("spatial index error: {0}")]
    SpatialIndex(String),

    #[error("{format} format error at line {line}: {reason}")]
    Format {
        format: &'static str,
        line: usize,
        reason: String,
    },

    #[error("unsupported structure format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl NanoError {
    pub fn config(param: impl Into<String>, reason: impl Into<String>) -> Self {
        NanoError::Configuration {
            param: param.into(),
            reason: reason.into(),
        }
    }
}

/// What went wrong while compiling a selection string.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    EmptyInput,
    UnknownKeyword(String),
    UnbalancedParen,
    UnexpectedEnd { expected: &'static str },
    UnexpectedToken { expected: &'static str, found: String },
    InvalidNumber(String),
    EmptyList { keyword: &'static str },
    UnknownShape(String),
    BadShapeArgs { shape: String, reason: String },
}

/// A selection-language error with the character offset it was detected at.
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ParseError {
    pub pos: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(pos: usize, kind: ParseErrorKind) -> Self {
        Self { pos, kind }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pos = self.pos;
        match &self.kind {
            ParseErrorKind::EmptyInput => write!(f, "empty selection string"),
            ParseErrorKind::UnknownKeyword(word) => {
                write!(f, "unknown keyword '{word}' at position {pos}")
            }
            ParseErrorKind::UnbalancedParen => {
                write!(f, "unbalanced parenthesis at position {pos}")
            }
            ParseErrorKind::UnexpectedEnd { expected } => {
                write!(f, "expected {expected}, got end of input")
            }
            ParseErrorKind::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected} at position {pos}, found '{found}'")
            }
            ParseErrorKind::InvalidNumber(text) => {
                write!(f, "invalid number '{text}' at position {pos}")
            }
            ParseErrorKind::EmptyList { keyword } => {
                write!(f, "'{keyword}' at position {pos} needs at least one value")
            }
            ParseErrorKind::UnknownShape(name) => {
                write!(f, "unknown region '{name}' at position {pos}")
            }
            ParseErrorKind::BadShapeArgs { shape, reason } => {
                write!(f, "bad arguments for {shape} at position {pos}: {reason}")
            }
        }
    }
}
