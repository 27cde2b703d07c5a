//! Diagnostics and error handling for the NatureLang toolchain.
//!
//! Two flavors of reporting coexist in the pipeline:
//!
//! - The frontend (lexer, parser) fails fast: a bad token or an unexpected
//!   keyword stops that stage, so those stages return [`Result`].
//! - The semantic analyzer collects: every violation becomes a
//!   [`Diagnostic`] and analysis continues so multiple errors surface in one
//!   run.
//!
//! Both carry optional 1-based line/column so the driver can point at the
//! offending source line.

use std::fmt;

use crate::ast::Loc;

/// How serious a collected diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A collected semantic diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub msg: String,
    pub loc: Loc,
}

impl Diagnostic {
    pub fn error(msg: impl Into<String>, loc: Loc) -> Self {
        Self {
            severity: Severity::Error,
            msg: msg.into(),
            loc,
        }
    }

    pub fn warning(msg: impl Into<String>, loc: Loc) -> Self {
        Self {
            severity: Severity::Warning,
            msg: msg.into(),
            loc,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.severity {
            Severity::Warning => "Warning",
            Severity::Error => "Semantic error",
        };
        write!(
            f,
            "{} at line {}:{}: {}",
            kind, self.loc.line, self.loc.col, self.msg
        )
    }
}

/// An error that stops a frontend stage.
#[derive(Debug, Clone)]
pub struct Error {
    pub msg: String,
    pub line: Option<usize>,
    pub col: Option<usize>,
}

impl Error {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            line: None,
            col: None,
        }
    }

    /// Error pinned to a source location.
    pub fn with_span(msg: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            msg: msg.into(),
            line: Some(line),
            col: Some(col),
        }
    }

    pub fn at(msg: impl Into<String>, loc: Loc) -> Self {
        Self::with_span(msg, loc.line, loc.col)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(l), Some(c)) = (self.line, self.col) {
            write!(f, "{} at {}:{}", self.msg, l, c)
        } else {
            write!(f, "{}", self.msg)
        }
    }
}

impl std::error::Error for Error {}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::new(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::new(s)
    }
}

/// Specialized result type used by the frontend stages.
pub type Result<T> = std::result::Result<T, Error>;

/// Shorthand for `Err(Error::new(msg))`.
pub fn error<T>(msg: impl Into<String>) -> Result<T> {
    Err(Error::new(msg))
}

/// Shorthand for `Err(Error::with_span(msg, line, col))`.
pub fn error_at<T>(line: usize, col: usize, msg: impl Into<String>) -> Result<T> {
    Err(Error::with_span(msg, line, col))
}
