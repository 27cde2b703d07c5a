//! NatureLang syntax definitions and abstract syntax tree.
//!
//! This crate provides the foundational types shared by every stage of the
//! NatureLang compiler: token definitions, AST node types, the `DataType`
//! lattice used by both the analyzer and the TAC backend, and the diagnostic
//! types used for error reporting. All other crates in the workspace depend
//! on these types.

/// Token definitions produced by the lexer.
pub mod token;

/// Abstract syntax tree node definitions.
pub mod ast;

/// Diagnostics and error handling utilities.
pub mod error;

pub use ast::*;
pub use error::*;
pub use token::*;
