//! Lowering from the NatureLang AST to three-address code.
//!
//! Consumes an analyzer-annotated AST and produces a [`naturec_tac::TacProgram`].
//! Lowering is total: every AST shape has a lowering, and constructs the
//! analyzer already rejected (a stray `stop`, a valueless `display`) are
//! skipped rather than panicked on.

pub mod lower;

pub use lower::{lower, IrBuilder};
