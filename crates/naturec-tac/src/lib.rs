//! Three-address code (TAC) IR for the NatureLang compiler.
//!
//! This crate defines the instruction set, operand representation, and
//! program container that sit between the AST and C code generation.
//! Instructions have the form `result = arg1 op arg2` (plus a third source
//! operand for the `between` range test), which keeps the optimizer's
//! pattern matching simple and machine-independent.

pub mod instruction;
pub mod operand;
pub mod program;

pub use instruction::{Instruction, Opcode};
pub use operand::Operand;
pub use program::{TacFunction, TacProgram};
