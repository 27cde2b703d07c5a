//! Pass 6: dead code elimination.
//!
//! An instruction producing a temp nobody reads is marked dead. The use
//! scan covers the whole function in both directions: loop back-edges mean
//! a temp defined late can be consumed at the loop header.

use naturec_tac::{Opcode, TacFunction};

/// Opcodes whose effects reach beyond their result operand. Never
/// eliminable.
fn has_side_effect(op: Opcode) -> bool {
    matches!(
        op,
        Opcode::Display
            | Opcode::Read
            | Opcode::Ask
            | Opcode::Call
            | Opcode::Param
            | Opcode::Return
            | Opcode::Goto
            | Opcode::IfGoto
            | Opcode::IfFalseGoto
            | Opcode::Label
            | Opcode::FuncBegin
            | Opcode::FuncEnd
            | Opcode::ScopeBegin
            | Opcode::ScopeEnd
            | Opcode::SecureBegin
            | Opcode::SecureEnd
            | Opcode::Decl
            | Opcode::Break
            | Opcode::Continue
            | Opcode::ListAppend
            | Opcode::ListSet
    )
}

pub fn dead_code_elimination(func: &mut TacFunction, verbose: bool) -> usize {
    let mut count = 0;

    for i in 0..func.instrs.len() {
        let instr = &func.instrs[i];
        if instr.is_dead || has_side_effect(instr.op) {
            continue;
        }
        // only results held in temps are candidates; named variables are
        // observable program state
        let Some(id) = instr.result.temp_id() else {
            continue;
        };

        let used = func.instrs.iter().enumerate().any(|(j, other)| {
            if j == i || other.is_dead {
                return false;
            }
            // list mutation reads the list held in its result slot
            other.uses_temp(id)
                || (matches!(other.op, Opcode::ListAppend | Opcode::ListSet)
                    && other.result.temp_id() == Some(id))
        });

        if !used {
            if verbose {
                println!("  [dce] dead: t{} from {}", id, func.instrs[i].op);
            }
            func.instrs[i].is_dead = true;
            count += 1;
        }
    }

    count
}
