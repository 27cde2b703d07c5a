//! Pass 2: constant propagation, within basic blocks.
//!
//! Temps loaded with constants are substituted into later uses. The table
//! is local to one pass invocation and resets at every block boundary
//! (`Label`, `FuncBegin`, `Call`), so nothing survives a jump target or a
//! call's side effects.

use std::collections::HashMap;

use naturec_tac::{Opcode, Operand, TacFunction};

pub fn constant_propagation(func: &mut TacFunction, verbose: bool) -> usize {
    let mut known: HashMap<u32, Operand> = HashMap::new();
    let mut count = 0;

    for instr in &mut func.instrs {
        if instr.is_dead {
            continue;
        }

        if matches!(instr.op, Opcode::Label | Opcode::FuncBegin | Opcode::Call) {
            known.clear();
            continue;
        }

        // record constants entering temps
        if let Some(id) = instr.result.temp_id() {
            if matches!(
                instr.op,
                Opcode::LoadInt | Opcode::LoadFloat | Opcode::LoadBool
            ) {
                if matches!(
                    instr.arg1,
                    Operand::Int(_) | Operand::Float(_) | Operand::Bool(_)
                ) {
                    known.insert(id, instr.arg1.clone());
                }
                continue;
            }
        }

        // substitute into source operands
        for arg in [&mut instr.arg1, &mut instr.arg2, &mut instr.arg3] {
            if let Some(id) = arg.temp_id() {
                if let Some(value) = known.get(&id) {
                    if verbose {
                        println!("  [prop] t{} -> {}", id, value);
                    }
                    *arg = value.clone();
                    count += 1;
                }
            }
        }

        // writing a temp kills its previous constant
        if let Some(id) = instr.result.temp_id() {
            known.remove(&id);
        }
    }

    count
}
