//! Pass 5: redundant load elimination.
//!
//! A constant loaded twice in the same basic block only needs one temp; the
//! second load becomes a copy of the first. The tracking table resets on
//! every control-flow instruction, including plain jumps.

use naturec_syntax::DataType;
use naturec_tac::{Opcode, Operand, TacFunction};

struct RecentLoad {
    op: Opcode,
    value: Operand,
    temp_id: u32,
    ty: DataType,
}

pub fn redundant_load_elimination(func: &mut TacFunction, verbose: bool) -> usize {
    let mut recent: Vec<RecentLoad> = Vec::new();
    let mut count = 0;

    for instr in &mut func.instrs {
        if instr.is_dead {
            continue;
        }

        if matches!(
            instr.op,
            Opcode::Label
                | Opcode::FuncBegin
                | Opcode::Call
                | Opcode::Goto
                | Opcode::IfGoto
                | Opcode::IfFalseGoto
        ) {
            recent.clear();
            continue;
        }

        let Some(id) = instr.result.temp_id() else {
            continue;
        };
        if !matches!(
            instr.op,
            Opcode::LoadInt | Opcode::LoadFloat | Opcode::LoadBool
        ) {
            continue;
        }

        if let Some(prev) = recent
            .iter()
            .find(|r| r.op == instr.op && r.value == instr.arg1)
        {
            if verbose {
                println!("  [rle] t{} = same as t{}", id, prev.temp_id);
            }
            instr.op = Opcode::Assign;
            instr.arg1 = Operand::temp(prev.temp_id, prev.ty);
            instr.arg2 = Operand::None;
            count += 1;
        } else {
            recent.push(RecentLoad {
                op: instr.op,
                value: instr.arg1.clone(),
                temp_id: id,
                ty: instr.result.ty(),
            });
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp(id: u32) -> Operand {
        Operand::temp(id, DataType::Number)
    }

    #[test]
    fn duplicate_loads_become_copies() {
        let mut func = TacFunction::new(None, DataType::Nothing);
        func.emit(Opcode::LoadInt, temp(0), Operand::Int(5), Operand::None);
        func.emit(Opcode::LoadInt, temp(1), Operand::Int(5), Operand::None);
        assert_eq!(redundant_load_elimination(&mut func, false), 1);
        assert_eq!(func.instrs[1].op, Opcode::Assign);
        assert_eq!(func.instrs[1].arg1, temp(0));
    }

    #[test]
    fn different_values_or_opcodes_do_not_match() {
        let mut func = TacFunction::new(None, DataType::Nothing);
        func.emit(Opcode::LoadInt, temp(0), Operand::Int(5), Operand::None);
        func.emit(Opcode::LoadInt, temp(1), Operand::Int(6), Operand::None);
        func.emit(
            Opcode::LoadFloat,
            Operand::temp(2, DataType::Decimal),
            Operand::Float(5.0),
            Operand::None,
        );
        assert_eq!(redundant_load_elimination(&mut func, false), 0);
    }

    #[test]
    fn any_control_flow_resets_tracking() {
        let mut func = TacFunction::new(None, DataType::Nothing);
        func.emit(Opcode::LoadInt, temp(0), Operand::Int(5), Operand::None);
        func.emit_goto(3);
        func.emit(Opcode::LoadInt, temp(1), Operand::Int(5), Operand::None);
        assert_eq!(redundant_load_elimination(&mut func, false), 0);
        assert_eq!(func.instrs[2].op, Opcode::LoadInt);
    }

    #[test]
    fn rle_property_no_duplicate_loads_remain_in_a_block() {
        let mut func = TacFunction::new(None, DataType::Nothing);
        for id in 0..4 {
            func.emit(Opcode::LoadInt, temp(id), Operand::Int(9), Operand::None);
        }
        redundant_load_elimination(&mut func, false);
        let loads: Vec<_> = func
            .instrs
            .iter()
            .filter(|i| i.op == Opcode::LoadInt)
            .map(|i| i.arg1.clone())
            .collect();
        assert_eq!(loads.len(), 1, "one canonical load per constant per block");
    }
}
