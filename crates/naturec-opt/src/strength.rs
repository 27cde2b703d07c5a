//! Pass 4: strength reduction.
//!
//! `x * 2` and `2 * x` become `x + x`; `x ^ 2` becomes `x * x`. Higher
//! powers are left for the runtime `pow`.

use naturec_tac::{Opcode, Operand, TacFunction};

pub fn strength_reduction(func: &mut TacFunction, verbose: bool) -> usize {
    let mut count = 0;

    for instr in &mut func.instrs {
        if instr.is_dead {
            continue;
        }

        if instr.op == Opcode::Mul {
            if instr.arg2 == Operand::Int(2) {
                if verbose {
                    println!("  [str] x * 2 -> x + x");
                }
                instr.op = Opcode::Add;
                instr.arg2 = instr.arg1.clone();
                count += 1;
            } else if instr.arg1 == Operand::Int(2) {
                if verbose {
                    println!("  [str] 2 * x -> x + x");
                }
                instr.op = Opcode::Add;
                instr.arg1 = instr.arg2.clone();
                count += 1;
            }
        }

        if instr.op == Opcode::Pow && instr.arg2 == Operand::Int(2) {
            if verbose {
                println!("  [str] x ^ 2 -> x * x");
            }
            instr.op = Opcode::Mul;
            instr.arg2 = instr.arg1.clone();
            count += 1;
        }
    }

    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use naturec_syntax::DataType;

    fn temp(id: u32) -> Operand {
        Operand::temp(id, DataType::Number)
    }

    fn reduce_one(op: Opcode, a: Operand, b: Operand) -> (Opcode, Operand, Operand) {
        let mut func = TacFunction::new(None, DataType::Nothing);
        func.emit(op, temp(10), a, b);
        strength_reduction(&mut func, false);
        (
            func.instrs[0].op,
            func.instrs[0].arg1.clone(),
            func.instrs[0].arg2.clone(),
        )
    }

    #[test]
    fn doubling_becomes_addition_on_either_side() {
        assert_eq!(
            reduce_one(Opcode::Mul, temp(0), Operand::Int(2)),
            (Opcode::Add, temp(0), temp(0))
        );
        assert_eq!(
            reduce_one(Opcode::Mul, Operand::Int(2), temp(1)),
            (Opcode::Add, temp(1), temp(1))
        );
    }

    #[test]
    fn squaring_becomes_multiplication() {
        assert_eq!(
            reduce_one(Opcode::Pow, temp(0), Operand::Int(2)),
            (Opcode::Mul, temp(0), temp(0))
        );
    }

    #[test]
    fn higher_powers_and_other_factors_are_left_alone() {
        let (op, ..) = reduce_one(Opcode::Pow, temp(0), Operand::Int(3));
        assert_eq!(op, Opcode::Pow);
        let (op, ..) = reduce_one(Opcode::Mul, temp(0), Operand::Int(4));
        assert_eq!(op, Opcode::Mul);
        // float 2.0 is not the integer pattern
        let (op, ..) = reduce_one(Opcode::Mul, temp(0), Operand::Float(2.0));
        assert_eq!(op, Opcode::Mul);
    }
}
