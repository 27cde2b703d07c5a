//! Pass 1: constant folding.
//!
//! Binary operations whose sources are both numeric constants are evaluated
//! at compile time and rewritten into loads. Division and modulo by zero
//! are left alone so the error surfaces at runtime, not in the compiler.

use naturec_tac::{Opcode, Operand, TacFunction};

use crate::is_binary_op;

pub fn constant_folding(func: &mut TacFunction, verbose: bool) -> usize {
    let mut count = 0;

    for instr in &mut func.instrs {
        if instr.is_dead {
            continue;
        }

        // binary ops with two numeric constants
        if is_binary_op(instr.op)
            && instr.arg1.is_numeric_const()
            && instr.arg2.is_numeric_const()
        {
            if let Some(value) = fold_binary(instr.op, &instr.arg1, &instr.arg2) {
                if verbose {
                    println!(
                        "  [fold] {} {}, {} -> {}",
                        instr.op, instr.arg1, instr.arg2, value
                    );
                }
                instr.op = load_opcode(&value);
                instr.arg1 = value;
                instr.arg2 = Operand::None;
                count += 1;
            }
        }

        // unary negation of a numeric constant
        if instr.op == Opcode::Neg {
            match instr.arg1 {
                Operand::Int(v) => {
                    if verbose {
                        println!("  [fold] NEG {} -> {}", v, v.wrapping_neg());
                    }
                    instr.op = Opcode::LoadInt;
                    instr.arg1 = Operand::Int(v.wrapping_neg());
                    instr.arg2 = Operand::None;
                    count += 1;
                }
                Operand::Float(v) => {
                    if verbose {
                        println!("  [fold] NEG {} -> {}", v, -v);
                    }
                    instr.op = Opcode::LoadFloat;
                    instr.arg1 = Operand::Float(-v);
                    instr.arg2 = Operand::None;
                    count += 1;
                }
                _ => {}
            }
        }

        // logical not of a boolean constant
        if instr.op == Opcode::Not {
            if let Operand::Bool(v) = instr.arg1 {
                if verbose {
                    println!("  [fold] NOT {} -> {}", v, !v);
                }
                instr.op = Opcode::LoadBool;
                instr.arg1 = Operand::Bool(!v);
                instr.arg2 = Operand::None;
                count += 1;
            }
        }

        // and/or of two boolean constants
        if matches!(instr.op, Opcode::And | Opcode::Or) {
            if let (Operand::Bool(a), Operand::Bool(b)) = (&instr.arg1, &instr.arg2) {
                let value = if instr.op == Opcode::And {
                    *a && *b
                } else {
                    *a || *b
                };
                if verbose {
                    println!("  [fold] {} -> {}", instr.op, value);
                }
                instr.op = Opcode::LoadBool;
                instr.arg1 = Operand::Bool(value);
                instr.arg2 = Operand::None;
                count += 1;
            }
        }
    }

    count
}

fn load_opcode(value: &Operand) -> Opcode {
    match value {
        Operand::Int(_) => Opcode::LoadInt,
        Operand::Float(_) => Opcode::LoadFloat,
        _ => Opcode::LoadBool,
    }
}

/// Evaluate one binary op over numeric constants. `None` means "do not
/// fold" (division by zero, modulo with a decimal operand, non-arithmetic
/// opcode).
fn fold_binary(op: Opcode, a: &Operand, b: &Operand) -> Option<Operand> {
    let ints = match (a.as_int(), b.as_int()) {
        (Some(ia), Some(ib)) => Some((ia, ib)),
        _ => None,
    };
    let x = a.as_numeric()?;
    let y = b.as_numeric()?;

    let value = match op {
        Opcode::Add => match ints {
            Some((ia, ib)) => Operand::Int(ia.wrapping_add(ib)),
            None => Operand::Float(x + y),
        },
        Opcode::Sub => match ints {
            Some((ia, ib)) => Operand::Int(ia.wrapping_sub(ib)),
            None => Operand::Float(x - y),
        },
        Opcode::Mul => match ints {
            Some((ia, ib)) => Operand::Int(ia.wrapping_mul(ib)),
            None => Operand::Float(x * y),
        },
        Opcode::Div => {
            if y == 0.0 {
                return None;
            }
            match ints {
                Some((ia, ib)) => Operand::Int(ia.wrapping_div(ib)),
                None => Operand::Float(x / y),
            }
        }
        Opcode::Mod => match ints {
            // integer-only; a decimal operand leaves the instruction alone
            Some((_, 0)) => return None,
            Some((ia, ib)) => Operand::Int(ia.wrapping_rem(ib)),
            None => return None,
        },
        Opcode::Pow => match ints {
            Some((ia, ib)) if ib >= 0 => {
                let mut result: i64 = 1;
                for _ in 0..ib {
                    result = result.wrapping_mul(ia);
                }
                Operand::Int(result)
            }
            _ => Operand::Float(x.powf(y)),
        },
        Opcode::Eq => Operand::Bool(x == y),
        Opcode::Neq => Operand::Bool(x != y),
        Opcode::Lt => Operand::Bool(x < y),
        Opcode::Gt => Operand::Bool(x > y),
        Opcode::Lte => Operand::Bool(x <= y),
        Opcode::Gte => Operand::Bool(x >= y),
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use naturec_syntax::DataType;

    fn fold_one(op: Opcode, a: Operand, b: Operand) -> (Opcode, Operand, usize) {
        let mut func = TacFunction::new(None, DataType::Nothing);
        func.emit(op, Operand::temp(0, DataType::Number), a, b);
        let n = constant_folding(&mut func, false);
        (func.instrs[0].op, func.instrs[0].arg1.clone(), n)
    }

    #[test]
    fn integer_arithmetic_folds_to_load_int() {
        assert_eq!(
            fold_one(Opcode::Add, Operand::Int(3), Operand::Int(4)),
            (Opcode::LoadInt, Operand::Int(7), 1)
        );
        assert_eq!(
            fold_one(Opcode::Mul, Operand::Int(6), Operand::Int(7)),
            (Opcode::LoadInt, Operand::Int(42), 1)
        );
        assert_eq!(
            fold_one(Opcode::Mod, Operand::Int(7), Operand::Int(3)),
            (Opcode::LoadInt, Operand::Int(1), 1)
        );
    }

    #[test]
    fn mixed_arithmetic_folds_to_load_float() {
        assert_eq!(
            fold_one(Opcode::Mul, Operand::Float(2.0), Operand::Int(3)),
            (Opcode::LoadFloat, Operand::Float(6.0), 1)
        );
    }

    #[test]
    fn division_by_zero_is_never_folded() {
        let (op, _, n) = fold_one(Opcode::Div, Operand::Int(1), Operand::Int(0));
        assert_eq!(op, Opcode::Div);
        assert_eq!(n, 0);
        let (op, _, n) = fold_one(Opcode::Mod, Operand::Int(1), Operand::Int(0));
        assert_eq!(op, Opcode::Mod);
        assert_eq!(n, 0);
    }

    #[test]
    fn modulo_with_a_decimal_operand_is_left_alone() {
        let (op, _, n) = fold_one(Opcode::Mod, Operand::Float(7.5), Operand::Int(2));
        assert_eq!(op, Opcode::Mod);
        assert_eq!(n, 0);
    }

    #[test]
    fn integer_pow_uses_integer_exponentiation() {
        assert_eq!(
            fold_one(Opcode::Pow, Operand::Int(2), Operand::Int(10)),
            (Opcode::LoadInt, Operand::Int(1024), 1)
        );
        // negative exponent goes through floating pow
        let (op, arg, _) = fold_one(Opcode::Pow, Operand::Int(2), Operand::Int(-1));
        assert_eq!(op, Opcode::LoadFloat);
        assert_eq!(arg, Operand::Float(0.5));
    }

    #[test]
    fn comparisons_fold_to_load_bool() {
        assert_eq!(
            fold_one(Opcode::Lt, Operand::Int(3), Operand::Int(4)),
            (Opcode::LoadBool, Operand::Bool(true), 1)
        );
        assert_eq!(
            fold_one(Opcode::Eq, Operand::Int(3), Operand::Float(3.0)),
            (Opcode::LoadBool, Operand::Bool(true), 1)
        );
    }

    #[test]
    fn unary_and_logical_constants_fold() {
        let mut func = TacFunction::new(None, DataType::Nothing);
        func.emit(
            Opcode::Neg,
            Operand::temp(0, DataType::Number),
            Operand::Int(5),
            Operand::None,
        );
        func.emit(
            Opcode::Not,
            Operand::temp(1, DataType::Flag),
            Operand::Bool(false),
            Operand::None,
        );
        func.emit(
            Opcode::And,
            Operand::temp(2, DataType::Flag),
            Operand::Bool(true),
            Operand::Bool(false),
        );
        assert_eq!(constant_folding(&mut func, false), 3);
        assert_eq!(func.instrs[0].arg1, Operand::Int(-5));
        assert_eq!(func.instrs[1].arg1, Operand::Bool(true));
        assert_eq!(func.instrs[2].arg1, Operand::Bool(false));
    }

    #[test]
    fn non_constant_operands_are_untouched() {
        let (op, _, n) = fold_one(
            Opcode::Add,
            Operand::temp(9, DataType::Number),
            Operand::Int(1),
        );
        assert_eq!(op, Opcode::Add);
        assert_eq!(n, 0);
    }

    #[test]
    fn overflow_wraps_instead_of_panicking() {
        let (op, arg, _) = fold_one(Opcode::Mul, Operand::Int(i64::MAX), Operand::Int(2));
        assert_eq!(op, Opcode::LoadInt);
        assert!(matches!(arg, Operand::Int(_)));
    }
}
