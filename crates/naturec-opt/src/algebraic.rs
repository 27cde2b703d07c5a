//! Pass 3: algebraic simplification.
//!
//! Identity and annihilator rewrites: `x+0`, `0+x`, `x-0`, `x-x`, `x*0`,
//! `0*x`, `x*1`, `1*x`, `x/1`, `x^0`, `x^1`. Rewrites producing `x` become
//! plain copies; rewrites producing a constant become loads.

use naturec_tac::{Instruction, Opcode, Operand, TacFunction};

fn is_zero(op: &Operand) -> bool {
    matches!(op, Operand::Int(0)) || matches!(op, Operand::Float(v) if *v == 0.0)
}

fn is_one(op: &Operand) -> bool {
    matches!(op, Operand::Int(1)) || matches!(op, Operand::Float(v) if *v == 1.0)
}

fn same_temp(a: &Operand, b: &Operand) -> bool {
    matches!((a.temp_id(), b.temp_id()), (Some(x), Some(y)) if x == y)
}

/// Rewrite to `result = src`.
fn convert_to_assign(instr: &mut Instruction, src: Operand) {
    instr.op = Opcode::Assign;
    instr.arg1 = src;
    instr.arg2 = Operand::None;
}

/// Rewrite to `result = LOAD_INT value`.
fn convert_to_int(instr: &mut Instruction, value: i64) {
    instr.op = Opcode::LoadInt;
    instr.arg1 = Operand::Int(value);
    instr.arg2 = Operand::None;
}

pub fn algebraic_simplification(func: &mut TacFunction, verbose: bool) -> usize {
    let mut count = 0;

    for instr in &mut func.instrs {
        if instr.is_dead {
            continue;
        }

        let a1_zero = is_zero(&instr.arg1);
        let a2_zero = is_zero(&instr.arg2);
        let a1_one = is_one(&instr.arg1);
        let a2_one = is_one(&instr.arg2);

        match instr.op {
            Opcode::Add => {
                if a2_zero {
                    if verbose {
                        println!("  [alg] x + 0 -> x");
                    }
                    let src = instr.arg1.clone();
                    convert_to_assign(instr, src);
                    count += 1;
                } else if a1_zero {
                    if verbose {
                        println!("  [alg] 0 + x -> x");
                    }
                    let src = instr.arg2.clone();
                    convert_to_assign(instr, src);
                    count += 1;
                }
            }

            Opcode::Sub => {
                if a2_zero {
                    if verbose {
                        println!("  [alg] x - 0 -> x");
                    }
                    let src = instr.arg1.clone();
                    convert_to_assign(instr, src);
                    count += 1;
                } else if same_temp(&instr.arg1, &instr.arg2) {
                    if verbose {
                        println!("  [alg] x - x -> 0");
                    }
                    convert_to_int(instr, 0);
                    count += 1;
                }
            }

            Opcode::Mul => {
                if a1_zero || a2_zero {
                    if verbose {
                        println!("  [alg] x * 0 -> 0");
                    }
                    convert_to_int(instr, 0);
                    count += 1;
                } else if a2_one {
                    if verbose {
                        println!("  [alg] x * 1 -> x");
                    }
                    let src = instr.arg1.clone();
                    convert_to_assign(instr, src);
                    count += 1;
                } else if a1_one {
                    if verbose {
                        println!("  [alg] 1 * x -> x");
                    }
                    let src = instr.arg2.clone();
                    convert_to_assign(instr, src);
                    count += 1;
                }
            }

            Opcode::Div => {
                if a2_one {
                    if verbose {
                        println!("  [alg] x / 1 -> x");
                    }
                    let src = instr.arg1.clone();
                    convert_to_assign(instr, src);
                    count += 1;
                }
            }

            Opcode::Pow => {
                if a2_zero {
                    if verbose {
                        println!("  [alg] x ^ 0 -> 1");
                    }
                    convert_to_int(instr, 1);
                    count += 1;
                } else if a2_one {
                    if verbose {
                        println!("  [alg] x ^ 1 -> x");
                    }
                    let src = instr.arg1.clone();
                    convert_to_assign(instr, src);
                    count += 1;
                }
            }

            _ => {}
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

    fn simplify_one(op: Opcode, a: Operand, b: Operand) -> (Opcode, Operand) {
        let mut func = TacFunction::new(None, DataType::Nothing);
        func.emit(op, temp(10), a, b);
        algebraic_simplification(&mut func, false);
        (func.instrs[0].op, func.instrs[0].arg1.clone())
    }

    #[test]
    fn additive_identities_become_copies() {
        assert_eq!(
            simplify_one(Opcode::Add, temp(0), Operand::Int(0)),
            (Opcode::Assign, temp(0))
        );
        assert_eq!(
            simplify_one(Opcode::Add, Operand::Int(0), temp(1)),
            (Opcode::Assign, temp(1))
        );
        assert_eq!(
            simplify_one(Opcode::Sub, temp(0), Operand::Int(0)),
            (Opcode::Assign, temp(0))
        );
    }

    #[test]
    fn self_subtraction_is_zero() {
        assert_eq!(
            simplify_one(Opcode::Sub, temp(3), temp(3)),
            (Opcode::LoadInt, Operand::Int(0))
        );
    }

    #[test]
    fn multiplicative_rules() {
        assert_eq!(
            simplify_one(Opcode::Mul, temp(0), Operand::Int(0)),
            (Opcode::LoadInt, Operand::Int(0))
        );
        assert_eq!(
            simplify_one(Opcode::Mul, Operand::Float(0.0), temp(0)),
            (Opcode::LoadInt, Operand::Int(0))
        );
        assert_eq!(
            simplify_one(Opcode::Mul, temp(0), Operand::Int(1)),
            (Opcode::Assign, temp(0))
        );
        assert_eq!(
            simplify_one(Opcode::Div, temp(0), Operand::Int(1)),
            (Opcode::Assign, temp(0))
        );
    }

    #[test]
    fn power_identities() {
        assert_eq!(
            simplify_one(Opcode::Pow, temp(0), Operand::Int(0)),
            (Opcode::LoadInt, Operand::Int(1))
        );
        assert_eq!(
            simplify_one(Opcode::Pow, temp(0), Operand::Int(1)),
            (Opcode::Assign, temp(0))
        );
    }

    #[test]
    fn unrelated_shapes_are_untouched() {
        let (op, _) = simplify_one(Opcode::Add, temp(0), temp(1));
        assert_eq!(op, Opcode::Add);
        let (op, _) = simplify_one(Opcode::Div, Operand::Int(1), temp(0));
        assert_eq!(op, Opcode::Div, "1 / x has no identity");
    }
}
