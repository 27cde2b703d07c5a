//! Machine-independent optimization passes over the TAC IR.
//!
//! Six classic passes run to a fixpoint:
//!
//!  1. constant propagation (so folding sees the freshest constants)
//!  2. constant folding
//!  3. algebraic simplification (`x+0`, `x*1`, ...)
//!  4. strength reduction (`x*2 -> x+x`, `x^2 -> x*x`)
//!  5. redundant load elimination
//!  6. dead code elimination
//!
//! Passes rewrite instructions in place or mark them dead; none of them
//! adds or removes instructions. Physical removal happens once, in the
//! final [`sweep`].

pub mod algebraic;
pub mod dce;
pub mod folding;
pub mod propagation;
pub mod redundant;
pub mod strength;

use serde::Serialize;

use naturec_tac::{Opcode, TacFunction, TacProgram};

pub use algebraic::algebraic_simplification;
pub use dce::dead_code_elimination;
pub use folding::constant_folding;
pub use propagation::constant_propagation;
pub use redundant::redundant_load_elimination;
pub use strength::strength_reduction;

/// Fixpoint safety cap.
const MAX_ITERATIONS: usize = 10;

/// The three optimization levels the driver exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptLevel {
    O0,
    O1,
    O2,
}

impl OptLevel {
    /// Clamp a numeric `-O` argument to a level.
    pub fn from_u8(level: u8) -> Self {
        match level {
            0 => OptLevel::O0,
            1 => OptLevel::O1,
            _ => OptLevel::O2,
        }
    }
}

/// Which passes run, and how loudly.
#[derive(Debug, Clone)]
pub struct OptOptions {
    pub level: OptLevel,
    pub verbose: bool,
    pub constant_folding: bool,
    pub constant_propagation: bool,
    pub algebraic_simplification: bool,
    pub strength_reduction: bool,
    pub redundant_load_elimination: bool,
    pub dead_code_elimination: bool,
}

impl OptOptions {
    /// Pass selection for a level: O0 nothing, O1 folding + DCE, O2 all.
    pub fn for_level(level: OptLevel) -> Self {
        let mut opts = Self {
            level,
            verbose: false,
            constant_folding: false,
            constant_propagation: false,
            algebraic_simplification: false,
            strength_reduction: false,
            redundant_load_elimination: false,
            dead_code_elimination: false,
        };
        match level {
            OptLevel::O0 => {}
            OptLevel::O1 => {
                opts.constant_folding = true;
                opts.dead_code_elimination = true;
            }
            OptLevel::O2 => {
                opts.constant_folding = true;
                opts.constant_propagation = true;
                opts.algebraic_simplification = true;
                opts.strength_reduction = true;
                opts.redundant_load_elimination = true;
                opts.dead_code_elimination = true;
            }
        }
        opts
    }
}

/// Per-pass transformation counters for one `optimize` run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OptStats {
    pub passes_run: usize,
    pub constants_folded: usize,
    pub constants_propagated: usize,
    pub algebraic_simplifications: usize,
    pub strength_reductions: usize,
    pub redundant_loads_removed: usize,
    pub dead_instructions_removed: usize,
    pub total_instructions_before: usize,
    pub total_instructions_after: usize,
}

/// Optimize the whole program: main first, then each user function.
pub fn optimize(program: &mut TacProgram, options: &OptOptions) -> OptStats {
    let mut stats = OptStats::default();
    if options.level == OptLevel::O0 {
        return stats;
    }

    stats.total_instructions_before = program.total_instructions();

    optimize_function(&mut program.main, options, &mut stats);
    for func in &mut program.functions {
        optimize_function(func, options, &mut stats);
    }

    stats.total_instructions_after = program.total_instructions();
    stats
}

/// Run the enabled passes over one function until none of them transforms
/// anything (or the iteration cap is hit), then sweep out dead code.
pub fn optimize_function(func: &mut TacFunction, options: &OptOptions, stats: &mut OptStats) {
    for _ in 0..MAX_ITERATIONS {
        let mut changes = 0;

        if options.constant_propagation {
            let n = constant_propagation(func, options.verbose);
            changes += n;
            stats.constants_propagated += n;
        }
        if options.constant_folding {
            let n = constant_folding(func, options.verbose);
            changes += n;
            stats.constants_folded += n;
        }
        if options.algebraic_simplification {
            let n = algebraic_simplification(func, options.verbose);
            changes += n;
            stats.algebraic_simplifications += n;
        }
        if options.strength_reduction {
            let n = strength_reduction(func, options.verbose);
            changes += n;
            stats.strength_reductions += n;
        }
        if options.redundant_load_elimination {
            let n = redundant_load_elimination(func, options.verbose);
            changes += n;
            stats.redundant_loads_removed += n;
        }
        if options.dead_code_elimination {
            let n = dead_code_elimination(func, options.verbose);
            changes += n;
            stats.dead_instructions_removed += n;
        }

        stats.passes_run += 1;
        if changes == 0 {
            break;
        }
    }

    sweep(func);
}

/// Physically remove instructions marked dead. Returns how many went.
pub fn sweep(func: &mut TacFunction) -> usize {
    let before = func.instrs.len();
    func.instrs.retain(|i| !i.is_dead);
    before - func.instrs.len()
}

/// Binary opcodes the folding pass evaluates.
pub(crate) fn is_binary_op(op: Opcode) -> bool {
    matches!(
        op,
        Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Mod
            | Opcode::Pow
            | Opcode::Eq
            | Opcode::Neq
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::Lte
            | Opcode::Gte
            | Opcode::And
            | Opcode::Or
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use naturec_syntax::DataType;
    use naturec_tac::Operand;

    fn temp(id: u32) -> Operand {
        Operand::temp(id, DataType::Number)
    }

    /// t0 = 3; t1 = 4; t2 = t0 + t1; display t2
    fn display_sum_program() -> TacProgram {
        let mut prog = TacProgram::new();
        let t0 = prog.new_temp();
        let t1 = prog.new_temp();
        let t2 = prog.new_temp();
        prog.main
            .emit(Opcode::LoadInt, temp(t0), Operand::Int(3), Operand::None);
        prog.main
            .emit(Opcode::LoadInt, temp(t1), Operand::Int(4), Operand::None);
        prog.main.emit(Opcode::Add, temp(t2), temp(t0), temp(t1));
        prog.main
            .emit(Opcode::Display, Operand::None, temp(t2), Operand::None);
        prog
    }

    #[test]
    fn level2_reduces_display_sum_to_a_single_constant_display() {
        let mut prog = display_sum_program();
        let options = OptOptions::for_level(OptLevel::O2);
        optimize(&mut prog, &options);

        assert_eq!(prog.main.instrs.len(), 1);
        let display = &prog.main.instrs[0];
        assert_eq!(display.op, Opcode::Display);
        assert_eq!(display.arg1, Operand::Int(7));
    }

    #[test]
    fn level0_leaves_the_program_untouched() {
        let mut prog = display_sum_program();
        let options = OptOptions::for_level(OptLevel::O0);
        let stats = optimize(&mut prog, &options);
        assert_eq!(prog.main.instrs.len(), 4);
        assert_eq!(stats.passes_run, 0);
    }

    #[test]
    fn level1_folds_but_does_not_propagate() {
        let mut prog = display_sum_program();
        let options = OptOptions::for_level(OptLevel::O1);
        let stats = optimize(&mut prog, &options);
        assert_eq!(stats.constants_propagated, 0);
        // the add still reads temps, so nothing folds and nothing is dead
        assert_eq!(prog.main.instrs.len(), 4);
    }

    #[test]
    fn passes_never_increase_live_instruction_count() {
        let mut prog = display_sum_program();
        let before = prog.main.live_len();
        let options = OptOptions::for_level(OptLevel::O2);

        let mut stats = OptStats::default();
        constant_propagation(&mut prog.main, false);
        assert!(prog.main.live_len() <= before);
        constant_folding(&mut prog.main, false);
        assert!(prog.main.live_len() <= before);
        dead_code_elimination(&mut prog.main, false);
        assert!(prog.main.live_len() <= before);

        optimize_function(&mut prog.main, &options, &mut stats);
        assert!(prog.main.live_len() <= before);
    }

    #[test]
    fn fixpoint_terminates_within_the_iteration_cap() {
        let mut prog = display_sum_program();
        let options = OptOptions::for_level(OptLevel::O2);
        let stats = optimize(&mut prog, &options);
        assert!(stats.passes_run <= MAX_ITERATIONS);
        // a second run is a no-op
        let stats2 = optimize(&mut prog, &options);
        assert_eq!(stats2.constants_folded, 0);
        assert_eq!(stats2.constants_propagated, 0);
        assert_eq!(
            stats2.total_instructions_before,
            stats2.total_instructions_after
        );
    }

    #[test]
    fn user_functions_are_optimized_too() {
        let mut prog = TacProgram::new();
        let mut func = TacFunction::new(Some("f".into()), DataType::Number);
        let t0 = prog.new_temp();
        func.emit(Opcode::LoadInt, temp(t0), Operand::Int(1), Operand::None);
        func.emit(Opcode::Return, Operand::None, Operand::Int(0), Operand::None);
        prog.functions.push(func);

        let options = OptOptions::for_level(OptLevel::O2);
        optimize(&mut prog, &options);
        // the unused load is swept from the user function
        assert_eq!(prog.functions[0].instrs.len(), 1);
        assert_eq!(prog.functions[0].instrs[0].op, Opcode::Return);
    }

    #[test]
    fn stats_serialize_to_json() {
        let stats = OptStats {
            passes_run: 2,
            constants_folded: 1,
            ..Default::default()
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"constants_folded\":1"));
    }
}
