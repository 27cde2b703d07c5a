//! Program containers for TAC: functions and the whole-program IR.

use std::fmt;

use naturec_syntax::DataType;

use crate::instruction::{Instruction, Opcode};
use crate::operand::Operand;

/// The TAC instruction list for one function (or the top-level code).
///
/// Instruction order is program order. Optimization passes may rewrite
/// instructions in place and mark them dead, but only the final sweep
/// removes them.
#[derive(Debug, Clone)]
pub struct TacFunction {
    /// `None` for the implicit top-level function.
    pub name: Option<String>,
    pub return_type: DataType,
    pub params: Vec<(String, DataType)>,
    pub instrs: Vec<Instruction>,
}

impl TacFunction {
    pub fn new(name: Option<String>, return_type: DataType) -> Self {
        Self {
            name,
            return_type,
            params: Vec::new(),
            instrs: Vec::new(),
        }
    }

    pub fn push(&mut self, instr: Instruction) {
        self.instrs.push(instr);
    }

    /// Number of instructions not marked dead.
    pub fn live_len(&self) -> usize {
        self.instrs.iter().filter(|i| !i.is_dead).count()
    }

    pub fn emit(&mut self, op: Opcode, result: Operand, arg1: Operand, arg2: Operand) {
        self.push(Instruction::new(op, result, arg1, arg2));
    }

    pub fn emit_label(&mut self, id: u32) {
        self.emit(Opcode::Label, Operand::Label(id), Operand::None, Operand::None);
    }

    pub fn emit_goto(&mut self, id: u32) {
        self.emit(Opcode::Goto, Operand::Label(id), Operand::None, Operand::None);
    }

    pub fn emit_if_goto(&mut self, cond: Operand, id: u32) {
        self.emit(Opcode::IfGoto, Operand::Label(id), cond, Operand::None);
    }

    pub fn emit_if_false_goto(&mut self, cond: Operand, id: u32) {
        self.emit(Opcode::IfFalseGoto, Operand::Label(id), cond, Operand::None);
    }
}

impl fmt::Display for TacFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => {
                write!(f, "function {}(", name)?;
                for (i, (pname, pty)) in self.params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", pname, pty)?;
                }
                writeln!(f, ") -> {}", self.return_type)?;
            }
            None => writeln!(f, "function <main>")?,
        }
        for instr in &self.instrs {
            writeln!(f, "{}", instr)?;
        }
        writeln!(f, "  [{} instructions]", self.live_len())
    }
}

/// The complete IR for a program: top-level code plus user functions, and
/// the two monotone allocation counters shared by every function.
#[derive(Debug, Clone)]
pub struct TacProgram {
    pub main: TacFunction,
    pub functions: Vec<TacFunction>,
    next_temp: u32,
    next_label: u32,
}

impl Default for TacProgram {
    fn default() -> Self {
        Self::new()
    }
}

impl TacProgram {
    pub fn new() -> Self {
        Self {
            main: TacFunction::new(None, DataType::Nothing),
            functions: Vec::new(),
            next_temp: 0,
            next_label: 0,
        }
    }

    /// Allocate a fresh temporary id. Never reused, even across functions.
    pub fn new_temp(&mut self) -> u32 {
        let t = self.next_temp;
        self.next_temp += 1;
        t
    }

    /// Allocate a fresh label id.
    pub fn new_label(&mut self) -> u32 {
        let l = self.next_label;
        self.next_label += 1;
        l
    }

    pub fn temp_count(&self) -> u32 {
        self.next_temp
    }

    pub fn label_count(&self) -> u32 {
        self.next_label
    }

    /// Look up a user function by name.
    pub fn function(&self, name: &str) -> Option<&TacFunction> {
        self.functions
            .iter()
            .find(|f| f.name.as_deref() == Some(name))
    }

    /// Total live instructions across main and all user functions.
    pub fn total_instructions(&self) -> usize {
        self.main.live_len() + self.functions.iter().map(|f| f.live_len()).sum::<usize>()
    }
}

impl fmt::Display for TacProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== NatureLang TAC IR ===")?;
        writeln!(f, "Temps: {}, Labels: {}", self.next_temp, self.next_label)?;
        writeln!(f)?;
        for func in &self.functions {
            writeln!(f, "{}", func)?;
        }
        writeln!(f, "{}", self.main)?;
        writeln!(f, "Total instructions: {}", self.total_instructions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_monotone_across_functions() {
        let mut prog = TacProgram::new();
        assert_eq!(prog.new_temp(), 0);
        assert_eq!(prog.new_temp(), 1);
        prog.functions
            .push(TacFunction::new(Some("f".into()), DataType::Number));
        assert_eq!(prog.new_temp(), 2);
        assert_eq!(prog.new_label(), 0);
        assert_eq!(prog.new_label(), 1);
    }

    #[test]
    fn live_len_ignores_dead_instructions() {
        let mut func = TacFunction::new(None, DataType::Nothing);
        func.emit(Opcode::Nop, Operand::None, Operand::None, Operand::None);
        func.emit(Opcode::Nop, Operand::None, Operand::None, Operand::None);
        func.instrs[0].is_dead = true;
        assert_eq!(func.live_len(), 1);
        assert_eq!(func.instrs.len(), 2);
    }
}
