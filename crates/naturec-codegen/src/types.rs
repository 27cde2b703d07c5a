//! Two-pass type synthesis over one function's TAC.
//!
//! Pass one records result types from loads, declarations, I/O, string,
//! comparison, and arithmetic instructions; pass two propagates through
//! plain copies. `Decl` types are authoritative for variables: later
//! records never overwrite them.

use std::collections::HashMap;

use naturec_syntax::DataType;
use naturec_tac::{Opcode, Operand, TacFunction};

#[derive(Debug, Default)]
pub(crate) struct TypeTables {
    temps: HashMap<u32, DataType>,
    vars: HashMap<String, DataType>,
}

impl TypeTables {
    /// Infer the concrete type of every temp and variable in `func`.
    pub(crate) fn infer(func: &TacFunction) -> Self {
        let mut tables = Self::default();
        for (name, ty) in &func.params {
            tables.vars.insert(name.clone(), *ty);
        }

        for instr in func.instrs.iter().filter(|i| !i.is_dead) {
            match instr.op {
                Opcode::LoadInt => tables.record(&instr.result, DataType::Number),
                Opcode::LoadFloat => tables.record(&instr.result, DataType::Decimal),
                Opcode::LoadString => tables.record(&instr.result, DataType::Text),
                Opcode::LoadBool => tables.record(&instr.result, DataType::Flag),
                Opcode::Decl => {
                    if let Operand::Var { name, ty } = &instr.result {
                        tables.vars.insert(name.clone(), *ty);
                    }
                }
                Opcode::Concat | Opcode::Ask | Opcode::Read => {
                    tables.record(&instr.result, DataType::Text)
                }
                Opcode::Eq
                | Opcode::Neq
                | Opcode::Lt
                | Opcode::Gt
                | Opcode::Lte
                | Opcode::Gte
                | Opcode::And
                | Opcode::Or
                | Opcode::Not
                | Opcode::Between => tables.record(&instr.result, DataType::Flag),
                Opcode::Add
                | Opcode::Sub
                | Opcode::Mul
                | Opcode::Div
                | Opcode::Mod
                | Opcode::Pow
                | Opcode::Neg => {
                    let left = tables.resolve(&instr.arg1);
                    let right = tables.resolve(&instr.arg2);
                    let ty = if left == DataType::Decimal || right == DataType::Decimal {
                        DataType::Decimal
                    } else {
                        DataType::Number
                    };
                    tables.record(&instr.result, ty);
                }
                _ => {}
            }
        }

        // copies inherit the resolved type of their source
        for instr in func.instrs.iter().filter(|i| !i.is_dead) {
            if instr.op == Opcode::Assign {
                let src = tables.resolve(&instr.arg1);
                if src != DataType::Unknown {
                    tables.record(&instr.result, src);
                }
            }
        }

        tables
    }

    fn record(&mut self, result: &Operand, ty: DataType) {
        match result {
            Operand::Temp { id, .. } => {
                self.temps.insert(*id, ty);
            }
            Operand::Var { name, .. } => {
                // declared types win over inferred ones
                self.vars.entry(name.clone()).or_insert(ty);
            }
            _ => {}
        }
    }

    /// Effective type of an operand: already-concrete embedded types win;
    /// default-`Number` temps and variables prefer the recorded type.
    pub(crate) fn resolve(&self, op: &Operand) -> DataType {
        let embedded = op.ty();
        if embedded != DataType::Unknown && embedded != DataType::Number {
            return embedded;
        }
        match op {
            Operand::Str(_) => DataType::Text,
            Operand::Float(_) => DataType::Decimal,
            Operand::Bool(_) => DataType::Flag,
            Operand::Int(_) => DataType::Number,
            Operand::Var { name, .. } => self.vars.get(name).copied().unwrap_or(embedded),
            Operand::Temp { id, .. } => self.temps.get(id).copied().unwrap_or(embedded),
            _ => embedded,
        }
    }

    pub(crate) fn temp_type(&self, id: u32) -> Option<DataType> {
        self.temps.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_fix_temp_types() {
        let mut func = TacFunction::new(None, DataType::Nothing);
        func.emit(
            Opcode::LoadString,
            Operand::temp(0, DataType::Text),
            Operand::Str("hi".into()),
            Operand::None,
        );
        let tables = TypeTables::infer(&func);
        assert_eq!(tables.temp_type(0), Some(DataType::Text));
    }

    #[test]
    fn decl_is_authoritative_for_variables() {
        let mut func = TacFunction::new(None, DataType::Nothing);
        func.emit(
            Opcode::Decl,
            Operand::var("d", DataType::Decimal),
            Operand::None,
            Operand::None,
        );
        // later assignment of an integer must not demote the variable
        func.emit(
            Opcode::Assign,
            Operand::var("d", DataType::Number),
            Operand::Int(1),
            Operand::None,
        );
        let tables = TypeTables::infer(&func);
        assert_eq!(
            tables.resolve(&Operand::var("d", DataType::Number)),
            DataType::Decimal
        );
    }

    #[test]
    fn arithmetic_promotes_through_resolved_operands() {
        let mut func = TacFunction::new(None, DataType::Nothing);
        func.emit(
            Opcode::LoadFloat,
            Operand::temp(0, DataType::Decimal),
            Operand::Float(1.5),
            Operand::None,
        );
        // the add's operands claim Number; resolution sees the decimal load
        func.emit(
            Opcode::Add,
            Operand::temp(1, DataType::Number),
            Operand::temp(0, DataType::Number),
            Operand::Int(2),
        );
        let tables = TypeTables::infer(&func);
        assert_eq!(tables.temp_type(1), Some(DataType::Decimal));
    }

    #[test]
    fn assign_propagation_runs_after_the_first_pass() {
        let mut func = TacFunction::new(None, DataType::Nothing);
        // the copy appears before its source's load would have typed it in
        // a single pass
        func.emit(
            Opcode::Concat,
            Operand::temp(0, DataType::Text),
            Operand::Str("a".into()),
            Operand::Str("b".into()),
        );
        func.emit(
            Opcode::Assign,
            Operand::temp(1, DataType::Number),
            Operand::temp(0, DataType::Number),
            Operand::None,
        );
        let tables = TypeTables::infer(&func);
        assert_eq!(tables.temp_type(1), Some(DataType::Text));
    }

    #[test]
    fn params_seed_variable_types() {
        let mut func = TacFunction::new(Some("f".into()), DataType::Number);
        func.params.push(("msg".into(), DataType::Text));
        let tables = TypeTables::infer(&func);
        assert_eq!(
            tables.resolve(&Operand::var("msg", DataType::Number)),
            DataType::Text
        );
    }
}
