//! The IR builder.
//!
//! Expressions lower to an [`Operand`] holding their value; statements
//! lower to instruction sequences. Temporaries and labels come from the
//! program's monotone counters and are never reused, not even across
//! functions.

use naturec_syntax::{DataType, Expr, ExprKind, Operator, Program, Stmt, StmtKind};
use naturec_tac::{Instruction, Opcode, Operand, TacFunction, TacProgram};

/// Runtime helper the for-each loop calls to obtain a list's length.
pub const LIST_LENGTH_FUNC: &str = "__list_length";

struct LoopCtx {
    break_label: u32,
    continue_label: u32,
}

/// Lower a full program. The AST must already be analyzer-annotated;
/// identifiers whose `data_type` is still `Unknown` fall back to `Number`.
pub fn lower(program: &Program) -> TacProgram {
    let mut builder = IrBuilder::new();
    for stmt in &program.statements {
        builder.gen_stmt(stmt);
    }
    builder.finish()
}

/// Carries the function currently being emitted into, plus the loop label
/// stack for `stop`/`skip`.
pub struct IrBuilder {
    program: TacProgram,
    cur: TacFunction,
    loops: Vec<LoopCtx>,
    line: usize,
}

impl Default for IrBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IrBuilder {
    pub fn new() -> Self {
        let mut program = TacProgram::new();
        let cur = std::mem::replace(&mut program.main, TacFunction::new(None, DataType::Nothing));
        Self {
            program,
            cur,
            loops: Vec::new(),
            line: 0,
        }
    }

    pub fn finish(mut self) -> TacProgram {
        self.program.main = self.cur;
        self.program
    }

    fn emit(&mut self, op: Opcode, result: Operand, arg1: Operand, arg2: Operand) {
        self.cur
            .push(Instruction::new(op, result, arg1, arg2).at_line(self.line));
    }

    fn emit3(&mut self, op: Opcode, result: Operand, arg1: Operand, arg2: Operand, arg3: Operand) {
        self.cur.push(
            Instruction::new(op, result, arg1, arg2)
                .with_arg3(arg3)
                .at_line(self.line),
        );
    }

    fn temp(&mut self, ty: DataType) -> Operand {
        Operand::temp(self.program.new_temp(), ty)
    }

    // ---- expressions ----

    fn gen_expr(&mut self, expr: &Expr) -> Operand {
        match &expr.kind {
            ExprKind::LiteralInt(v) => {
                let dst = self.temp(DataType::Number);
                self.emit(Opcode::LoadInt, dst.clone(), Operand::Int(*v), Operand::None);
                dst
            }
            ExprKind::LiteralFloat(v) => {
                let dst = self.temp(DataType::Decimal);
                self.emit(
                    Opcode::LoadFloat,
                    dst.clone(),
                    Operand::Float(*v),
                    Operand::None,
                );
                dst
            }
            ExprKind::LiteralString(s) => {
                let dst = self.temp(DataType::Text);
                self.emit(
                    Opcode::LoadString,
                    dst.clone(),
                    Operand::Str(s.clone()),
                    Operand::None,
                );
                dst
            }
            ExprKind::LiteralBool(b) => {
                let dst = self.temp(DataType::Flag);
                self.emit(
                    Opcode::LoadBool,
                    dst.clone(),
                    Operand::Bool(*b),
                    Operand::None,
                );
                dst
            }

            ExprKind::Ident(name) => Operand::var(name.clone(), annotated(expr.data_type)),

            ExprKind::Binary { op, left, right } => {
                let left_op = self.gen_expr(left);
                let right_op = self.gen_expr(right);

                // '+' with a text side is concatenation
                if *op == Operator::Add
                    && (left_op.ty() == DataType::Text || right_op.ty() == DataType::Text)
                {
                    let dst = self.temp(DataType::Text);
                    self.emit(Opcode::Concat, dst.clone(), left_op, right_op);
                    return dst;
                }

                let res_ty = binop_result_type(*op, left_op.ty(), right_op.ty());
                let dst = self.temp(res_ty);
                self.emit(operator_opcode(*op), dst.clone(), left_op, right_op);
                dst
            }

            ExprKind::Unary { op, operand } => {
                let value = self.gen_expr(operand);
                match op {
                    // unary plus is the identity; no instruction
                    Operator::Pos => value,
                    Operator::Not => {
                        let dst = self.temp(DataType::Flag);
                        self.emit(Opcode::Not, dst.clone(), value, Operand::None);
                        dst
                    }
                    _ => {
                        let dst = self.temp(value.ty());
                        self.emit(Opcode::Neg, dst.clone(), value, Operand::None);
                        dst
                    }
                }
            }

            ExprKind::Between {
                value,
                lower,
                upper,
            } => {
                let value_op = self.gen_expr(value);
                let lower_op = self.gen_expr(lower);
                let upper_op = self.gen_expr(upper);
                let dst = self.temp(DataType::Flag);
                self.emit3(Opcode::Between, dst.clone(), value_op, lower_op, upper_op);
                dst
            }

            ExprKind::Call { name, args } => {
                for arg in args {
                    let arg_op = self.gen_expr(arg);
                    self.emit(Opcode::Param, Operand::None, arg_op, Operand::None);
                }
                // nothing-returning calls have no value to hold
                let ret_ty = annotated(expr.data_type);
                let dst = if ret_ty == DataType::Nothing {
                    Operand::None
                } else {
                    self.temp(ret_ty)
                };
                self.emit(
                    Opcode::Call,
                    dst.clone(),
                    Operand::func(name.clone()),
                    Operand::Int(args.len() as i64),
                );
                dst
            }

            ExprKind::List(elements) => {
                let dst = self.temp(DataType::List);
                self.emit(
                    Opcode::ListCreate,
                    dst.clone(),
                    Operand::Int(elements.len() as i64),
                    Operand::None,
                );
                for elem in elements {
                    let elem_op = self.gen_expr(elem);
                    self.emit(Opcode::ListAppend, dst.clone(), elem_op, Operand::None);
                }
                dst
            }

            ExprKind::Index { base, index } => {
                let base_op = self.gen_expr(base);
                let index_op = self.gen_expr(index);
                let dst = self.temp(annotated(expr.data_type));
                self.emit(Opcode::ListGet, dst.clone(), base_op, index_op);
                dst
            }
        }
    }

    // ---- statements ----

    pub fn gen_stmt(&mut self, stmt: &Stmt) {
        self.line = stmt.loc.line;
        match &stmt.kind {
            StmtKind::Block(stmts) => {
                self.emit(Opcode::ScopeBegin, Operand::None, Operand::None, Operand::None);
                for s in stmts {
                    self.gen_stmt(s);
                }
                self.emit(Opcode::ScopeEnd, Operand::None, Operand::None, Operand::None);
            }

            StmtKind::VarDecl { name, ty, init, .. } => {
                self.emit(
                    Opcode::Decl,
                    Operand::var(name.clone(), *ty),
                    Operand::None,
                    Operand::None,
                );
                if let Some(init) = init {
                    let value = self.gen_expr(init);
                    self.emit(
                        Opcode::Assign,
                        Operand::var(name.clone(), *ty),
                        value,
                        Operand::None,
                    );
                }
            }

            StmtKind::Assign { target, value } => {
                let value_op = self.gen_expr(value);
                match &target.kind {
                    ExprKind::Index { base, index } => {
                        let base_op = self.gen_expr(base);
                        let index_op = self.gen_expr(index);
                        self.emit3(
                            Opcode::ListSet,
                            base_op,
                            index_op,
                            value_op,
                            Operand::None,
                        );
                    }
                    ExprKind::Ident(name) => {
                        let ty = annotated(target.data_type);
                        self.emit(
                            Opcode::Assign,
                            Operand::var(name.clone(), ty),
                            value_op,
                            Operand::None,
                        );
                    }
                    _ => {
                        let target_op = self.gen_expr(target);
                        self.emit(Opcode::Assign, target_op, value_op, Operand::None);
                    }
                }
            }

            StmtKind::Display(value) => {
                let value_op = self.gen_expr(value);
                if !value_op.is_none() {
                    self.emit(Opcode::Display, Operand::None, value_op, Operand::None);
                }
            }

            StmtKind::Ask { prompt, target } => {
                let prompt_op = match prompt {
                    Some(p) => self.gen_expr(p),
                    None => Operand::None,
                };
                self.emit(
                    Opcode::Ask,
                    Operand::var(target.clone(), DataType::Text),
                    prompt_op,
                    Operand::None,
                );
            }

            StmtKind::Read { target } => {
                self.emit(
                    Opcode::Read,
                    Operand::var(target.clone(), DataType::Text),
                    Operand::None,
                    Operand::None,
                );
            }

            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_op = self.gen_expr(cond);
                match else_branch {
                    Some(else_branch) => {
                        let else_label = self.program.new_label();
                        let end_label = self.program.new_label();
                        self.cur.emit_if_false_goto(cond_op, else_label);
                        self.gen_stmt(then_branch);
                        self.cur.emit_goto(end_label);
                        self.cur.emit_label(else_label);
                        self.gen_stmt(else_branch);
                        self.cur.emit_label(end_label);
                    }
                    None => {
                        let end_label = self.program.new_label();
                        self.cur.emit_if_false_goto(cond_op, end_label);
                        self.gen_stmt(then_branch);
                        self.cur.emit_label(end_label);
                    }
                }
            }

            StmtKind::While { cond, body } => {
                let start = self.program.new_label();
                let end = self.program.new_label();
                self.loops.push(LoopCtx {
                    break_label: end,
                    continue_label: start,
                });

                self.cur.emit_label(start);
                let cond_op = self.gen_expr(cond);
                self.cur.emit_if_false_goto(cond_op, end);
                self.gen_stmt(body);
                self.cur.emit_goto(start);
                self.cur.emit_label(end);

                self.loops.pop();
            }

            StmtKind::Repeat { count, body } => {
                // iter = 0; start: if iter >= limit goto end; body;
                // inc: iter = iter + 1; goto start; end:
                let limit = self.gen_expr(count);
                let iter = self.temp(DataType::Number);
                self.emit(Opcode::LoadInt, iter.clone(), Operand::Int(0), Operand::None);

                let start = self.program.new_label();
                let end = self.program.new_label();
                let inc = self.program.new_label();
                self.loops.push(LoopCtx {
                    break_label: end,
                    continue_label: inc,
                });

                self.cur.emit_label(start);
                let cond = self.temp(DataType::Flag);
                self.emit(Opcode::Gte, cond.clone(), iter.clone(), limit);
                self.cur.emit_if_goto(cond, end);

                self.gen_stmt(body);

                self.cur.emit_label(inc);
                self.emit(Opcode::Add, iter.clone(), iter.clone(), Operand::Int(1));
                self.cur.emit_goto(start);
                self.cur.emit_label(end);

                self.loops.pop();
            }

            StmtKind::ForEach {
                iterator,
                iterable,
                body,
            } => {
                let list = self.gen_expr(iterable);
                let elem_ty = if list.ty() == DataType::Text {
                    DataType::Text
                } else {
                    DataType::Number
                };

                let idx = self.temp(DataType::Number);
                self.emit(Opcode::LoadInt, idx.clone(), Operand::Int(0), Operand::None);

                let start = self.program.new_label();
                let end = self.program.new_label();
                let inc = self.program.new_label();
                self.loops.push(LoopCtx {
                    break_label: end,
                    continue_label: inc,
                });

                self.cur.emit_label(start);

                // len = __list_length(list)
                let len = self.temp(DataType::Number);
                self.emit(Opcode::Param, Operand::None, list.clone(), Operand::None);
                self.emit(
                    Opcode::Call,
                    len.clone(),
                    Operand::func(LIST_LENGTH_FUNC),
                    Operand::Int(1),
                );

                let cond = self.temp(DataType::Flag);
                self.emit(Opcode::Gte, cond.clone(), idx.clone(), len);
                self.cur.emit_if_goto(cond, end);

                // iterator = list[idx]
                self.emit(
                    Opcode::Decl,
                    Operand::var(iterator.clone(), elem_ty),
                    Operand::None,
                    Operand::None,
                );
                let elem = self.temp(elem_ty);
                self.emit(Opcode::ListGet, elem.clone(), list.clone(), idx.clone());
                self.emit(
                    Opcode::Assign,
                    Operand::var(iterator.clone(), elem_ty),
                    elem,
                    Operand::None,
                );

                self.gen_stmt(body);

                self.cur.emit_label(inc);
                self.emit(Opcode::Add, idx.clone(), idx.clone(), Operand::Int(1));
                self.cur.emit_goto(start);
                self.cur.emit_label(end);

                self.loops.pop();
            }

            StmtKind::FuncDecl {
                name,
                params,
                return_type,
                body,
            } => {
                let mut func = TacFunction::new(Some(name.clone()), *return_type);
                func.params = params.iter().map(|p| (p.name.clone(), p.ty)).collect();
                func.emit(
                    Opcode::FuncBegin,
                    Operand::func(name.clone()),
                    Operand::None,
                    Operand::None,
                );

                let saved = std::mem::replace(&mut self.cur, func);
                // a function body is never inside the enclosing loop
                let saved_loops = std::mem::take(&mut self.loops);

                self.gen_stmt(body);
                self.emit(Opcode::FuncEnd, Operand::None, Operand::None, Operand::None);

                self.loops = saved_loops;
                let done = std::mem::replace(&mut self.cur, saved);
                self.program.functions.push(done);
            }

            StmtKind::Return(value) => match value {
                Some(value) => {
                    let value_op = self.gen_expr(value);
                    self.emit(Opcode::Return, Operand::None, value_op, Operand::None);
                }
                None => {
                    self.emit(Opcode::Return, Operand::None, Operand::None, Operand::None);
                }
            },

            StmtKind::Break => {
                // outside a loop the analyzer already complained; skip
                if let Some(ctx) = self.loops.last() {
                    let label = ctx.break_label;
                    self.cur.emit_goto(label);
                }
            }

            StmtKind::Continue => {
                if let Some(ctx) = self.loops.last() {
                    let label = ctx.continue_label;
                    self.cur.emit_goto(label);
                }
            }

            StmtKind::SecureZone { body, .. } => {
                self.emit(Opcode::SecureBegin, Operand::None, Operand::None, Operand::None);
                self.gen_stmt(body);
                self.emit(Opcode::SecureEnd, Operand::None, Operand::None, Operand::None);
            }

            StmtKind::ExprStmt(expr) => {
                self.gen_expr(expr);
            }
        }
    }
}

/// Identifiers the analyzer could not type default to `Number` at IR time.
fn annotated(ty: DataType) -> DataType {
    if ty == DataType::Unknown {
        DataType::Number
    } else {
        ty
    }
}

fn operator_opcode(op: Operator) -> Opcode {
    match op {
        Operator::Add => Opcode::Add,
        Operator::Sub => Opcode::Sub,
        Operator::Mul => Opcode::Mul,
        Operator::Div => Opcode::Div,
        Operator::Mod => Opcode::Mod,
        Operator::Pow => Opcode::Pow,
        Operator::Eq => Opcode::Eq,
        Operator::Neq => Opcode::Neq,
        Operator::Lt => Opcode::Lt,
        Operator::Gt => Opcode::Gt,
        Operator::Lte => Opcode::Lte,
        Operator::Gte => Opcode::Gte,
        Operator::And => Opcode::And,
        Operator::Or => Opcode::Or,
        Operator::Not => Opcode::Not,
        Operator::Neg => Opcode::Neg,
        _ => Opcode::Nop,
    }
}

fn binop_result_type(op: Operator, left: DataType, right: DataType) -> DataType {
    match op {
        Operator::Eq
        | Operator::Neq
        | Operator::Lt
        | Operator::Gt
        | Operator::Lte
        | Operator::Gte
        | Operator::And
        | Operator::Or
        | Operator::Between => return DataType::Flag,
        _ => {}
    }
    if op == Operator::Add && (left == DataType::Text || right == DataType::Text) {
        return DataType::Text;
    }
    if left == DataType::Decimal || right == DataType::Decimal {
        return DataType::Decimal;
    }
    left
}
