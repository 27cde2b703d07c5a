//! The semantic analyzer.
//!
//! Walks the AST, builds a fresh [`SymbolTable`], annotates every
//! expression's `data_type`, and collects diagnostics. Violations never
//! abort the walk: analysis always completes so that one run surfaces every
//! error in the program.

use naturec_syntax::{
    DataType, Diagnostic, Expr, ExprKind, Loc, Operator, Program, Stmt, StmtKind,
};

use crate::symbol_table::{SymbolKind, SymbolTable};

/// Outcome of a full analysis run. The symbol table outlives the analyzer
/// and is handed to the caller.
#[derive(Debug)]
pub struct SemanticResult {
    pub success: bool,
    pub error_count: usize,
    pub warning_count: usize,
    pub symbols: SymbolTable,
    pub diagnostics: Vec<Diagnostic>,
}

/// Two types can be mixed when they are equal, both numeric, or either side
/// is still `Unknown` (error recovery must not cascade).
pub fn types_compatible(target: DataType, source: DataType) -> bool {
    if target == source {
        return true;
    }
    if (target == DataType::Number || target == DataType::Decimal)
        && (source == DataType::Number || source == DataType::Decimal)
    {
        return true;
    }
    target == DataType::Unknown || source == DataType::Unknown
}

fn binary_result_type(op: Operator, left: DataType, right: DataType) -> DataType {
    match op {
        Operator::Add | Operator::Sub | Operator::Mul | Operator::Div | Operator::Pow => {
            if left == DataType::Decimal || right == DataType::Decimal {
                DataType::Decimal
            } else {
                DataType::Number
            }
        }
        // modulo always yields an integer
        Operator::Mod => DataType::Number,
        Operator::Eq
        | Operator::Neq
        | Operator::Lt
        | Operator::Gt
        | Operator::Lte
        | Operator::Gte
        | Operator::Between
        | Operator::And
        | Operator::Or => DataType::Flag,
        _ => DataType::Unknown,
    }
}

/// AST walker carrying the symbol table and collected diagnostics.
pub struct Analyzer {
    symbols: SymbolTable,
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            symbols: SymbolTable::new(),
            diagnostics: Vec::new(),
            error_count: 0,
            warning_count: 0,
        }
    }

    /// Analyze a whole program, annotating the AST in place.
    pub fn analyze(mut self, program: &mut Program) -> SemanticResult {
        for stmt in &mut program.statements {
            self.analyze_stmt(stmt);
        }
        SemanticResult {
            success: self.error_count == 0,
            error_count: self.error_count,
            warning_count: self.warning_count,
            symbols: self.symbols,
            diagnostics: self.diagnostics,
        }
    }

    fn error(&mut self, loc: Loc, msg: String) {
        self.error_count += 1;
        self.diagnostics.push(Diagnostic::error(msg, loc));
    }

    fn warning(&mut self, loc: Loc, msg: String) {
        self.warning_count += 1;
        self.diagnostics.push(Diagnostic::warning(msg, loc));
    }

    fn analyze_stmt(&mut self, stmt: &mut Stmt) {
        let loc = stmt.loc;
        match &mut stmt.kind {
            StmtKind::Block(stmts) => {
                for s in stmts {
                    self.analyze_stmt(s);
                }
            }

            StmtKind::VarDecl {
                name,
                ty,
                init,
                is_const,
            } => {
                let name = name.clone();
                let ty = *ty;
                if let Err(msg) = self.symbols.declare_variable(&name, ty, *is_const, loc) {
                    self.error(loc, msg);
                }
                if let Some(init) = init {
                    let init_ty = self.analyze_expr(init);
                    if !types_compatible(ty, init_ty) {
                        self.error(
                            loc,
                            format!("Cannot initialize {} variable with {} value", ty, init_ty),
                        );
                    }
                    self.symbols.mark_initialized(&name);
                }
            }

            StmtKind::FuncDecl {
                name,
                params,
                return_type,
                body,
            } => {
                let sig: Vec<(String, DataType)> =
                    params.iter().map(|p| (p.name.clone(), p.ty)).collect();
                if let Err(msg) = self
                    .symbols
                    .declare_function(name, sig, *return_type, loc)
                {
                    self.error(loc, msg);
                }

                self.symbols.enter_function_scope(*return_type);
                for p in params.iter() {
                    if let Err(msg) = self.symbols.declare_parameter(&p.name, p.ty, p.loc) {
                        self.error(p.loc, msg);
                    }
                }
                self.analyze_stmt(body);
                self.symbols.exit_scope();
            }

            StmtKind::Assign { target, value } => match &mut target.kind {
                ExprKind::Ident(name) => {
                    let name = name.clone();
                    let found = self.symbols.lookup(&name).map(|s| (s.kind, s.ty));
                    match found {
                        None => {
                            self.error(loc, format!("Undefined variable '{}'", name));
                            self.analyze_expr(value);
                        }
                        Some((SymbolKind::Constant, _)) => {
                            self.error(loc, format!("Cannot assign to constant '{}'", name));
                            self.analyze_expr(value);
                        }
                        Some((SymbolKind::Function, _)) => {
                            self.error(loc, format!("Cannot assign to function '{}'", name));
                            self.analyze_expr(value);
                        }
                        Some((_, target_ty)) => {
                            target.data_type = target_ty;
                            let value_ty = self.analyze_expr(value);
                            if !types_compatible(target_ty, value_ty) {
                                self.error(
                                    loc,
                                    format!(
                                        "Cannot assign {} to {} variable '{}'",
                                        value_ty, target_ty, name
                                    ),
                                );
                            }
                            self.symbols.mark_initialized(&name);
                        }
                    }
                }
                _ => {
                    // index assignment: both sides just need to be well-typed
                    self.analyze_expr(target);
                    self.analyze_expr(value);
                }
            },

            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_ty = self.analyze_expr(cond);
                if cond_ty != DataType::Flag && !cond_ty.is_numeric() {
                    self.warning(
                        loc,
                        format!("Condition is {}, expected flag (boolean)", cond_ty),
                    );
                }
                self.symbols.enter_scope();
                self.analyze_stmt(then_branch);
                self.symbols.exit_scope();
                if let Some(else_branch) = else_branch {
                    self.symbols.enter_scope();
                    self.analyze_stmt(else_branch);
                    self.symbols.exit_scope();
                }
            }

            StmtKind::While { cond, body } => {
                let cond_ty = self.analyze_expr(cond);
                if cond_ty != DataType::Flag && !cond_ty.is_numeric() {
                    self.warning(
                        loc,
                        format!("While condition is {}, expected flag (boolean)", cond_ty),
                    );
                }
                self.symbols.enter_loop_scope();
                self.analyze_stmt(body);
                self.symbols.exit_scope();
            }

            StmtKind::Repeat { count, body } => {
                let count_ty = self.analyze_expr(count);
                if !count_ty.is_numeric() {
                    self.error(loc, format!("Repeat count must be numeric, got {}", count_ty));
                }
                self.symbols.enter_loop_scope();
                self.analyze_stmt(body);
                self.symbols.exit_scope();
            }

            StmtKind::ForEach {
                iterator,
                iterable,
                body,
            } => {
                let iter_ty = self.analyze_expr(iterable);
                if iter_ty != DataType::List
                    && iter_ty != DataType::Text
                    && iter_ty != DataType::Unknown
                {
                    self.error(
                        loc,
                        format!("Cannot iterate over {} (expected list or text)", iter_ty),
                    );
                }

                self.symbols.enter_loop_scope();
                // element types of lists are not tracked
                let elem_ty = if iter_ty == DataType::Text {
                    DataType::Text
                } else {
                    DataType::Unknown
                };
                let iterator = iterator.clone();
                match self.symbols.declare_variable(&iterator, elem_ty, false, loc) {
                    Ok(()) => self.symbols.mark_initialized(&iterator),
                    Err(msg) => self.error(loc, msg),
                }
                self.analyze_stmt(body);
                self.symbols.exit_scope();
            }

            StmtKind::Return(value) => {
                if !self.symbols.in_function() {
                    self.error(loc, "'give back' (return) outside of function".to_string());
                } else {
                    let expected = self.symbols.return_type();
                    match value {
                        Some(value) => {
                            let actual = self.analyze_expr(value);
                            if expected == DataType::Nothing {
                                self.error(loc, "Function should not return a value".to_string());
                            } else if !types_compatible(expected, actual) {
                                self.error(
                                    loc,
                                    format!(
                                        "Return type mismatch: expected {}, got {}",
                                        expected, actual
                                    ),
                                );
                            }
                        }
                        None => {
                            if expected != DataType::Nothing && expected != DataType::Unknown {
                                self.error(loc, format!("Function should return {}", expected));
                            }
                        }
                    }
                }
            }

            StmtKind::Break => {
                if !self.symbols.in_loop() {
                    self.error(loc, "'stop' (break) outside of loop".to_string());
                }
            }

            StmtKind::Continue => {
                if !self.symbols.in_loop() {
                    self.error(loc, "'skip' (continue) outside of loop".to_string());
                }
            }

            StmtKind::Display(value) => {
                self.analyze_expr(value);
            }

            StmtKind::Ask { prompt, target } => {
                if let Some(prompt) = prompt {
                    self.analyze_expr(prompt);
                }
                let target = target.clone();
                self.check_input_target(&target, loc);
            }

            StmtKind::Read { target } => {
                let target = target.clone();
                self.check_input_target(&target, loc);
            }

            StmtKind::SecureZone { body, .. } => {
                self.symbols.enter_secure_scope();
                self.analyze_stmt(body);
                self.symbols.exit_scope();
            }

            StmtKind::ExprStmt(expr) => {
                self.analyze_expr(expr);
            }
        }
    }

    /// `ask`/`read` targets must exist and not be constants; a successful
    /// read initializes the target.
    fn check_input_target(&mut self, name: &str, loc: Loc) {
        match self.symbols.lookup(name).map(|s| s.kind) {
            None => self.error(loc, format!("Undefined variable '{}'", name)),
            Some(SymbolKind::Constant) => {
                self.error(loc, format!("Cannot read into constant '{}'", name));
            }
            Some(_) => self.symbols.mark_initialized(name),
        }
    }

    fn analyze_expr(&mut self, expr: &mut Expr) -> DataType {
        let loc = expr.loc;
        let ty = match &mut expr.kind {
            ExprKind::LiteralInt(_) => DataType::Number,
            ExprKind::LiteralFloat(_) => DataType::Decimal,
            ExprKind::LiteralString(_) => DataType::Text,
            ExprKind::LiteralBool(_) => DataType::Flag,

            ExprKind::Ident(name) => {
                let name = name.clone();
                match self
                    .symbols
                    .lookup(&name)
                    .map(|s| (s.ty, s.kind, s.is_initialized))
                {
                    None => {
                        self.error(loc, format!("Undefined variable '{}'", name));
                        DataType::Unknown
                    }
                    Some((ty, kind, initialized)) => {
                        if !initialized && kind != SymbolKind::Parameter {
                            self.warning(
                                loc,
                                format!("Variable '{}' may be used before initialization", name),
                            );
                        }
                        ty
                    }
                }
            }

            ExprKind::Binary { op, left, right } => {
                let op = *op;
                let left_ty = self.analyze_expr(left);
                let right_ty = self.analyze_expr(right);

                // string concatenation is the one non-numeric use of '+'
                if op == Operator::Add
                    && (left_ty == DataType::Text || right_ty == DataType::Text)
                {
                    expr.data_type = DataType::Text;
                    return DataType::Text;
                }

                match op {
                    Operator::Add
                    | Operator::Sub
                    | Operator::Mul
                    | Operator::Div
                    | Operator::Mod
                    | Operator::Pow => {
                        if !left_ty.is_numeric() {
                            self.error(
                                loc,
                                format!(
                                    "Left operand of '{}' must be numeric, got {}",
                                    op, left_ty
                                ),
                            );
                        }
                        if !right_ty.is_numeric() {
                            self.error(
                                loc,
                                format!(
                                    "Right operand of '{}' must be numeric, got {}",
                                    op, right_ty
                                ),
                            );
                        }
                    }
                    Operator::And | Operator::Or => {
                        if !left_ty.is_boolean() {
                            self.error(
                                loc,
                                format!(
                                    "Left operand of '{}' must be boolean, got {}",
                                    op, left_ty
                                ),
                            );
                        }
                        if !right_ty.is_boolean() {
                            self.error(
                                loc,
                                format!(
                                    "Right operand of '{}' must be boolean, got {}",
                                    op, right_ty
                                ),
                            );
                        }
                    }
                    // any two values can be compared for (in)equality
                    Operator::Eq | Operator::Neq => {}
                    Operator::Lt | Operator::Gt | Operator::Lte | Operator::Gte => {
                        if !types_compatible(left_ty, right_ty) {
                            self.error(
                                loc,
                                format!("Cannot compare {} with {}", left_ty, right_ty),
                            );
                        }
                    }
                    _ => {}
                }

                binary_result_type(op, left_ty, right_ty)
            }

            ExprKind::Unary { op, operand } => {
                let op = *op;
                let operand_ty = self.analyze_expr(operand);
                if (op == Operator::Neg || op == Operator::Pos) && !operand_ty.is_numeric() {
                    self.error(
                        loc,
                        format!("Unary '{}' requires numeric operand, got {}", op, operand_ty),
                    );
                }
                if op == Operator::Not && !operand_ty.is_boolean() {
                    self.error(
                        loc,
                        format!("'not' requires boolean operand, got {}", operand_ty),
                    );
                }
                if op == Operator::Not {
                    DataType::Flag
                } else {
                    operand_ty
                }
            }

            ExprKind::Between {
                value,
                lower,
                upper,
            } => {
                let value_ty = self.analyze_expr(value);
                let lower_ty = self.analyze_expr(lower);
                let upper_ty = self.analyze_expr(upper);
                if !value_ty.is_numeric() {
                    self.error(
                        loc,
                        format!("'is between' requires numeric operand, got {}", value_ty),
                    );
                }
                if !lower_ty.is_numeric() {
                    self.error(
                        loc,
                        format!("'is between' lower bound must be numeric, got {}", lower_ty),
                    );
                }
                if !upper_ty.is_numeric() {
                    self.error(
                        loc,
                        format!("'is between' upper bound must be numeric, got {}", upper_ty),
                    );
                }
                DataType::Flag
            }

            ExprKind::Call { name, args } => {
                let name = name.clone();
                let info = self.symbols.lookup_function(&name).and_then(|s| s.func.clone());
                match info {
                    None => {
                        self.error(loc, format!("Undefined function '{}'", name));
                        for arg in args.iter_mut() {
                            self.analyze_expr(arg);
                        }
                        DataType::Unknown
                    }
                    Some(info) => {
                        if info.params.len() != args.len() {
                            self.error(
                                loc,
                                format!(
                                    "Function '{}' expects {} arguments, got {}",
                                    name,
                                    info.params.len(),
                                    args.len()
                                ),
                            );
                        }
                        for (i, arg) in args.iter_mut().enumerate() {
                            let arg_ty = self.analyze_expr(arg);
                            if let Some((_, param_ty)) = info.params.get(i) {
                                if !types_compatible(*param_ty, arg_ty) {
                                    self.error(
                                        loc,
                                        format!(
                                            "Argument {} type mismatch: expected {}, got {}",
                                            i + 1,
                                            param_ty,
                                            arg_ty
                                        ),
                                    );
                                }
                            }
                        }
                        info.return_type
                    }
                }
            }

            ExprKind::Index { base, index } => {
                let base_ty = self.analyze_expr(base);
                let index_ty = self.analyze_expr(index);
                if base_ty != DataType::List
                    && base_ty != DataType::Text
                    && base_ty != DataType::Unknown
                {
                    self.error(
                        loc,
                        format!("Cannot index into {} (expected list or text)", base_ty),
                    );
                }
                if !index_ty.is_numeric() {
                    self.error(loc, format!("Index must be numeric, got {}", index_ty));
                }
                if base_ty == DataType::Text {
                    // single character, still text
                    DataType::Text
                } else {
                    DataType::Unknown
                }
            }

            ExprKind::List(elements) => {
                for elem in elements.iter_mut() {
                    self.analyze_expr(elem);
                }
                DataType::List
            }
        };
        expr.data_type = ty;
        ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use naturec_lexer::Lexer;
    use naturec_parser::Parser;

    fn analyze_src(src: &str) -> SemanticResult {
        let tokens = Lexer::new(src).tokenize().expect("lexes");
        let mut program = Parser::new(tokens).parse_program().expect("parses");
        Analyzer::new().analyze(&mut program)
    }

    #[test]
    fn clean_program_has_no_diagnostics() {
        let result = analyze_src(
            "create a number called x and set it to 10\n\
             display x",
        );
        assert!(result.success);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.warning_count, 0);
    }

    #[test]
    fn assigning_text_to_number_is_one_error() {
        let result = analyze_src(
            "create a number called x\n\
             x becomes \"hi\"",
        );
        assert!(!result.success);
        assert_eq!(result.error_count, 1);
        assert!(result.diagnostics[0].msg.contains("Cannot assign text"));
    }

    #[test]
    fn stop_outside_loop_is_one_error() {
        let result = analyze_src("stop");
        assert_eq!(result.error_count, 1);
        assert!(result.diagnostics[0].msg.contains("outside of loop"));
    }

    #[test]
    fn bodiless_give_back_in_number_function_is_an_error() {
        let result = analyze_src(
            "define function f and returns a number\n\
             give back\n\
             end function",
        );
        assert_eq!(result.error_count, 1);
        assert!(result.diagnostics[0].msg.contains("should return number"));
    }

    #[test]
    fn give_back_outside_function_is_an_error() {
        let result = analyze_src("give back 1");
        assert_eq!(result.error_count, 1);
        assert!(result.diagnostics[0].msg.contains("outside of function"));
    }

    #[test]
    fn undefined_variable_is_reported_but_analysis_continues() {
        let result = analyze_src(
            "display mystery\n\
             display also_missing",
        );
        assert_eq!(result.error_count, 2, "all errors surface in one pass");
    }

    #[test]
    fn redeclaration_in_same_scope() {
        let result = analyze_src(
            "create a number called x\n\
             create a number called x",
        );
        assert_eq!(result.error_count, 1);
        assert!(result.diagnostics[0].msg.contains("Redeclaration"));
    }

    #[test]
    fn shadowing_in_inner_scope_is_allowed() {
        let result = analyze_src(
            "create a number called x and set it to 1\n\
             if true then\n\
             create a number called x and set it to 2\n\
             end if",
        );
        assert_eq!(result.error_count, 0);
    }

    #[test]
    fn repeat_count_must_be_numeric() {
        let result = analyze_src(
            "repeat \"three\" times\n\
             display 1\n\
             end repeat",
        );
        assert_eq!(result.error_count, 1);
        assert!(result.diagnostics[0].msg.contains("Repeat count"));
    }

    #[test]
    fn uninitialized_read_is_a_warning_not_an_error() {
        let result = analyze_src(
            "create a number called x\n\
             display x",
        );
        assert!(result.success);
        assert_eq!(result.warning_count, 1);
        assert!(result.diagnostics[0]
            .msg
            .contains("used before initialization"));
    }

    #[test]
    fn non_flag_loop_condition_warns_for_text_only() {
        let numeric = analyze_src("while 1 do\nstop\nend while");
        assert_eq!(numeric.warning_count, 0, "numeric conditions pass silently");

        let texty = analyze_src("while \"yes\" do\nstop\nend while");
        assert_eq!(texty.warning_count, 1);
        assert!(texty.success, "warnings never fail analysis");
    }

    #[test]
    fn constants_reject_assignment_and_reads() {
        let result = analyze_src(
            "create a constant number called limit and set it to 10\n\
             limit becomes 20\n\
             read into limit",
        );
        assert_eq!(result.error_count, 2);
        assert!(result.diagnostics[0].msg.contains("constant"));
        assert!(result.diagnostics[1].msg.contains("constant"));
    }

    #[test]
    fn call_checks_arity_and_argument_types() {
        let result = analyze_src(
            "define function add that takes a number called a and a number called b and returns a number\n\
             give back a plus b\n\
             end function\n\
             create a number called r and set it to add(1, 2, 3)",
        );
        assert_eq!(result.error_count, 1);
        assert!(result.diagnostics[0].msg.contains("expects 2 arguments"));

        let result = analyze_src(
            "define function shout that takes a text called msg\n\
             display msg\n\
             end function\n\
             shout(5)",
        );
        assert_eq!(result.error_count, 1);
        assert!(result.diagnostics[0].msg.contains("type mismatch"));
    }

    #[test]
    fn for_each_requires_an_iterable() {
        let result = analyze_src(
            "create a number called n and set it to 3\n\
             for each item in n\n\
             display item\n\
             end for",
        );
        assert_eq!(result.error_count, 1);
        assert!(result.diagnostics[0].msg.contains("Cannot iterate"));
    }

    #[test]
    fn for_each_iterator_is_scoped_to_the_loop() {
        let result = analyze_src(
            "create a list called items and set it to [1, 2]\n\
             for each item in items\n\
             display item\n\
             end for\n\
             display item",
        );
        assert_eq!(result.error_count, 1);
        assert!(result.diagnostics[0].msg.contains("Undefined variable 'item'"));
    }

    #[test]
    fn between_bounds_must_be_numeric() {
        let result = analyze_src(
            "create a number called t and set it to 70\n\
             if t is between \"low\" and 75 then\n\
             display 1\n\
             end if",
        );
        assert_eq!(result.error_count, 1);
        assert!(result.diagnostics[0].msg.contains("lower bound"));
    }

    #[test]
    fn annotations_land_on_expression_nodes() {
        let tokens = Lexer::new("create a decimal called d and set it to 1.5 plus 2")
            .tokenize()
            .unwrap();
        let mut program = Parser::new(tokens).parse_program().unwrap();
        let result = Analyzer::new().analyze(&mut program);
        assert!(result.success);
        let StmtKind::VarDecl { init: Some(init), .. } = &program.statements[0].kind else {
            panic!("expected var decl with initializer");
        };
        assert_eq!(init.data_type, DataType::Decimal, "decimal promotion");
    }
}
