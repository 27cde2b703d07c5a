//! Parser for NatureLang: turns the lexer's token stream into the AST
//! shared by the rest of the pipeline.

pub mod parser;

pub use parser::Parser;

#[cfg(test)]
mod tests {
    use super::*;
    use naturec_lexer::Lexer;
    use naturec_syntax::*;

    fn parse_expr_str(input: &str) -> Expr {
        let tokens = Lexer::new(input).tokenize().expect("Lexing should succeed");
        let mut parser = Parser::new(tokens);
        parser.parse_expr().expect("Parsing should succeed")
    }

    fn parse_program_str(input: &str) -> Program {
        let tokens = Lexer::new(input).tokenize().expect("Lexing should succeed");
        let mut parser = Parser::new(tokens);
        parser.parse_program().expect("Parsing should succeed")
    }

    #[test]
    fn test_literal_expressions() {
        assert!(matches!(parse_expr_str("42").kind, ExprKind::LiteralInt(42)));
        assert!(matches!(parse_expr_str("2.5").kind, ExprKind::LiteralFloat(v) if v == 2.5));
        assert!(
            matches!(parse_expr_str("\"hello\"").kind, ExprKind::LiteralString(s) if s == "hello")
        );
        assert!(matches!(
            parse_expr_str("true").kind,
            ExprKind::LiteralBool(true)
        ));
        assert!(matches!(
            parse_expr_str("no").kind,
            ExprKind::LiteralBool(false)
        ));
    }

    #[test]
    fn test_worded_arithmetic() {
        let expr = parse_expr_str("3 plus 4 multiplied by 5");
        let ExprKind::Binary { op, right, .. } = expr.kind else {
            panic!("expected binary expression");
        };
        assert_eq!(op, Operator::Add);
        assert!(
            matches!(right.kind, ExprKind::Binary { op: Operator::Mul, .. }),
            "multiplication binds tighter than addition"
        );
    }

    #[test]
    fn test_symbolic_and_worded_forms_agree() {
        for src in ["x plus 1", "x + 1"] {
            assert!(matches!(
                parse_expr_str(src).kind,
                ExprKind::Binary { op: Operator::Add, .. }
            ));
        }
        for src in ["x is greater than 1", "x > 1"] {
            assert!(matches!(
                parse_expr_str(src).kind,
                ExprKind::Binary { op: Operator::Gt, .. }
            ));
        }
        for src in ["x is at least 1", "x >= 1"] {
            assert!(matches!(
                parse_expr_str(src).kind,
                ExprKind::Binary { op: Operator::Gte, .. }
            ));
        }
    }

    #[test]
    fn test_is_between_parses_as_ternary() {
        let expr = parse_expr_str("t is between 65 and 75");
        let ExprKind::Between { lower, upper, .. } = expr.kind else {
            panic!("expected between expression");
        };
        assert!(matches!(lower.kind, ExprKind::LiteralInt(65)));
        assert!(matches!(upper.kind, ExprKind::LiteralInt(75)));
    }

    #[test]
    fn test_between_leaves_logical_and_available() {
        // the first `and` belongs to the bounds, the second is logical
        let expr = parse_expr_str("t is between 1 and 9 and ok");
        assert!(matches!(
            expr.kind,
            ExprKind::Binary { op: Operator::And, .. }
        ));
    }

    #[test]
    fn test_power_is_right_associative() {
        let expr = parse_expr_str("2 ^ 3 ^ 2");
        let ExprKind::Binary { op, right, .. } = expr.kind else {
            panic!("expected binary expression");
        };
        assert_eq!(op, Operator::Pow);
        assert!(matches!(right.kind, ExprKind::Binary { op: Operator::Pow, .. }));
    }

    #[test]
    fn test_calls_lists_and_indexing() {
        let ExprKind::Call { name, args } = parse_expr_str("add(5, 3)").kind else {
            panic!("expected call");
        };
        assert_eq!(name, "add");
        assert_eq!(args.len(), 2);

        let ExprKind::List(items) = parse_expr_str("[1, 2, 3]").kind else {
            panic!("expected list");
        };
        assert_eq!(items.len(), 3);

        assert!(matches!(
            parse_expr_str("items[0]").kind,
            ExprKind::Index { .. }
        ));
    }

    #[test]
    fn test_var_decl_with_initializer() {
        let program = parse_program_str("create a number called x and set it to 10");
        let StmtKind::VarDecl {
            name,
            ty,
            init,
            is_const,
        } = &program.statements[0].kind
        else {
            panic!("expected var decl");
        };
        assert_eq!(name, "x");
        assert_eq!(*ty, DataType::Number);
        assert!(!is_const);
        assert!(matches!(
            init.as_ref().unwrap().kind,
            ExprKind::LiteralInt(10)
        ));
    }

    #[test]
    fn test_constant_decl() {
        let program = parse_program_str("create a constant decimal called pi and set it to 3.14");
        assert!(matches!(
            program.statements[0].kind,
            StmtKind::VarDecl {
                is_const: true,
                ty: DataType::Decimal,
                ..
            }
        ));
    }

    #[test]
    fn test_assignment_forms() {
        let program = parse_program_str("r becomes x plus y");
        assert!(matches!(program.statements[0].kind, StmtKind::Assign { .. }));

        let program = parse_program_str("set r to 5");
        assert!(matches!(program.statements[0].kind, StmtKind::Assign { .. }));

        let program = parse_program_str("items[0] becomes 5");
        let StmtKind::Assign { target, .. } = &program.statements[0].kind else {
            panic!("expected assign");
        };
        assert!(matches!(target.kind, ExprKind::Index { .. }));
    }

    #[test]
    fn test_if_otherwise() {
        let program = parse_program_str(
            "if t is between 65 and 75 then\n\
             display \"ok\"\n\
             otherwise\n\
             display \"no\"\n\
             end if",
        );
        let StmtKind::If { else_branch, .. } = &program.statements[0].kind else {
            panic!("expected if");
        };
        assert!(else_branch.is_some());
    }

    #[test]
    fn test_loops() {
        let program = parse_program_str("repeat 3 times\ndisplay 1\nend repeat");
        assert!(matches!(program.statements[0].kind, StmtKind::Repeat { .. }));

        let program = parse_program_str("while x is less than 10 do\nx becomes x plus 1\nend while");
        assert!(matches!(program.statements[0].kind, StmtKind::While { .. }));

        let program = parse_program_str("for each item in items\ndisplay item\nend for");
        assert!(matches!(program.statements[0].kind, StmtKind::ForEach { .. }));
    }

    #[test]
    fn test_function_declaration() {
        let program = parse_program_str(
            "define function add that takes a number called a and a number called b and returns a number\n\
             give back a plus b\n\
             end function",
        );
        let StmtKind::FuncDecl {
            name,
            params,
            return_type,
            ..
        } = &program.statements[0].kind
        else {
            panic!("expected function decl");
        };
        assert_eq!(name, "add");
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "a");
        assert_eq!(*return_type, DataType::Number);
    }

    #[test]
    fn test_function_without_params_or_return() {
        let program = parse_program_str("define function greet\ndisplay \"hi\"\nend function");
        let StmtKind::FuncDecl {
            params,
            return_type,
            ..
        } = &program.statements[0].kind
        else {
            panic!("expected function decl");
        };
        assert!(params.is_empty());
        assert_eq!(*return_type, DataType::Nothing);
    }

    #[test]
    fn test_io_statements() {
        let program = parse_program_str("ask \"Name?\" into name\nread into line");
        assert!(matches!(
            program.statements[0].kind,
            StmtKind::Ask { prompt: Some(_), .. }
        ));
        assert!(matches!(program.statements[1].kind, StmtKind::Read { .. }));
    }

    #[test]
    fn test_secure_zone() {
        let program = parse_program_str("enter secure zone\ndisplay 1\nend zone");
        assert!(matches!(
            program.statements[0].kind,
            StmtKind::SecureZone { is_safe: false, .. }
        ));

        let program = parse_program_str("enter safe zone\ndisplay 1\nend zone");
        assert!(matches!(
            program.statements[0].kind,
            StmtKind::SecureZone { is_safe: true, .. }
        ));
    }

    #[test]
    fn test_give_back_without_value() {
        let program = parse_program_str("define function f\ngive back\nend function");
        let StmtKind::FuncDecl { body, .. } = &program.statements[0].kind else {
            panic!("expected function decl");
        };
        let StmtKind::Block(stmts) = &body.kind else {
            panic!("expected block body");
        };
        assert!(matches!(stmts[0].kind, StmtKind::Return(None)));
    }

    #[test]
    fn test_call_statement() {
        let program = parse_program_str("call greet with 1 and 2");
        let StmtKind::ExprStmt(expr) = &program.statements[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Call { name, args } = &expr.kind else {
            panic!("expected call");
        };
        assert_eq!(name, "greet");
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_parse_error_reports_location() {
        let tokens = Lexer::new("create a number").tokenize().unwrap();
        let err = Parser::new(tokens).parse_program().unwrap_err();
        assert!(err.msg.contains("'called' or 'named'"));
        assert!(err.line.is_some());
    }
}
