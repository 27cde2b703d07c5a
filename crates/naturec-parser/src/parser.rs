//! Recursive-descent parser for NatureLang.
//!
//! Statements are keyword-directed, so no backtracking is needed; the only
//! lookahead of two tokens is for the `and`-separated clauses of
//! declarations and function headers. `is between` bounds parse at the
//! additive level so the `and` separating them never collides with the
//! logical operator.

use naturec_syntax::error::{Error, Result};
use naturec_syntax::{
    DataType, Expr, ExprKind, Loc, Operator, Param, Program, Stmt, StmtKind, Token, TokenKind,
};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// One token of lookahead past the current one.
    fn peek2_kind(&self) -> &TokenKind {
        let i = (self.pos + 1).min(self.tokens.len() - 1);
        &self.tokens[i].kind
    }

    fn loc(&self) -> Loc {
        self.peek().loc
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(Error::at(
                format!("Expected {}, found {:?}", what, tok.kind),
                tok.loc,
            ))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String> {
        match self.peek_kind() {
            TokenKind::Ident(_) => {
                let tok = self.advance();
                match tok.kind {
                    TokenKind::Ident(name) => Ok(name),
                    _ => unreachable!(),
                }
            }
            other => Err(Error::at(
                format!("Expected {}, found {:?}", what, other),
                self.loc(),
            )),
        }
    }

    /// Parse the whole token stream into a program.
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut statements = Vec::new();
        while !self.check(&TokenKind::Eof) {
            statements.push(self.parse_stmt()?);
        }
        Ok(Program { statements })
    }

    /// Statements until `end` (or `otherwise` inside an `if`), wrapped in a
    /// block node.
    fn parse_body(&mut self) -> Result<Stmt> {
        let loc = self.loc();
        let mut stmts = Vec::new();
        while !matches!(
            self.peek_kind(),
            TokenKind::End | TokenKind::Otherwise | TokenKind::Eof
        ) {
            stmts.push(self.parse_stmt()?);
        }
        Ok(Stmt::new(StmtKind::Block(stmts), loc))
    }

    /// Consume `end` plus its optional echo keyword (`end if`, `end repeat`,
    /// `end function`, ...).
    fn expect_end(&mut self, echo: &TokenKind) -> Result<()> {
        self.expect(&TokenKind::End, "'end'")?;
        self.eat(echo);
        Ok(())
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        let loc = self.loc();
        match self.peek_kind() {
            TokenKind::Create => self.parse_create(),
            TokenKind::Set => {
                self.advance();
                let name = self.expect_ident("a variable name after 'set'")?;
                self.expect(&TokenKind::To, "'to'")?;
                let value = self.parse_expr()?;
                let target = Expr::new(ExprKind::Ident(name), loc);
                Ok(Stmt::new(StmtKind::Assign { target, value }, loc))
            }
            TokenKind::Display | TokenKind::Show | TokenKind::Print => {
                self.advance();
                let value = self.parse_expr()?;
                Ok(Stmt::new(StmtKind::Display(value), loc))
            }
            TokenKind::Ask => {
                self.advance();
                let prompt = if self.check(&TokenKind::Into) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect(&TokenKind::Into, "'into'")?;
                let target = self.expect_ident("a variable name after 'into'")?;
                Ok(Stmt::new(StmtKind::Ask { prompt, target }, loc))
            }
            TokenKind::Read => {
                self.advance();
                self.expect(&TokenKind::Into, "'into'")?;
                let target = self.expect_ident("a variable name after 'into'")?;
                Ok(Stmt::new(StmtKind::Read { target }, loc))
            }
            TokenKind::If => {
                self.advance();
                let cond = self.parse_expr()?;
                self.expect(&TokenKind::Then, "'then'")?;
                let then_branch = Box::new(self.parse_body()?);
                let else_branch = if self.eat(&TokenKind::Otherwise) {
                    Some(Box::new(self.parse_body()?))
                } else {
                    None
                };
                self.expect_end(&TokenKind::If)?;
                Ok(Stmt::new(
                    StmtKind::If {
                        cond,
                        then_branch,
                        else_branch,
                    },
                    loc,
                ))
            }
            TokenKind::While => {
                self.advance();
                let cond = self.parse_expr()?;
                self.eat(&TokenKind::Do);
                let body = Box::new(self.parse_body()?);
                self.expect_end(&TokenKind::While)?;
                Ok(Stmt::new(StmtKind::While { cond, body }, loc))
            }
            TokenKind::Repeat => {
                self.advance();
                let count = self.parse_expr()?;
                self.expect(&TokenKind::Times, "'times'")?;
                let body = Box::new(self.parse_body()?);
                self.expect_end(&TokenKind::Repeat)?;
                Ok(Stmt::new(StmtKind::Repeat { count, body }, loc))
            }
            TokenKind::For => {
                self.advance();
                self.expect(&TokenKind::Each, "'each'")?;
                let iterator = self.expect_ident("an iterator name")?;
                self.expect(&TokenKind::In, "'in'")?;
                let iterable = self.parse_expr()?;
                let body = Box::new(self.parse_body()?);
                self.expect_end(&TokenKind::For)?;
                Ok(Stmt::new(
                    StmtKind::ForEach {
                        iterator,
                        iterable,
                        body,
                    },
                    loc,
                ))
            }
            TokenKind::Define => self.parse_func_decl(),
            TokenKind::Give => {
                self.advance();
                self.expect(&TokenKind::Back, "'back'")?;
                let value = if self.starts_expr() {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                Ok(Stmt::new(StmtKind::Return(value), loc))
            }
            TokenKind::Stop => {
                self.advance();
                Ok(Stmt::new(StmtKind::Break, loc))
            }
            TokenKind::Skip => {
                self.advance();
                Ok(Stmt::new(StmtKind::Continue, loc))
            }
            TokenKind::Enter => {
                self.advance();
                let is_safe = match self.peek_kind() {
                    TokenKind::Safe => {
                        self.advance();
                        true
                    }
                    TokenKind::Secure => {
                        self.advance();
                        false
                    }
                    other => {
                        return Err(Error::at(
                            format!("Expected 'secure' or 'safe', found {:?}", other),
                            loc,
                        ))
                    }
                };
                self.expect(&TokenKind::Zone, "'zone'")?;
                let body = Box::new(self.parse_body()?);
                self.expect_end(&TokenKind::Zone)?;
                Ok(Stmt::new(StmtKind::SecureZone { body, is_safe }, loc))
            }
            TokenKind::Call => {
                self.advance();
                let name = self.expect_ident("a function name after 'call'")?;
                let mut args = Vec::new();
                if self.eat(&TokenKind::With) {
                    args.push(self.parse_comparison()?);
                    while self.eat(&TokenKind::And) {
                        args.push(self.parse_comparison()?);
                    }
                }
                let call = Expr::new(ExprKind::Call { name, args }, loc);
                Ok(Stmt::new(StmtKind::ExprStmt(call), loc))
            }
            TokenKind::Ident(_) => {
                // assignment target or a bare expression statement
                let target = self.parse_postfix()?;
                if self.eat(&TokenKind::Becomes) {
                    let value = self.parse_expr()?;
                    Ok(Stmt::new(StmtKind::Assign { target, value }, loc))
                } else {
                    Ok(Stmt::new(StmtKind::ExprStmt(target), loc))
                }
            }
            other => Err(Error::at(
                format!("Unexpected token {:?} at start of statement", other),
                loc,
            )),
        }
    }

    /// `create a|an [constant] TYPE called|named IDENT [and set it to EXPR]`
    fn parse_create(&mut self) -> Result<Stmt> {
        let loc = self.loc();
        self.expect(&TokenKind::Create, "'create'")?;
        if !self.eat(&TokenKind::A) {
            self.eat(&TokenKind::An);
        }
        let is_const = self.eat(&TokenKind::Constant);
        let ty = self.parse_type_word()?;
        if !self.eat(&TokenKind::Called) {
            self.expect(&TokenKind::Named, "'called' or 'named'")?;
        }
        let name = self.expect_ident("a variable name")?;

        let init = if self.check(&TokenKind::And) && *self.peek2_kind() == TokenKind::Set {
            self.advance(); // and
            self.advance(); // set
            self.expect(&TokenKind::It, "'it'")?;
            self.expect(&TokenKind::To, "'to'")?;
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(Stmt::new(
            StmtKind::VarDecl {
                name,
                ty,
                init,
                is_const,
            },
            loc,
        ))
    }

    /// `define function NAME [that takes PARAM {and PARAM}]
    ///  [and returns TYPE] BODY end [function]`
    fn parse_func_decl(&mut self) -> Result<Stmt> {
        let loc = self.loc();
        self.expect(&TokenKind::Define, "'define'")?;
        self.eat(&TokenKind::A);
        self.expect(&TokenKind::Function, "'function'")?;
        let name = self.expect_ident("a function name")?;

        let mut params = Vec::new();
        if self.eat(&TokenKind::That) {
            self.expect(&TokenKind::Takes, "'takes'")?;
            params.push(self.parse_param()?);
            while self.check(&TokenKind::And)
                && matches!(self.peek2_kind(), TokenKind::A | TokenKind::An)
            {
                self.advance(); // and
                params.push(self.parse_param()?);
            }
        }

        let mut return_type = DataType::Nothing;
        if (self.check(&TokenKind::And) && *self.peek2_kind() == TokenKind::Returns)
            || self.check(&TokenKind::Returns)
        {
            self.eat(&TokenKind::And);
            self.expect(&TokenKind::Returns, "'returns'")?;
            if !self.eat(&TokenKind::A) {
                self.eat(&TokenKind::An);
            }
            return_type = self.parse_type_word()?;
        }

        let body = Box::new(self.parse_body()?);
        self.expect_end(&TokenKind::Function)?;
        Ok(Stmt::new(
            StmtKind::FuncDecl {
                name,
                params,
                return_type,
                body,
            },
            loc,
        ))
    }

    /// `a|an TYPE called|named IDENT`
    fn parse_param(&mut self) -> Result<Param> {
        let loc = self.loc();
        if !self.eat(&TokenKind::A) {
            self.eat(&TokenKind::An);
        }
        let ty = self.parse_type_word()?;
        if !self.eat(&TokenKind::Called) {
            self.expect(&TokenKind::Named, "'called' or 'named'")?;
        }
        let name = self.expect_ident("a parameter name")?;
        Ok(Param { name, ty, loc })
    }

    fn parse_type_word(&mut self) -> Result<DataType> {
        let ty = match self.peek_kind() {
            TokenKind::TyNumber => DataType::Number,
            TokenKind::TyDecimal => DataType::Decimal,
            TokenKind::TyText => DataType::Text,
            TokenKind::TyFlag => DataType::Flag,
            TokenKind::TyList => DataType::List,
            TokenKind::TyNothing => DataType::Nothing,
            other => {
                return Err(Error::at(
                    format!("Expected a type name, found {:?}", other),
                    self.loc(),
                ))
            }
        };
        self.advance();
        Ok(ty)
    }

    /// Can the current token begin an expression? Used to decide whether
    /// `give back` carries a value.
    fn starts_expr(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Integer(_)
                | TokenKind::Float(_)
                | TokenKind::Str(_)
                | TokenKind::Ident(_)
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Yes
                | TokenKind::No
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::OpMinus
                | TokenKind::OpPlus
                | TokenKind::Not
        )
    }

    // ---- expression grammar, loosest binding first ----

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.check(&TokenKind::Or) {
            let loc = self.loc();
            self.advance();
            let right = self.parse_and()?;
            left = Expr::new(
                ExprKind::Binary {
                    op: Operator::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                loc,
            );
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_comparison()?;
        while self.check(&TokenKind::And) {
            let loc = self.loc();
            self.advance();
            let right = self.parse_comparison()?;
            left = Expr::new(
                ExprKind::Binary {
                    op: Operator::And,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                loc,
            );
        }
        Ok(left)
    }

    /// One comparison; the worded forms all start with `is`.
    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_additive()?;
        let loc = self.loc();

        if self.eat(&TokenKind::Is) {
            // "x is between lo and hi"
            if self.eat(&TokenKind::Between) {
                let lower = self.parse_additive()?;
                self.expect(&TokenKind::And, "'and' between the bounds")?;
                let upper = self.parse_additive()?;
                return Ok(Expr::new(
                    ExprKind::Between {
                        value: Box::new(left),
                        lower: Box::new(lower),
                        upper: Box::new(upper),
                    },
                    loc,
                ));
            }
            let op = if self.eat(&TokenKind::Not) {
                self.expect(&TokenKind::Equal, "'equal'")?;
                self.expect(&TokenKind::To, "'to'")?;
                Operator::Neq
            } else if self.eat(&TokenKind::Greater) {
                self.expect(&TokenKind::Than, "'than'")?;
                Operator::Gt
            } else if self.eat(&TokenKind::Less) {
                self.expect(&TokenKind::Than, "'than'")?;
                Operator::Lt
            } else if self.eat(&TokenKind::At) {
                if self.eat(&TokenKind::Least) {
                    Operator::Gte
                } else {
                    self.expect(&TokenKind::Most, "'least' or 'most'")?;
                    Operator::Lte
                }
            } else if self.eat(&TokenKind::Equal) {
                self.expect(&TokenKind::To, "'to'")?;
                Operator::Eq
            } else {
                Operator::Eq
            };
            let right = self.parse_additive()?;
            return Ok(Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                loc,
            ));
        }

        let op = match self.peek_kind() {
            TokenKind::OpEqEq => Operator::Eq,
            TokenKind::OpNeq => Operator::Neq,
            TokenKind::OpLt => Operator::Lt,
            TokenKind::OpGt => Operator::Gt,
            TokenKind::OpLte => Operator::Lte,
            TokenKind::OpGte => Operator::Gte,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_additive()?;
        Ok(Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            loc,
        ))
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let loc = self.loc();
            let op = match self.peek_kind() {
                TokenKind::Plus | TokenKind::OpPlus => Operator::Add,
                TokenKind::Minus | TokenKind::OpMinus => Operator::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                loc,
            );
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut left = self.parse_power()?;
        loop {
            let loc = self.loc();
            let op = match self.peek_kind() {
                TokenKind::Multiplied => {
                    self.advance();
                    self.expect(&TokenKind::By, "'by' after 'multiplied'")?;
                    Operator::Mul
                }
                TokenKind::Divided => {
                    self.advance();
                    self.expect(&TokenKind::By, "'by' after 'divided'")?;
                    Operator::Div
                }
                TokenKind::Modulo => {
                    self.advance();
                    Operator::Mod
                }
                TokenKind::OpStar => {
                    self.advance();
                    Operator::Mul
                }
                TokenKind::OpSlash => {
                    self.advance();
                    Operator::Div
                }
                TokenKind::OpPercent => {
                    self.advance();
                    Operator::Mod
                }
                _ => break,
            };
            let right = self.parse_power()?;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                loc,
            );
        }
        Ok(left)
    }

    /// `^` is right-associative.
    fn parse_power(&mut self) -> Result<Expr> {
        let base = self.parse_unary()?;
        if self.check(&TokenKind::OpCaret) {
            let loc = self.loc();
            self.advance();
            let exp = self.parse_power()?;
            return Ok(Expr::new(
                ExprKind::Binary {
                    op: Operator::Pow,
                    left: Box::new(base),
                    right: Box::new(exp),
                },
                loc,
            ));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let loc = self.loc();
        let op = match self.peek_kind() {
            TokenKind::OpMinus => Operator::Neg,
            TokenKind::OpPlus => Operator::Pos,
            TokenKind::Not => Operator::Not,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            loc,
        ))
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        while self.check(&TokenKind::LBracket) {
            let loc = self.loc();
            self.advance();
            let index = self.parse_expr()?;
            self.expect(&TokenKind::RBracket, "']'")?;
            expr = Expr::new(
                ExprKind::Index {
                    base: Box::new(expr),
                    index: Box::new(index),
                },
                loc,
            );
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let loc = self.loc();
        match self.peek_kind().clone() {
            TokenKind::Integer(v) => {
                self.advance();
                Ok(Expr::new(ExprKind::LiteralInt(v), loc))
            }
            TokenKind::Float(v) => {
                self.advance();
                Ok(Expr::new(ExprKind::LiteralFloat(v), loc))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::new(ExprKind::LiteralString(s), loc))
            }
            TokenKind::True | TokenKind::Yes => {
                self.advance();
                Ok(Expr::new(ExprKind::LiteralBool(true), loc))
            }
            TokenKind::False | TokenKind::No => {
                self.advance();
                Ok(Expr::new(ExprKind::LiteralBool(false), loc))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.eat(&TokenKind::LParen) {
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        args.push(self.parse_expr()?);
                        while self.eat(&TokenKind::Comma) {
                            args.push(self.parse_expr()?);
                        }
                    }
                    self.expect(&TokenKind::RParen, "')'")?;
                    Ok(Expr::new(ExprKind::Call { name, args }, loc))
                } else {
                    Ok(Expr::new(ExprKind::Ident(name), loc))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RBracket) {
                    elements.push(self.parse_expr()?);
                    while self.eat(&TokenKind::Comma) {
                        elements.push(self.parse_expr()?);
                    }
                }
                self.expect(&TokenKind::RBracket, "']'")?;
                Ok(Expr::new(ExprKind::List(elements), loc))
            }
            other => Err(Error::at(
                format!("Unexpected token {:?} in expression", other),
                loc,
            )),
        }
    }
}
