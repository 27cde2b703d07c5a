//! AST (abstract syntax tree) types for NatureLang.
//!
//! Every expression node carries a source location and a `data_type` slot.
//! The parser leaves `data_type` as [`DataType::Unknown`]; the semantic
//! analyzer fills it in, and the IR builder reads the annotation back.

use std::fmt;

/// Source location of a token or AST node (1-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Loc {
    pub line: usize,
    pub col: usize,
}

impl Loc {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Static type tags used for checking and annotations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    #[default]
    Unknown,
    /// 64-bit integer ("number").
    Number,
    /// 64-bit float ("decimal").
    Decimal,
    /// String ("text").
    Text,
    /// Boolean ("flag").
    Flag,
    /// Dynamic list.
    List,
    /// Void ("nothing").
    Nothing,
    /// Function value (symbol-table only).
    Function,
    /// Error recovery type.
    Error,
}

impl DataType {
    /// Numeric in the analyzer's sense: `Unknown` is treated as numeric so
    /// error recovery does not cascade.
    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Number | DataType::Decimal | DataType::Unknown)
    }

    pub fn is_boolean(self) -> bool {
        matches!(self, DataType::Flag | DataType::Unknown)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Unknown => "unknown",
            DataType::Number => "number",
            DataType::Decimal => "decimal",
            DataType::Text => "text",
            DataType::Flag => "flag",
            DataType::List => "list",
            DataType::Nothing => "nothing",
            DataType::Function => "function",
            DataType::Error => "error",
        };
        f.write_str(s)
    }
}

/// Binary, unary, and ternary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    // arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    // comparison
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    /// "is between" (ternary)
    Between,
    // logical
    And,
    Or,
    Not,
    // unary
    Neg,
    Pos,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Pow => "^",
            Operator::Eq => "==",
            Operator::Neq => "!=",
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Lte => "<=",
            Operator::Gte => ">=",
            Operator::Between => "between",
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Not => "not",
            Operator::Neg => "-",
            Operator::Pos => "+",
        };
        f.write_str(s)
    }
}

/// An expression with its location and (analyzer-filled) resolved type.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub loc: Loc,
    pub data_type: DataType,
}

impl Expr {
    pub fn new(kind: ExprKind, loc: Loc) -> Self {
        Self {
            kind,
            loc,
            data_type: DataType::Unknown,
        }
    }
}

/// Expression payloads.
#[derive(Debug, Clone)]
pub enum ExprKind {
    LiteralInt(i64),
    LiteralFloat(f64),
    LiteralString(String),
    LiteralBool(bool),
    Ident(String),
    Binary {
        op: Operator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: Operator,
        operand: Box<Expr>,
    },
    /// "value is between lower and upper"
    Between {
        value: Box<Expr>,
        lower: Box<Expr>,
        upper: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    List(Vec<Expr>),
}

/// Function parameter declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: DataType,
    pub loc: Loc,
}

/// A statement with its location.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub loc: Loc,
}

impl Stmt {
    pub fn new(kind: StmtKind, loc: Loc) -> Self {
        Self { kind, loc }
    }
}

/// Statement payloads. Loop and branch bodies are always [`StmtKind::Block`]
/// nodes; the enclosing construct decides the scope, the block decides the
/// brace pair in the generated code.
#[derive(Debug, Clone)]
pub enum StmtKind {
    VarDecl {
        name: String,
        ty: DataType,
        init: Option<Expr>,
        is_const: bool,
    },
    FuncDecl {
        name: String,
        params: Vec<Param>,
        return_type: DataType,
        body: Box<Stmt>,
    },
    Block(Vec<Stmt>),
    Assign {
        target: Expr,
        value: Expr,
    },
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    /// "repeat N times" with an implicit 0..N iterator.
    Repeat {
        count: Expr,
        body: Box<Stmt>,
    },
    ForEach {
        iterator: String,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Display(Expr),
    Ask {
        prompt: Option<Expr>,
        target: String,
    },
    Read {
        target: String,
    },
    SecureZone {
        body: Box<Stmt>,
        is_safe: bool,
    },
    ExprStmt(Expr),
}

/// Entire program: the top-level statement list.
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}
