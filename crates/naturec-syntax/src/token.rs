//! Token definitions for the NatureLang lexer.

use crate::ast::Loc;

/// A single lexed token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: Loc,
}

/// All token kinds the lexer can produce.
///
/// NatureLang's surface syntax is made of English words; multi-word
/// constructs ("multiplied by", "is between", "give back") are assembled by
/// the parser from the single-word tokens below.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // declarations
    Create,
    A,
    An,
    Constant,
    Called,
    Named,
    And,
    Set,
    It,
    To,
    Becomes,

    // type names
    TyNumber,
    TyText,
    TyDecimal,
    TyFlag,
    TyList,
    TyNothing,

    // control flow
    If,
    Then,
    Otherwise,
    End,
    Repeat,
    Times,
    While,
    Do,
    For,
    Each,
    In,
    Stop,
    Skip,

    // functions
    Define,
    Function,
    That,
    Takes,
    Returns,
    Give,
    Back,
    Call,
    With,

    // I/O
    Display,
    Show,
    Print,
    Ask,
    Read,
    Into,

    // secure zones
    Enter,
    Secure,
    Safe,
    Zone,

    // logic / comparison words
    Is,
    Not,
    Or,
    True,
    False,
    Yes,
    No,
    Greater,
    Less,
    Than,
    At,
    Least,
    Most,
    Equal,
    Between,

    // arithmetic words
    Plus,
    Minus,
    Multiplied,
    Divided,
    By,
    Modulo,
    Power,

    // symbolic operators
    OpPlus,
    OpMinus,
    OpStar,
    OpSlash,
    OpPercent,
    OpCaret,
    OpEq,
    OpEqEq,
    OpNeq,
    OpLt,
    OpGt,
    OpLte,
    OpGte,

    // punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,

    // literals and identifiers
    Integer(i64),
    Float(f64),
    Str(String),
    Ident(String),

    Eof,
}

impl TokenKind {
    /// Keyword lookup used by the lexer; returns `None` for identifiers.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "create" => TokenKind::Create,
            "a" => TokenKind::A,
            "an" => TokenKind::An,
            "constant" => TokenKind::Constant,
            "called" => TokenKind::Called,
            "named" => TokenKind::Named,
            "and" => TokenKind::And,
            "set" => TokenKind::Set,
            "it" => TokenKind::It,
            "to" => TokenKind::To,
            "becomes" => TokenKind::Becomes,
            "number" => TokenKind::TyNumber,
            "text" => TokenKind::TyText,
            "decimal" => TokenKind::TyDecimal,
            "flag" => TokenKind::TyFlag,
            "list" => TokenKind::TyList,
            "nothing" => TokenKind::TyNothing,
            "if" => TokenKind::If,
            "then" => TokenKind::Then,
            "otherwise" => TokenKind::Otherwise,
            "end" => TokenKind::End,
            "repeat" => TokenKind::Repeat,
            "times" => TokenKind::Times,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "for" => TokenKind::For,
            "each" => TokenKind::Each,
            "in" => TokenKind::In,
            "stop" => TokenKind::Stop,
            "skip" => TokenKind::Skip,
            "define" => TokenKind::Define,
            "function" => TokenKind::Function,
            "that" => TokenKind::That,
            "takes" => TokenKind::Takes,
            "returns" => TokenKind::Returns,
            "give" => TokenKind::Give,
            "back" => TokenKind::Back,
            "call" => TokenKind::Call,
            "with" => TokenKind::With,
            "display" => TokenKind::Display,
            "show" => TokenKind::Show,
            "print" => TokenKind::Print,
            "ask" => TokenKind::Ask,
            "read" => TokenKind::Read,
            "into" => TokenKind::Into,
            "enter" => TokenKind::Enter,
            "secure" => TokenKind::Secure,
            "safe" => TokenKind::Safe,
            "zone" => TokenKind::Zone,
            "is" => TokenKind::Is,
            "not" => TokenKind::Not,
            "or" => TokenKind::Or,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "yes" => TokenKind::Yes,
            "no" => TokenKind::No,
            "greater" => TokenKind::Greater,
            "less" => TokenKind::Less,
            "than" => TokenKind::Than,
            "at" => TokenKind::At,
            "least" => TokenKind::Least,
            "most" => TokenKind::Most,
            "equal" => TokenKind::Equal,
            "between" => TokenKind::Between,
            "plus" => TokenKind::Plus,
            "minus" => TokenKind::Minus,
            "multiplied" => TokenKind::Multiplied,
            "divided" => TokenKind::Divided,
            "by" => TokenKind::By,
            "modulo" => TokenKind::Modulo,
            "power" => TokenKind::Power,
            _ => return None,
        };
        Some(kind)
    }
}
