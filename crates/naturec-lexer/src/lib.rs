//! NatureLang lexer: converts source text into tokens.
//!
//! The surface syntax is word-based; this stage only splits words, literals,
//! and symbolic operators. Multi-word constructs ("multiplied by",
//! "is between") are recognized later by the parser.

use naturec_syntax::error::{error_at, Error, Result};
use naturec_syntax::{Loc, Token, TokenKind};

/// Streaming character scanner producing tokens with positions.
pub struct Lexer {
    src: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            src: input.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_next(&self) -> Option<char> {
        self.src.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.src.get(self.pos).copied();
        if let Some(c) = ch {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        ch
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                // "--" comments run to end of line
                Some('-') if self.peek_next() == Some('-') => {
                    while let Some(c) = self.advance() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn read_number(&mut self) -> Result<Token> {
        let loc = Loc::new(self.line, self.col);
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        // fractional part makes it a decimal literal
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            s.push('.');
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    s.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
            let val: f64 = s
                .parse()
                .map_err(|_| Error::at(format!("Invalid number '{}'", s), loc))?;
            return Ok(Token {
                kind: TokenKind::Float(val),
                loc,
            });
        }
        let val: i64 = s
            .parse()
            .map_err(|_| Error::at(format!("Invalid number '{}'", s), loc))?;
        Ok(Token {
            kind: TokenKind::Integer(val),
            loc,
        })
    }

    fn read_word(&mut self) -> Token {
        let loc = Loc::new(self.line, self.col);
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = TokenKind::keyword(&s).unwrap_or(TokenKind::Ident(s));
        Token { kind, loc }
    }

    fn read_string(&mut self) -> Result<Token> {
        let loc = Loc::new(self.line, self.col);
        self.advance(); // opening quote
        let mut s = String::new();
        while let Some(c) = self.advance() {
            match c {
                '"' => {
                    return Ok(Token {
                        kind: TokenKind::Str(s),
                        loc,
                    })
                }
                '\\' => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some('r') => s.push('\r'),
                    Some('\\') => s.push('\\'),
                    Some('"') => s.push('"'),
                    Some(other) => s.push(other),
                    None => return error_at(loc.line, loc.col, "Unterminated string"),
                },
                other => s.push(other),
            }
        }
        error_at(loc.line, loc.col, "Unterminated string")
    }

    /// Tokenize the entire input; the result always ends with `Eof`.
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            let loc = Loc::new(self.line, self.col);
            let kind = match self.peek() {
                None => {
                    tokens.push(Token {
                        kind: TokenKind::Eof,
                        loc,
                    });
                    break;
                }
                Some(c) if c.is_ascii_digit() => {
                    tokens.push(self.read_number()?);
                    continue;
                }
                Some(c) if c.is_ascii_alphabetic() || c == '_' => {
                    tokens.push(self.read_word());
                    continue;
                }
                Some('"') => {
                    tokens.push(self.read_string()?);
                    continue;
                }
                Some('+') => {
                    self.advance();
                    TokenKind::OpPlus
                }
                Some('-') => {
                    self.advance();
                    TokenKind::OpMinus
                }
                Some('*') => {
                    self.advance();
                    TokenKind::OpStar
                }
                Some('/') => {
                    self.advance();
                    TokenKind::OpSlash
                }
                Some('%') => {
                    self.advance();
                    TokenKind::OpPercent
                }
                Some('^') => {
                    self.advance();
                    TokenKind::OpCaret
                }
                Some('=') => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::OpEqEq
                    } else {
                        TokenKind::OpEq
                    }
                }
                Some('!') => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::OpNeq
                    } else {
                        return error_at(loc.line, loc.col, "Unexpected character '!'");
                    }
                }
                Some('<') => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::OpLte
                    } else {
                        TokenKind::OpLt
                    }
                }
                Some('>') => {
                    self.advance();
                    if self.peek() == Some('=') {
                        self.advance();
                        TokenKind::OpGte
                    } else {
                        TokenKind::OpGt
                    }
                }
                Some('(') => {
                    self.advance();
                    TokenKind::LParen
                }
                Some(')') => {
                    self.advance();
                    TokenKind::RParen
                }
                Some('[') => {
                    self.advance();
                    TokenKind::LBracket
                }
                Some(']') => {
                    self.advance();
                    TokenKind::RBracket
                }
                Some(',') => {
                    self.advance();
                    TokenKind::Comma
                }
                Some(other) => {
                    return error_at(
                        loc.line,
                        loc.col,
                        format!("Unexpected character '{}'", other),
                    )
                }
            };
            tokens.push(Token { kind, loc });
        }
        Ok(tokens)
    }
}
