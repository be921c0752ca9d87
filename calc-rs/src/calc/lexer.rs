//! Tokenizer shared by the infix and postfix compilers.
//!
//! Number tokens are kept as text; each domain parses its own literals.
//! Operator tokens are matched longest-first against the calculator's
//! [`OperatorTable`], so `<=` and `<<` are single tokens where the domain
//! defines them.

use std::fmt;

use super::compiler::OperatorTable;

/// Characters that may form an operator token.
const OPERATOR_CHARS: &str = "+-*/%^<>=!&|";

// ── Token ─────────────────────────────────────────────────────────────────────

/// Explicit counts attached to a call site (`name$N` or `name$N,M`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub inputs: usize,
    pub outputs: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Number(String),
    Ident { name: String, counts: Option<CallCounts> },
    Operator(String),
    LParen,
    RParen,
    Comma,
    /// Unrecognised input — reported as a diagnostic instead of masking as EOF.
    Unknown(char),
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "number '{n}'"),
            TokenKind::Ident { name, .. } => write!(f, "symbol '{name}'"),
            TokenKind::Operator(op) => write!(f, "operator '{op}'"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::Unknown(c) => write!(f, "character '{c}'"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Char offset of the first character.
    pub position: usize,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

pub struct Lexer<'a> {
    src: Vec<char>,
    pos: usize,
    operators: &'a OperatorTable,
    /// Postfix input reads `-3` as one literal.
    signed_literals: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &str, operators: &'a OperatorTable) -> Self {
        Lexer { src: src.chars().collect(), pos: 0, operators, signed_literals: false }
    }

    pub fn with_signed_literals(mut self, enabled: bool) -> Self {
        self.signed_literals = enabled;
        self
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.src.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, out: &mut String, pred: impl Fn(char) -> bool) {
        while let Some(c) = self.peek().filter(|&c| pred(c)) {
            out.push(c);
            self.pos += 1;
        }
    }

    fn read_number(&mut self, first: char) -> TokenKind {
        let mut s = String::new();
        s.push(first);

        // Radix literal: 0x…, 0o…, 0b…
        if first == '0' && matches!(self.peek(), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B')) {
            if let Some(c) = self.advance() {
                s.push(c);
            }
            self.take_while(&mut s, |c| c.is_ascii_alphanumeric() || c == '_');
            return TokenKind::Number(s);
        }

        self.take_while(&mut s, |c| c.is_ascii_digit() || c == '_');
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            s.push('.');
            self.pos += 1;
            self.take_while(&mut s, |c| c.is_ascii_digit() || c == '_');
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    if let Some(c) = self.advance() {
                        s.push(c);
                    }
                }
                self.take_while(&mut s, |c| c.is_ascii_digit());
            }
        }
        TokenKind::Number(s)
    }

    fn read_ident(&mut self, first: char) -> TokenKind {
        let mut name = String::new();
        name.push(first);
        self.take_while(&mut name, |c| c.is_alphanumeric() || c == '_');

        // Call-site counts: name$N or name$N,M
        let mut counts = None;
        if self.peek() == Some('$') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            let inputs = self.read_count();
            let mut outputs = None;
            if self.peek() == Some(',') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
                outputs = Some(self.read_count());
            }
            counts = Some(CallCounts { inputs, outputs });
        }
        TokenKind::Ident { name, counts }
    }

    fn read_count(&mut self) -> usize {
        let mut digits = String::new();
        self.take_while(&mut digits, |c| c.is_ascii_digit());
        // Absurdly long counts saturate; the arity check rejects them later.
        digits.parse().unwrap_or(usize::MAX)
    }

    fn read_operator(&mut self, first: char) -> TokenKind {
        let mut longest = 1;
        let mut candidate = String::from(first);
        for extra in 1.. {
            match self.peek_at(extra - 1) {
                Some(c) if OPERATOR_CHARS.contains(c) => {
                    candidate.push(c);
                    if self.operators.is_operator(&candidate) {
                        longest = extra + 1;
                    }
                }
                _ => break,
            }
        }
        let op: String = candidate.chars().take(longest).collect();
        if longest == 1 && !self.operators.is_operator(&op) {
            return TokenKind::Unknown(first);
        }
        self.pos += longest - 1;
        TokenKind::Operator(op)
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_ws();
        let position = self.pos;
        let prev_is_space = position == 0 || self.src[position - 1].is_whitespace();
        let kind = match self.advance() {
            None => TokenKind::Eof,
            Some(c) if c.is_ascii_digit() => self.read_number(c),
            Some('.') if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number('.'),
            Some('-')
                if self.signed_literals
                    && prev_is_space
                    && self.peek().is_some_and(|c| c.is_ascii_digit()) =>
            {
                let first = self.advance().unwrap_or('0');
                match self.read_number(first) {
                    TokenKind::Number(n) => TokenKind::Number(format!("-{n}")),
                    other => other,
                }
            }
            Some(c) if c.is_alphabetic() || c == '_' || c == '$' => self.read_ident(c),
            Some('(') => TokenKind::LParen,
            Some(')') => TokenKind::RParen,
            Some(',') => TokenKind::Comma,
            Some(c) if OPERATOR_CHARS.contains(c) => self.read_operator(c),
            Some(c) => TokenKind::Unknown(c),
        };
        Token { kind, position }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token();
            let done = t.kind == TokenKind::Eof;
            tokens.push(t);
            if done {
                break;
            }
        }
        tokens
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
