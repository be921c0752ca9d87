//! Compiler: source text → [`ExecutableForm`].
//!
//! Both notations lower to the same flat op list.  Every symbol name is
//! resolved against the environment while compiling, so a successful compile
//! never fails later with [`CalcError::UnknownSymbol`], and later
//! redefinitions do not change already compiled code.
//!
//! Infix precedence (lowest → highest) comes from the domain's
//! [`OperatorTable`]; the standard table is
//!   comparisons  →  additive  →  multiplicative  →  `^`  →  unary `-`

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::trace;

use super::domain::Domain;
use super::env::Environment;
use super::lexer::{CallCounts, Lexer, Token, TokenKind};
use super::symbol::{Frame, Symbol};
use crate::error::{CalcError, Result};

/// Precedence shared by `^` and prefix operators, so `-2^2` is `-(2^2)`.
const UNARY_PRECEDENCE: u8 = 7;

/// Deepest infix nesting (parentheses, argument lists, prefix and
/// right-associative chains) the parser accepts.
const MAX_NESTING: usize = 256;

// ── Notation ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Notation {
    #[default]
    Infix,
    Postfix,
}

impl FromStr for Notation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "infix" | "in" => Ok(Notation::Infix),
            "postfix" | "rpn" | "post" => Ok(Notation::Postfix),
            other => Err(format!("unknown notation '{other}' (expected infix or postfix)")),
        }
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Notation::Infix => "infix",
            Notation::Postfix => "postfix",
        })
    }
}

// ── Operator table ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryOperator {
    pub precedence: u8,
    pub right_assoc: bool,
}

/// Operator tokens a domain understands.  Binary operators call the symbol
/// with the same name; prefix operators map to a named symbol.
#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
    binary: HashMap<String, BinaryOperator>,
    unary: HashMap<String, String>,
}

impl OperatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Comparisons, `+ -`, `* / %`, right-associative `^`, prefix `-`.
    pub fn standard() -> Self {
        let mut table = Self::new();
        for op in ["==", "!=", "<", "<=", ">", ">="] {
            table = table.with_binary(op, 1, false);
        }
        table
            .with_binary("+", 5, false)
            .with_binary("-", 5, false)
            .with_binary("*", 6, false)
            .with_binary("/", 6, false)
            .with_binary("%", 6, false)
            .with_binary("^", UNARY_PRECEDENCE, true)
            .with_unary("-", "neg")
    }

    pub fn with_binary(mut self, token: &str, precedence: u8, right_assoc: bool) -> Self {
        self.binary.insert(token.to_owned(), BinaryOperator { precedence, right_assoc });
        self
    }

    pub fn with_unary(mut self, token: &str, symbol: &str) -> Self {
        self.unary.insert(token.to_owned(), symbol.to_owned());
        self
    }

    pub fn binary(&self, token: &str) -> Option<BinaryOperator> {
        self.binary.get(token).copied()
    }

    pub fn unary(&self, token: &str) -> Option<&str> {
        self.unary.get(token).map(String::as_str)
    }

    pub fn is_operator(&self, token: &str) -> bool {
        self.binary.contains_key(token) || self.unary.contains_key(token)
    }
}

// ── Executable form ───────────────────────────────────────────────────────────

enum Op<D: Domain> {
    Push(D::Value),
    /// Function argument placeholder (`_1` is index 0).
    Arg(usize),
    Call {
        name: String,
        symbol: Arc<dyn Symbol<D>>,
        inputs: Option<usize>,
        outputs: Option<usize>,
    },
}

impl<D: Domain> Clone for Op<D> {
    fn clone(&self) -> Self {
        match self {
            Op::Push(v) => Op::Push(v.clone()),
            Op::Arg(i) => Op::Arg(*i),
            Op::Call { name, symbol, inputs, outputs } => Op::Call {
                name: name.clone(),
                symbol: Arc::clone(symbol),
                inputs: *inputs,
                outputs: *outputs,
            },
        }
    }
}

/// Compiled code bound to one domain.
pub struct ExecutableForm<D: Domain> {
    ops: Vec<Op<D>>,
}

impl<D: Domain> Clone for ExecutableForm<D> {
    fn clone(&self) -> Self {
        ExecutableForm { ops: self.ops.clone() }
    }
}

impl<D: Domain> fmt::Debug for ExecutableForm<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for op in &self.ops {
            match op {
                Op::Push(v) => list.entry(v),
                Op::Arg(i) => list.entry(&format_args!("_{}", i + 1)),
                Op::Call { name, .. } => list.entry(&format_args!("{name}")),
            };
        }
        list.finish()
    }
}

impl<D: Domain> ExecutableForm<D> {
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Run against `frame`, stopping at the first failure.
    pub fn execute(&self, frame: &mut Frame<'_, D>) -> Result<()> {
        for op in &self.ops {
            match op {
                Op::Push(v) => frame.stack_mut().push(v.clone()),
                Op::Arg(i) => {
                    let v = frame.arg(*i)?.clone();
                    frame.stack_mut().push(v);
                }
                Op::Call { name, symbol, inputs, outputs } => {
                    trace!(symbol = %name, depth = frame.stack().len(), "call");
                    symbol.call(frame, *inputs, *outputs)?;
                }
            }
        }
        Ok(())
    }
}

// ── Compiler ──────────────────────────────────────────────────────────────────

pub struct Compiler<'a, D: Domain> {
    env: &'a Environment<D>,
    operators: &'a OperatorTable,
    /// Number of `_N` argument placeholders in scope.
    params: usize,
}

impl<'a, D: Domain> Compiler<'a, D> {
    pub fn new(env: &'a Environment<D>, operators: &'a OperatorTable) -> Self {
        Compiler { env, operators, params: 0 }
    }

    /// Bring `_1 … _count` into scope for a function body.
    pub fn with_params(mut self, count: usize) -> Self {
        self.params = count;
        self
    }

    pub fn compile(&self, notation: Notation, src: &str) -> Result<ExecutableForm<D>> {
        let lexer = Lexer::new(src, self.operators).with_signed_literals(notation == Notation::Postfix);
        let tokens = lexer.tokenize();
        let mut ops = Vec::new();
        match notation {
            Notation::Postfix => self.compile_postfix(&tokens, &mut ops)?,
            Notation::Infix => {
                let mut parser = InfixParser { compiler: self, tokens: &tokens, pos: 0, depth: 0, ops: &mut ops };
                parser.parse()?;
            }
        }
        Ok(ExecutableForm { ops })
    }

    fn compile_postfix(&self, tokens: &[Token], ops: &mut Vec<Op<D>>) -> Result<()> {
        for token in tokens {
            match &token.kind {
                TokenKind::Number(text) => ops.push(self.literal(text, token.position)?),
                TokenKind::Ident { name, counts } => {
                    let (inputs, outputs) = split_counts(*counts);
                    ops.push(self.call(name, token.position, inputs, outputs)?);
                }
                TokenKind::Operator(op) => ops.push(self.call(op, token.position, None, None)?),
                TokenKind::Eof => break,
                other => {
                    return Err(CalcError::syntax(
                        token.position,
                        format!("unexpected {other} in postfix expression"),
                    ))
                }
            }
        }
        Ok(())
    }

    fn literal(&self, text: &str, position: usize) -> Result<Op<D>> {
        D::parse_literal(text)
            .map(Op::Push)
            .map_err(|message| CalcError::syntax(position, message))
    }

    fn call(&self, name: &str, position: usize, inputs: Option<usize>, outputs: Option<usize>) -> Result<Op<D>> {
        if let Some(index) = self.param_index(name) {
            if inputs.is_some_and(|n| n != 0) || outputs.is_some_and(|n| n != 1) {
                return Err(CalcError::syntax(position, format!("argument {name} takes no call counts")));
            }
            return Ok(Op::Arg(index));
        }
        let symbol = self.env.resolve(name)?;
        Ok(Op::Call { name: name.to_owned(), symbol, inputs, outputs })
    }

    fn param_index(&self, name: &str) -> Option<usize> {
        let n: usize = name.strip_prefix('_')?.parse().ok()?;
        (1..=self.params).contains(&n).then(|| n - 1)
    }
}

fn split_counts(counts: Option<CallCounts>) -> (Option<usize>, Option<usize>) {
    match counts {
        Some(c) => (Some(c.inputs), c.outputs),
        None => (None, None),
    }
}

// ── Infix parser ──────────────────────────────────────────────────────────────

struct InfixParser<'c, 'a, D: Domain> {
    compiler: &'c Compiler<'a, D>,
    tokens: &'c [Token],
    pos: usize,
    depth: usize,
    ops: &'c mut Vec<Op<D>>,
}

impl<D: Domain> InfixParser<'_, '_, D> {
    fn peek(&self) -> &TokenKind {
        self.tokens.get(self.pos).map(|t| &t.kind).unwrap_or(&TokenKind::Eof)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.position)
            .unwrap_or(0)
    }

    fn eat(&mut self, expected: &TokenKind) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn unexpected(&self) -> CalcError {
        CalcError::syntax(self.position(), format!("unexpected {}", self.peek()))
    }

    fn parse(&mut self) -> Result<()> {
        self.parse_expr(0)?;
        if self.peek() != &TokenKind::Eof {
            return Err(self.unexpected());
        }
        Ok(())
    }

    fn parse_expr(&mut self, min_precedence: u8) -> Result<()> {
        if self.depth >= MAX_NESTING {
            return Err(CalcError::syntax(self.position(), "expression nested too deeply"));
        }
        self.depth += 1;
        let result = self.parse_binary(min_precedence);
        self.depth -= 1;
        result
    }

    /// Precedence climbing over the domain's binary operators.
    fn parse_binary(&mut self, min_precedence: u8) -> Result<()> {
        self.parse_unary()?;
        loop {
            let (op, info) = match self.peek() {
                TokenKind::Operator(op) => match self.compiler.operators.binary(op) {
                    Some(info) if info.precedence >= min_precedence => (op.clone(), info),
                    _ => break,
                },
                _ => break,
            };
            let position = self.position();
            self.pos += 1;
            let next_min = if info.right_assoc { info.precedence } else { info.precedence + 1 };
            self.parse_expr(next_min)?;
            let call = self.compiler.call(&op, position, None, None)?;
            self.ops.push(call);
        }
        Ok(())
    }

    fn parse_unary(&mut self) -> Result<()> {
        if let TokenKind::Operator(op) = self.peek() {
            if let Some(symbol) = self.compiler.operators.unary(op) {
                let symbol = symbol.to_owned();
                let position = self.position();
                self.pos += 1;
                self.parse_expr(UNARY_PRECEDENCE)?;
                let call = self.compiler.call(&symbol, position, None, None)?;
                self.ops.push(call);
                return Ok(());
            }
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<()> {
        let position = self.position();
        match self.peek().clone() {
            TokenKind::Number(text) => {
                self.pos += 1;
                let op = self.compiler.literal(&text, position)?;
                self.ops.push(op);
            }
            TokenKind::Ident { name, counts } => {
                self.pos += 1;
                if self.eat(&TokenKind::LParen) {
                    if counts.is_some() {
                        return Err(CalcError::syntax(position, format!("'{name}' has both counts and an argument list")));
                    }
                    let argc = self.parse_args(&name)?;
                    let call = self.compiler.call(&name, position, Some(argc), None)?;
                    self.ops.push(call);
                } else {
                    let (inputs, outputs) = split_counts(counts);
                    let call = self.compiler.call(&name, position, inputs, outputs)?;
                    self.ops.push(call);
                }
            }
            TokenKind::LParen => {
                self.pos += 1;
                self.parse_expr(0)?;
                if !self.eat(&TokenKind::RParen) {
                    return Err(CalcError::syntax(self.position(), format!("expected ')', found {}", self.peek())));
                }
            }
            _ => return Err(self.unexpected()),
        }
        Ok(())
    }

    /// Parse `a, b, …)` after the opening parenthesis; returns the count.
    fn parse_args(&mut self, name: &str) -> Result<usize> {
        if self.eat(&TokenKind::RParen) {
            return Ok(0);
        }
        let mut argc = 0;
        loop {
            self.parse_expr(0)?;
            argc += 1;
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            if self.eat(&TokenKind::RParen) {
                return Ok(argc);
            }
            return Err(CalcError::syntax(
                self.position(),
                format!("expected ',' or ')' in arguments to {name}, found {}", self.peek()),
            ));
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
