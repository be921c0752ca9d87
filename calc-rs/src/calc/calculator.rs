//! Calculator façade: one domain, one environment, one compiler.
//!
//! [`Calculator`] is generic and monomorphic over its [`Domain`];
//! [`AnyCalculator`] is the closed set of shipped backends, selected through
//! [`CalculatorType`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use super::builtins;
use super::compiler::{Compiler, ExecutableForm, Notation, OperatorTable};
use super::domain::{BigIntDomain, Domain, DoubleDomain, FractionDomain};
use super::env::Environment;
use super::stack::Stack;
use super::symbol::{FixedSymbol, Frame};
use crate::error::{CalcError, Result};

// ── Calculator ────────────────────────────────────────────────────────────────

pub struct Calculator<D: Domain> {
    env: Environment<D>,
    operators: OperatorTable,
}

impl<D: Domain> Default for Calculator<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Domain> fmt::Debug for Calculator<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Calculator").field("env", &self.env).finish()
    }
}

impl<D: Domain> Calculator<D> {
    /// Fresh calculator with the common builtins and the domain's operators.
    pub fn new() -> Self {
        let mut env = Environment::new();
        builtins::register_common(&mut env);
        D::register_symbols(&mut env);
        Calculator { env, operators: D::operators() }
    }

    pub fn environment(&self) -> &Environment<D> {
        &self.env
    }

    pub fn environment_mut(&mut self) -> &mut Environment<D> {
        &mut self.env
    }

    pub fn print(&self, value: &D::Value) -> String {
        D::print(value)
    }

    pub fn compile(&self, notation: Notation, src: &str) -> Result<ExecutableForm<D>> {
        debug!(domain = D::NAME, %notation, src, "compile");
        Compiler::new(&self.env, &self.operators).compile(notation, src)
    }

    /// Run `form` on a fresh frame and hand back what is left on its stack.
    pub fn execute(&self, form: &ExecutableForm<D>) -> Result<Stack<D::Value>> {
        let mut frame = Frame::new(&self.env);
        form.execute(&mut frame)?;
        Ok(frame.into_stack())
    }

    /// Compile and run for side effects; the code must leave nothing behind.
    pub fn compile_and_execute(&self, notation: Notation, src: &str) -> Result<()> {
        let stack = self.execute(&self.compile(notation, src)?)?;
        if !stack.is_empty() {
            return Err(CalcError::arity(format!(
                "expression left {} value(s) on the stack",
                stack.len()
            )));
        }
        Ok(())
    }

    /// Compile, run and render every remaining value bottom to top.
    pub fn compile_execute_and_print(&self, notation: Notation, src: &str) -> Result<String> {
        let stack = self.execute(&self.compile(notation, src)?)?;
        let rendered: Vec<String> = stack.iter().map(D::print).collect();
        Ok(rendered.join(" "))
    }

    /// Evaluate `src` once and bind the single result to `name` as a
    /// constant.
    pub fn compile_and_set_global_symbol(&mut self, notation: Notation, name: &str, src: &str) -> Result<D::Value> {
        let mut stack = self.execute(&self.compile(notation, src)?)?;
        if stack.len() != 1 {
            return Err(CalcError::arity(format!(
                "'{name}' must evaluate to exactly one value, got {}",
                stack.len()
            )));
        }
        let value = stack.pop()?;
        debug!(domain = D::NAME, name, value = %D::print(&value), "set global");
        self.env.define(name, FixedSymbol::<D>::constant(value.clone()));
        Ok(value)
    }

    /// Bind `src` as an `arg_count → 1` function.  Arguments are `_1 … _N`
    /// inside the body, which runs on its own stack.
    pub fn compile_and_define_global_function(
        &mut self,
        notation: Notation,
        name: &str,
        arg_count: usize,
        src: &str,
    ) -> Result<()> {
        debug!(domain = D::NAME, %notation, name, arg_count, src, "define function");
        let body = Compiler::new(&self.env, &self.operators)
            .with_params(arg_count)
            .compile(notation, src)?;
        let fname = name.to_owned();
        self.env.define(name, FixedSymbol::<D>::new(arg_count, 1, move |frame| {
            let args = frame.stack_mut().pop_n(arg_count)?;
            let mut local = Frame::with_args(frame.env(), args);
            body.execute(&mut local)?;
            let mut results = local.into_stack();
            if results.len() != 1 {
                return Err(CalcError::arity(format!(
                    "function {fname} left {} value(s), expected 1",
                    results.len()
                )));
            }
            frame.stack_mut().push(results.pop()?);
            Ok(())
        }));
        Ok(())
    }
}

// ── Backend selection ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CalculatorType {
    #[default]
    Double,
    Fraction,
    BigInt,
}

impl CalculatorType {
    pub const ALL: [CalculatorType; 3] = [CalculatorType::Double, CalculatorType::Fraction, CalculatorType::BigInt];

    pub fn name(self) -> &'static str {
        match self {
            CalculatorType::Double => DoubleDomain::NAME,
            CalculatorType::Fraction => FractionDomain::NAME,
            CalculatorType::BigInt => BigIntDomain::NAME,
        }
    }

    /// Construction routine for each tag.
    pub fn new_calculator(self) -> AnyCalculator {
        match self {
            CalculatorType::Double => AnyCalculator::Double(Calculator::new()),
            CalculatorType::Fraction => AnyCalculator::Fraction(Calculator::new()),
            CalculatorType::BigInt => AnyCalculator::BigInt(Calculator::new()),
        }
    }
}

impl FromStr for CalculatorType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "double" | "float" | "fp" => Ok(CalculatorType::Double),
            "fraction" | "rational" | "frac" => Ok(CalculatorType::Fraction),
            "bigint" | "integer" | "int" => Ok(CalculatorType::BigInt),
            other => Err(format!("unknown calculator type '{other}' (expected double, fraction or bigint)")),
        }
    }
}

impl fmt::Display for CalculatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A calculator over one of the shipped backends.
#[derive(Debug)]
pub enum AnyCalculator {
    Double(Calculator<DoubleDomain>),
    Fraction(Calculator<FractionDomain>),
    BigInt(Calculator<BigIntDomain>),
}

macro_rules! dispatch {
    ($self:expr, $calc:ident => $body:expr) => {
        match $self {
            AnyCalculator::Double($calc) => $body,
            AnyCalculator::Fraction($calc) => $body,
            AnyCalculator::BigInt($calc) => $body,
        }
    };
}

impl AnyCalculator {
    pub fn kind(&self) -> CalculatorType {
        match self {
            AnyCalculator::Double(_) => CalculatorType::Double,
            AnyCalculator::Fraction(_) => CalculatorType::Fraction,
            AnyCalculator::BigInt(_) => CalculatorType::BigInt,
        }
    }

    pub fn compile_and_execute(&self, notation: Notation, src: &str) -> Result<()> {
        dispatch!(self, c => c.compile_and_execute(notation, src))
    }

    pub fn compile_execute_and_print(&self, notation: Notation, src: &str) -> Result<String> {
        dispatch!(self, c => c.compile_execute_and_print(notation, src))
    }

    /// Returns the bound value rendered by the backend's printer.
    pub fn compile_and_set_global_symbol(&mut self, notation: Notation, name: &str, src: &str) -> Result<String> {
        dispatch!(self, c => c.compile_and_set_global_symbol(notation, name, src).map(|v| c.print(&v)))
    }

    pub fn compile_and_define_global_function(
        &mut self,
        notation: Notation,
        name: &str,
        arg_count: usize,
        src: &str,
    ) -> Result<()> {
        dispatch!(self, c => c.compile_and_define_global_function(notation, name, arg_count, src))
    }

    pub fn symbol_names(&self) -> BTreeSet<String> {
        dispatch!(self, c => c.environment().names())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
