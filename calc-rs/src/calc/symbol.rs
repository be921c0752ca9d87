//! Executable symbols and the frame they run against.
//!
//! Two flavours exist:
//!
//! - [`FixedSymbol`] declares exact input and output counts.  Explicit call
//!   site counts must agree with them, the stack must hold enough values
//!   before the body runs, and the body must leave exactly the declared
//!   number of results.
//! - [`VariadicSymbol`] declares default counts; the call site may override
//!   them and the body receives the resolved counts.

use tracing::trace;

use super::domain::Domain;
use super::env::Environment;
use super::stack::Stack;
use crate::error::{CalcError, Result};

// ── Frame ─────────────────────────────────────────────────────────────────────

/// One stack plus the environment in force for a single execution.
pub struct Frame<'a, D: Domain> {
    stack: Stack<D::Value>,
    env: &'a Environment<D>,
    args: Vec<D::Value>,
}

impl<'a, D: Domain> Frame<'a, D> {
    pub fn new(env: &'a Environment<D>) -> Self {
        Self::with_args(env, Vec::new())
    }

    /// Frame for a function body; `args` back the `_1 … _N` placeholders.
    pub fn with_args(env: &'a Environment<D>, args: Vec<D::Value>) -> Self {
        Frame { stack: Stack::new(), env, args }
    }

    pub fn env(&self) -> &'a Environment<D> {
        self.env
    }

    pub fn stack(&self) -> &Stack<D::Value> {
        &self.stack
    }

    pub fn stack_mut(&mut self) -> &mut Stack<D::Value> {
        &mut self.stack
    }

    /// Zero-based argument lookup.
    pub fn arg(&self, index: usize) -> Result<&D::Value> {
        self.args
            .get(index)
            .ok_or_else(|| CalcError::arity(format!("argument _{} is not bound", index + 1)))
    }

    pub fn into_stack(self) -> Stack<D::Value> {
        self.stack
    }
}

// ── Symbol ────────────────────────────────────────────────────────────────────

/// Input/output counts of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub inputs: usize,
    pub outputs: usize,
}

impl Arity {
    pub const fn new(inputs: usize, outputs: usize) -> Self {
        Arity { inputs, outputs }
    }
}

/// Anything that can be called from compiled code.
///
/// `inputs` and `outputs` are the counts requested at the call site, or
/// `None` when the call site did not specify them.
pub trait Symbol<D: Domain>: Send + Sync {
    fn call(&self, frame: &mut Frame<'_, D>, inputs: Option<usize>, outputs: Option<usize>) -> Result<()>;
}

type FixedBody<D> = dyn Fn(&mut Frame<'_, D>) -> Result<()> + Send + Sync;

/// Symbol with a non-negotiable input/output contract.
pub struct FixedSymbol<D: Domain> {
    arity: Arity,
    body: Box<FixedBody<D>>,
}

impl<D: Domain> FixedSymbol<D> {
    pub fn new(
        inputs: usize,
        outputs: usize,
        body: impl Fn(&mut Frame<'_, D>) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        FixedSymbol { arity: Arity::new(inputs, outputs), body: Box::new(body) }
    }

    /// `0 → 1` symbol pushing a copy of `value`.
    pub fn constant(value: D::Value) -> Self {
        Self::new(0, 1, move |frame| {
            frame.stack_mut().push(value.clone());
            Ok(())
        })
    }

    pub fn unary(op: impl Fn(D::Value) -> Result<D::Value> + Send + Sync + 'static) -> Self {
        Self::new(1, 1, move |frame| {
            let a = frame.stack_mut().pop()?;
            let result = op(a)?;
            frame.stack_mut().push(result);
            Ok(())
        })
    }

    /// `2 → 1` symbol; `op` receives the deeper operand first.
    pub fn binary(op: impl Fn(D::Value, D::Value) -> Result<D::Value> + Send + Sync + 'static) -> Self {
        Self::new(2, 1, move |frame| {
            let b = frame.stack_mut().pop()?;
            let a = frame.stack_mut().pop()?;
            let result = op(a, b)?;
            frame.stack_mut().push(result);
            Ok(())
        })
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }
}

impl<D: Domain> Symbol<D> for FixedSymbol<D> {
    fn call(&self, frame: &mut Frame<'_, D>, inputs: Option<usize>, outputs: Option<usize>) -> Result<()> {
        let Arity { inputs: want_in, outputs: want_out } = self.arity;
        if let Some(n) = inputs.filter(|&n| n != want_in) {
            return Err(CalcError::arity(format!("expected {want_in} argument(s), call site gave {n}")));
        }
        if let Some(n) = outputs.filter(|&n| n != want_out) {
            return Err(CalcError::arity(format!("returns {want_out} value(s), call site wants {n}")));
        }

        let depth = frame.stack().len();
        if depth < want_in {
            return Err(CalcError::arity(format!(
                "expected {want_in} argument(s), stack holds {depth}"
            )));
        }

        (self.body)(frame)?;

        let expected = depth - want_in + want_out;
        let actual = frame.stack().len();
        if actual != expected {
            return Err(CalcError::arity(format!(
                "declared {want_out} result(s), stack changed by {}",
                actual as isize - (depth - want_in) as isize
            )));
        }
        Ok(())
    }
}

type VariadicBody<D> = dyn Fn(&mut Frame<'_, D>, usize, usize) -> Result<()> + Send + Sync;

/// Symbol whose counts are chosen per call.
pub struct VariadicSymbol<D: Domain> {
    defaults: Arity,
    body: Box<VariadicBody<D>>,
}

impl<D: Domain> VariadicSymbol<D> {
    pub fn new(
        defaults: Arity,
        body: impl Fn(&mut Frame<'_, D>, usize, usize) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        VariadicSymbol { defaults, body: Box::new(body) }
    }

    pub fn defaults(&self) -> Arity {
        self.defaults
    }
}

impl<D: Domain> Symbol<D> for VariadicSymbol<D> {
    fn call(&self, frame: &mut Frame<'_, D>, inputs: Option<usize>, outputs: Option<usize>) -> Result<()> {
        let inputs = inputs.unwrap_or(self.defaults.inputs);
        let outputs = outputs.unwrap_or(self.defaults.outputs);
        trace!(inputs, outputs, "variadic call");
        (self.body)(frame, inputs, outputs)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
