//! Error taxonomy shared by the evaluator, the session manager and the
//! command surface.

use thiserror::Error;

/// Every way a calculator call can fail.
///
/// All of these abort the current top-level call; none leaves a partially
/// defined symbol or a bound invoking actor behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    /// Malformed source text.  `position` is the char offset of the
    /// offending token.
    #[error("syntax error at {position}: {message}")]
    Syntax { position: usize, message: String },

    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("stack underflow")]
    StackUnderflow,

    /// Requested or available argument/return counts disagree with a
    /// symbol's contract.
    #[error("arity mismatch: {0}")]
    ArityMismatch(String),

    /// Backend-specific arithmetic failure (division by zero, bad exponent…).
    #[error("{0}")]
    Domain(String),

    #[error("no calculator named '{0}'")]
    NoSuchName(String),

    #[error("no saved calculators")]
    EmptyStack,

    /// A host symbol (`$x`, `p`, …) ran outside of a bound invocation.
    #[error("no invoking actor bound")]
    NoInvokingActor,

    /// A command-surface line that does not match any command form.
    #[error("{0}")]
    Command(String),
}

impl CalcError {
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        CalcError::Syntax { position, message: message.into() }
    }

    pub fn arity(detail: impl Into<String>) -> Self {
        CalcError::ArityMismatch(detail.into())
    }

    pub fn domain(detail: impl Into<String>) -> Self {
        CalcError::Domain(detail.into())
    }
}

pub type Result<T> = std::result::Result<T, CalcError>;
