//! Expression engine: stack, symbols, environment, lexer, compiler, builtins
//! and the numeric backends, tied together by [`Calculator`].

pub mod builtins;
pub mod calculator;
pub mod compiler;
pub mod domain;
pub mod env;
pub mod lexer;
pub mod stack;
pub mod symbol;

pub use calculator::{AnyCalculator, Calculator, CalculatorType};
pub use compiler::{ExecutableForm, Notation, OperatorTable};
pub use domain::Domain;
pub use env::Environment;
pub use stack::Stack;
pub use symbol::{Arity, FixedSymbol, Frame, Symbol, VariadicSymbol};
