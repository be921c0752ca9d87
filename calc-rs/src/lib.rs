//! Stack-machine calculator with interchangeable numeric backends.
//!
//! Expressions (infix or postfix) compile against a calculator's symbol
//! environment into an [`calc::ExecutableForm`] that runs on a value stack.
//! A [`session::Session`] tracks which calculator a user is working with and
//! exposes the invoking [`actor::Actor`] to host symbols for the duration of
//! one call; [`command`] is the line-oriented surface on top of it.

pub mod actor;
pub mod calc;
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
pub mod logger;
pub mod session;

pub use error::{CalcError, Result};
