//! Numeric domain backends.
//!
//! A [`Domain`] is a zero-sized marker type naming one arithmetic: its value
//! type, literal parser, printer, operator precedence table and the operator
//! symbols it pre-registers into a fresh [`Environment`].  Calculators are
//! generic over the domain and stay monomorphic for their whole lifetime.

pub mod bigint;
pub mod double;
pub mod fraction;

use std::fmt;

use super::compiler::OperatorTable;
use super::env::Environment;

pub use bigint::BigIntDomain;
pub use double::DoubleDomain;
pub use fraction::FractionDomain;

/// Capability interface every backend supplies.
pub trait Domain: Sized + Send + Sync + 'static {
    type Value: Clone + fmt::Debug + PartialEq + PartialOrd + Send + Sync + 'static;

    /// Short name used in logs and by the command surface.
    const NAME: &'static str;

    /// Parse one numeric literal token (possibly with a leading `-`).
    fn parse_literal(text: &str) -> Result<Self::Value, String>;

    /// Canonical display string.
    fn print(value: &Self::Value) -> String;

    /// Lift a host integer (coordinates, boolean results) into the domain.
    fn from_i64(n: i64) -> Self::Value;

    /// Infix operator precedences understood by this domain.
    fn operators() -> OperatorTable {
        OperatorTable::standard()
    }

    /// Register arithmetic operators and functions.
    fn register_symbols(env: &mut Environment<Self>);
}

/// Split an optional leading minus sign off a literal.
pub(crate) fn split_sign(text: &str) -> (bool, &str) {
    match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    }
}

/// Recognise `0x`, `0o` and `0b` prefixes.
pub(crate) fn split_radix(text: &str) -> Option<(u32, &str)> {
    let bytes = text.as_bytes();
    if bytes.len() < 3 || bytes[0] != b'0' {
        return None;
    }
    let radix = match bytes[1] {
        b'x' | b'X' => 16,
        b'o' | b'O' => 8,
        b'b' | b'B' => 2,
        _ => return None,
    };
    Some((radix, &text[2..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_prefix() {
        assert_eq!(split_sign("-12"), (true, "12"));
        assert_eq!(split_sign("12"), (false, "12"));
    }

    #[test]
    fn radix_prefix() {
        assert_eq!(split_radix("0xff"), Some((16, "ff")));
        assert_eq!(split_radix("0b101"), Some((2, "101")));
        assert_eq!(split_radix("0o17"), Some((8, "17")));
        assert_eq!(split_radix("0x"), None);
        assert_eq!(split_radix("10"), None);
    }
}
