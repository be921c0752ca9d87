//! Arbitrary-precision integer backend.

use num::{BigInt, Integer, Signed, ToPrimitive, Zero};

use super::{split_radix, split_sign, Domain};
use crate::calc::compiler::OperatorTable;
use crate::calc::env::Environment;
use crate::calc::symbol::FixedSymbol;
use crate::error::{CalcError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct BigIntDomain;

fn non_zero(divisor: &BigInt) -> Result<()> {
    if divisor.is_zero() {
        Err(CalcError::domain("division by zero"))
    } else {
        Ok(())
    }
}

/// Largest result, in bits, that `<<` and `^` may produce.
const MAX_RESULT_BITS: u64 = 1 << 22;

fn shift_amount(n: &BigInt) -> Result<usize> {
    n.to_usize().ok_or_else(|| CalcError::domain(format!("invalid shift amount {n}")))
}

fn shift_left(a: BigInt, b: &BigInt) -> Result<BigInt> {
    let n = shift_amount(b)?;
    if !a.is_zero() && a.bits().saturating_add(n as u64) > MAX_RESULT_BITS {
        return Err(CalcError::domain("shift amount too large"));
    }
    Ok(a << n)
}

fn pow(a: BigInt, b: &BigInt) -> Result<BigInt> {
    let e = b
        .to_u32()
        .ok_or_else(|| CalcError::domain(format!("invalid exponent {b}")))?;
    // |a| <= 1 never grows.
    if a.bits() > 1 && a.bits().saturating_mul(u64::from(e)) > MAX_RESULT_BITS {
        return Err(CalcError::domain("exponent too large"));
    }
    Ok(a.pow(e))
}

impl Domain for BigIntDomain {
    type Value = BigInt;

    const NAME: &'static str = "bigint";

    fn parse_literal(text: &str) -> std::result::Result<BigInt, String> {
        let (negative, body) = split_sign(text);
        let cleaned = body.replace('_', "");
        let (radix, digits) = split_radix(&cleaned).unwrap_or((10, cleaned.as_str()));
        let value = BigInt::parse_bytes(digits.as_bytes(), radix)
            .ok_or_else(|| format!("invalid integer '{text}'"))?;
        Ok(if negative { -value } else { value })
    }

    fn print(value: &BigInt) -> String {
        value.to_string()
    }

    fn from_i64(n: i64) -> BigInt {
        BigInt::from(n)
    }

    fn operators() -> OperatorTable {
        OperatorTable::standard()
            .with_binary("|", 2, false)
            .with_binary("&", 3, false)
            .with_binary("<<", 4, false)
            .with_binary(">>", 4, false)
    }

    fn register_symbols(env: &mut Environment<Self>) {
        env.define("+", FixedSymbol::<Self>::binary(|a, b| Ok(a + b)));
        env.define("-", FixedSymbol::<Self>::binary(|a, b| Ok(a - b)));
        env.define("*", FixedSymbol::<Self>::binary(|a, b| Ok(a * b)));
        // Truncating division, like the remainder below.
        env.define("/", FixedSymbol::<Self>::binary(|a, b| {
            non_zero(&b)?;
            Ok(a / b)
        }));
        env.define("%", FixedSymbol::<Self>::binary(|a, b| {
            non_zero(&b)?;
            Ok(a % b)
        }));
        env.define("^", FixedSymbol::<Self>::binary(|a, b| pow(a, &b)));
        env.define("&", FixedSymbol::<Self>::binary(|a, b| Ok(a & b)));
        env.define("|", FixedSymbol::<Self>::binary(|a, b| Ok(a | b)));
        env.define("<<", FixedSymbol::<Self>::binary(|a, b| shift_left(a, &b)));
        env.define(">>", FixedSymbol::<Self>::binary(|a, b| Ok(a >> shift_amount(&b)?)));
        env.define("neg", FixedSymbol::<Self>::unary(|a| Ok(-a)));
        env.define("abs", FixedSymbol::<Self>::unary(|a| Ok(a.abs())));
        env.define("sign", FixedSymbol::<Self>::unary(|a| Ok(a.signum())));
        env.define("gcd", FixedSymbol::<Self>::binary(|a, b| Ok(a.gcd(&b))));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals() {
        assert_eq!(BigIntDomain::parse_literal("123"), Ok(BigInt::from(123)));
        assert_eq!(BigIntDomain::parse_literal("-0xff"), Ok(BigInt::from(-255)));
        assert_eq!(BigIntDomain::parse_literal("0b1010"), Ok(BigInt::from(10)));
        assert_eq!(BigIntDomain::parse_literal("0o17"), Ok(BigInt::from(15)));
        assert_eq!(BigIntDomain::parse_literal("1_000_000"), Ok(BigInt::from(1_000_000)));
        assert!(BigIntDomain::parse_literal("1.5").is_err());
        assert!(BigIntDomain::parse_literal("1e3").is_err());
    }

    #[test]
    fn big_values_print_exactly() {
        let v = BigIntDomain::parse_literal("123456789012345678901234567890").unwrap();
        assert_eq!(BigIntDomain::print(&(v * BigInt::from(10))), "1234567890123456789012345678900");
    }

    #[test]
    fn shift_amount_rejects_negative() {
        assert!(shift_amount(&BigInt::from(-1)).is_err());
        assert_eq!(shift_amount(&BigInt::from(3)), Ok(3));
    }

    #[test]
    fn oversized_results_are_rejected() {
        let huge = BigInt::from(i64::MAX);
        assert_eq!(shift_left(BigInt::from(1), &huge), Err(CalcError::domain("shift amount too large")));
        assert_eq!(shift_left(BigInt::from(0), &huge), Ok(BigInt::from(0)));
        assert_eq!(shift_left(BigInt::from(3), &BigInt::from(4)), Ok(BigInt::from(48)));

        let max_exp = BigInt::from(u32::MAX);
        assert_eq!(pow(BigInt::from(2), &max_exp), Err(CalcError::domain("exponent too large")));
        assert_eq!(pow(BigInt::from(-1), &max_exp), Ok(BigInt::from(-1)));
        assert_eq!(pow(BigInt::from(1), &max_exp), Ok(BigInt::from(1)));
        assert!(pow(BigInt::from(2), &BigInt::from(-1)).is_err());
        assert_eq!(pow(BigInt::from(2), &BigInt::from(10)), Ok(BigInt::from(1024)));
    }

    #[test]
    fn oversized_results_fail_in_calculator() {
        use crate::calc::{Calculator, Notation};

        let calculator = Calculator::<BigIntDomain>::new();
        for src in ["1 9223372036854775807 <<", "2 4294967295 ^"] {
            assert!(matches!(
                calculator.compile_execute_and_print(Notation::Postfix, src),
                Err(CalcError::Domain(_))
            ));
        }
        assert_eq!(calculator.compile_execute_and_print(Notation::Postfix, "1 9223372036854775807 >>").unwrap(), "0");
    }
}
