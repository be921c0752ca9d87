//! Exact rational backend.
//!
//! Values are [`BigRational`]s, always kept in lowest terms with a positive
//! denominator.  Decimal literals are exact (`0.1` is `1/10`).

use num::{BigInt, BigRational, One, Signed, ToPrimitive, Zero};

use super::{split_radix, split_sign, Domain};
use crate::calc::env::Environment;
use crate::calc::symbol::FixedSymbol;
use crate::error::{CalcError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct FractionDomain;

fn non_zero(divisor: &BigRational) -> Result<()> {
    if divisor.is_zero() {
        Err(CalcError::domain("division by zero"))
    } else {
        Ok(())
    }
}

fn integer(text: &str, digits: &str, radix: u32) -> std::result::Result<BigInt, String> {
    BigInt::parse_bytes(digits.as_bytes(), radix).ok_or_else(|| format!("invalid number '{text}'"))
}

/// Largest numerator or denominator, in bits, that `^` may produce.
const MAX_RESULT_BITS: u64 = 1 << 22;

/// Largest decimal exponent a literal may scale by, after folding in its
/// fractional digits.
const MAX_DECIMAL_EXPONENT: i32 = 100_000;

fn pow(base: BigRational, exponent: BigRational) -> Result<BigRational> {
    if !exponent.is_integer() {
        return Err(CalcError::domain("exponent must be an integer"));
    }
    let e = exponent
        .to_integer()
        .to_i32()
        .ok_or_else(|| CalcError::domain("exponent out of range"))?;
    if e < 0 {
        non_zero(&base)?;
    }
    let bits = base.numer().bits().max(base.denom().bits());
    if bits > 1 && bits.saturating_mul(u64::from(e.unsigned_abs())) > MAX_RESULT_BITS {
        return Err(CalcError::domain("exponent too large"));
    }
    Ok(base.pow(e))
}

impl Domain for FractionDomain {
    type Value = BigRational;

    const NAME: &'static str = "fraction";

    fn parse_literal(text: &str) -> std::result::Result<BigRational, String> {
        let (negative, body) = split_sign(text);
        let cleaned = body.replace('_', "");

        let value = if let Some((radix, digits)) = split_radix(&cleaned) {
            BigRational::from_integer(integer(text, digits, radix)?)
        } else {
            let (mantissa, exponent) = match cleaned.split_once(['e', 'E']) {
                Some((m, e)) => (m, e.parse::<i32>().map_err(|_| format!("invalid exponent in '{text}'"))?),
                None => (cleaned.as_str(), 0),
            };
            let (whole, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
            let numer = integer(text, &format!("{whole}{frac}"), 10)?;
            let scale = i32::try_from(frac.len())
                .ok()
                .and_then(|digits| exponent.checked_sub(digits))
                .filter(|scale| scale.unsigned_abs() <= MAX_DECIMAL_EXPONENT.unsigned_abs())
                .ok_or_else(|| format!("exponent out of range in '{text}'"))?;
            let ten = BigRational::from_integer(BigInt::from(10));
            BigRational::from_integer(numer) * ten.pow(scale)
        };
        Ok(if negative { -value } else { value })
    }

    fn print(value: &BigRational) -> String {
        if value.denom().is_one() {
            value.numer().to_string()
        } else {
            format!("{}/{}", value.numer(), value.denom())
        }
    }

    fn from_i64(n: i64) -> BigRational {
        BigRational::from_integer(BigInt::from(n))
    }

    fn register_symbols(env: &mut Environment<Self>) {
        env.define("+", FixedSymbol::<Self>::binary(|a, b| Ok(a + b)));
        env.define("-", FixedSymbol::<Self>::binary(|a, b| Ok(a - b)));
        env.define("*", FixedSymbol::<Self>::binary(|a, b| Ok(a * b)));
        env.define("/", FixedSymbol::<Self>::binary(|a, b| {
            non_zero(&b)?;
            Ok(a / b)
        }));
        env.define("%", FixedSymbol::<Self>::binary(|a, b| {
            non_zero(&b)?;
            Ok(a % b)
        }));
        env.define("^", FixedSymbol::<Self>::binary(pow));
        env.define("neg", FixedSymbol::<Self>::unary(|a| Ok(-a)));
        env.define("abs", FixedSymbol::<Self>::unary(|a| Ok(a.abs())));
        env.define("inv", FixedSymbol::<Self>::unary(|a| {
            non_zero(&a)?;
            Ok(a.recip())
        }));
        env.define("num", FixedSymbol::<Self>::unary(|a| Ok(BigRational::from_integer(a.numer().clone()))));
        env.define("den", FixedSymbol::<Self>::unary(|a| Ok(BigRational::from_integer(a.denom().clone()))));
        env.define("floor", FixedSymbol::<Self>::unary(|a| Ok(a.floor())));
        env.define("ceil", FixedSymbol::<Self>::unary(|a| Ok(a.ceil())));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
