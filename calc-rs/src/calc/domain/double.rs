//! IEEE double backend.

use super::{split_radix, split_sign, Domain};
use crate::calc::env::Environment;
use crate::calc::symbol::FixedSymbol;

/// `f64` arithmetic.  Division by zero follows IEEE rules (±inf, NaN).
#[derive(Debug, Clone, Copy, Default)]
pub struct DoubleDomain;

impl Domain for DoubleDomain {
    type Value = f64;

    const NAME: &'static str = "double";

    fn parse_literal(text: &str) -> Result<f64, String> {
        let (negative, body) = split_sign(text);
        let cleaned = body.replace('_', "");
        let value = match split_radix(&cleaned) {
            Some((radix, digits)) => u64::from_str_radix(digits, radix)
                .map(|n| n as f64)
                .map_err(|_| format!("invalid number '{text}'"))?,
            None => cleaned.parse::<f64>().map_err(|_| format!("invalid number '{text}'"))?,
        };
        Ok(if negative { -value } else { value })
    }

    fn print(value: &f64) -> String {
        // Integral values keep a trailing `.0` so they read as reals.
        if value.fract() == 0.0 && value.abs() < 1e15 {
            format!("{value:.1}")
        } else {
            format!("{value}")
        }
    }

    fn from_i64(n: i64) -> f64 {
        n as f64
    }

    fn register_symbols(env: &mut Environment<Self>) {
        env.define("+", FixedSymbol::<Self>::binary(|a, b| Ok(a + b)));
        env.define("-", FixedSymbol::<Self>::binary(|a, b| Ok(a - b)));
        env.define("*", FixedSymbol::<Self>::binary(|a, b| Ok(a * b)));
        env.define("/", FixedSymbol::<Self>::binary(|a, b| Ok(a / b)));
        env.define("%", FixedSymbol::<Self>::binary(|a, b| Ok(a % b)));
        env.define("^", FixedSymbol::<Self>::binary(|a, b| Ok(a.powf(b))));
        env.define("neg", FixedSymbol::<Self>::unary(|a| Ok(-a)));

        let functions: [(&str, fn(f64) -> f64); 11] = [
            ("abs", f64::abs),
            ("sqrt", f64::sqrt),
            ("exp", f64::exp),
            ("ln", f64::ln),
            ("log10", f64::log10),
            ("sin", f64::sin),
            ("cos", f64::cos),
            ("tan", f64::tan),
            ("floor", f64::floor),
            ("ceil", f64::ceil),
            ("round", f64::round),
        ];
        for (name, f) in functions {
            env.define(name, FixedSymbol::<Self>::unary(move |a| Ok(f(a))));
        }

        env.define("PI", FixedSymbol::<Self>::constant(std::f64::consts::PI));
        env.define("E", FixedSymbol::<Self>::constant(std::f64::consts::E));
        env.define("INF", FixedSymbol::<Self>::constant(f64::INFINITY));
        env.define("NAN", FixedSymbol::<Self>::constant(f64::NAN));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
