//! Domain-independent built-in symbols.
//!
//! Stack words (`dup`, `swap`, `drop`, `over`), the relational operators and
//! the variadic folds `min`, `max` and `sum`.  Arithmetic lives with each
//! domain.

use std::cmp::Ordering;

use super::domain::Domain;
use super::env::Environment;
use super::symbol::{Arity, FixedSymbol, Frame, VariadicSymbol};
use crate::error::{CalcError, Result};

/// Register every common symbol into `env`.
pub fn register_common<D: Domain>(env: &mut Environment<D>) {
    register_stack_words(env);
    register_comparisons(env);
    register_folds(env);
}

fn register_stack_words<D: Domain>(env: &mut Environment<D>) {
    env.define("dup", FixedSymbol::<D>::new(1, 2, |frame| {
        let top = frame.stack().peek()?.clone();
        frame.stack_mut().push(top);
        Ok(())
    }));
    env.define("swap", FixedSymbol::<D>::new(2, 2, |frame| {
        let b = frame.stack_mut().pop()?;
        let a = frame.stack_mut().pop()?;
        frame.stack_mut().push(b);
        frame.stack_mut().push(a);
        Ok(())
    }));
    env.define("drop", FixedSymbol::<D>::new(1, 0, |frame| {
        frame.stack_mut().pop()?;
        Ok(())
    }));
    env.define("over", FixedSymbol::<D>::new(2, 3, |frame| {
        let b = frame.stack_mut().pop()?;
        let a = frame.stack().peek()?.clone();
        frame.stack_mut().push(b);
        frame.stack_mut().push(a);
        Ok(())
    }));
}

fn register_comparisons<D: Domain>(env: &mut Environment<D>) {
    let table: [(&str, fn(Option<Ordering>) -> bool); 6] = [
        ("==", |o| o == Some(Ordering::Equal)),
        ("!=", |o| o != Some(Ordering::Equal)),
        ("<", |o| o == Some(Ordering::Less)),
        ("<=", |o| matches!(o, Some(Ordering::Less | Ordering::Equal))),
        (">", |o| o == Some(Ordering::Greater)),
        (">=", |o| matches!(o, Some(Ordering::Greater | Ordering::Equal))),
    ];
    for (name, test) in table {
        env.define(name, FixedSymbol::<D>::binary(move |a: D::Value, b: D::Value| {
            Ok(D::from_i64(test(a.partial_cmp(&b)) as i64))
        }));
    }
}

fn register_folds<D: Domain>(env: &mut Environment<D>) {
    env.define("min", VariadicSymbol::<D>::new(Arity::new(2, 1), |frame, inputs, outputs| {
        extremum(frame, "min", inputs, outputs, Ordering::Less)
    }));
    env.define("max", VariadicSymbol::<D>::new(Arity::new(2, 1), |frame, inputs, outputs| {
        extremum(frame, "max", inputs, outputs, Ordering::Greater)
    }));

    // `sum` folds with whatever `+` the environment defines at call time.
    env.define("sum", VariadicSymbol::<D>::new(Arity::new(2, 1), |frame, inputs, outputs| {
        single_result("sum", outputs)?;
        if frame.stack().len() < inputs {
            return Err(CalcError::StackUnderflow);
        }
        if inputs == 0 {
            frame.stack_mut().push(D::from_i64(0));
            return Ok(());
        }
        let plus = frame.env().resolve("+")?;
        for _ in 1..inputs {
            plus.call(frame, Some(2), Some(1))?;
        }
        Ok(())
    }));
}

fn single_result(name: &str, outputs: usize) -> Result<()> {
    if outputs != 1 {
        return Err(CalcError::arity(format!("{name} returns exactly one value, call site wants {outputs}")));
    }
    Ok(())
}

fn extremum<D: Domain>(
    frame: &mut Frame<'_, D>,
    name: &str,
    inputs: usize,
    outputs: usize,
    keep: Ordering,
) -> Result<()> {
    single_result(name, outputs)?;
    if inputs == 0 {
        return Err(CalcError::arity(format!("{name} needs at least one argument")));
    }
    let mut values = frame.stack_mut().pop_n(inputs)?.into_iter();
    let mut best = values.next().ok_or(CalcError::StackUnderflow)?;
    for v in values {
        if v.partial_cmp(&best) == Some(keep) {
            best = v;
        }
    }
    frame.stack_mut().push(best);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::domain::DoubleDomain;

    fn run(src: &[(&str, Option<usize>)], stack: &[f64]) -> Result<Vec<f64>> {
        let mut env = Environment::<DoubleDomain>::new();
        register_common(&mut env);
        DoubleDomain::register_symbols(&mut env);
        let mut frame = Frame::new(&env);
        for &v in stack {
            frame.stack_mut().push(v);
        }
        for &(name, inputs) in src {
            env.resolve(name)?.call(&mut frame, inputs, None)?;
        }
        Ok(frame.into_stack().into_vec())
    }

    #[test]
    fn stack_words() {
        assert_eq!(run(&[("dup", None)], &[1.0]).unwrap(), vec![1.0, 1.0]);
        assert_eq!(run(&[("swap", None)], &[1.0, 2.0]).unwrap(), vec![2.0, 1.0]);
        assert_eq!(run(&[("drop", None)], &[1.0, 2.0]).unwrap(), vec![1.0]);
        assert_eq!(run(&[("over", None)], &[1.0, 2.0]).unwrap(), vec![1.0, 2.0, 1.0]);
    }

    #[test]
    fn comparisons_yield_one_or_zero() {
        assert_eq!(run(&[("<", None)], &[1.0, 2.0]).unwrap(), vec![1.0]);
        assert_eq!(run(&[(">=", None)], &[1.0, 2.0]).unwrap(), vec![0.0]);
        assert_eq!(run(&[("==", None)], &[2.0, 2.0]).unwrap(), vec![1.0]);
        assert_eq!(run(&[("!=", None)], &[f64::NAN, f64::NAN]).unwrap(), vec![1.0]);
    }

    #[test]
    fn folds() {
        assert_eq!(run(&[("max", Some(3))], &[4.0, 9.0, 2.0]).unwrap(), vec![9.0]);
        assert_eq!(run(&[("min", None)], &[4.0, 9.0, 2.0]).unwrap(), vec![4.0, 2.0]);
        assert_eq!(run(&[("sum", Some(3))], &[1.0, 2.0, 3.0]).unwrap(), vec![6.0]);
        assert_eq!(run(&[("sum", Some(0))], &[]).unwrap(), vec![0.0]);
    }

    #[test]
    fn fold_errors() {
        assert_eq!(run(&[("sum", Some(3))], &[1.0]), Err(CalcError::StackUnderflow));
        assert!(matches!(run(&[("max", Some(0))], &[1.0]), Err(CalcError::ArityMismatch(_))));
    }
}
