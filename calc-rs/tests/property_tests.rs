use std::sync::Arc;

use proptest::prelude::*;

use calc::calc::domain::{BigIntDomain, DoubleDomain, FractionDomain};
use calc::calc::{Calculator, CalculatorType, Notation, Stack};
use calc::session::Session;
use calc::CalcError;

proptest! {
    /// N pushes then N pops come back reversed; one more pop underflows.
    #[test]
    fn stack_discipline(values in prop::collection::vec(any::<i64>(), 0..64)) {
        let mut stack = Stack::new();
        for &v in &values {
            stack.push(v);
        }
        prop_assert_eq!(stack.len(), values.len());
        let mut popped = Vec::new();
        while !stack.is_empty() {
            popped.push(stack.pop().unwrap());
        }
        popped.reverse();
        prop_assert_eq!(popped, values);
        prop_assert_eq!(stack.pop(), Err(CalcError::StackUnderflow));
    }
}

proptest! {
    /// pop_n takes the top n in push order, or nothing at all.
    #[test]
    fn pop_n_all_or_nothing(len in 0usize..32, n in 0usize..40) {
        let mut stack = Stack::new();
        for v in 0..len {
            stack.push(v);
        }
        match stack.pop_n(n) {
            Ok(top) => {
                prop_assert!(n <= len);
                prop_assert_eq!(top, (len - n..len).collect::<Vec<_>>());
                prop_assert_eq!(stack.len(), len - n);
            }
            Err(e) => {
                prop_assert!(n > len);
                prop_assert_eq!(e, CalcError::StackUnderflow);
                prop_assert_eq!(stack.len(), len);
            }
        }
    }
}

fn kind_strategy() -> impl Strategy<Value = CalculatorType> {
    prop::sample::select(CalculatorType::ALL.to_vec())
}

proptest! {
    /// Whatever happened before, two restores bring back the same pair.
    #[test]
    fn restore_twice_is_identity(kinds in prop::collection::vec(kind_strategy(), 1..6)) {
        let session = Session::new();
        for kind in kinds {
            session.create_calculator(kind);
        }
        let active = session.active();
        let previous = session.previous().unwrap();
        prop_assert!(session.restore_previous_calculator());
        prop_assert!(session.restore_previous_calculator());
        prop_assert!(Arc::ptr_eq(&session.active(), &active));
        prop_assert!(Arc::ptr_eq(&session.previous().unwrap(), &previous));
    }
}

proptest! {
    /// Compilation returns Ok or Err on any input, in every backend and notation.
    #[test]
    fn compiler_does_not_panic(s in "\\PC{0,64}") {
        for notation in [Notation::Infix, Notation::Postfix] {
            let _ = Calculator::<DoubleDomain>::new().compile(notation, &s);
            let _ = Calculator::<FractionDomain>::new().compile(notation, &s);
            let _ = Calculator::<BigIntDomain>::new().compile(notation, &s);
        }
    }

    /// Any nesting depth yields a value or a syntax error, never a crash.
    #[test]
    fn deep_nesting_does_not_crash(depth in 0usize..20_000, op in prop::sample::select(vec!["(", "-", "2 ^ "])) {
        let close = if op == "(" { ")" } else { "" };
        let src = format!("{}1{}", op.repeat(depth), close.repeat(depth));
        match Calculator::<BigIntDomain>::new().compile(Notation::Infix, &src) {
            Ok(_) => prop_assert!(depth < 256),
            Err(e) => prop_assert!(matches!(e, CalcError::Syntax { .. }), "{:?}", e),
        }
    }

    /// Small integer arithmetic agrees with i64 in both notations.
    #[test]
    fn bigint_matches_i64(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
        let calculator = Calculator::<BigIntDomain>::new();
        let infix = calculator.compile_execute_and_print(Notation::Infix, &format!("({a}) * ({b}) - ({b})")).unwrap();
        prop_assert_eq!(infix, (a * b - b).to_string());
        let postfix = calculator.compile_execute_and_print(Notation::Postfix, &format!("{a} {b} +")).unwrap();
        prop_assert_eq!(postfix, (a + b).to_string());
    }

    /// Exact rationals: n/d + (d-n)/d is always 1.
    #[test]
    fn fraction_sums_are_exact(n in -500i64..500, d in 1i64..500) {
        let calculator = Calculator::<FractionDomain>::new();
        let src = format!("({n})/{d} + ({d} - ({n}))/{d}");
        prop_assert_eq!(calculator.compile_execute_and_print(Notation::Infix, &src).unwrap(), "1");
    }
}
