use criterion::{black_box, criterion_group, criterion_main, Criterion};

use calc::calc::domain::{BigIntDomain, DoubleDomain, FractionDomain};
use calc::calc::{Calculator, Notation};

fn make_sum(terms: usize) -> String {
    (1..=terms).map(|n| n.to_string()).collect::<Vec<_>>().join(" + ")
}

fn bench_eval(c: &mut Criterion) {
    let short = "(1 + 2) * 3 - 4 / 5 ^ 2";
    let long = make_sum(500);

    let double = Calculator::<DoubleDomain>::new();
    let fraction = Calculator::<FractionDomain>::new();
    let bigint = Calculator::<BigIntDomain>::new();

    let mut g = c.benchmark_group("eval");

    g.bench_function("compile_short", |b| {
        b.iter(|| double.compile(Notation::Infix, black_box(short)))
    });
    g.bench_function("compile_long", |b| {
        b.iter(|| double.compile(Notation::Infix, black_box(&long)))
    });

    // Compile once, run many: the cost the session pays per `eval` after parsing.
    let form = double.compile(Notation::Infix, &long).unwrap();
    g.bench_function("execute_long_double", |b| {
        b.iter(|| double.execute(black_box(&form)))
    });

    g.bench_function("print_short_fraction", |b| {
        b.iter(|| fraction.compile_execute_and_print(Notation::Infix, black_box(short)))
    });
    g.bench_function("print_pow_bigint", |b| {
        b.iter(|| bigint.compile_execute_and_print(Notation::Postfix, black_box("3 4000 ^")))
    });

    g.finish();
}

criterion_group!(benches, bench_eval);
criterion_main!(benches);
