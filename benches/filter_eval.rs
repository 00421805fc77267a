//! Benchmarks for the `--where` filter language.
//!
//! Parsing happens once per invocation, evaluation once per repository, so
//! evaluation over a large synthetic workspace is what matters.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use git_fleet::filter::FilterExpr;
use git_fleet::flags::{Flag, RepoFlags};

/// Flag sets for a workspace of `count` repositories with varied states.
fn workspace_flags(count: usize) -> Vec<RepoFlags> {
    (0..count)
        .map(|i| RepoFlags {
            dirty: i % 3 == 0,
            unpushed: i % 4 == 0,
            behind_share: i % 7 == 0,
            behind_base: i % 2 == 0,
            diverged: i % 5 == 0,
            detached: i % 11 == 0,
            at_risk: i % 13 == 0,
            ..Default::default()
        })
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_parse");

    group.bench_function("single_flag", |b| {
        b.iter(|| FilterExpr::parse(black_box("dirty")))
    });

    group.bench_function("mixed_expression", |b| {
        b.iter(|| FilterExpr::parse(black_box("dirty+unpushed,^detached+behind-base,atRisk")))
    });

    let every_flag: Vec<&str> = Flag::ALL.iter().map(|f| f.name()).collect();
    let every_flag = every_flag.join(",");
    group.bench_function("every_flag", |b| {
        b.iter(|| FilterExpr::parse(black_box(&every_flag)))
    });

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_evaluate");
    let flags = workspace_flags(1000);

    let simple = FilterExpr::parse("dirty").unwrap();
    group.bench_function("single_flag", |b| {
        b.iter(|| flags.iter().filter(|f| simple.matches(black_box(f))).count())
    });

    let mixed = FilterExpr::parse("dirty+unpushed,^detached+behind-base,at-risk").unwrap();
    group.bench_function("mixed_expression", |b| {
        b.iter(|| flags.iter().filter(|f| mixed.matches(black_box(f))).count())
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_evaluate);
criterion_main!(benches);
