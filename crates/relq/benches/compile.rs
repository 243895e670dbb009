use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use relq::{JoinOn, QueryBuilder, TableRef, Value};

/// SELECT with `n` equality filters and an `n`-element IN list.
fn build_select(n: usize) -> QueryBuilder {
    let mut qb = QueryBuilder::postgres(TableRef::aliased("users", "u"));
    qb.left_join("teams", JoinOn::columns("team_id", "id"));
    for i in 0..n {
        qb.where_eq(format!("u.col{i}"), i as i64);
    }
    qb.where_in("u.id", 0..n as i64).order_by_desc("u.id").paginate(2, 50);
    qb
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder/compile");

    for n in [1, 5, 10, 50, 100] {
        let qb = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &qb, |b, qb| {
            b.iter(|| black_box(qb.compile()));
        });
    }

    group.finish();
}

fn bench_build_and_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder/build_and_compile");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_select(n).compile()));
        });
    }

    group.finish();
}

fn bench_raw_signature(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder/raw_signature");

    for n in [1, 10, 100] {
        let signature = (0..n)
            .map(|i| format!("c{i} = {{{i}}}"))
            .collect::<Vec<_>>()
            .join(" AND ");
        let values: Vec<Value> = (0..n as i64).map(Value::Int).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut qb = QueryBuilder::mysql("t");
                qb.where_raw(signature.clone(), values.clone());
                black_box(qb.compile());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_compile,
    bench_build_and_compile,
    bench_raw_signature
);
criterion_main!(benches);
