use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dictsql::{predicate, Config, Parser};
use std::hint::black_box;

const REQUESTS: [(&str, &str); 3] = [
    (
        "simple",
        r#"{"select": {"table": "jobs", "where": {"id": 5}}}"#,
    ),
    (
        "medium",
        r#"{"select": {"table": "jobs", "columns": ["id", "value"],
            "where": {"id": {"$IN": [1, 2, 3]}, "value": {"$LIKE": ["a%", "b%"]}, "deleted": null}}}"#,
    ),
    (
        "complex",
        r#"{"select": {"table": "user(u)", "columns": ["u.id", "a.balance"],
            "join": {"[>]account(a)": {"u.id": "a.user_id"}},
            "where": {"$OR": [{"u.age": {"$BETWEEN": [18, 30]}}, {"$NOT": {"a.balance": {"$<": 100}}}],
                      "u.status": ["active", "trial"]},
            "order": "u.id DESC", "limit": [0, 20]}}"#,
    ),
];

// 基准测试：请求解析性能
fn benchmark_parser(c: &mut Criterion) {
    let config = Config::default();
    let parser = Parser::new(&config);
    let mut group = c.benchmark_group("parser_performance");

    for (name, input) in REQUESTS {
        group.bench_with_input(BenchmarkId::new("parse", name), &input, |b, &input| {
            b.iter(|| black_box(parser.parse_str(black_box(input))))
        });
    }

    group.finish();
}

// 基准测试：条件树编译性能
fn benchmark_predicate(c: &mut Criterion) {
    let config = Config::default();
    let parser = Parser::new(&config);
    let mut group = c.benchmark_group("predicate_performance");

    for (name, input) in REQUESTS {
        let json: serde_json::Value = match serde_json::from_str(input) {
            Ok(json) => json,
            Err(_) => continue,
        };
        let condition = match parser.parse_condition(&json["select"]["where"]) {
            Ok(condition) => condition,
            Err(_) => continue,
        };
        group.bench_with_input(BenchmarkId::new("compile", name), &condition, |b, condition| {
            b.iter(|| black_box(predicate::compile(black_box(condition))))
        });
    }

    group.finish();
}

// 基准测试：端到端 (解析 + 语句组装)
fn benchmark_end_to_end(c: &mut Criterion) {
    let config = Config::default();
    let parser = Parser::new(&config);
    let mut group = c.benchmark_group("end_to_end");

    for (name, input) in REQUESTS {
        group.bench_with_input(BenchmarkId::new("full", name), &input, |b, &input| {
            b.iter(|| {
                let request = parser.parse_str(black_box(input));
                black_box(request.and_then(|request| request.compile()))
            })
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_parser, benchmark_predicate, benchmark_end_to_end);
criterion_main!(benches);
