//! Benchmarks for context hot paths.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rulectx::context::{Context, Location};
use std::sync::Arc;

fn context_benchmark(c: &mut Criterion) {
    let ctx = Context::for_bench("bench");
    for i in 0..32 {
        ctx.add_prop(format!("key_{i}"), serde_json::json!(i));
    }
    ctx.set_loc(Arc::new(Location::new("bench")));

    c.bench_function("fork", |b| b.iter(|| black_box(ctx.fork())));

    c.bench_function("prop", |b| b.iter(|| black_box(ctx.prop("key_7"))));

    c.bench_function("get_loc", |b| b.iter(|| black_box(ctx.get_loc())));

    c.bench_function("record_silent", |b| {
        b.iter(|| ctx.record(rulectx::logging::LogLevel::Error, "op", &[]));
    });
}

criterion_group!(benches, context_benchmark);
criterion_main!(benches);
