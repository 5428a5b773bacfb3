//! Compilation and per-frame execution throughput.
//!
//! The synthetic level is a counting loop whose body pulls a chain of
//! additions, nested inside `depth` levels of custom blocks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use voxscript::graph::build::PrefabBuilder;
use voxscript::graph::catalog::ids;
use voxscript::graph::{BlockId, Prefab, PrefabList, DEFAULT_BUILTIN_THRESHOLD};
use voxscript::{compile, run_frame, CompileOptions, Limits, SimContext};

/// Loop to `iterations`, inspecting counter + 1 + 1 + ... (`adds` times).
fn busy_level(iterations: f32, adds: i16) -> Prefab {
    let mut b = PrefabBuilder::new("busy");
    let l = b.place(ids::LOOP, (0, 0, 40));
    let stop = b.number(iterations, (-2, 0, 40));
    b.wire(stop, "Number", l, "Stop").unwrap();

    let mut last = (l, "Counter");
    for i in 0..adds {
        let add = b.place(ids::ADD_NUMBERS, (4 + 2 * i, 0, 20));
        let one = b.number(1.0, (4 + 2 * i, 0, 24));
        b.wire(last.0, last.1, add, "Num1").unwrap();
        b.wire(one, "Number", add, "Num2").unwrap();
        last = (add, "Sum");
    }

    let body = b.place(ids::INSPECT_NUMBER, (4, 0, 0));
    b.wire(l, "Do", body, "Before").unwrap();
    b.wire(last.0, last.1, body, "Number").unwrap();
    b.build()
}

/// `depth` wrappers around `busy_level`, outermost first.
fn nested(depth: u16) -> PrefabList {
    let mut prefabs = Vec::new();
    for i in 0..depth {
        let mut b = PrefabBuilder::new(format!("wrap{}", i));
        b.place(BlockId(DEFAULT_BUILTIN_THRESHOLD + i + 1), (0, 0, 0));
        prefabs.push(b.build());
    }
    prefabs.push(busy_level(100.0, 16));
    PrefabList::new(prefabs)
}

fn bench_compile(c: &mut Criterion) {
    let flat = nested(0);
    let deep = nested(8);
    let options = CompileOptions::default();

    let mut group = c.benchmark_group("compile");
    group.bench_function("flat", |b| {
        b.iter(|| compile(black_box(&flat), 0, &options).unwrap())
    });
    group.bench_function("nested_8", |b| {
        b.iter(|| compile(black_box(&deep), 0, &options).unwrap())
    });
    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let options = CompileOptions::default();
    let limits = Limits::default();
    let flat = compile(&nested(0), 0, &options).unwrap();
    let deep = compile(&nested(8), 0, &options).unwrap();

    let mut group = c.benchmark_group("run_frame");
    group.bench_function("flat", |b| {
        b.iter(|| {
            let mut ctx = SimContext::default();
            run_frame(black_box(&flat), &mut ctx, &limits).unwrap()
        })
    });
    group.bench_function("nested_8", |b| {
        b.iter(|| {
            let mut ctx = SimContext::default();
            run_frame(black_box(&deep), &mut ctx, &limits).unwrap()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_compile, bench_frame);
criterion_main!(benches);
