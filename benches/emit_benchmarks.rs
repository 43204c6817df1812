//! Performance benchmarks for both emitters.
//!
//! Programs are generated with `TreeBuilder`: `n` free functions, each with
//! a counting loop, a string concatenation, a ternary and a protected
//! region, called in turn from the entry point.
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- "functions_1000"
//! ```

use bumpalo::Bump;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use sable::prelude::*;
use sable_core::testing::TreeBuilder;
use sable_core::{BinaryOp, builtins};
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

/// Call at the end of each iteration to flush profiling data.
#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

const SIZES: [usize; 3] = [10, 100, 1000];

fn generate<'a>(b: &TreeBuilder<'a>, functions: usize) -> BoundProgram<'a> {
    let mut bodies = Vec::with_capacity(functions + 1);
    let mut calls = Vec::with_capacity(functions);
    for n in 0..functions {
        let f = b.function(&format!("f{n}"), &[b.param("limit", b.int_type())], b.string_type());
        let i = b.local("i", b.int_type());
        let text = b.local("text", b.string_type());
        let body = b.block(&[
            b.declare(text, b.string("")),
            b.for_(
                Some(b.declare(i, b.int(0))),
                Some(b.binary(BinaryOp::Less, b.var(i), b.arg(f, 0))),
                Some(b.assign(i, b.add(b.var(i), b.int(1)))),
                |_, _| {
                    vec![b.expr_stmt(b.assign(
                        text,
                        b.concat(&[
                            b.var(text),
                            b.string("["),
                            b.ternary(
                                b.binary(BinaryOp::Greater, b.var(i), b.int(5)),
                                b.string("big"),
                                b.string("small"),
                            ),
                            b.string("]"),
                        ]),
                    ))]
                },
            ),
            b.try_(
                &[b.expr_stmt(b.call(&builtins::PRINT, &[b.var(text)]))],
                None,
                Some(&[b.expr_stmt(b.call(&builtins::PRINT, &[b.string("done")]))]),
            ),
            b.ret(Some(b.var(text))),
        ]);
        bodies.push(b.body(f, body));
        calls.push(b.expr_stmt(b.call(f, &[b.int(n as i32)])));
    }
    let main = b.function("main", &[], b.void_type());
    bodies.push(b.body(main, b.block(&calls)));
    b.program(&bodies, Some(main))
}

fn bytecode_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let runtime = standard_library();
    let mut group = c.benchmark_group("emit/bytecode");
    for size in SIZES {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let program = generate(&b, size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("functions", size), &program, |bench, program| {
            bench.iter(|| {
                let emitter = ModuleEmitter::with_references(EmitOptions::new("bench"), std::slice::from_ref(&runtime))
                    .unwrap();
                let (module, _) = emitter.build(black_box(program)).unwrap();
                end_profiling_frame();
                black_box(module)
            });
        });
    }
    group.finish();
}

fn source_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit/source");
    for size in SIZES {
        let arena = Bump::new();
        let b = TreeBuilder::new(&arena);
        let program = generate(&b, size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("functions", size), &program, |bench, program| {
            bench.iter(|| {
                let (text, _) = SourceEmitter::new("Bench").emit(black_box(program)).unwrap();
                black_box(text)
            });
        });
    }
    group.finish();
}

fn container_benchmarks(c: &mut Criterion) {
    let arena = Bump::new();
    let b = TreeBuilder::new(&arena);
    let program = generate(&b, 1000);
    let emitter =
        ModuleEmitter::with_references(EmitOptions::new("bench"), &[standard_library()]).unwrap();
    let Ok((Some(module), _)) = emitter.build(&program) else {
        panic!("benchmark program failed to build");
    };
    let bytes = module.to_bytes().unwrap();

    let mut group = c.benchmark_group("container");
    group.throughput(Throughput::Bytes(bytes.len() as u64));
    group.bench_function("write", |bench| bench.iter(|| black_box(module.to_bytes().unwrap())));
    group.bench_function("read", |bench| {
        bench.iter(|| black_box(Module::from_bytes(black_box(&bytes)).unwrap()))
    });
    group.bench_function("disassemble", |bench| bench.iter(|| black_box(module.disassemble())));
    group.finish();
}

criterion_group!(benches, bytecode_benchmarks, source_benchmarks, container_benchmarks);
criterion_main!(benches);
