//! Benchmarks for the analysis pipeline.
//!
//! Measures each phase on synthetic methods of growing size:
//! - Control flow graph construction (with and without uncaught-exception edges)
//! - Dominator and dominance frontier computation
//! - Control dependence graph construction
//! - SSA construction
//! - The parallel batch driver

extern crate dexscope;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dexscope::{
    analysis::{
        analyze_methods, ssa::SsaBuilder, ControlDependenceGraph, ControlFlowGraph, Dominators,
        MethodAnalysis,
    },
    code::{AnalyzedInstruction, Opcode},
};
use std::hint::black_box;

/// A chain of `n` if/else diamonds, each redefining v1 and v2, inside a try
/// block whose handler jumps back to the first diamond.
fn branchy_method(n: usize) -> Vec<AnalyzedInstruction> {
    let mut instructions = Vec::with_capacity(n * 4 + 3);
    for d in 0..n {
        let base = d * 4;
        let next = base + 4;
        instructions.push(
            AnalyzedInstruction::builder(base, Opcode::IF_EQZ)
                .source(0)
                .successors([base + 1, base + 2])
                .build()
                .unwrap(),
        );
        instructions.push(
            AnalyzedInstruction::builder(base + 1, Opcode::CONST_4)
                .destination(1)
                .successor(base + 3)
                .build()
                .unwrap(),
        );
        instructions.push(
            AnalyzedInstruction::builder(base + 2, Opcode::DIV_INT)
                .destination(2)
                .sources([1, 2])
                .successors([base + 3, n * 4 + 1])
                .exception_successor(n * 4 + 1)
                .build()
                .unwrap(),
        );
        instructions.push(
            AnalyzedInstruction::builder(base + 3, Opcode::ADD_INT)
                .destination(0)
                .sources([1, 2])
                .successor(next)
                .build()
                .unwrap(),
        );
    }
    let ret = n * 4;
    instructions.push(
        AnalyzedInstruction::builder(ret, Opcode::RETURN)
            .source(0)
            .build()
            .unwrap(),
    );
    instructions.push(
        AnalyzedInstruction::builder(ret + 1, Opcode::MOVE_EXCEPTION)
            .destination(3)
            .successor(ret + 2)
            .build()
            .unwrap(),
    );
    instructions.push(
        AnalyzedInstruction::builder(ret + 2, Opcode::GOTO)
            .successor(0)
            .build()
            .unwrap(),
    );
    instructions
}

const SIZES: [usize; 3] = [8, 64, 256];

fn bench_cfg(c: &mut Criterion) {
    let mut group = c.benchmark_group("cfg_build");
    for size in SIZES {
        let instructions = branchy_method(size);
        group.bench_with_input(BenchmarkId::new("plain", size), &instructions, |b, insns| {
            b.iter(|| ControlFlowGraph::build(black_box(insns.clone()), "bench", false).unwrap());
        });
        group.bench_with_input(
            BenchmarkId::new("uncaught", size),
            &instructions,
            |b, insns| {
                b.iter(|| {
                    ControlFlowGraph::build(black_box(insns.clone()), "bench", true).unwrap()
                });
            },
        );
    }
    group.finish();
}

fn bench_dominators(c: &mut Criterion) {
    let mut group = c.benchmark_group("dominators");
    for size in SIZES {
        let cfg = ControlFlowGraph::build(branchy_method(size), "bench", false).unwrap();
        group.bench_with_input(BenchmarkId::new("forward", size), &cfg, |b, cfg| {
            b.iter(|| Dominators::compute(black_box(cfg), cfg.entry()));
        });
    }
    group.finish();
}

fn bench_cdg(c: &mut Criterion) {
    let mut group = c.benchmark_group("cdg_build");
    for size in SIZES {
        let cfg = ControlFlowGraph::build(branchy_method(size), "bench", false).unwrap();
        cfg.post_dominators();
        group.bench_with_input(BenchmarkId::from_parameter(size), &cfg, |b, cfg| {
            b.iter(|| ControlDependenceGraph::build(black_box(cfg)).unwrap());
        });
    }
    group.finish();
}

fn bench_ssa(c: &mut Criterion) {
    let mut group = c.benchmark_group("ssa_build");
    for size in SIZES {
        let cfg = ControlFlowGraph::build(branchy_method(size), "bench", false).unwrap();
        let dominators = cfg.dominators();
        group.bench_with_input(BenchmarkId::from_parameter(size), &cfg, |b, cfg| {
            b.iter(|| SsaBuilder::build(black_box(cfg), dominators).unwrap());
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    c.bench_function("batch_64_methods", |b| {
        b.iter_with_setup(
            || {
                (0..64)
                    .map(|i| MethodAnalysis::new(format!("La;->m{i}()V"), branchy_method(32)))
                    .collect::<Vec<_>>()
            },
            |methods| black_box(analyze_methods(&methods, true)),
        );
    });
}

criterion_group!(
    benches,
    bench_cfg,
    bench_dominators,
    bench_cdg,
    bench_ssa,
    bench_batch
);
criterion_main!(benches);
