//! Benchmarks for batched command aggregation.

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use sqlfront::batch::{
    BatchExecutor, BatchOutcomes, BatchResult, Command, CommandDescriptor, CommandSet,
    ExecutionContext, OperationOutcome, SqlParameter, is_valid_parameter_name,
};

/// Reports one affected row per command without doing any work.
struct NullExecutor;

impl BatchExecutor for NullExecutor {
    type Handle = BatchOutcomes;

    fn execute_batch(
        &mut self,
        _context: &ExecutionContext,
        commands: &[CommandDescriptor],
    ) -> BatchResult<BatchOutcomes> {
        Ok(commands.iter().map(|_| OperationOutcome::success(1)).collect())
    }
}

fn update(id: i64) -> Command {
    Command::text("UPDATE orders SET shipped = 1 WHERE id = @id AND region = @region")
        .param(SqlParameter::new("@id", id))
        .param(SqlParameter::new("@region", "emea"))
}

/// Benchmark parameter name validation.
fn bench_parameter_names(c: &mut Criterion) {
    let mut group = c.benchmark_group("parameter_names");

    for name in ["@id", "@customer_reference_number", "@1bad", "@名前"] {
        group.bench_with_input(BenchmarkId::from_parameter(name), name, |b, name| {
            b.iter(|| black_box(is_valid_parameter_name(black_box(name))))
        });
    }

    group.finish();
}

/// Benchmark appending commands, including parameter snapshots.
fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append");

    group.bench_function("two_scalar_params", |b| {
        let command = update(42);
        b.iter_batched(CommandSet::new, |mut set| black_box(set.append(&command)), BatchSize::SmallInput)
    });

    group.bench_function("blob_window_4k", |b| {
        let payload: Vec<u8> = (0..8192u32).map(|i| i as u8).collect();
        let command = Command::procedure("dbo.StoreBlob")
            .param(SqlParameter::new("@blob", payload).with_offset(1024).with_size(4096));
        b.iter_batched(CommandSet::new, |mut set| black_box(set.append(&command)), BatchSize::SmallInput)
    });

    group.finish();
}

/// Benchmark building and dispatching whole batches.
fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");

    for size in [1usize, 10, 100] {
        let commands: Vec<Command> = (0..size as i64).map(update).collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &commands, |b, commands| {
            b.iter(|| {
                let mut set = CommandSet::new();
                for command in commands {
                    set.append(command).unwrap();
                }
                black_box(set.dispatch(&mut NullExecutor).unwrap())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parameter_names, bench_append, bench_dispatch);
criterion_main!(benches);
