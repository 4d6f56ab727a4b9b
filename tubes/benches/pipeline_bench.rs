//! Benchmarks for pipeline execution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tubes::cancellation::CancellationToken;
use tubes::filters::AsyncFnFilter;
use tubes::pipeline::{AsyncPipeline, Pipeline};

const FILTERS: u64 = 16;

fn sync_pipeline() -> Pipeline<u64> {
    let mut pipeline = Pipeline::new();
    for step in 0..FILTERS {
        pipeline.register_fn(move |message: &mut u64| {
            *message = message.wrapping_add(step);
            Ok(())
        });
    }
    pipeline
}

fn async_pipeline() -> AsyncPipeline<u64> {
    let mut pipeline = AsyncPipeline::new();
    for step in 0..FILTERS {
        pipeline.register(AsyncFnFilter::new(
            move |message: &mut u64, _cancel: &CancellationToken| {
                Box::pin(async move {
                    *message = message.wrapping_add(step);
                    Ok::<(), anyhow::Error>(())
                })
            },
        ));
    }
    pipeline
}

fn pipeline_benchmark(c: &mut Criterion) {
    let pipeline = sync_pipeline();
    c.bench_function("sync_pipeline_16_filters", |b| {
        b.iter(|| {
            let mut message = 0_u64;
            pipeline.execute(black_box(&mut message)).ok();
            black_box(message)
        });
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    let pipeline = async_pipeline();
    let token = CancellationToken::new();
    c.bench_function("async_pipeline_16_filters", |b| {
        b.iter(|| {
            let mut message = 0_u64;
            runtime
                .block_on(pipeline.execute_async(black_box(&mut message), &token))
                .ok();
            black_box(message)
        });
    });
}

criterion_group!(benches, pipeline_benchmark);
criterion_main!(benches);
