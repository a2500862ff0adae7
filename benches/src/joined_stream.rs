mod common;

use common::{generate_customers, seeded_order_client};
use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use crm_gateway::prelude::*;
use tokio::runtime::Runtime;

/// Benchmark the joined stream across fan-out limits
fn bench_concurrency_levels(c: &mut Criterion) {
    let mut group = c.benchmark_group("joined_stream_concurrency");
    let runtime = Runtime::new().unwrap();

    for concurrency in [1, 4, 16, 64] {
        group.bench_with_input(
            BenchmarkId::from_parameter(concurrency),
            &concurrency,
            |b, &concurrency| {
                b.to_async(&runtime).iter_batched(
                    || generate_customers(500),
                    |customers| async move {
                        let reader =
                            CustomerSourceReader::new(InMemoryCustomerTransport::new(customers));
                        let records = Aggregator::new(reader, seeded_order_client(500, 100))
                            .with_concurrency(concurrency)
                            .collect()
                            .await
                            .unwrap();
                        black_box(records);
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

/// Benchmark end-to-end aggregation, including JSON line output, by customer count
fn bench_customer_counts(c: &mut Criterion) {
    let mut group = c.benchmark_group("joined_stream_customers");
    let runtime = Runtime::new().unwrap();

    for (size_name, customers) in [("small_10", 10), ("medium_1k", 1_000), ("large_10k", 10_000)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(size_name),
            &customers,
            |b, &customers| {
                b.to_async(&runtime).iter_batched(
                    || generate_customers(customers),
                    |list| async move {
                        let reader = CustomerSourceReader::new(InMemoryCustomerTransport::new(list));
                        let records = Aggregator::new(reader, seeded_order_client(customers, 20))
                            .collect()
                            .await
                            .unwrap();

                        let mut writer = JsonLinesWriter::new(Vec::new());
                        for record in &records {
                            writer.write(record).await.unwrap();
                        }
                        black_box(writer.finish().await.unwrap());
                    },
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_concurrency_levels, bench_customer_counts);
criterion_main!(benches);
