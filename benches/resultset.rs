//! Result cursor benchmarks
//!
//! Measures the per-row cost of the two sources the cursor merges:
//! decoding records out of partitions and converting fallback objects under
//! the interop lock. Target: > 1M partition rows/sec.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

use resultset::records::{decode_row, encode_row};
use resultset::{
    ColumnDef, DataType, DynamicRuntime, DynamicValue, MemoryBudget, OwnedValue, PartitionHandle,
    PartitionPool, ResultSet, Row, Schema, TaggedRow,
};

fn schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        ColumnDef::new("id", DataType::Int8),
        ColumnDef::new("name", DataType::Text),
        ColumnDef::new("score", DataType::Float8),
    ]))
}

fn row(id: i64) -> Row {
    Row::new(vec![
        OwnedValue::Int(id),
        format!("name-{:06}", id).into(),
        OwnedValue::Float(id as f64 * 0.5),
    ])
}

fn partitions(pool: &PartitionPool, schema: &Arc<Schema>, count: usize) -> Vec<PartitionHandle> {
    let mut out = Vec::new();
    let mut writer = pool.allocate(schema.clone(), 64 * 1024).unwrap();
    for id in 0..count as i64 {
        if writer.append(&row(id)).is_err() {
            out.push(writer.finish());
            writer = pool.allocate(schema.clone(), 64 * 1024).unwrap();
            writer.append(&row(id)).unwrap();
        }
    }
    out.push(writer.finish());
    out
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_codec");
    let schema = schema();
    let sample = row(42);
    let encoded = encode_row(&schema, &sample).unwrap();

    group.bench_function("encode", |b| {
        b.iter(|| black_box(encode_row(&schema, black_box(&sample)).unwrap()));
    });

    group.bench_function("decode", |b| {
        b.iter(|| black_box(decode_row(&schema, black_box(&encoded)).unwrap()));
    });

    group.finish();
}

fn bench_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("resultset_drain");
    let schema = schema();
    let pool = PartitionPool::new(Arc::new(MemoryBudget::with_limit(64 * 1024 * 1024)), 16);

    for count in [1_000usize, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(BenchmarkId::new("partitions_only", count), count, |b, &count| {
            b.iter_with_setup(
                || {
                    ResultSet::builder()
                        .schema(schema.clone())
                        .runtime(DynamicRuntime::new(schema.clone()))
                        .partitions(partitions(&pool, &schema, count))
                        .build()
                        .unwrap()
                },
                |mut rs| {
                    while rs.has_next_row() {
                        black_box(rs.next_row().unwrap());
                    }
                },
            );
        });

        group.bench_with_input(BenchmarkId::new("one_in_ten_fallback", count), count, |b, &count| {
            b.iter_with_setup(
                || {
                    let tagged: Vec<_> = (0..count)
                        .step_by(10)
                        .map(|i| {
                            TaggedRow::new(
                                i,
                                DynamicValue::Tuple(vec![
                                    (i as i64).into(),
                                    "fallback".into(),
                                    DynamicValue::Float(0.0),
                                ]),
                            )
                        })
                        .collect();
                    ResultSet::builder()
                        .schema(schema.clone())
                        .runtime(DynamicRuntime::new(schema.clone()))
                        .partitions(partitions(&pool, &schema, count - tagged.len()))
                        .tagged_rows(tagged)
                        .build()
                        .unwrap()
                },
                |mut rs| {
                    while rs.has_next_row() {
                        black_box(rs.next_row().unwrap());
                    }
                },
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_codec, bench_drain);
criterion_main!(benches);
