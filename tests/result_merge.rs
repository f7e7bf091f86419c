//! # Result Merge Integration Tests
//!
//! Drives the cursor end to end: partitions are produced through the pool
//! (some on worker threads), fallback rows through the bundled dynamic
//! runtime, and the merged stream is checked against the logical order.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use resultset::config::MIN_BUDGET_FLOOR;
use resultset::{
    ColumnDef, DataType, DynamicRuntime, DynamicValue, MemoryBudget, OwnedValue, PartitionHandle,
    PartitionPool, ResultSet, Row, Schema, TaggedRow,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        ColumnDef::new("idx", DataType::Int8),
        ColumnDef::new("source", DataType::Text),
        ColumnDef::new("score", DataType::Float8),
    ]))
}

fn fast_row(idx: i64) -> Row {
    Row::new(vec![
        OwnedValue::Int(idx),
        "fast".into(),
        OwnedValue::Float(idx as f64 / 2.0),
    ])
}

fn fallback(idx: usize) -> TaggedRow<DynamicValue> {
    TaggedRow::new(
        idx,
        DynamicValue::Tuple(vec![
            (idx as i64).into(),
            "fallback".into(),
            DynamicValue::Int(idx as i64),
        ]),
    )
}

fn needs_fallback(idx: usize) -> bool {
    idx % 7 == 3 || idx % 11 == 0
}

/// Splits `ids` into partitions of cycling sizes.
fn write_partitions(pool: &PartitionPool, schema: &Arc<Schema>, ids: &[i64]) -> Vec<PartitionHandle> {
    let sizes = [5usize, 1, 13, 8];
    let mut out = Vec::new();
    let mut rest = ids;
    let mut turn = 0;
    while !rest.is_empty() {
        let take = sizes[turn % sizes.len()].min(rest.len());
        let mut writer = pool.allocate(schema.clone(), 4096).unwrap();
        for id in &rest[..take] {
            writer.append(&fast_row(*id)).unwrap();
        }
        out.push(writer.finish());
        rest = &rest[take..];
        turn += 1;
    }
    out
}

fn pool() -> PartitionPool {
    PartitionPool::new(Arc::new(MemoryBudget::with_limit(MIN_BUDGET_FLOOR)), 4)
}

#[test]
fn merged_stream_restores_logical_order() {
    init_tracing();
    let pool = pool();
    let schema = schema();
    let total = 200usize;

    let fast_ids: Vec<i64> = (0..total)
        .filter(|i| !needs_fallback(*i))
        .map(|i| i as i64)
        .collect();
    let tagged: Vec<_> = (0..total).filter(|i| needs_fallback(*i)).map(fallback).collect();
    let fallback_count = tagged.len();

    let mut rs = ResultSet::builder()
        .schema(schema.clone())
        .runtime(DynamicRuntime::new(schema.clone()))
        .partitions(write_partitions(&pool, &schema, &fast_ids))
        .tagged_rows(tagged)
        .build()
        .unwrap();
    assert_eq!(rs.row_count(), total);

    let rows = rs.collect_rows(usize::MAX).unwrap();
    assert_eq!(rows.len(), total);

    let mut fallbacks_seen = 0;
    for (position, row) in rows.iter().enumerate() {
        assert_eq!(row.get_int(0).unwrap(), position as i64);
        let source = row.get_text(1).unwrap();
        assert_eq!(source == "fallback", needs_fallback(position));
        if source == "fallback" {
            fallbacks_seen += 1;
            assert_eq!(row.get_float(2).unwrap(), position as f64);
        }
    }
    assert_eq!(fallbacks_seen, fallback_count);
    assert_eq!(rs.total_row_counter(), total);
    assert_eq!(pool.live_partitions(), 0);
    assert_eq!(pool.budget().total_used(), 0);
}

#[test]
fn fallback_expansion_keeps_following_rows_aligned() {
    init_tracing();
    let pool = pool();
    let schema = schema();

    // Index 2 expands into three fallback rows that share one logical slot.
    let fast_ids = [0i64, 1, 3, 4];
    let tagged = vec![fallback(2), fallback(2), fallback(2)];

    let mut rs = ResultSet::builder()
        .schema(schema.clone())
        .runtime(DynamicRuntime::new(schema.clone()))
        .partitions(write_partitions(&pool, &schema, &fast_ids))
        .tagged_rows(tagged)
        .build()
        .unwrap();

    let ids: Vec<i64> = rs
        .rows()
        .map(|r| r.unwrap().get_int(0).unwrap())
        .collect();
    assert_eq!(ids, vec![0, 1, 2, 2, 2, 3, 4]);
    assert_eq!(rs.total_row_counter(), 5);
    assert_eq!(rs.rows_retrieved(), 7);
}

#[test]
fn partitions_from_worker_threads() {
    init_tracing();
    let pool = pool();
    let schema = schema();

    let workers: Vec<_> = (0..4i64)
        .map(|w| {
            let pool = pool.clone();
            let schema = schema.clone();
            thread::spawn(move || {
                let ids: Vec<i64> = (w * 25..(w + 1) * 25).collect();
                write_partitions(&pool, &schema, &ids)
            })
        })
        .collect();

    let partitions: Vec<_> = workers
        .into_iter()
        .flat_map(|w| w.join().unwrap())
        .collect();
    let distinct: HashSet<_> = partitions.iter().map(|p| p.id()).collect();
    assert_eq!(distinct.len(), partitions.len());

    let mut rs = ResultSet::builder()
        .schema(schema.clone())
        .runtime(DynamicRuntime::new(schema))
        .partitions(partitions)
        .max_rows(60)
        .build()
        .unwrap();

    let rows = rs.collect_rows(usize::MAX).unwrap();
    assert_eq!(rows.len(), 60);
    let ids: Vec<i64> = rows.iter().map(|r| r.get_int(0).unwrap()).collect();
    assert_eq!(ids, (0..60).collect::<Vec<_>>());

    rs.clear();
    assert_eq!(pool.live_partitions(), 0);
}

#[test]
fn bulk_export_then_row_pulls() {
    init_tracing();
    let pool = pool();
    let schema = schema();
    let fast_ids: Vec<i64> = (0..30).collect();

    let mut rs = ResultSet::builder()
        .schema(schema.clone())
        .runtime(DynamicRuntime::new(schema.clone()))
        .partitions(write_partitions(&pool, &schema, &fast_ids))
        .tagged_rows(vec![fallback(100)])
        .build()
        .unwrap();

    let mut exported = 0;
    while rs.has_next_partition() {
        let Some(partition) = rs.next_partition() else {
            break;
        };
        exported += partition.row_count();
        partition.invalidate();
    }
    assert_eq!(exported, 30);
    assert_eq!(rs.rows_retrieved(), 30);

    // Only the fallback row is left.
    assert!(rs.has_next_row());
    let last = rs.next_row().unwrap();
    assert_eq!(last.get_text(1).unwrap(), "fallback");
    assert!(!rs.has_next_row());
}

#[test]
fn abandoned_cursor_returns_memory() {
    init_tracing();
    let pool = pool();
    let schema = schema();
    let fast_ids: Vec<i64> = (0..40).collect();

    {
        let mut rs = ResultSet::builder()
            .schema(schema.clone())
            .runtime(DynamicRuntime::new(schema.clone()))
            .partitions(write_partitions(&pool, &schema, &fast_ids))
            .build()
            .unwrap();
        rs.collect_rows(7).unwrap();
        assert!(pool.live_partitions() > 0);
    }

    assert_eq!(pool.live_partitions(), 0);
    assert_eq!(pool.budget().total_used(), 0);
}
