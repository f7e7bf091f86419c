//! Fuzz testing for partition writes and cursor reads.
//!
//! Appends arbitrary rows to small partitions, splicing arbitrary fallback
//! rows in between, then drains a result cursor and checks that every
//! accepted row comes back unchanged and all partition memory is returned.

#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use resultset::{
    ColumnDef, DataType, DynamicRuntime, DynamicValue, MemoryBudget, OwnedValue, PartitionPool,
    ResultSet, Row, Schema, TaggedRow,
};

#[derive(Debug, Arbitrary)]
struct WriterInput {
    capacity: u16,
    rows: Vec<FuzzRow>,
    fallback_every: u8,
    max_rows: i16,
}

#[derive(Debug, Arbitrary)]
struct FuzzRow {
    id: Option<i64>,
    name: Option<String>,
    flag: Option<bool>,
}

impl FuzzRow {
    fn to_row(&self) -> Row {
        Row::new(vec![
            self.id.map_or(OwnedValue::Null, OwnedValue::Int),
            self.name.clone().map_or(OwnedValue::Null, OwnedValue::Text),
            self.flag.map_or(OwnedValue::Null, OwnedValue::Bool),
        ])
    }

    fn to_dynamic(&self) -> DynamicValue {
        DynamicValue::Tuple(vec![
            self.id.map_or(DynamicValue::None, DynamicValue::Int),
            self.name.clone().map_or(DynamicValue::None, DynamicValue::Str),
            self.flag.map_or(DynamicValue::None, DynamicValue::Bool),
        ])
    }
}

fuzz_target!(|input: WriterInput| {
    let capacity = (input.capacity as usize).max(64);
    let schema = Arc::new(Schema::new(vec![
        ColumnDef::new("id", DataType::Int8),
        ColumnDef::new("name", DataType::Text),
        ColumnDef::new("flag", DataType::Bool),
    ]));
    let pool = PartitionPool::new(Arc::new(MemoryBudget::with_limit(64 << 20)), 2);

    let mut expected = Vec::new();
    let mut tagged = Vec::new();
    let mut partitions = Vec::new();
    let mut writer = pool.allocate(schema.clone(), capacity).unwrap();

    for (i, fuzz_row) in input.rows.iter().take(512).enumerate() {
        if input.fallback_every > 0 && i % input.fallback_every as usize == 0 {
            tagged.push(TaggedRow::new(expected.len(), fuzz_row.to_dynamic()));
            expected.push(fuzz_row.to_row());
            continue;
        }

        let row = fuzz_row.to_row();
        if writer.append(&row).is_err() {
            partitions.push(writer.finish());
            writer = pool.allocate(schema.clone(), capacity).unwrap();
            if writer.append(&row).is_err() {
                // Row larger than a whole partition.
                continue;
            }
        }
        expected.push(row);
    }
    partitions.push(writer.finish());

    let mut rs = ResultSet::builder()
        .schema(schema.clone())
        .runtime(DynamicRuntime::new(schema))
        .partitions(partitions)
        .tagged_rows(tagged)
        .max_rows(input.max_rows as i64)
        .build()
        .unwrap();

    let limit = usize::try_from(input.max_rows).unwrap_or(usize::MAX);
    let actual = rs.collect_rows(usize::MAX).unwrap();
    assert_eq!(actual.len(), expected.len().min(limit));
    assert_eq!(actual[..], expected[..actual.len()]);

    drop(rs);
    assert_eq!(pool.live_partitions(), 0);
    assert_eq!(pool.budget().total_used(), 0);
});
