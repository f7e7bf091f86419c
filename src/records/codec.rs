//! # Row Codec
//!
//! Converts between materialized [`Row`]s and the record layout described in
//! the module docs of [`crate::records`]. Partitions store records back to
//! back with no framing, so the decoder reports how many bytes it consumed
//! and the caller advances its byte offset by exactly that amount.
//!
//! ## Type Mapping
//!
//! | Column type | Accepted value | Decoded as |
//! |-------------|----------------|------------|
//! | bool | Bool | Bool |
//! | int2/int4/int8 | Int (range-checked) | Int |
//! | float4/float8 | Float, Int | Float |
//! | date | Date | Date |
//! | time | Time, Int | Time |
//! | timestamp | Timestamp, Int | Timestamp |
//! | uuid | Uuid | Uuid |
//! | text | Text | Text |
//! | blob | Blob | Blob |
//!
//! Null is accepted for every column.

use eyre::{bail, Result, WrapErr};

use crate::records::builder::RecordBuilder;
use crate::records::schema::Schema;
use crate::records::types::DataType;
use crate::records::view::RecordView;
use crate::resultset::Row;
use crate::types::OwnedValue;

/// Decodes the record at the start of `buf`, returning the row and the
/// number of bytes it occupied.
pub fn decode_row(schema: &Schema, buf: &[u8]) -> Result<(Row, usize)> {
    let view = RecordView::from_prefix(buf, schema)?;
    let mut values = Vec::with_capacity(schema.column_count());

    for (idx, col) in schema.columns().iter().enumerate() {
        if view.is_null(idx) {
            values.push(OwnedValue::Null);
            continue;
        }

        let value = match col.data_type {
            DataType::Bool => OwnedValue::Bool(view.get_bool(idx)?),
            DataType::Int2 => OwnedValue::Int(view.get_int2(idx)? as i64),
            DataType::Int4 => OwnedValue::Int(view.get_int4(idx)? as i64),
            DataType::Int8 => OwnedValue::Int(view.get_int8(idx)?),
            DataType::Float4 => OwnedValue::Float(view.get_float4(idx)? as f64),
            DataType::Float8 => OwnedValue::Float(view.get_float8(idx)?),
            DataType::Date => OwnedValue::Date(view.get_date(idx)?),
            DataType::Time => OwnedValue::Time(view.get_time(idx)?),
            DataType::Timestamp => OwnedValue::Timestamp(view.get_timestamp(idx)?),
            DataType::Uuid => OwnedValue::Uuid(view.get_uuid(idx)?),
            DataType::Text => OwnedValue::Text(view.get_text(idx)?.to_string()),
            DataType::Blob => OwnedValue::Blob(view.get_blob(idx)?.to_vec()),
        };
        values.push(value);
    }

    Ok((Row::new(values), view.record_len()))
}

/// Encodes `row` and appends it to `out`. The builder is reset first, so
/// one builder can be reused for a whole partition.
pub fn encode_row_into(builder: &mut RecordBuilder<'_>, row: &Row, out: &mut Vec<u8>) -> Result<()> {
    let schema = builder.schema();
    if row.column_count() != schema.column_count() {
        bail!(
            "row has {} columns but schema {} has {}",
            row.column_count(),
            schema,
            schema.column_count()
        );
    }

    builder.reset();
    for (idx, (col, value)) in schema.columns().iter().zip(&row.values).enumerate() {
        set_column(builder, idx, col.data_type, value)
            .wrap_err_with(|| format!("failed to encode column '{}'", col.name))?;
    }
    builder.build_into(out)
}

pub fn encode_row(schema: &Schema, row: &Row) -> Result<Vec<u8>> {
    let mut builder = RecordBuilder::new(schema);
    let mut out = Vec::with_capacity(row.serialized_length(schema));
    encode_row_into(&mut builder, row, &mut out)?;
    Ok(out)
}

fn set_column(
    builder: &mut RecordBuilder<'_>,
    idx: usize,
    data_type: DataType,
    value: &OwnedValue,
) -> Result<()> {
    match (data_type, value) {
        (_, OwnedValue::Null) => {
            builder.set_null(idx);
            Ok(())
        }
        (DataType::Bool, OwnedValue::Bool(b)) => builder.set_bool(idx, *b),
        (DataType::Int2, OwnedValue::Int(i)) => {
            let v = i16::try_from(*i).map_err(|_| eyre::eyre!("value {} out of range for int2", i))?;
            builder.set_int2(idx, v)
        }
        (DataType::Int4, OwnedValue::Int(i)) => {
            let v = i32::try_from(*i).map_err(|_| eyre::eyre!("value {} out of range for int4", i))?;
            builder.set_int4(idx, v)
        }
        (DataType::Int8, OwnedValue::Int(i)) => builder.set_int8(idx, *i),
        (DataType::Float4, OwnedValue::Float(f)) => builder.set_float4(idx, *f as f32),
        (DataType::Float4, OwnedValue::Int(i)) => builder.set_float4(idx, *i as f32),
        (DataType::Float8, OwnedValue::Float(f)) => builder.set_float8(idx, *f),
        (DataType::Float8, OwnedValue::Int(i)) => builder.set_float8(idx, *i as f64),
        (DataType::Date, OwnedValue::Date(d)) => builder.set_date(idx, *d),
        (DataType::Time, OwnedValue::Time(t) | OwnedValue::Int(t)) => builder.set_time(idx, *t),
        (DataType::Timestamp, OwnedValue::Timestamp(t) | OwnedValue::Int(t)) => {
            builder.set_timestamp(idx, *t)
        }
        (DataType::Uuid, OwnedValue::Uuid(u)) => builder.set_uuid(idx, u),
        (DataType::Text, OwnedValue::Text(s)) => builder.set_text(idx, s),
        (DataType::Blob, OwnedValue::Blob(b)) => builder.set_blob(idx, b),
        (expected, got) => bail!("cannot store {:?} in {} column", got, expected),
    }
}
