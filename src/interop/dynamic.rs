//! Bundled fallback runtime over a small dynamically typed object model.
//!
//! A `Tuple` or `List` converts column by column; any other value is a
//! one-column row. Values are coerced to the runtime's schema:
//!
//! | Column type | Accepted values |
//! |-------------|-----------------|
//! | bool | Bool |
//! | int2/int4/int8 | Int (range-checked) |
//! | float4/float8 | Float, Int |
//! | date | Int (range-checked to i32) |
//! | time/timestamp | Int |
//! | uuid | Bytes of length 16 |
//! | text | Str |
//! | blob | Bytes, Str |
//!
//! `None` is accepted for every column.

use std::sync::Arc;

use eyre::{bail, eyre, Result, WrapErr};

use super::{FallbackRuntime, InteropGuard};
use crate::records::{DataType, Schema};
use crate::resultset::Row;
use crate::types::OwnedValue;

#[derive(Debug, Clone, PartialEq)]
pub enum DynamicValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<DynamicValue>),
    List(Vec<DynamicValue>),
}

impl DynamicValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            DynamicValue::None => "none",
            DynamicValue::Bool(_) => "bool",
            DynamicValue::Int(_) => "int",
            DynamicValue::Float(_) => "float",
            DynamicValue::Str(_) => "str",
            DynamicValue::Bytes(_) => "bytes",
            DynamicValue::Tuple(_) => "tuple",
            DynamicValue::List(_) => "list",
        }
    }
}

impl From<i64> for DynamicValue {
    fn from(v: i64) -> Self {
        DynamicValue::Int(v)
    }
}

impl From<f64> for DynamicValue {
    fn from(v: f64) -> Self {
        DynamicValue::Float(v)
    }
}

impl From<bool> for DynamicValue {
    fn from(v: bool) -> Self {
        DynamicValue::Bool(v)
    }
}

impl From<&str> for DynamicValue {
    fn from(v: &str) -> Self {
        DynamicValue::Str(v.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(v: String) -> Self {
        DynamicValue::Str(v)
    }
}

impl From<Vec<u8>> for DynamicValue {
    fn from(v: Vec<u8>) -> Self {
        DynamicValue::Bytes(v)
    }
}

/// Converts [`DynamicValue`]s into rows of a fixed schema.
#[derive(Debug, Clone)]
pub struct DynamicRuntime {
    schema: Arc<Schema>,
}

impl DynamicRuntime {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn convert_fields(&self, fields: &[DynamicValue]) -> Result<Row> {
        let columns = self.schema.columns();
        if fields.len() != columns.len() {
            bail!(
                "fallback object has {} fields but schema {} has {}",
                fields.len(),
                self.schema,
                columns.len()
            );
        }

        let values = columns
            .iter()
            .zip(fields)
            .map(|(col, field)| {
                convert_value(col.data_type, field)
                    .wrap_err_with(|| format!("failed to convert field '{}'", col.name))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Row::new(values))
    }
}

impl FallbackRuntime for DynamicRuntime {
    type Object = DynamicValue;

    fn to_row(&self, object: &DynamicValue, _guard: &InteropGuard) -> Result<Row> {
        match object {
            DynamicValue::Tuple(fields) | DynamicValue::List(fields) => self.convert_fields(fields),
            scalar => self.convert_fields(std::slice::from_ref(scalar)),
        }
    }
}

fn convert_value(data_type: DataType, value: &DynamicValue) -> Result<OwnedValue> {
    let converted = match (data_type, value) {
        (_, DynamicValue::None) => OwnedValue::Null,
        (DataType::Bool, DynamicValue::Bool(b)) => OwnedValue::Bool(*b),
        (DataType::Int2, DynamicValue::Int(i)) => {
            i16::try_from(*i).map_err(|_| eyre!("value {} out of range for int2", i))?;
            OwnedValue::Int(*i)
        }
        (DataType::Int4, DynamicValue::Int(i)) => {
            i32::try_from(*i).map_err(|_| eyre!("value {} out of range for int4", i))?;
            OwnedValue::Int(*i)
        }
        (DataType::Int8, DynamicValue::Int(i)) => OwnedValue::Int(*i),
        (DataType::Float4 | DataType::Float8, DynamicValue::Float(f)) => OwnedValue::Float(*f),
        (DataType::Float4 | DataType::Float8, DynamicValue::Int(i)) => OwnedValue::Float(*i as f64),
        (DataType::Date, DynamicValue::Int(i)) => OwnedValue::Date(
            i32::try_from(*i).map_err(|_| eyre!("value {} out of range for date", i))?,
        ),
        (DataType::Time, DynamicValue::Int(i)) => OwnedValue::Time(*i),
        (DataType::Timestamp, DynamicValue::Int(i)) => OwnedValue::Timestamp(*i),
        (DataType::Uuid, DynamicValue::Bytes(b)) => {
            let uuid: [u8; 16] = b
                .as_slice()
                .try_into()
                .map_err(|_| eyre!("uuid needs 16 bytes, got {}", b.len()))?;
            OwnedValue::Uuid(uuid)
        }
        (DataType::Text, DynamicValue::Str(s)) => OwnedValue::Text(s.clone()),
        (DataType::Blob, DynamicValue::Bytes(b)) => OwnedValue::Blob(b.clone()),
        (DataType::Blob, DynamicValue::Str(s)) => OwnedValue::Blob(s.as_bytes().to_vec()),
        (expected, got) => bail!("cannot convert {} to {}", got.type_name(), expected),
    };
    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interop::lock_interop;
    use crate::records::ColumnDef;

    fn runtime() -> DynamicRuntime {
        DynamicRuntime::new(Arc::new(Schema::new(vec![
            ColumnDef::new("id", DataType::Int4),
            ColumnDef::new("score", DataType::Float8),
            ColumnDef::new("name", DataType::Text),
        ])))
    }

    #[test]
    fn test_tuple_converts_per_column() {
        let rt = runtime();
        let guard = lock_interop();
        let obj = DynamicValue::Tuple(vec![7i64.into(), 3i64.into(), "x".into()]);

        let row = rt.to_row(&obj, &guard).unwrap();
        assert_eq!(
            row,
            Row::new(vec![OwnedValue::Int(7), OwnedValue::Float(3.0), "x".into()])
        );
    }

    #[test]
    fn test_list_and_none() {
        let rt = runtime();
        let guard = lock_interop();
        let obj = DynamicValue::List(vec![DynamicValue::None, 1.5.into(), DynamicValue::None]);

        let row = rt.to_row(&obj, &guard).unwrap();
        assert!(row.is_null(0));
        assert_eq!(row.get_float(1).unwrap(), 1.5);
        assert!(row.is_null(2));
    }

    #[test]
    fn test_scalar_is_single_column_row() {
        let rt = DynamicRuntime::new(Arc::new(Schema::new(vec![ColumnDef::new(
            "v",
            DataType::Int8,
        )])));
        let guard = lock_interop();

        let row = rt.to_row(&DynamicValue::Int(-4), &guard).unwrap();
        assert_eq!(row.get_int(0).unwrap(), -4);
    }

    #[test]
    fn test_field_count_mismatch() {
        let rt = runtime();
        let guard = lock_interop();

        let err = rt.to_row(&DynamicValue::Int(1), &guard).unwrap_err();
        assert!(err.to_string().contains("1 fields"));
    }

    #[test]
    fn test_int_range_checked() {
        let rt = runtime();
        let guard = lock_interop();
        let obj = DynamicValue::Tuple(vec![i64::MAX.into(), 0i64.into(), "x".into()]);

        let err = rt.to_row(&obj, &guard).unwrap_err();
        assert!(err.to_string().contains("'id'"));
        assert!(err.chain().any(|c| c.to_string().contains("out of range for int4")));
    }

    #[test]
    fn test_type_mismatch_names_types() {
        let rt = runtime();
        let guard = lock_interop();
        let obj = DynamicValue::Tuple(vec![1i64.into(), 2i64.into(), 3i64.into()]);

        let err = rt.to_row(&obj, &guard).unwrap_err();
        assert!(err.chain().any(|c| c.to_string() == "cannot convert int to text"));
    }

    #[test]
    fn test_uuid_and_blob_columns() {
        let rt = DynamicRuntime::new(Arc::new(Schema::new(vec![
            ColumnDef::new("u", DataType::Uuid),
            ColumnDef::new("b", DataType::Blob),
        ])));
        let guard = lock_interop();
        let obj = DynamicValue::Tuple(vec![vec![1u8; 16].into(), "raw".into()]);

        let row = rt.to_row(&obj, &guard).unwrap();
        assert_eq!(row.get(0), Some(&OwnedValue::Uuid([1; 16])));
        assert_eq!(row.get_blob(1).unwrap(), b"raw");

        let short = DynamicValue::Tuple(vec![vec![1u8; 4].into(), DynamicValue::None]);
        assert!(rt.to_row(&short, &guard).is_err());
    }
}
