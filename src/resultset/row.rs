use crate::records::Schema;
use crate::types::OwnedValue;
use eyre::{bail, Result};

/// A materialized output row.
///
/// Rows produced by the cursor own their values; an empty row (no columns)
/// is the exhaustion sentinel returned by [`crate::ResultSet::next_row`]
/// once nothing is left to read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    pub values: Vec<OwnedValue>,
}

impl Row {
    pub fn new(values: Vec<OwnedValue>) -> Self {
        Self { values }
    }

    /// The exhaustion sentinel.
    pub fn empty() -> Self {
        Self { values: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&OwnedValue> {
        self.values.get(index)
    }

    pub fn get_int(&self, index: usize) -> Result<i64> {
        match self.get(index) {
            Some(OwnedValue::Int(i)) => Ok(*i),
            Some(other) => bail!("expected INT, got {:?}", other),
            None => bail!("column {} out of bounds", index),
        }
    }

    pub fn get_float(&self, index: usize) -> Result<f64> {
        match self.get(index) {
            Some(OwnedValue::Float(f)) => Ok(*f),
            Some(other) => bail!("expected FLOAT, got {:?}", other),
            None => bail!("column {} out of bounds", index),
        }
    }

    pub fn get_text(&self, index: usize) -> Result<&str> {
        match self.get(index) {
            Some(OwnedValue::Text(s)) => Ok(s),
            Some(other) => bail!("expected TEXT, got {:?}", other),
            None => bail!("column {} out of bounds", index),
        }
    }

    pub fn get_blob(&self, index: usize) -> Result<&[u8]> {
        match self.get(index) {
            Some(OwnedValue::Blob(b)) => Ok(b),
            Some(other) => bail!("expected BLOB, got {:?}", other),
            None => bail!("column {} out of bounds", index),
        }
    }

    pub fn is_null(&self, index: usize) -> bool {
        matches!(self.get(index), Some(OwnedValue::Null))
    }

    pub fn column_count(&self) -> usize {
        self.values.len()
    }

    /// Byte length of this row once encoded with `schema`. For a row decoded
    /// from a partition this equals the number of bytes the decoder consumed.
    pub fn serialized_length(&self, schema: &Schema) -> usize {
        let var_bytes: usize = schema
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, col)| col.data_type.is_variable())
            .map(|(idx, col)| {
                self.values
                    .get(idx)
                    .map_or(0, |v| v.payload_len(col.data_type))
            })
            .sum();

        schema.min_record_size() + var_bytes
    }
}

impl std::fmt::Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("(")?;
        for (idx, value) in self.values.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            f.write_str(&value.display_string())?;
        }
        f.write_str(")")
    }
}

impl From<Vec<OwnedValue>> for Row {
    fn from(values: Vec<OwnedValue>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::ColumnDef;
    use crate::types::DataType;

    #[test]
    fn test_empty_row_is_sentinel() {
        assert!(Row::empty().is_empty());
        assert_eq!(Row::empty(), Row::default());
        assert!(!Row::new(vec![OwnedValue::Null]).is_empty());
    }

    #[test]
    fn test_typed_getters() {
        let row = Row::new(vec![1i64.into(), "a".into(), OwnedValue::Null]);
        assert_eq!(row.get_int(0).unwrap(), 1);
        assert_eq!(row.get_text(1).unwrap(), "a");
        assert!(row.is_null(2));
        assert!(row.get_int(1).is_err());
        assert!(row.get_int(7).unwrap_err().to_string().contains("out of bounds"));
    }

    #[test]
    fn test_serialized_length_counts_variable_payload() {
        let schema = Schema::new(vec![
            ColumnDef::new("id", DataType::Int4),
            ColumnDef::new("name", DataType::Text),
        ]);
        // header: 2 + 1 bitmap + 2 offset = 5, fixed: 4, var: 5
        let row = Row::new(vec![7i64.into(), "hello".into()]);
        assert_eq!(row.serialized_length(&schema), 14);

        let null_name = Row::new(vec![7i64.into(), OwnedValue::Null]);
        assert_eq!(null_name.serialized_length(&schema), 9);
    }

    #[test]
    fn test_display() {
        let row = Row::new(vec![1i64.into(), "x".into(), OwnedValue::Null]);
        assert_eq!(row.to_string(), "(1,x,NULL)");
    }
}
