//! # Heap-Owned Value Representation
//!
//! `OwnedValue` is the materialized value of one column in a [`crate::Row`].
//! Rows leave the cursor as owned data: partitions are retired as soon as
//! their last row is read, so nothing handed to the consumer may borrow
//! from a partition buffer.
//!
//! Integer columns of every width surface as `Int(i64)` and float columns as
//! `Float(f64)`; the schema decides the stored width.

use super::DataType;

#[derive(Debug, Clone, PartialEq)]
pub enum OwnedValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Date(i32),
    Time(i64),
    Timestamp(i64),
    Uuid([u8; 16]),
}

impl OwnedValue {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, OwnedValue::Null)
    }

    /// Returns the widest DataType able to hold this value.
    pub fn data_type(&self) -> DataType {
        match self {
            OwnedValue::Null => DataType::Int8,
            OwnedValue::Bool(_) => DataType::Bool,
            OwnedValue::Int(_) => DataType::Int8,
            OwnedValue::Float(_) => DataType::Float8,
            OwnedValue::Text(_) => DataType::Text,
            OwnedValue::Blob(_) => DataType::Blob,
            OwnedValue::Date(_) => DataType::Date,
            OwnedValue::Time(_) => DataType::Time,
            OwnedValue::Timestamp(_) => DataType::Timestamp,
            OwnedValue::Uuid(_) => DataType::Uuid,
        }
    }

    /// Returns the number of payload bytes this value occupies in a record
    /// column of type `data_type`. NULLs occupy the fixed slot but no
    /// variable bytes.
    pub fn payload_len(&self, data_type: DataType) -> usize {
        match (self, data_type.fixed_size()) {
            (_, Some(size)) => size,
            (OwnedValue::Null, None) => 0,
            (OwnedValue::Text(s), None) => s.len(),
            (OwnedValue::Blob(b), None) => b.len(),
            (_, None) => 0,
        }
    }

    /// Formats the value as a display string.
    pub fn display_string(&self) -> String {
        match self {
            OwnedValue::Null => "NULL".to_string(),
            OwnedValue::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            OwnedValue::Int(i) => i.to_string(),
            OwnedValue::Float(f) => f.to_string(),
            OwnedValue::Text(s) => s.clone(),
            OwnedValue::Blob(b) => {
                let hex: String = b.iter().map(|b| format!("{:02x}", b)).collect();
                format!("\\x{}", hex)
            }
            OwnedValue::Date(d) => format!("date:{}", d),
            OwnedValue::Time(t) => format!("time:{}", t),
            OwnedValue::Timestamp(ts) => format!("ts:{}", ts),
            OwnedValue::Uuid(u) => {
                let h: String = u.iter().map(|b| format!("{:02x}", b)).collect();
                format!(
                    "{}-{}-{}-{}-{}",
                    &h[0..8],
                    &h[8..12],
                    &h[12..16],
                    &h[16..20],
                    &h[20..32]
                )
            }
        }
    }
}

impl From<i64> for OwnedValue {
    fn from(v: i64) -> Self {
        OwnedValue::Int(v)
    }
}

impl From<f64> for OwnedValue {
    fn from(v: f64) -> Self {
        OwnedValue::Float(v)
    }
}

impl From<bool> for OwnedValue {
    fn from(v: bool) -> Self {
        OwnedValue::Bool(v)
    }
}

impl From<&str> for OwnedValue {
    fn from(v: &str) -> Self {
        OwnedValue::Text(v.to_string())
    }
}

impl From<String> for OwnedValue {
    fn from(v: String) -> Self {
        OwnedValue::Text(v)
    }
}

impl From<Vec<u8>> for OwnedValue {
    fn from(v: Vec<u8>) -> Self {
        OwnedValue::Blob(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owned_value_data_type() {
        assert_eq!(OwnedValue::Int(42).data_type(), DataType::Int8);
        assert_eq!(OwnedValue::Text("x".into()).data_type(), DataType::Text);
        assert_eq!(OwnedValue::Uuid([0; 16]).data_type(), DataType::Uuid);
    }

    #[test]
    fn test_payload_len_fixed_ignores_value() {
        assert_eq!(OwnedValue::Int(1).payload_len(DataType::Int2), 2);
        assert_eq!(OwnedValue::Null.payload_len(DataType::Int8), 8);
    }

    #[test]
    fn test_payload_len_variable() {
        assert_eq!(OwnedValue::from("hello").payload_len(DataType::Text), 5);
        assert_eq!(OwnedValue::Null.payload_len(DataType::Blob), 0);
    }

    #[test]
    fn test_display_uuid() {
        let mut u = [0u8; 16];
        u[15] = 0xab;
        assert_eq!(
            OwnedValue::Uuid(u).display_string(),
            "00000000-0000-0000-0000-0000000000ab"
        );
    }
}
