//! # Column Data Types
//!
//! This module provides the canonical `DataType` enum used by schemas, the
//! row codec, and fallback conversion.
//!
//! ## Type Categories
//!
//! | Category | Types | Fixed Size |
//! |----------|-------|------------|
//! | **Boolean** | Bool | 1 byte |
//! | **Integer** | Int2, Int4, Int8 | 2, 4, 8 bytes |
//! | **Float** | Float4, Float8 | 4, 8 bytes |
//! | **Date/Time** | Date, Time, Timestamp | 4, 8, 8 bytes |
//! | **Identity** | Uuid | 16 bytes |
//! | **Text** | Text | Variable |
//! | **Binary** | Blob | Variable |
//!
//! ## Discriminant Values
//!
//! - 0-10: Fixed-width primitives
//! - 20-21: Variable-length text/binary
//!
//! The `#[repr(u8)]` keeps the discriminant a single byte so a schema can be
//! fingerprinted or persisted compactly.

/// Storage-level type of a column.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool = 0,
    Int2 = 1,
    Int4 = 2,
    Int8 = 3,
    Float4 = 4,
    Float8 = 5,
    Date = 6,
    Time = 7,
    Timestamp = 8,
    Uuid = 10,

    Text = 20,
    Blob = 21,
}

impl DataType {
    /// Returns the fixed byte size for this type, or None for variable-length types.
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            DataType::Bool => Some(1),
            DataType::Int2 => Some(2),
            DataType::Int4 => Some(4),
            DataType::Int8 => Some(8),
            DataType::Float4 => Some(4),
            DataType::Float8 => Some(8),
            DataType::Date => Some(4),
            DataType::Time => Some(8),
            DataType::Timestamp => Some(8),
            DataType::Uuid => Some(16),
            DataType::Text | DataType::Blob => None,
        }
    }

    pub fn is_variable(&self) -> bool {
        self.fixed_size().is_none()
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, DataType::Int2 | DataType::Int4 | DataType::Int8)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::Float4 | DataType::Float8)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataType::Bool => "bool",
            DataType::Int2 => "int2",
            DataType::Int4 => "int4",
            DataType::Int8 => "int8",
            DataType::Float4 => "float4",
            DataType::Float8 => "float8",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::Timestamp => "timestamp",
            DataType::Uuid => "uuid",
            DataType::Text => "text",
            DataType::Blob => "blob",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for DataType {
    type Error = eyre::Report;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DataType::Bool),
            1 => Ok(DataType::Int2),
            2 => Ok(DataType::Int4),
            3 => Ok(DataType::Int8),
            4 => Ok(DataType::Float4),
            5 => Ok(DataType::Float8),
            6 => Ok(DataType::Date),
            7 => Ok(DataType::Time),
            8 => Ok(DataType::Timestamp),
            10 => Ok(DataType::Uuid),
            20 => Ok(DataType::Text),
            21 => Ok(DataType::Blob),
            _ => eyre::bail!("invalid DataType discriminant: {}", value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_sizes() {
        assert_eq!(DataType::Int2.fixed_size(), Some(2));
        assert_eq!(DataType::Uuid.fixed_size(), Some(16));
        assert_eq!(DataType::Text.fixed_size(), None);
        assert!(DataType::Blob.is_variable());
    }

    #[test]
    fn test_discriminant_roundtrip() {
        for dt in [
            DataType::Bool,
            DataType::Int8,
            DataType::Float4,
            DataType::Timestamp,
            DataType::Uuid,
            DataType::Text,
        ] {
            assert_eq!(DataType::try_from(dt as u8).unwrap(), dt);
        }
    }

    #[test]
    fn test_invalid_discriminant() {
        let err = DataType::try_from(9).unwrap_err();
        assert!(err.to_string().contains("invalid DataType"));
    }
}
