//! Fuzz testing for the record decoder.
//!
//! Feeds arbitrary byte sequences to `decode_row` under arbitrary schemas
//! and walks them the way the result cursor walks a partition. Malformed
//! input must surface as an error, never a panic or an out-of-bounds read.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use resultset::records::{decode_row, encode_row, ColumnDef, Schema};
use resultset::DataType;

#[derive(Debug, Arbitrary)]
struct DecoderInput {
    column_types: Vec<FuzzDataType>,
    data: Vec<u8>,
}

#[derive(Debug, Arbitrary, Clone, Copy)]
enum FuzzDataType {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Date,
    Time,
    Timestamp,
    Uuid,
    Text,
    Blob,
}

impl From<FuzzDataType> for DataType {
    fn from(fdt: FuzzDataType) -> Self {
        match fdt {
            FuzzDataType::Bool => DataType::Bool,
            FuzzDataType::Int2 => DataType::Int2,
            FuzzDataType::Int4 => DataType::Int4,
            FuzzDataType::Int8 => DataType::Int8,
            FuzzDataType::Float4 => DataType::Float4,
            FuzzDataType::Float8 => DataType::Float8,
            FuzzDataType::Date => DataType::Date,
            FuzzDataType::Time => DataType::Time,
            FuzzDataType::Timestamp => DataType::Timestamp,
            FuzzDataType::Uuid => DataType::Uuid,
            FuzzDataType::Text => DataType::Text,
            FuzzDataType::Blob => DataType::Blob,
        }
    }
}

fuzz_target!(|input: DecoderInput| {
    if input.column_types.is_empty() || input.column_types.len() > 64 {
        return;
    }

    let columns = input
        .column_types
        .iter()
        .enumerate()
        .map(|(i, t)| ColumnDef::new(format!("c{}", i), (*t).into()))
        .collect();
    let schema = Schema::new(columns);

    let mut offset = 0;
    while offset < input.data.len() {
        match decode_row(&schema, &input.data[offset..]) {
            Ok((row, consumed)) => {
                assert!(consumed > 0);
                assert!(offset + consumed <= input.data.len());
                assert_eq!(row.column_count(), schema.column_count());

                // Text is validated on decode, so a decoded row re-encodes.
                if let Ok(encoded) = encode_row(&schema, &row) {
                    assert_eq!(encoded.len(), row.serialized_length(&schema));
                }
                offset += consumed;
            }
            Err(_) => break,
        }
    }
});
