//! # RecordView - Zero-Copy Record Access
//!
//! This module provides `RecordView` for reading records with O(1) column access.
//! All getters return references into the underlying buffer for zero-copy operation.
//!
//! ## Usage
//!
//! ```ignore
//! // Records are packed back to back inside a partition buffer.
//! let record = RecordView::from_prefix(&buffer[offset..], &schema)?;
//! let name: &str = record.get_text(1)?;
//! let next = offset + record.record_len();
//! ```
//!
//! ## Validation
//!
//! `from_prefix` checks the header length against the schema and checks
//! that the variable-column offsets are monotonic and inside the buffer, so
//! getters on a constructed view never index out of bounds.

use eyre::{ensure, Result};

use crate::config::RECORD_HEADER_LEN_SIZE;
use crate::records::schema::Schema;

#[derive(Debug)]
pub struct RecordView<'a> {
    data: &'a [u8],
    schema: &'a Schema,
}

impl<'a> RecordView<'a> {
    /// Creates a view over exactly one record.
    pub fn new(data: &'a [u8], schema: &'a Schema) -> Result<Self> {
        let view = Self::from_prefix(data, schema)?;
        ensure!(
            view.record_len() == data.len(),
            "record is {} bytes but buffer holds {}",
            view.record_len(),
            data.len()
        );
        Ok(view)
    }

    /// Creates a view over the record starting at `buf[0]`. Trailing bytes
    /// after the record are ignored.
    pub fn from_prefix(buf: &'a [u8], schema: &'a Schema) -> Result<Self> {
        ensure!(!buf.is_empty(), "record data cannot be empty");
        ensure!(
            buf.len() >= RECORD_HEADER_LEN_SIZE,
            "record too small for header length"
        );

        let header_len = u16::from_le_bytes([buf[0], buf[1]]) as usize;
        ensure!(
            header_len == schema.header_size(),
            "record header length {} does not match schema header size {}",
            header_len,
            schema.header_size()
        );
        ensure!(
            buf.len() >= schema.min_record_size(),
            "record needs at least {} bytes, only {} remaining",
            schema.min_record_size(),
            buf.len()
        );

        let table_start = RECORD_HEADER_LEN_SIZE + Schema::null_bitmap_size(schema.column_count());
        let mut prev_end = 0usize;
        for var_idx in 0..schema.var_column_count() {
            let pos = table_start + var_idx * 2;
            let end = u16::from_le_bytes([buf[pos], buf[pos + 1]]) as usize;
            ensure!(
                end >= prev_end,
                "variable column offsets are not monotonic ({} after {})",
                end,
                prev_end
            );
            prev_end = end;
        }

        let record_len = schema.min_record_size() + prev_end;
        ensure!(
            record_len <= buf.len(),
            "record of {} bytes overruns buffer of {} bytes",
            record_len,
            buf.len()
        );

        Ok(Self {
            data: &buf[..record_len],
            schema,
        })
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    /// Total serialized length of this record in bytes.
    pub fn record_len(&self) -> usize {
        self.data.len()
    }

    pub fn header_len(&self) -> u16 {
        u16::from_le_bytes([self.data[0], self.data[1]])
    }

    pub fn null_bitmap(&self) -> &'a [u8] {
        let bitmap_size = Schema::null_bitmap_size(self.schema.column_count());
        &self.data[2..2 + bitmap_size]
    }

    pub fn offset_table(&self) -> &'a [u8] {
        let bitmap_size = Schema::null_bitmap_size(self.schema.column_count());
        let offset_table_start = 2 + bitmap_size;
        let offset_table_bytes = self.schema.var_column_count() * 2;
        &self.data[offset_table_start..offset_table_start + offset_table_bytes]
    }

    pub fn data_offset(&self) -> usize {
        self.header_len() as usize
    }

    pub fn is_null(&self, col_idx: usize) -> bool {
        let bitmap = self.null_bitmap();
        (bitmap[col_idx / 8] & (1 << (col_idx % 8))) != 0
    }

    pub fn get_fixed_col_offset(&self, col_idx: usize) -> usize {
        self.data_offset() + self.schema.fixed_offset(col_idx)
    }

    pub fn get_var_bounds(&self, col_idx: usize) -> Result<(usize, usize)> {
        let var_idx = self
            .schema
            .var_column_index(col_idx)
            .ok_or_else(|| eyre::eyre!("column {} is not a variable column", col_idx))?;

        let offset_table = self.offset_table();
        let var_data_start = self.data_offset() + self.schema.total_fixed_size();

        let end_offset =
            u16::from_le_bytes([offset_table[var_idx * 2], offset_table[var_idx * 2 + 1]]) as usize;

        let start_offset = if var_idx == 0 {
            0
        } else {
            u16::from_le_bytes([
                offset_table[(var_idx - 1) * 2],
                offset_table[(var_idx - 1) * 2 + 1],
            ]) as usize
        };

        Ok((var_data_start + start_offset, var_data_start + end_offset))
    }

    fn fixed<const N: usize>(&self, col_idx: usize, what: &str) -> Result<[u8; N]> {
        let offset = self.get_fixed_col_offset(col_idx);
        self.data
            .get(offset..offset + N)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| eyre::eyre!("insufficient data for {} at col {}", what, col_idx))
    }

    pub fn get_bool(&self, col_idx: usize) -> Result<bool> {
        Ok(self.fixed::<1>(col_idx, "bool")?[0] != 0)
    }

    pub fn get_int2(&self, col_idx: usize) -> Result<i16> {
        Ok(i16::from_le_bytes(self.fixed(col_idx, "int2")?))
    }

    pub fn get_int4(&self, col_idx: usize) -> Result<i32> {
        Ok(i32::from_le_bytes(self.fixed(col_idx, "int4")?))
    }

    pub fn get_int8(&self, col_idx: usize) -> Result<i64> {
        Ok(i64::from_le_bytes(self.fixed(col_idx, "int8")?))
    }

    pub fn get_float4(&self, col_idx: usize) -> Result<f32> {
        Ok(f32::from_le_bytes(self.fixed(col_idx, "float4")?))
    }

    pub fn get_float8(&self, col_idx: usize) -> Result<f64> {
        Ok(f64::from_le_bytes(self.fixed(col_idx, "float8")?))
    }

    pub fn get_date(&self, col_idx: usize) -> Result<i32> {
        Ok(i32::from_le_bytes(self.fixed(col_idx, "date")?))
    }

    pub fn get_time(&self, col_idx: usize) -> Result<i64> {
        Ok(i64::from_le_bytes(self.fixed(col_idx, "time")?))
    }

    pub fn get_timestamp(&self, col_idx: usize) -> Result<i64> {
        Ok(i64::from_le_bytes(self.fixed(col_idx, "timestamp")?))
    }

    pub fn get_uuid(&self, col_idx: usize) -> Result<[u8; 16]> {
        self.fixed(col_idx, "uuid")
    }

    pub fn get_blob(&self, col_idx: usize) -> Result<&'a [u8]> {
        let (start, end) = self.get_var_bounds(col_idx)?;
        Ok(&self.data[start..end])
    }

    pub fn get_text(&self, col_idx: usize) -> Result<&'a str> {
        let bytes = self.get_blob(col_idx)?;
        std::str::from_utf8(bytes)
            .map_err(|e| eyre::eyre!("invalid UTF-8 in text column {}: {}", col_idx, e))
    }
}
