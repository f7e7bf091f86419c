//! # RecordBuilder - Record Construction
//!
//! This module provides `RecordBuilder` for constructing records with type-safe setters.
//! The builder pre-allocates space based on schema and supports reset for zero-alloc reuse.
//!
//! ## Usage
//!
//! ```ignore
//! let mut builder = RecordBuilder::new(&schema);
//! builder.set_int4(0, 42)?;
//! builder.set_text(1, "hello")?;
//! builder.build_into(&mut partition_bytes)?;
//!
//! // Reuse builder for next record
//! builder.reset();
//! builder.set_int4(0, 100)?;
//! ```

use eyre::{bail, Result};
use smallvec::SmallVec;

use crate::config::MAX_RECORD_SIZE;
use crate::records::schema::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnValue {
    Null,
    Fixed,
    Variable,
}

pub struct RecordBuilder<'a> {
    schema: &'a Schema,
    null_bitmap: SmallVec<[u8; 8]>,
    fixed_data: Vec<u8>,
    var_data: Vec<Vec<u8>>,
    column_values: SmallVec<[ColumnValue; 16]>,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        let bitmap_size = Schema::null_bitmap_size(schema.column_count());
        let mut null_bitmap: SmallVec<[u8; 8]> = SmallVec::from_elem(0u8, bitmap_size);
        for i in 0..schema.column_count() {
            null_bitmap[i / 8] |= 1 << (i % 8);
        }

        Self {
            schema,
            null_bitmap,
            fixed_data: vec![0u8; schema.total_fixed_size()],
            var_data: vec![Vec::new(); schema.var_column_count()],
            column_values: SmallVec::from_elem(ColumnValue::Null, schema.column_count()),
        }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn reset(&mut self) {
        for i in 0..self.schema.column_count() {
            self.null_bitmap[i / 8] |= 1 << (i % 8);
        }
        self.fixed_data.fill(0);
        for var in &mut self.var_data {
            var.clear();
        }
        for val in &mut self.column_values {
            *val = ColumnValue::Null;
        }
    }

    pub fn set_null(&mut self, col_idx: usize) {
        self.null_bitmap[col_idx / 8] |= 1 << (col_idx % 8);
        self.column_values[col_idx] = ColumnValue::Null;
        if let Some(var_idx) = self.schema.var_column_index(col_idx) {
            self.var_data[var_idx].clear();
        } else {
            let offset = self.schema.fixed_offset(col_idx);
            let size = self.schema.columns[col_idx]
                .data_type
                .fixed_size()
                .unwrap_or(0);
            self.fixed_data[offset..offset + size].fill(0);
        }
    }

    pub fn is_null(&self, col_idx: usize) -> bool {
        self.column_values[col_idx] == ColumnValue::Null
    }

    pub fn is_variable(&self, col_idx: usize) -> bool {
        self.column_values[col_idx] == ColumnValue::Variable
    }

    fn clear_null(&mut self, col_idx: usize) {
        self.null_bitmap[col_idx / 8] &= !(1 << (col_idx % 8));
    }

    fn set_fixed_bytes(&mut self, col_idx: usize, bytes: &[u8]) -> Result<()> {
        let col = self
            .schema
            .column(col_idx)
            .ok_or_else(|| eyre::eyre!("column {} not found", col_idx))?;
        let size = col
            .data_type
            .fixed_size()
            .ok_or_else(|| eyre::eyre!("column {} is not a fixed-width column", col_idx))?;
        eyre::ensure!(
            size == bytes.len(),
            "column {} ({}) expects {} bytes, got {}",
            col_idx,
            col.data_type,
            size,
            bytes.len()
        );

        self.clear_null(col_idx);
        let offset = self.schema.fixed_offset(col_idx);
        self.fixed_data[offset..offset + size].copy_from_slice(bytes);
        self.column_values[col_idx] = ColumnValue::Fixed;
        Ok(())
    }

    pub fn set_bool(&mut self, col_idx: usize, value: bool) -> Result<()> {
        self.set_fixed_bytes(col_idx, &[if value { 1 } else { 0 }])
    }

    pub fn set_int2(&mut self, col_idx: usize, value: i16) -> Result<()> {
        self.set_fixed_bytes(col_idx, &value.to_le_bytes())
    }

    pub fn set_int4(&mut self, col_idx: usize, value: i32) -> Result<()> {
        self.set_fixed_bytes(col_idx, &value.to_le_bytes())
    }

    pub fn set_int8(&mut self, col_idx: usize, value: i64) -> Result<()> {
        self.set_fixed_bytes(col_idx, &value.to_le_bytes())
    }

    pub fn set_float4(&mut self, col_idx: usize, value: f32) -> Result<()> {
        self.set_fixed_bytes(col_idx, &value.to_le_bytes())
    }

    pub fn set_float8(&mut self, col_idx: usize, value: f64) -> Result<()> {
        self.set_fixed_bytes(col_idx, &value.to_le_bytes())
    }

    pub fn set_date(&mut self, col_idx: usize, days: i32) -> Result<()> {
        self.set_fixed_bytes(col_idx, &days.to_le_bytes())
    }

    pub fn set_time(&mut self, col_idx: usize, micros: i64) -> Result<()> {
        self.set_fixed_bytes(col_idx, &micros.to_le_bytes())
    }

    pub fn set_timestamp(&mut self, col_idx: usize, micros: i64) -> Result<()> {
        self.set_fixed_bytes(col_idx, &micros.to_le_bytes())
    }

    pub fn set_uuid(&mut self, col_idx: usize, uuid: &[u8; 16]) -> Result<()> {
        self.set_fixed_bytes(col_idx, uuid)
    }

    pub fn set_text(&mut self, col_idx: usize, text: &str) -> Result<()> {
        self.set_blob(col_idx, text.as_bytes())
    }

    pub fn set_blob(&mut self, col_idx: usize, data: &[u8]) -> Result<()> {
        let var_idx = self
            .schema
            .var_column_index(col_idx)
            .ok_or_else(|| eyre::eyre!("column {} is not a variable column", col_idx))?;
        self.clear_null(col_idx);
        self.var_data[var_idx].clear();
        self.var_data[var_idx].extend_from_slice(data);
        self.column_values[col_idx] = ColumnValue::Variable;
        Ok(())
    }

    /// Number of bytes `build_into` will append for the current values.
    pub fn encoded_len(&self) -> usize {
        self.schema.header_size()
            + self.fixed_data.len()
            + self.var_data.iter().map(|v| v.len()).sum::<usize>()
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        let mut result = Vec::with_capacity(self.encoded_len());
        self.build_into(&mut result)?;
        Ok(result)
    }

    /// Appends the encoded record to `out` without clearing it, so records
    /// can be packed back to back.
    pub fn build_into(&self, out: &mut Vec<u8>) -> Result<()> {
        let total = self.encoded_len();
        if total > MAX_RECORD_SIZE {
            bail!(
                "record of {} bytes exceeds maximum record size {}",
                total,
                MAX_RECORD_SIZE
            );
        }

        let header_len = self.schema.header_size();
        out.reserve(total);
        out.extend((header_len as u16).to_le_bytes());
        out.extend(&self.null_bitmap);

        let mut var_offset: usize = 0;
        for var_data in &self.var_data {
            var_offset += var_data.len();
            out.extend((var_offset as u16).to_le_bytes());
        }

        out.extend(&self.fixed_data);

        for var_data in &self.var_data {
            out.extend(var_data);
        }

        Ok(())
    }
}
