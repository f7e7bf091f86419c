//! # Schema Definition
//!
//! `Schema` describes the column layout shared by every partition of one
//! result cursor. It pre-computes offsets so the codec never re-derives them
//! per row.
//!
//! ## Schema Internals
//!
//! - `columns`: Vector of column definitions
//! - `var_column_indices`: Indices of variable-length columns (for offset table)
//! - `fixed_offsets`: Pre-computed byte offsets for each column in fixed data section
//! - `total_fixed_size`: Total size of all fixed-width columns
//!
//! ## Equality
//!
//! Two schemas are equal when their column lists are equal. The derived
//! offset tables are a pure function of the columns and are not compared.

use crate::config::{RECORD_HEADER_LEN_SIZE, RECORD_OFFSET_ENTRY_SIZE};
use crate::records::types::ColumnDef;

#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) columns: Vec<ColumnDef>,
    pub(crate) var_column_indices: Vec<usize>,
    pub(crate) fixed_offsets: Vec<usize>,
    pub(crate) total_fixed_size: usize,
}

impl Schema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        let mut var_column_indices = Vec::new();
        let mut fixed_offsets = Vec::new();
        let mut offset = 0;

        for (idx, col) in columns.iter().enumerate() {
            fixed_offsets.push(offset);
            if let Some(size) = col.data_type.fixed_size() {
                offset += size;
            } else {
                var_column_indices.push(idx);
            }
        }

        Self {
            columns,
            var_column_indices,
            fixed_offsets,
            total_fixed_size: offset,
        }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn var_column_count(&self) -> usize {
        self.var_column_indices.len()
    }

    pub fn column(&self, idx: usize) -> Option<&ColumnDef> {
        self.columns.get(idx)
    }

    pub fn var_column_index(&self, col_idx: usize) -> Option<usize> {
        self.var_column_indices
            .iter()
            .position(|&idx| idx == col_idx)
    }

    pub fn fixed_offset(&self, col_idx: usize) -> usize {
        self.fixed_offsets[col_idx]
    }

    pub fn total_fixed_size(&self) -> usize {
        self.total_fixed_size
    }

    pub fn null_bitmap_size(column_count: usize) -> usize {
        column_count.div_ceil(8)
    }

    /// Size of the record header for this schema: length prefix, null
    /// bitmap, and variable-column offset table.
    pub fn header_size(&self) -> usize {
        RECORD_HEADER_LEN_SIZE
            + Self::null_bitmap_size(self.column_count())
            + self.var_column_count() * RECORD_OFFSET_ENTRY_SIZE
    }

    /// Smallest possible record for this schema (all variable columns empty).
    pub fn min_record_size(&self) -> usize {
        self.header_size() + self.total_fixed_size
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

impl Eq for Schema {}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("(")?;
        for (idx, col) in self.columns.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", col.name, col.data_type)?;
        }
        f.write_str(")")
    }
}
