//! # resultset - Merged Result Cursor for Two-Path Query Execution
//!
//! A query executor with a compiled fast path and an interpreted fallback
//! produces its output in two physically different shapes:
//!
//! - **Partitions**: fixed-capacity binary blocks of schema-typed records,
//!   produced in bulk by the fast path.
//! - **Tagged rows**: individual objects from the fallback runtime, each
//!   carrying the logical output index it must occupy.
//!
//! This crate presents both as one ordered stream to a single consumer,
//! enforces a row budget across them, and returns partition memory to its
//! pool the moment a partition has been read.
//!
//! ## Quick Start
//!
//! ```ignore
//! use resultset::{DynamicRuntime, DynamicValue, MemoryBudget, PartitionPool, ResultSet};
//!
//! let pool = PartitionPool::new(Arc::new(MemoryBudget::auto_detect()), 4);
//! let mut writer = pool.allocate(schema.clone(), 64 * 1024)?;
//! writer.append(&row)?;
//!
//! let mut rs = ResultSet::builder()
//!     .schema(schema.clone())
//!     .runtime(DynamicRuntime::new(schema))
//!     .partition(writer.finish())
//!     .tagged_rows(vec![(1, DynamicValue::Int(7)).into()])
//!     .max_rows(1000)
//!     .build()?;
//!
//! while rs.has_next_row() {
//!     let row = rs.next_row()?;
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        ResultSet (cursor)           │
//! ├──────────────────┬──────────────────┤
//! │  Partition queue │ Tagged row queue │
//! ├──────────────────┼──────────────────┤
//! │    Row codec     │  Interop lock +  │
//! │ (records module) │ FallbackRuntime  │
//! ├──────────────────┴──────────────────┤
//! │  PartitionPool + MemoryBudget       │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - `config`: centralized constants
//! - `types`: column data types and owned values
//! - `records`: schema and the binary record codec
//! - `memory`: memory budget and the partition pool
//! - `interop`: global interop lock and fallback runtimes
//! - `resultset`: rows, the merging cursor, and its builder

pub mod config;
pub mod interop;
pub mod memory;
pub mod records;
pub mod resultset;
pub mod types;

pub use interop::{DynamicRuntime, DynamicValue, FallbackRuntime, InteropGuard, TaggedRow};
pub use memory::{MemoryBudget, PartitionHandle, PartitionId, PartitionPool, PartitionWriter};
pub use records::{ColumnDef, Schema};
pub use resultset::{ResultSet, ResultSetBuilder, Row};
pub use types::{DataType, OwnedValue};
