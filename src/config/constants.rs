//! # Result Set Configuration Constants
//!
//! This module centralizes the numeric configuration of the result layer,
//! grouping interdependent values together. Constants that depend on each
//! other are co-located and checked at compile time.
//!
//! ## Dependency Graph
//!
//! ```text
//! MAX_RECORD_SIZE (u16::MAX)
//!       │
//!       └─> DEFAULT_PARTITION_CAPACITY (must be >=)
//!             A partition must be able to hold at least one record of
//!             maximum size, otherwise a legal row can never be appended.
//!
//! MIN_BUDGET_FLOOR (8 MB)
//!       │
//!       └─> TOTAL_RESERVED (must be <=)
//!             PARTITION_RESERVED + EXCEPTION_RESERVED
//!
//! PARTITION_RESERVED (4 MB)
//!       │
//!       └─> DEFAULT_PARTITION_CAPACITY * DEFAULT_PREALLOCATED_PARTITIONS
//!             (must be <=, so pre-allocation never touches the shared pool)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use crate::config::{DEFAULT_PARTITION_CAPACITY, UNBOUNDED_ROWS};
//! ```

// ============================================================================
// RECORD LAYOUT CONSTANTS
// ============================================================================

/// Size of the record header length prefix in bytes.
pub const RECORD_HEADER_LEN_SIZE: usize = 2;

/// Size of one entry in the variable-column offset table.
pub const RECORD_OFFSET_ENTRY_SIZE: usize = 2;

/// Largest record the codec can address. Header and offset table entries
/// are u16, so a single record can never exceed this.
pub const MAX_RECORD_SIZE: usize = u16::MAX as usize;

// ============================================================================
// PARTITION CONFIGURATION
// ============================================================================

/// Default byte capacity of a fast-path partition (256KB).
pub const DEFAULT_PARTITION_CAPACITY: usize = 256 * 1024;

/// Number of partition buffers a pool pre-allocates on creation.
pub const DEFAULT_PREALLOCATED_PARTITIONS: usize = 4;

const _: () = assert!(
    DEFAULT_PARTITION_CAPACITY >= MAX_RECORD_SIZE,
    "DEFAULT_PARTITION_CAPACITY must hold at least one maximum-size record"
);

// ============================================================================
// ROW BUDGET
// ============================================================================

/// Row budget value meaning "no limit". Negative budgets passed to the
/// builder are clamped to this.
pub const UNBOUNDED_ROWS: usize = usize::MAX;

// ============================================================================
// MEMORY BUDGET CONFIGURATION
// ============================================================================

/// Default memory budget as percentage of system RAM.
pub const DEFAULT_BUDGET_PERCENT: usize = 25;

/// Minimum memory budget floor in bytes (8MB).
pub const MIN_BUDGET_FLOOR: usize = 8 * 1024 * 1024;

/// Memory reserved for fast-path partitions (4MB).
pub const PARTITION_RESERVED: usize = 4 * 1024 * 1024;

/// Memory reserved for exception partitions (1MB).
pub const EXCEPTION_RESERVED: usize = 1024 * 1024;

/// Total reserved memory across all pools.
pub const TOTAL_RESERVED: usize = PARTITION_RESERVED + EXCEPTION_RESERVED;

const _: () = assert!(
    TOTAL_RESERVED <= MIN_BUDGET_FLOOR,
    "reserved pools must fit inside the minimum budget"
);

const _: () = assert!(
    DEFAULT_PARTITION_CAPACITY * DEFAULT_PREALLOCATED_PARTITIONS <= PARTITION_RESERVED,
    "pre-allocated partitions must fit in the partition reservation"
);
