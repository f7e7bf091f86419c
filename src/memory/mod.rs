//! # Partition Memory
//!
//! This module owns every byte a result set reads from. Partitions are
//! fixed-capacity buffers of packed records; their full capacity is charged
//! against a [`MemoryBudget`] when they are allocated and released when the
//! partition is invalidated.
//!
//! ## Architecture
//!
//! The budget uses a **reserved minimums + shared pool** model:
//!
//! ```text
//! +----------------------------------------------------------+
//! |                  Total Memory Budget                      |
//! |  (default: 25% of system RAM, minimum floor: 8 MB)       |
//! +----------------------------------------------------------+
//! |                                                          |
//! |  Reserved Pools (guaranteed minimums):                   |
//! |  +--------------------+ +--------------------+           |
//! |  | Partition          | | Exception          |           |
//! |  | 4 MB               | | 1 MB               |           |
//! |  +--------------------+ +--------------------+           |
//! |                                                          |
//! |  Shared Pool (remainder):                                |
//! |  +----------------------------------------------------+  |
//! |  | Available for any pool when reserved is exceeded   |  |
//! |  +----------------------------------------------------+  |
//! |                                                          |
//! +----------------------------------------------------------+
//! ```
//!
//! Exception partitions have their own reservation so a fast path that
//! fills the budget cannot starve the rows that need the fallback path.
//!
//! ## Enforcement Model
//!
//! Hard limits: an allocation that would exceed the budget is refused with
//! a [`MemoryError`] wrapped in an `eyre::Report`.
//!
//! ## Partition Lifecycle
//!
//! ```text
//! PartitionPool::allocate ──> PartitionWriter ──finish──> PartitionHandle
//!        │ charge budget           append rows               lock / read
//!        │                                                       │
//!        └──────────── release budget, recycle buffer <── invalidate
//! ```

mod budget;
mod partition;

pub use budget::{BudgetStats, MemoryBudget, MemoryError, Pool};
pub use partition::{
    PartitionFull, PartitionHandle, PartitionId, PartitionPool, PartitionReadGuard,
    PartitionWriter,
};
