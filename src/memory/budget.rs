//! # Memory Budget
//!
//! Byte accounting for partition buffers. Each [`Pool`] owns a reservation
//! no other pool can touch; whatever the total limit leaves after both
//! reservations is a shared overflow that either pool may borrow.
//!
//! Overflow is not tracked separately. It is derived from the per-pool
//! counters on every check:
//!
//! ```text
//! overflow(pool)   = max(0, used(pool) - reserved(pool))
//! shared_available = (total_limit - TOTAL_RESERVED) - sum(overflow(pool))
//! ```
//!
//! Because every byte above a reservation counts against the shared
//! overflow, keeping `sum(overflow) <= total_limit - TOTAL_RESERVED` is
//! enough to keep `total_used <= total_limit`.
//!
//! Both counters sit behind one `parking_lot::Mutex`, so the check and the
//! charge happen together even when the two pools allocate concurrently.
//! Allocations are per partition, not per row, so the lock is cold.

use std::sync::OnceLock;

use eyre::{bail, Result};
use parking_lot::Mutex;
use sysinfo::System;

use crate::config::{
    DEFAULT_BUDGET_PERCENT, EXCEPTION_RESERVED, MIN_BUDGET_FLOOR, PARTITION_RESERVED,
    TOTAL_RESERVED,
};

static SYSTEM_TOTAL_MEMORY: OnceLock<usize> = OnceLock::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    /// Fast-path result partitions.
    Partition,
    /// Partitions holding rows that failed the fast path.
    Exception,
}

impl Pool {
    pub const ALL: [Pool; 2] = [Pool::Partition, Pool::Exception];

    fn slot(self) -> usize {
        self as usize
    }

    pub fn reserved_size(self) -> usize {
        match self {
            Pool::Partition => PARTITION_RESERVED,
            Pool::Exception => EXCEPTION_RESERVED,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Pool::Partition => "partition",
            Pool::Exception => "exception",
        }
    }
}

/// Bytes charged per pool, indexed by [`Pool::slot`].
#[derive(Debug, Default, Clone, Copy)]
struct Usage([usize; 2]);

impl Usage {
    fn get(&self, pool: Pool) -> usize {
        self.0[pool.slot()]
    }

    fn total(&self) -> usize {
        self.0.iter().sum()
    }

    fn overflow(&self) -> usize {
        Pool::ALL
            .iter()
            .map(|&pool| self.get(pool).saturating_sub(pool.reserved_size()))
            .sum()
    }
}

/// Point-in-time snapshot of a [`MemoryBudget`].
#[derive(Debug, Clone)]
pub struct BudgetStats {
    pub total_limit: usize,
    pub total_used: usize,
    pub partition_used: usize,
    pub partition_reserved: usize,
    pub exception_used: usize,
    pub exception_reserved: usize,
    pub shared_available: usize,
}

impl BudgetStats {
    pub fn available(&self) -> usize {
        self.total_limit.saturating_sub(self.total_used)
    }

    pub fn utilization_percent(&self) -> f64 {
        if self.total_limit == 0 {
            return 0.0;
        }
        (self.total_used as f64 / self.total_limit as f64) * 100.0
    }
}

impl std::fmt::Display for BudgetStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "partition:{}/{},exception:{}/{},shared_available:{}",
            self.partition_used,
            self.partition_reserved,
            self.exception_used,
            self.exception_reserved,
            self.shared_available
        )
    }
}

/// Returned (inside an `eyre::Report`) when a charge does not fit.
#[derive(Debug)]
pub struct MemoryError {
    pub pool: Pool,
    pub requested: usize,
    pub available: usize,
}

impl std::fmt::Display for MemoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "memory budget exceeded: {} pool requested {} bytes but only {} available",
            self.pool.name(),
            self.requested,
            self.available
        )
    }
}

impl std::error::Error for MemoryError {}

#[derive(Debug)]
pub struct MemoryBudget {
    total_limit: usize,
    usage: Mutex<Usage>,
}

impl MemoryBudget {
    /// Budget of `DEFAULT_BUDGET_PERCENT` of system RAM, never below the floor.
    pub fn auto_detect() -> Self {
        let total_memory = *SYSTEM_TOTAL_MEMORY.get_or_init(|| {
            let mut sys = System::new();
            sys.refresh_memory();
            sys.total_memory() as usize
        });

        Self::with_limit(total_memory / 100 * DEFAULT_BUDGET_PERCENT)
    }

    pub fn with_limit(limit: usize) -> Self {
        Self {
            total_limit: limit.max(MIN_BUDGET_FLOOR),
            usage: Mutex::new(Usage::default()),
        }
    }

    pub fn total_limit(&self) -> usize {
        self.total_limit
    }

    fn shared_size(&self) -> usize {
        self.total_limit - TOTAL_RESERVED
    }

    fn shared_left(&self, usage: &Usage) -> usize {
        self.shared_size().saturating_sub(usage.overflow())
    }

    fn room_in(&self, usage: &Usage, pool: Pool) -> usize {
        pool.reserved_size().saturating_sub(usage.get(pool)) + self.shared_left(usage)
    }

    pub fn total_used(&self) -> usize {
        self.usage.lock().total()
    }

    pub fn pool_used(&self, pool: Pool) -> usize {
        self.usage.lock().get(pool)
    }

    /// Bytes `pool` could still be charged: what is left of its own
    /// reservation plus the unclaimed shared overflow.
    pub fn available(&self, pool: Pool) -> usize {
        let usage = self.usage.lock();
        self.room_in(&usage, pool)
    }

    /// Shared overflow not yet claimed by either pool.
    pub fn shared_available(&self) -> usize {
        let usage = self.usage.lock();
        self.shared_left(&usage)
    }

    pub fn can_allocate(&self, pool: Pool, bytes: usize) -> bool {
        self.available(pool) >= bytes
    }

    /// Charges `bytes` to `pool`, first against its reservation, then
    /// against the shared overflow.
    pub fn allocate(&self, pool: Pool, bytes: usize) -> Result<()> {
        if bytes == 0 {
            return Ok(());
        }

        let mut usage = self.usage.lock();
        let room = self.room_in(&usage, pool);
        if bytes > room {
            bail!(MemoryError {
                pool,
                requested: bytes,
                available: room,
            });
        }
        usage.0[pool.slot()] += bytes;
        Ok(())
    }

    /// Returns `bytes` to `pool`. Releasing more than was charged clamps the
    /// pool at zero.
    pub fn release(&self, pool: Pool, bytes: usize) {
        let mut usage = self.usage.lock();
        let used = &mut usage.0[pool.slot()];
        *used = used.saturating_sub(bytes);
    }

    pub fn stats(&self) -> BudgetStats {
        let usage = *self.usage.lock();

        BudgetStats {
            total_limit: self.total_limit,
            total_used: usage.total(),
            partition_used: usage.get(Pool::Partition),
            partition_reserved: PARTITION_RESERVED,
            exception_used: usage.get(Pool::Exception),
            exception_reserved: EXCEPTION_RESERVED,
            shared_available: self.shared_left(&usage),
        }
    }
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self::auto_detect()
    }
}
