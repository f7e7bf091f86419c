//! # Partition Pool
//!
//! Arena of fixed-capacity row partitions addressed by generation-checked
//! index handles.
//!
//! ## Purpose
//!
//! Fast-path executors write serialized rows into partitions; the result
//! cursor reads them back and retires each one the moment its last row has
//! been consumed. The pool owns the memory, charges every partition's full
//! capacity against the [`MemoryBudget`], and recycles buffers of retired
//! partitions so steady-state execution does not hit the allocator.
//!
//! ## Usage
//!
//! ```ignore
//! let pool = PartitionPool::new(Arc::new(MemoryBudget::with_limit(64 << 20)), 4);
//!
//! let mut writer = pool.allocate(schema.clone(), DEFAULT_PARTITION_CAPACITY)?;
//! writer.append(&row)?;
//! let partition = writer.finish();
//!
//! {
//!     let buf = partition.lock(); // scoped read access
//!     let (row, consumed) = decode_row(partition.schema(), &buf)?;
//! }
//!
//! partition.invalidate(); // back to the pool, budget released
//! ```
//!
//! ## Handles
//!
//! A `PartitionHandle` is not `Clone`. `invalidate` consumes it, so a
//! partition can be retired only once and never read afterwards. Dropping a
//! handle without invalidating it still retires the partition, with a
//! warning, so abandoned handles cannot pin pool memory.
//!
//! Slots are reused after retirement. The slot generation is bumped on every
//! retirement, so a stale `PartitionId` never resolves to a newer partition.
//!
//! ## Locking
//!
//! The arena mutex is held only for slot bookkeeping. Each partition buffer
//! has its own `RwLock`; readers (the cursor, `PartitionPool::with_buffer`)
//! hold it only for the span of one decode or inspection.

use crate::config::{DEFAULT_PARTITION_CAPACITY, DEFAULT_PREALLOCATED_PARTITIONS};
use crate::memory::budget::{MemoryBudget, Pool};
use crate::records::{encode_row_into, RecordBuilder, RecordView, Schema};
use crate::resultset::Row;
use eyre::{bail, Result};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Stable identifier of a partition: arena slot plus slot generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartitionId {
    slot: u32,
    generation: u32,
}

impl PartitionId {
    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl std::fmt::Display for PartitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "p{}g{}", self.slot, self.generation)
    }
}

/// Returned (via `eyre`) when an append would exceed a partition's capacity.
#[derive(Debug)]
pub struct PartitionFull {
    pub capacity: usize,
    pub used: usize,
    pub requested: usize,
}

impl std::fmt::Display for PartitionFull {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "partition full: {} of {} bytes used, record needs {}",
            self.used, self.capacity, self.requested
        )
    }
}

impl std::error::Error for PartitionFull {}

struct PartitionData {
    id: PartitionId,
    schema: Arc<Schema>,
    capacity: usize,
    row_count: usize,
    budget_pool: Pool,
    buffer: RwLock<Vec<u8>>,
}

struct Slot {
    generation: u32,
    live: Option<Arc<PartitionData>>,
}

struct Arena {
    slots: Vec<Slot>,
    free_slots: Vec<u32>,
    free_buffers: Vec<Vec<u8>>,
}

struct PoolInner {
    budget: Arc<MemoryBudget>,
    arena: Mutex<Arena>,
    max_free_buffers: usize,
    invalidations: AtomicUsize,
}

/// Owner of all partition memory. Cloning shares the same arena.
pub struct PartitionPool {
    inner: Arc<PoolInner>,
}

impl Clone for PartitionPool {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for PartitionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionPool")
            .field("live_partitions", &self.live_partitions())
            .field("available_buffers", &self.available_buffers())
            .field("invalidations", &self.invalidations())
            .finish()
    }
}

impl PartitionPool {
    /// Creates a pool charging `budget` and pre-allocating `preallocated`
    /// buffers of `DEFAULT_PARTITION_CAPACITY` bytes.
    pub fn new(budget: Arc<MemoryBudget>, preallocated: usize) -> Self {
        let free_buffers = (0..preallocated)
            .map(|_| Vec::with_capacity(DEFAULT_PARTITION_CAPACITY))
            .collect();

        Self {
            inner: Arc::new(PoolInner {
                budget,
                arena: Mutex::new(Arena {
                    slots: Vec::new(),
                    free_slots: Vec::new(),
                    free_buffers,
                }),
                max_free_buffers: preallocated.max(1),
                invalidations: AtomicUsize::new(0),
            }),
        }
    }

    /// Pool over an auto-detected budget with the default pre-allocation.
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(MemoryBudget::auto_detect()),
            DEFAULT_PREALLOCATED_PARTITIONS,
        )
    }

    pub fn budget(&self) -> &MemoryBudget {
        &self.inner.budget
    }

    /// Starts a fast-path partition of `capacity` bytes.
    pub fn allocate(&self, schema: Arc<Schema>, capacity: usize) -> Result<PartitionWriter> {
        self.allocate_in(Pool::Partition, schema, capacity)
    }

    /// Starts a partition for rows that failed the fast path. Charged to the
    /// exception reservation.
    pub fn allocate_exception(
        &self,
        schema: Arc<Schema>,
        capacity: usize,
    ) -> Result<PartitionWriter> {
        self.allocate_in(Pool::Exception, schema, capacity)
    }

    fn allocate_in(
        &self,
        budget_pool: Pool,
        schema: Arc<Schema>,
        capacity: usize,
    ) -> Result<PartitionWriter> {
        if capacity == 0 {
            bail!("partition capacity must be greater than zero");
        }
        self.inner.budget.allocate(budget_pool, capacity)?;

        let recycled = {
            let mut arena = self.inner.arena.lock();
            arena
                .free_buffers
                .iter()
                .position(|b| b.capacity() >= capacity)
                .map(|pos| arena.free_buffers.swap_remove(pos))
        };

        let buffer = match recycled {
            Some(buffer) => buffer,
            None => {
                debug!(capacity, pool = budget_pool.name(), "allocating new partition buffer");
                Vec::with_capacity(capacity)
            }
        };

        Ok(PartitionWriter {
            pool: self.clone(),
            schema,
            budget_pool,
            capacity,
            buffer,
            row_count: 0,
            finished: false,
        })
    }

    fn install(&self, writer_data: PartitionData) -> Arc<PartitionData> {
        let mut arena = self.inner.arena.lock();
        let mut data = writer_data;

        let slot = match arena.free_slots.pop() {
            Some(slot) => slot,
            None => {
                arena.slots.push(Slot {
                    generation: 0,
                    live: None,
                });
                (arena.slots.len() - 1) as u32
            }
        };

        let entry = &mut arena.slots[slot as usize];
        data.id = PartitionId {
            slot,
            generation: entry.generation,
        };
        let data = Arc::new(data);
        entry.live = Some(Arc::clone(&data));
        data
    }

    fn retire(&self, data: Arc<PartitionData>) {
        let id = data.id;
        {
            let mut arena = self.inner.arena.lock();
            let entry = &mut arena.slots[id.slot as usize];
            assert_eq!(
                entry.generation, id.generation,
                "partition {} retired twice",
                id
            );
            entry.live = None;
            entry.generation = entry.generation.wrapping_add(1);
            arena.free_slots.push(id.slot);
        }

        self.inner
            .budget
            .release(data.budget_pool, data.capacity);
        self.inner.invalidations.fetch_add(1, Ordering::Relaxed);

        // Only recycle when no inspector still holds the partition.
        if let Ok(data) = Arc::try_unwrap(data) {
            self.recycle(data.buffer.into_inner());
        }
    }

    fn recycle(&self, mut buffer: Vec<u8>) {
        buffer.clear();
        let mut arena = self.inner.arena.lock();
        if arena.free_buffers.len() < self.inner.max_free_buffers {
            arena.free_buffers.push(buffer);
        }
    }

    /// Runs `f` over the used bytes of a live partition. Returns `None` if
    /// `id` no longer names a live partition.
    pub fn with_buffer<T>(&self, id: PartitionId, f: impl FnOnce(&[u8]) -> T) -> Option<T> {
        let data = {
            let arena = self.inner.arena.lock();
            let entry = arena.slots.get(id.slot as usize)?;
            if entry.generation != id.generation {
                return None;
            }
            Arc::clone(entry.live.as_ref()?)
        };
        let buf = data.buffer.read();
        Some(f(&buf))
    }

    pub fn is_live(&self, id: PartitionId) -> bool {
        let arena = self.inner.arena.lock();
        arena
            .slots
            .get(id.slot as usize)
            .is_some_and(|e| e.generation == id.generation && e.live.is_some())
    }

    pub fn live_partitions(&self) -> usize {
        let arena = self.inner.arena.lock();
        arena.slots.iter().filter(|s| s.live.is_some()).count()
    }

    /// Total number of partitions retired since the pool was created.
    pub fn invalidations(&self) -> usize {
        self.inner.invalidations.load(Ordering::Relaxed)
    }

    pub fn available_buffers(&self) -> usize {
        self.inner.arena.lock().free_buffers.len()
    }
}

/// Append-only writer for a partition under construction.
///
/// The budget is charged when the writer is created. Dropping a writer
/// without calling `finish` releases the charge and recycles the buffer.
#[derive(Debug)]
pub struct PartitionWriter {
    pool: PartitionPool,
    schema: Arc<Schema>,
    budget_pool: Pool,
    capacity: usize,
    buffer: Vec<u8>,
    row_count: usize,
    finished: bool,
}

impl PartitionWriter {
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn bytes_used(&self) -> usize {
        self.buffer.len()
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.buffer.len()
    }

    /// Encodes `row` with the partition schema and appends it.
    pub fn append(&mut self, row: &Row) -> Result<()> {
        let start = self.buffer.len();
        let mut builder = RecordBuilder::new(&self.schema);
        encode_row_into(&mut builder, row, &mut self.buffer)?;

        let written = self.buffer.len() - start;
        if self.buffer.len() > self.capacity {
            self.buffer.truncate(start);
            bail!(PartitionFull {
                capacity: self.capacity,
                used: start,
                requested: written,
            });
        }

        self.row_count += 1;
        Ok(())
    }

    /// Appends one pre-encoded record. The bytes must form exactly one
    /// record of the partition schema.
    pub fn append_encoded(&mut self, record: &[u8]) -> Result<()> {
        RecordView::new(record, &self.schema)?;
        if record.len() > self.remaining() {
            bail!(PartitionFull {
                capacity: self.capacity,
                used: self.buffer.len(),
                requested: record.len(),
            });
        }

        self.buffer.extend_from_slice(record);
        self.row_count += 1;
        Ok(())
    }

    /// Seals the partition and registers it with the pool.
    pub fn finish(mut self) -> PartitionHandle {
        self.finished = true;
        let data = PartitionData {
            id: PartitionId {
                slot: 0,
                generation: 0,
            },
            schema: Arc::clone(&self.schema),
            capacity: self.capacity,
            row_count: self.row_count,
            budget_pool: self.budget_pool,
            buffer: RwLock::new(std::mem::take(&mut self.buffer)),
        };

        let data = self.pool.install(data);
        debug!(
            partition = %data.id,
            rows = data.row_count,
            capacity = data.capacity,
            "partition sealed"
        );

        PartitionHandle {
            data: ManuallyDrop::new(data),
            pool: self.pool.clone(),
            explicit: false,
        }
    }
}

impl Drop for PartitionWriter {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        self.pool
            .inner
            .budget
            .release(self.budget_pool, self.capacity);
        self.pool.recycle(std::mem::take(&mut self.buffer));
    }
}

/// Non-clonable reference to a sealed partition.
pub struct PartitionHandle {
    data: ManuallyDrop<Arc<PartitionData>>,
    pool: PartitionPool,
    explicit: bool,
}

impl std::fmt::Debug for PartitionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PartitionHandle")
            .field("id", &self.data.id)
            .field("rows", &self.data.row_count)
            .field("capacity", &self.data.capacity)
            .finish()
    }
}

impl PartitionHandle {
    pub fn id(&self) -> PartitionId {
        self.data.id
    }

    pub fn row_count(&self) -> usize {
        self.data.row_count
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.data.schema
    }

    pub fn capacity(&self) -> usize {
        self.data.capacity
    }

    pub fn bytes_used(&self) -> usize {
        self.data.buffer.read().len()
    }

    /// Scoped read access to the serialized rows. The lock is released when
    /// the guard is dropped.
    pub fn lock(&self) -> PartitionReadGuard<'_> {
        PartitionReadGuard {
            guard: self.data.buffer.read(),
        }
    }

    /// Releases the partition back to its pool.
    pub fn invalidate(mut self) {
        self.explicit = true;
    }
}

impl Drop for PartitionHandle {
    fn drop(&mut self) {
        // SAFETY: `data` is only taken here, and drop runs once.
        let data = unsafe { ManuallyDrop::take(&mut self.data) };
        if !self.explicit {
            warn!(partition = %data.id, "partition handle dropped without invalidate");
        }
        self.pool.retire(data);
    }
}

/// Read guard over a partition's used bytes.
pub struct PartitionReadGuard<'a> {
    guard: RwLockReadGuard<'a, Vec<u8>>,
}

impl Deref for PartitionReadGuard<'_> {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.guard.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_BUDGET_FLOOR;
    use crate::records::{decode_row, ColumnDef, DataType};
    use crate::types::OwnedValue;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            ColumnDef::new("id", DataType::Int8),
            ColumnDef::new("name", DataType::Text),
        ]))
    }

    fn pool() -> PartitionPool {
        PartitionPool::new(Arc::new(MemoryBudget::with_limit(MIN_BUDGET_FLOOR)), 2)
    }

    fn row(id: i64, name: &str) -> Row {
        Row::new(vec![OwnedValue::Int(id), name.into()])
    }

    #[test]
    fn test_write_and_read_back() {
        let pool = pool();
        let mut writer = pool.allocate(schema(), 1024).unwrap();
        writer.append(&row(1, "a")).unwrap();
        writer.append(&row(2, "bb")).unwrap();
        let partition = writer.finish();

        assert_eq!(partition.row_count(), 2);
        assert_eq!(partition.capacity(), 1024);

        let buf = partition.lock();
        let (first, used) = decode_row(partition.schema(), &buf).unwrap();
        let (second, _) = decode_row(partition.schema(), &buf[used..]).unwrap();
        assert_eq!(first, row(1, "a"));
        assert_eq!(second, row(2, "bb"));
    }

    #[test]
    fn test_budget_charged_and_released() {
        let pool = pool();
        let partition = pool.allocate(schema(), 4096).unwrap().finish();
        assert_eq!(pool.budget().pool_used(Pool::Partition), 4096);

        partition.invalidate();
        assert_eq!(pool.budget().pool_used(Pool::Partition), 0);
        assert_eq!(pool.invalidations(), 1);
    }

    #[test]
    fn test_exception_partitions_use_exception_pool() {
        let pool = pool();
        let partition = pool.allocate_exception(schema(), 512).unwrap().finish();
        assert_eq!(pool.budget().pool_used(Pool::Exception), 512);
        assert_eq!(pool.budget().pool_used(Pool::Partition), 0);
        partition.invalidate();
        assert_eq!(pool.budget().pool_used(Pool::Exception), 0);
    }

    #[test]
    fn test_allocation_fails_over_budget() {
        let pool = pool();
        let err = pool.allocate(schema(), MIN_BUDGET_FLOOR + 1).unwrap_err();
        assert!(err.to_string().contains("memory budget exceeded"));
    }

    #[test]
    fn test_append_past_capacity_is_rejected() {
        let pool = pool();
        let mut writer = pool.allocate(schema(), 40).unwrap();
        writer.append(&row(1, "fits")).unwrap();
        let used = writer.bytes_used();

        let err = writer.append(&row(2, "this one does not fit")).unwrap_err();
        assert!(err.downcast_ref::<PartitionFull>().is_some());
        assert_eq!(writer.bytes_used(), used);
        assert_eq!(writer.row_count(), 1);
    }

    #[test]
    fn test_append_encoded_validates_record() {
        let pool = pool();
        let mut writer = pool.allocate(schema(), 1024).unwrap();

        assert!(writer.append_encoded(&[1, 2, 3]).is_err());

        let bytes = crate::records::encode_row(&schema(), &row(5, "x")).unwrap();
        writer.append_encoded(&bytes).unwrap();
        assert_eq!(writer.row_count(), 1);
    }

    #[test]
    fn test_slot_generation_invalidates_stale_ids() {
        let pool = pool();
        let first = pool.allocate(schema(), 64).unwrap().finish();
        let stale = first.id();
        assert!(pool.is_live(stale));

        first.invalidate();
        assert!(!pool.is_live(stale));

        let second = pool.allocate(schema(), 64).unwrap().finish();
        assert_eq!(second.id().slot(), stale.slot());
        assert_ne!(second.id(), stale);
        assert!(pool.with_buffer(stale, |b| b.len()).is_none());
        assert!(pool.with_buffer(second.id(), |b| b.len()).is_some());
        second.invalidate();
    }

    #[test]
    fn test_buffers_are_recycled() {
        let pool = pool();
        assert_eq!(pool.available_buffers(), 2);

        let a = pool.allocate(schema(), 1024).unwrap().finish();
        assert_eq!(pool.available_buffers(), 1);

        a.invalidate();
        assert_eq!(pool.available_buffers(), 2);
    }

    #[test]
    fn test_dropped_writer_releases_budget() {
        let pool = pool();
        {
            let mut writer = pool.allocate(schema(), 2048).unwrap();
            writer.append(&row(1, "x")).unwrap();
        }
        assert_eq!(pool.budget().pool_used(Pool::Partition), 0);
        assert_eq!(pool.live_partitions(), 0);
    }

    #[test]
    fn test_default_pool_preallocates() {
        let pool = PartitionPool::with_defaults();
        assert_eq!(pool.available_buffers(), DEFAULT_PREALLOCATED_PARTITIONS);

        let partition = pool
            .allocate(schema(), DEFAULT_PARTITION_CAPACITY)
            .unwrap()
            .finish();
        assert_eq!(pool.available_buffers(), DEFAULT_PREALLOCATED_PARTITIONS - 1);
        partition.invalidate();
    }

    #[test]
    fn test_dropped_handle_still_retires() {
        let pool = pool();
        {
            let _partition = pool.allocate(schema(), 64).unwrap().finish();
            assert_eq!(pool.live_partitions(), 1);
        }
        assert_eq!(pool.live_partitions(), 0);
        assert_eq!(pool.invalidations(), 1);
    }
}
