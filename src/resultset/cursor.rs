//! # Result Cursor
//!
//! `ResultSet` merges two row sources into one ordered stream:
//!
//! - a FIFO of fast-path partitions, decoded row by row, and
//! - a FIFO of fallback rows, each tagged with the logical output index it
//!   must occupy.
//!
//! Neither queue is sorted by the cursor. One running counter,
//! `total_row_counter`, tracks the logical position of the next output row;
//! the front tagged row is spliced in as soon as its index is at or below
//! that position, otherwise the next partition row is decoded.
//!
//! ```text
//! partitions:  [p0 p1] [p2 p3 p4]          tagged: (1, x) (1, y) (4, z)
//!
//! output:      p0  x  y  p1  p2  z  p3  p4
//! logical:     0   1  1  2   3   4  5   6
//! ```
//!
//! Tagged rows sharing an index are emitted back to back and advance the
//! logical position once.
//!
//! ## Row Budget
//!
//! `max_rows` caps the rows the cursor will ever hand out, across both
//! sources and across the bulk partition path. Once `rows_retrieved` reaches
//! it, `has_next_row` and `has_next_partition` report false and `next_row`
//! returns the empty sentinel row.
//!
//! ## Partition Retirement
//!
//! A partition is invalidated the moment its last row is decoded. `clear`
//! invalidates everything still queued, and dropping the cursor does the
//! same, with a warning when partitions were still live. Pending fallback
//! objects are always released under the interop lock.

use std::collections::VecDeque;
use std::sync::Arc;

use eyre::{eyre, Result, WrapErr};
use tracing::{debug, trace, warn};

use crate::config::UNBOUNDED_ROWS;
use crate::interop::{lock_interop, FallbackRuntime, TaggedRow};
use crate::memory::PartitionHandle;
use crate::records::{decode_row, Schema};
use crate::resultset::builder::ResultSetBuilder;
use crate::resultset::Row;

/// Pull-based cursor over merged fast-path and fallback rows.
pub struct ResultSet<R: FallbackRuntime> {
    schema: Arc<Schema>,
    runtime: R,
    partitions: VecDeque<PartitionHandle>,
    exceptions: Vec<PartitionHandle>,
    tagged: VecDeque<TaggedRow<R::Object>>,
    max_rows: usize,
    rows_retrieved: usize,
    cur_row_counter: usize,
    byte_counter: usize,
    total_row_counter: usize,
}

/// Converts a signed row limit to a budget. Negative means unbounded.
pub fn row_budget(max_rows: i64) -> usize {
    usize::try_from(max_rows).unwrap_or(UNBOUNDED_ROWS)
}

impl<R: FallbackRuntime> ResultSet<R> {
    pub fn builder() -> ResultSetBuilder<R> {
        ResultSetBuilder::new()
    }

    /// Creates a cursor. `max_rows < 0` means no row budget.
    ///
    /// Partitions holding zero rows are invalidated here. They would
    /// contribute nothing and would otherwise stall the front of the queue.
    pub fn new(
        schema: Arc<Schema>,
        partitions: Vec<PartitionHandle>,
        exceptions: Vec<PartitionHandle>,
        tagged_rows: Vec<TaggedRow<R::Object>>,
        runtime: R,
        max_rows: i64,
    ) -> Self {
        let mut queue = VecDeque::with_capacity(partitions.len());
        for partition in partitions {
            if partition.row_count() > 0 {
                queue.push_back(partition);
            } else {
                debug!(partition = %partition.id(), "dropping empty partition");
                partition.invalidate();
            }
        }

        Self {
            schema,
            runtime,
            partitions: queue,
            exceptions,
            tagged: tagged_rows.into(),
            max_rows: row_budget(max_rows),
            rows_retrieved: 0,
            cur_row_counter: 0,
            byte_counter: 0,
            total_row_counter: 0,
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn rows_retrieved(&self) -> usize {
        self.rows_retrieved
    }

    pub fn cur_row_counter(&self) -> usize {
        self.cur_row_counter
    }

    pub fn byte_counter(&self) -> usize {
        self.byte_counter
    }

    pub fn total_row_counter(&self) -> usize {
        self.total_row_counter
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn exception_count(&self) -> usize {
        self.exceptions.len()
    }

    pub fn pending_fallback_rows(&self) -> usize {
        self.tagged.len()
    }

    fn budget_exhausted(&self) -> bool {
        self.rows_retrieved >= self.max_rows
    }

    pub fn has_next_row(&self) -> bool {
        if self.budget_exhausted() {
            return false;
        }
        if !self.tagged.is_empty() {
            return true;
        }
        self.partitions
            .front()
            .is_some_and(|p| self.cur_row_counter < p.row_count())
    }

    /// Like `has_next_row`, ignoring pending fallback rows.
    pub fn has_next_partition(&self) -> bool {
        if self.budget_exhausted() {
            return false;
        }
        self.partitions
            .front()
            .is_some_and(|p| self.cur_row_counter < p.row_count())
    }

    /// Hands the front partition to the caller, who becomes responsible for
    /// reading and invalidating it. Its full row count is charged against
    /// the row budget.
    pub fn next_partition(&mut self) -> Option<PartitionHandle> {
        let first = self.partitions.pop_front()?;
        self.assert_schema(&first);

        self.rows_retrieved = self
            .rows_retrieved
            .saturating_add(first.row_count())
            .min(self.max_rows);
        self.cur_row_counter = 0;
        self.byte_counter = 0;

        Some(first)
    }

    /// Pulls the next row in logical order, or `Row::empty()` once the
    /// budget is spent or both sources are drained.
    ///
    /// On error no counter is advanced.
    pub fn next_row(&mut self) -> Result<Row> {
        if self.budget_exhausted() {
            return Ok(Row::empty());
        }

        if let Some(front) = self.tagged.front() {
            if self.partitions.is_empty() || front.index <= self.total_row_counter {
                return self.next_fallback_row();
            }
        }

        if self.partitions.is_empty() {
            return Ok(Row::empty());
        }
        self.next_partition_row()
    }

    fn next_fallback_row(&mut self) -> Result<Row> {
        let guard = lock_interop();
        let (index, row) = match self.tagged.front() {
            Some(tagged) => {
                let row = self
                    .runtime
                    .to_row(&tagged.object, &guard)
                    .wrap_err_with(|| {
                        format!("failed to convert fallback row for index {}", tagged.index)
                    })?;
                (tagged.index, row)
            }
            None => return Ok(Row::empty()),
        };
        // Foreign objects are released under the lock too.
        drop(self.tagged.pop_front());
        drop(guard);

        self.rows_retrieved += 1;
        if self.tagged.front().map_or(true, |next| next.index != index) {
            self.total_row_counter += 1;
        }

        trace!(
            index,
            rows_retrieved = self.rows_retrieved,
            total_row_counter = self.total_row_counter,
            "spliced fallback row"
        );
        Ok(row)
    }

    fn next_partition_row(&mut self) -> Result<Row> {
        let front = self
            .partitions
            .front()
            .ok_or_else(|| eyre!("no partition to read from"))?;
        self.assert_schema(front);

        let row_count = front.row_count();
        let (row, consumed) = {
            let buf = front.lock();
            let remaining = buf.get(self.byte_counter..).ok_or_else(|| {
                eyre!(
                    "byte offset {} is past the end of partition {} ({} bytes)",
                    self.byte_counter,
                    front.id(),
                    buf.len()
                )
            })?;
            decode_row(&self.schema, remaining).wrap_err_with(|| {
                format!(
                    "failed to decode row {} of partition {} at byte offset {}",
                    self.cur_row_counter,
                    front.id(),
                    self.byte_counter
                )
            })?
        };

        self.byte_counter += consumed;
        self.cur_row_counter += 1;
        self.rows_retrieved += 1;
        self.total_row_counter += 1;

        if self.cur_row_counter == row_count {
            self.remove_first_partition();
        }
        Ok(row)
    }

    /// Queued partition rows plus pending fallback rows.
    ///
    /// Fallback rows that replace a partition row are counted twice.
    pub fn row_count(&self) -> usize {
        self.partitions
            .iter()
            .map(PartitionHandle::row_count)
            .sum::<usize>()
            + self.tagged.len()
    }

    /// Invalidates and drops the front partition.
    ///
    /// # Panics
    ///
    /// Panics if no partition is queued.
    pub fn remove_first_partition(&mut self) {
        let Some(first) = self.partitions.pop_front() else {
            panic!("remove_first_partition called with no queued partitions");
        };

        debug!(
            partition = %first.id(),
            rows = first.row_count(),
            "retiring consumed partition"
        );
        first.invalidate();
        self.cur_row_counter = 0;
        self.byte_counter = 0;
    }

    /// Invalidates every queued and exception partition, releases pending
    /// fallback rows, and zeroes all counters and the row budget. The cursor
    /// yields nothing afterwards.
    pub fn clear(&mut self) {
        let released = self.partitions.len() + self.exceptions.len();
        for partition in self.partitions.drain(..) {
            partition.invalidate();
        }
        for partition in self.exceptions.drain(..) {
            partition.invalidate();
        }

        if !self.tagged.is_empty() {
            let _guard = lock_interop();
            self.tagged.clear();
        }

        self.cur_row_counter = 0;
        self.byte_counter = 0;
        self.rows_retrieved = 0;
        self.total_row_counter = 0;
        self.max_rows = 0;

        debug!(released, "result set cleared");
    }

    /// Iterator over the remaining rows. Stops after the first error.
    pub fn rows(&mut self) -> Rows<'_, R> {
        Rows {
            cursor: self,
            failed: false,
        }
    }

    /// Pulls up to `limit` rows.
    pub fn collect_rows(&mut self, limit: usize) -> Result<Vec<Row>> {
        self.rows().take(limit).collect()
    }

    fn assert_schema(&self, partition: &PartitionHandle) {
        assert!(
            Arc::ptr_eq(partition.schema(), &self.schema) || **partition.schema() == *self.schema,
            "partition {} has schema {} but result set expects {}",
            partition.id(),
            partition.schema(),
            self.schema
        );
    }
}

impl<R: FallbackRuntime> std::fmt::Debug for ResultSet<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("schema", &self.schema.to_string())
            .field("partitions", &self.partitions.len())
            .field("exceptions", &self.exceptions.len())
            .field("pending_fallback_rows", &self.tagged.len())
            .field("max_rows", &self.max_rows)
            .field("rows_retrieved", &self.rows_retrieved)
            .field("total_row_counter", &self.total_row_counter)
            .finish()
    }
}

impl<R: FallbackRuntime> Drop for ResultSet<R> {
    fn drop(&mut self) {
        if !self.partitions.is_empty() || !self.exceptions.is_empty() {
            warn!(
                partitions = self.partitions.len(),
                exceptions = self.exceptions.len(),
                "result set dropped with live partitions"
            );
        } else if self.tagged.is_empty() {
            return;
        }
        // Pending fallback objects are released under the interop lock.
        self.clear();
    }
}

/// Iterator returned by [`ResultSet::rows`].
pub struct Rows<'a, R: FallbackRuntime> {
    cursor: &'a mut ResultSet<R>,
    failed: bool,
}

impl<R: FallbackRuntime> Iterator for Rows<'_, R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.cursor.has_next_row() {
            return None;
        }
        let next = self.cursor.next_row();
        self.failed = next.is_err();
        Some(next)
    }
}
