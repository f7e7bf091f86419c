//! # Result Set Builder
//!
//! Fluent construction of a [`ResultSet`].
//!
//! | Option          | Default   | Description                                   |
//! |-----------------|-----------|-----------------------------------------------|
//! | schema          | required  | Schema every partition must match             |
//! | runtime         | required  | Fallback runtime converting tagged objects    |
//! | partitions      | none      | Fast-path partitions in production order      |
//! | exceptions      | none      | Exception partitions released with the cursor |
//! | tagged_rows     | none      | Fallback rows in ascending index order        |
//! | max_rows        | unbounded | Row budget; negative means unbounded          |
//!
//! ```ignore
//! let mut rs = ResultSet::builder()
//!     .schema(schema.clone())
//!     .runtime(DynamicRuntime::new(schema))
//!     .partitions(partitions)
//!     .tagged_rows(vec![(1, DynamicValue::Int(7)).into()])
//!     .max_rows(100)
//!     .build()?;
//! ```
//!
//! Partitions holding zero rows are invalidated when the cursor is built.

use std::sync::Arc;

use eyre::{eyre, Result};

use crate::interop::{FallbackRuntime, TaggedRow};
use crate::memory::PartitionHandle;
use crate::records::Schema;
use crate::resultset::cursor::ResultSet;

pub struct ResultSetBuilder<R: FallbackRuntime> {
    schema: Option<Arc<Schema>>,
    runtime: Option<R>,
    partitions: Vec<PartitionHandle>,
    exceptions: Vec<PartitionHandle>,
    tagged_rows: Vec<TaggedRow<R::Object>>,
    max_rows: i64,
}

impl<R: FallbackRuntime> Default for ResultSetBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: FallbackRuntime> ResultSetBuilder<R> {
    pub fn new() -> Self {
        Self {
            schema: None,
            runtime: None,
            partitions: Vec::new(),
            exceptions: Vec::new(),
            tagged_rows: Vec::new(),
            max_rows: -1,
        }
    }

    pub fn schema(mut self, schema: Arc<Schema>) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn runtime(mut self, runtime: R) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn partitions(mut self, partitions: impl IntoIterator<Item = PartitionHandle>) -> Self {
        self.partitions.extend(partitions);
        self
    }

    pub fn partition(mut self, partition: PartitionHandle) -> Self {
        self.partitions.push(partition);
        self
    }

    pub fn exceptions(mut self, exceptions: impl IntoIterator<Item = PartitionHandle>) -> Self {
        self.exceptions.extend(exceptions);
        self
    }

    pub fn tagged_rows(mut self, rows: impl IntoIterator<Item = TaggedRow<R::Object>>) -> Self {
        self.tagged_rows.extend(rows);
        self
    }

    /// Row budget. Negative values mean unbounded.
    pub fn max_rows(mut self, max_rows: i64) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn build(self) -> Result<ResultSet<R>> {
        let schema = self
            .schema
            .ok_or_else(|| eyre!("result set requires a schema"))?;
        let runtime = self
            .runtime
            .ok_or_else(|| eyre!("result set requires a fallback runtime"))?;

        Ok(ResultSet::new(
            schema,
            self.partitions,
            self.exceptions,
            self.tagged_rows,
            runtime,
            self.max_rows,
        ))
    }
}
