//! # Result Sets
//!
//! The consumer-facing side of query execution. A [`ResultSet`] is built
//! from the partitions a fast-path executor produced, the rows its fallback
//! path produced (tagged with their logical output index), and a row budget.
//! The consumer pulls rows one at a time, or whole partitions for bulk
//! export, until the cursor is exhausted or cleared.
//!
//! ## Module Structure
//!
//! - `row`: materialized `Row` values
//! - `cursor`: the merging `ResultSet` cursor and its row iterator
//! - `builder`: `ResultSetBuilder`

pub mod builder;
pub mod cursor;
mod row;


pub use builder::ResultSetBuilder;
pub use cursor::{row_budget, ResultSet, Rows};
pub use row::Row;
