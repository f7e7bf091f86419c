//! # Configuration Module
//!
//! Centralizes the configuration constants of the result layer. Values that
//! depend on each other live together and are checked by compile-time
//! assertions.
//!
//! Per-cursor settings (row budget, schema, inputs) are supplied through
//! [`crate::resultset::ResultSetBuilder`]; per-pool settings through
//! [`crate::memory::PartitionPool::new`].
//!
//! - [`constants`]: All numeric configuration values with dependency documentation

pub mod constants;
pub use constants::*;
