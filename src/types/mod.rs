//! # Type System
//!
//! - `data_type`: Storage-level `DataType` discriminant
//! - `owned_value`: Heap-owned `OwnedValue` carried by materialized rows
//!
//! ## Usage
//!
//! ```ignore
//! use resultset::types::{DataType, OwnedValue};
//!
//! assert_eq!(DataType::Int4.fixed_size(), Some(4));
//! let v: OwnedValue = 42i64.into();
//! ```

mod data_type;
mod owned_value;

pub use data_type::DataType;
pub use owned_value::OwnedValue;
