//! # Record Serialization
//!
//! This module defines the binary row format stored inside partitions. Each
//! record carries a header with a null bitmap and an offset table, so any
//! column is reachable in O(1) and the record's total length is known from
//! the header alone. Records are packed back to back inside a partition.
//!
//! ## Record Binary Layout
//!
//! ```text
//! +------------------+------------------+------------------+------------------+
//! | Header Length    | Null Bitmap      | Offset Table     | Data Payload     |
//! | (u16)            | [u8; (N+7)/8]    | [u16; M]         | [u8; ...]        |
//! +------------------+------------------+------------------+------------------+
//! ```
//!
//! | Component | Type | Description |
//! |-----------|------|-------------|
//! | **Header Length** | `u16` | Total header size (allows skipping to data) |
//! | **Null Bitmap** | `[u8; (N+7)/8]` | 1 bit per column. `1` = NULL, `0` = has data |
//! | **Offset Table** | `[u16; M]` | End offsets for variable-length columns only |
//! | **Data Payload** | `[u8; ...]` | Fixed-width values, then variable-width values |
//!
//! The serialized length of a record is
//! `header_len + total_fixed_size + end offset of the last variable column`.
//!
//! ## Module Structure
//!
//! - `types`: ColumnDef struct
//! - `schema`: Schema definition with pre-computed offsets
//! - `view`: RecordView for zero-copy reading
//! - `builder`: RecordBuilder for construction
//! - `codec`: Row encode/decode on top of builder and view

pub mod builder;
pub mod codec;
pub mod schema;
pub mod types;
pub mod view;


pub use builder::RecordBuilder;
pub use codec::{decode_row, encode_row, encode_row_into};
pub use schema::Schema;
pub use types::{ColumnDef, DataType};
pub use view::RecordView;
