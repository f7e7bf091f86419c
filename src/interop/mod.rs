//! # Fallback Runtime Interop
//!
//! Rows that fail the fast path are produced by a foreign runtime as opaque
//! objects. The runtime is not thread-safe, so every conversion from a
//! foreign object to a native [`Row`] happens under one process-wide lock.
//!
//! The lock is expressed in the type system: [`FallbackRuntime::to_row`]
//! takes an [`InteropGuard`], which can only be obtained from
//! [`lock_interop`]. The guard releases the lock on drop, on every path.
//!
//! ```ignore
//! let guard = lock_interop();
//! let row = runtime.to_row(&object, &guard)?;
//! drop(guard);
//! ```
//!
//! The lock is not reentrant. A runtime must not call `lock_interop` from
//! inside `to_row`.

mod dynamic;

pub use dynamic::{DynamicRuntime, DynamicValue};

use std::cell::Cell;

use crate::resultset::Row;
use eyre::Result;
use parking_lot::{Mutex, MutexGuard};

static INTEROP_LOCK: Mutex<()> = parking_lot::const_mutex(());

thread_local! {
    static HELD_HERE: Cell<bool> = const { Cell::new(false) };
}

/// Proof that the global interop lock is held by the current thread.
pub struct InteropGuard {
    _guard: MutexGuard<'static, ()>,
}

impl Drop for InteropGuard {
    fn drop(&mut self) {
        HELD_HERE.with(|held| held.set(false));
    }
}

impl std::fmt::Debug for InteropGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("InteropGuard")
    }
}

/// Blocks until the global interop lock is acquired.
pub fn lock_interop() -> InteropGuard {
    let guard = INTEROP_LOCK.lock();
    HELD_HERE.with(|held| held.set(true));
    InteropGuard { _guard: guard }
}

/// Whether the calling thread holds the interop lock. Other threads holding
/// it do not count.
pub fn interop_lock_held() -> bool {
    HELD_HERE.with(Cell::get)
}

/// Converts foreign-runtime objects into native rows.
pub trait FallbackRuntime {
    type Object;

    fn to_row(&self, object: &Self::Object, guard: &InteropGuard) -> Result<Row>;
}

/// A fallback-produced object together with the logical output position it
/// must occupy.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedRow<O> {
    pub index: usize,
    pub object: O,
}

impl<O> TaggedRow<O> {
    pub fn new(index: usize, object: O) -> Self {
        Self { index, object }
    }
}

impl<O> From<(usize, O)> for TaggedRow<O> {
    fn from((index, object): (usize, O)) -> Self {
        Self { index, object }
    }
}
