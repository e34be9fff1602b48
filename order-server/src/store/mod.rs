//! Record store abstraction
//!
//! A key-value store with opaque byte values plus named sets that can be
//! enumerated incrementally with a cursor. The repository layer only talks to
//! [`RecordStore`]; [`RedbStore`] is the production backend.
//!
//! Keys are UTF-8 strings, values are bytes. Absence is never an error:
//! reads return `None`, conditional writes return `false`, and only transport
//! or storage failures surface as [`StoreError`].

mod batch;
mod error;
pub mod pattern;
mod redb_store;

pub use batch::{Batch, BatchOp, CommitOutcome};
pub use error::{StoreError, StoreResult};
pub use redb_store::RedbStore;

#[cfg(test)]
pub(crate) use redb_store::test_support;

use async_trait::async_trait;

/// One increment of a set enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    /// Members examined in this increment that matched the pattern
    pub members: Vec<String>,
    /// Cursor for the next increment, `None` once enumeration is complete
    pub next: Option<u64>,
}

impl ScanPage {
    pub fn is_exhausted(&self) -> bool {
        self.next.is_none()
    }
}

/// Key-value store with named sets
///
/// Implementations must be safe to share across tasks. Every call is
/// cancellable by dropping its future.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    /// Check the store is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Read a single value
    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Read many values in one round trip
    ///
    /// The result is positionally aligned with `keys`.
    async fn multi_get(&self, keys: &[String]) -> StoreResult<Vec<Option<Vec<u8>>>>;

    /// Enumerate one increment of `set`
    ///
    /// Cursor `0` starts a new enumeration. At most `count` members are
    /// examined; `pattern` (glob, `*` and `?`) filters the examined members,
    /// so a page may hold fewer than `count` members even when more remain.
    ///
    /// A member present for the whole enumeration is returned exactly once.
    /// Members added or removed while it runs may or may not appear.
    async fn set_scan(
        &self,
        set: &str,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> StoreResult<ScanPage>;

    /// Apply a batch atomically
    ///
    /// If any guard fails nothing is applied and the outcome names it.
    async fn commit(&self, batch: Batch) -> StoreResult<CommitOutcome>;

    /// Write `value` only if `key` is absent. Returns `true` if written.
    async fn set_if_absent(&self, key: &str, value: Vec<u8>) -> StoreResult<bool> {
        let mut batch = Batch::new();
        batch.set_if_absent(key, value);
        Ok(self.commit(batch).await?.is_applied())
    }

    /// Overwrite `value` only if `key` is present. Returns `true` if written.
    async fn set_if_present(&self, key: &str, value: Vec<u8>) -> StoreResult<bool> {
        let mut batch = Batch::new();
        batch.set_if_present(key, value);
        Ok(self.commit(batch).await?.is_applied())
    }

    /// Remove `key`. Returns `true` if it existed.
    async fn delete(&self, key: &str) -> StoreResult<bool> {
        let mut batch = Batch::new();
        batch.delete(key);
        Ok(self.commit(batch).await?.is_applied())
    }

    async fn set_add(&self, set: &str, member: &str) -> StoreResult<()> {
        let mut batch = Batch::new();
        batch.set_add(set, member);
        self.commit(batch).await.map(|_| ())
    }

    async fn set_remove(&self, set: &str, member: &str) -> StoreResult<()> {
        let mut batch = Batch::new();
        batch.set_remove(set, member);
        self.commit(batch).await.map(|_| ())
    }
}
