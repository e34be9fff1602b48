//! Transactional write batch
//!
//! A [`Batch`] collects record and set mutations, then
//! [`RecordStore::commit`](super::RecordStore::commit) applies them in a
//! single transaction: all of them or none.
//!
//! Conditional operations act as guards. If the precondition of any of them
//! does not hold, the whole batch is discarded and the commit reports which
//! operation was rejected.
//!
//! ```ignore
//! let mut batch = Batch::new();
//! batch
//!     .set_if_absent("order:7", bytes)
//!     .set_add("orders", "order:7");
//! match store.commit(batch).await? {
//!     CommitOutcome::Applied => {}
//!     CommitOutcome::Rejected { key, .. } => { /* order:7 already existed */ }
//! }
//! ```

/// A buffered operation in the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Write `value` under `key`; guard: `key` must be absent
    SetIfAbsent { key: String, value: Vec<u8> },
    /// Replace the value under `key`; guard: `key` must be present
    SetIfPresent { key: String, value: Vec<u8> },
    /// Remove `key`; guard: `key` must be present
    Delete { key: String },
    /// Add `member` to `set` (no-op if already a member)
    SetAdd { set: String, member: String },
    /// Remove `member` from `set` (no-op if not a member)
    SetRemove { set: String, member: String },
}

impl BatchOp {
    /// The record key or set name this operation touches
    pub fn key(&self) -> &str {
        match self {
            Self::SetIfAbsent { key, .. } | Self::SetIfPresent { key, .. } | Self::Delete { key } => {
                key
            }
            Self::SetAdd { set, .. } | Self::SetRemove { set, .. } => set,
        }
    }

    /// Whether a failed precondition on this operation aborts the batch
    pub fn is_guard(&self) -> bool {
        matches!(
            self,
            Self::SetIfAbsent { .. } | Self::SetIfPresent { .. } | Self::Delete { .. }
        )
    }
}

/// Collects operations to be committed atomically.
///
/// Dropping a batch without committing it applies nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    ops: Vec<BatchOp>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer an insert-if-absent.
    pub fn set_if_absent(&mut self, key: impl Into<String>, value: Vec<u8>) -> &mut Self {
        self.ops.push(BatchOp::SetIfAbsent {
            key: key.into(),
            value,
        });
        self
    }

    /// Buffer an update-if-present.
    pub fn set_if_present(&mut self, key: impl Into<String>, value: Vec<u8>) -> &mut Self {
        self.ops.push(BatchOp::SetIfPresent {
            key: key.into(),
            value,
        });
        self
    }

    /// Buffer a delete of an existing key.
    pub fn delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::Delete { key: key.into() });
        self
    }

    /// Buffer a set membership add.
    pub fn set_add(&mut self, set: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::SetAdd {
            set: set.into(),
            member: member.into(),
        });
        self
    }

    /// Buffer a set membership removal.
    pub fn set_remove(&mut self, set: impl Into<String>, member: impl Into<String>) -> &mut Self {
        self.ops.push(BatchOp::SetRemove {
            set: set.into(),
            member: member.into(),
        });
        self
    }

    /// Return the number of buffered operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Return `true` if the batch contains no operations.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

/// Result of committing a [`Batch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Every operation was applied
    Applied,
    /// The guard at `index` failed; nothing was applied
    Rejected { index: usize, key: String },
}

impl CommitOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}
