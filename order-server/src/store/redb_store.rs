//! redb-backed record store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `records` | `key` | bytes | Record values |
//! | `set_members` | `(set, member)` | `u64` | Membership, points at scan position |
//! | `set_positions` | `(set, position)` | `member` | Scan order |
//! | `set_sequences` | `set` | `u64` | Last position handed out per set |
//!
//! Positions start at 1 and are never reused within a set, so a scan cursor
//! stays valid across concurrent adds and removes: a member present for the
//! whole scan is returned exactly once.
//!
//! All redb work runs on the blocking pool. A write whose caller stops
//! waiting (deadline or dropped future) is aborted instead of committed, as
//! long as it has not reached `commit()` yet.

use super::{
    Batch, BatchOp, CommitOutcome, RecordStore, ScanPage, StoreError, StoreResult,
    pattern::glob_match,
};
use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, Table, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Record values: key = record key, value = opaque bytes
const RECORDS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

/// Set membership: key = (set, member), value = scan position
const SET_MEMBERS_TABLE: TableDefinition<(&str, &str), u64> = TableDefinition::new("set_members");

/// Scan order: key = (set, position), value = member
const SET_POSITIONS_TABLE: TableDefinition<(&str, u64), &str> =
    TableDefinition::new("set_positions");

/// Position counter per set
const SET_SEQUENCES_TABLE: TableDefinition<&str, u64> = TableDefinition::new("set_sequences");

type MembersTable<'txn> = Table<'txn, (&'static str, &'static str), u64>;
type PositionsTable<'txn> = Table<'txn, (&'static str, u64), &'static str>;
type SequencesTable<'txn> = Table<'txn, &'static str, u64>;

/// Record store on an embedded redb database
///
/// Cheap to clone; all clones share the same database handle.
#[derive(Clone)]
pub struct RedbStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create the database file at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests and throwaway runs)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RECORDS_TABLE)?;
            let _ = write_txn.open_table(SET_MEMBERS_TABLE)?;
            let _ = write_txn.open_table(SET_POSITIONS_TABLE)?;
            let _ = write_txn.open_table(SET_SEQUENCES_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Run a closure against the database on the blocking pool
    async fn blocking<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Database) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(db.as_ref())).await?
    }

    /// Like [`blocking`](Self::blocking), but the closure also gets a token
    /// that fires once the caller stops waiting
    async fn blocking_write<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Database, &CancellationToken) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        let cancel = CancellationToken::new();
        // future 被丢弃（超时或调用方放弃）时触发取消
        let _guard = cancel.clone().drop_guard();
        tokio::task::spawn_blocking(move || f(db.as_ref(), &cancel)).await?
    }
}

// ========== Blocking operations ==========

fn read_one(db: &Database, key: &str) -> StoreResult<Option<Vec<u8>>> {
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(RECORDS_TABLE)?;
    let value = table.get(key)?.map(|guard| guard.value().to_vec());
    Ok(value)
}

fn read_many(db: &Database, keys: &[String]) -> StoreResult<Vec<Option<Vec<u8>>>> {
    // 单个读事务，所有值来自同一快照
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(RECORDS_TABLE)?;

    let mut values = Vec::with_capacity(keys.len());
    for key in keys {
        let value = table.get(key.as_str())?.map(|guard| guard.value().to_vec());
        values.push(value);
    }
    Ok(values)
}

fn scan(db: &Database, set: &str, cursor: u64, pattern: &str, count: usize) -> StoreResult<ScanPage> {
    let count = count.max(1);
    let read_txn = db.begin_read()?;
    let table = read_txn.open_table(SET_POSITIONS_TABLE)?;

    let mut page = ScanPage::default();
    let mut examined = 0usize;

    let range_start = (set, cursor);
    let range_end = (set, u64::MAX);
    for result in table.range(range_start..=range_end)? {
        let (key, value) = result?;
        let (_, position) = key.value();
        if examined == count {
            page.next = Some(position);
            break;
        }
        examined += 1;

        let member = value.value();
        if glob_match(pattern, member) {
            page.members.push(member.to_string());
        }
    }

    Ok(page)
}

fn apply(db: &Database, ops: Vec<BatchOp>, cancel: &CancellationToken) -> StoreResult<CommitOutcome> {
    let write_txn = db.begin_write()?;
    let rejected = {
        let mut records = write_txn.open_table(RECORDS_TABLE)?;
        let mut members = write_txn.open_table(SET_MEMBERS_TABLE)?;
        let mut positions = write_txn.open_table(SET_POSITIONS_TABLE)?;
        let mut sequences = write_txn.open_table(SET_SEQUENCES_TABLE)?;

        let mut rejected = None;
        for (index, op) in ops.iter().enumerate() {
            let holds = match op {
                BatchOp::SetIfAbsent { key, value } => {
                    let exists = records.get(key.as_str())?.is_some();
                    if !exists {
                        records.insert(key.as_str(), value.as_slice())?;
                    }
                    !exists
                }
                BatchOp::SetIfPresent { key, value } => {
                    let exists = records.get(key.as_str())?.is_some();
                    if exists {
                        records.insert(key.as_str(), value.as_slice())?;
                    }
                    exists
                }
                BatchOp::Delete { key } => records.remove(key.as_str())?.is_some(),
                BatchOp::SetAdd { set, member } => {
                    add_member(&mut members, &mut positions, &mut sequences, set, member)?;
                    true
                }
                BatchOp::SetRemove { set, member } => {
                    remove_member(&mut members, &mut positions, set, member)?;
                    true
                }
            };

            if !holds {
                rejected = Some(CommitOutcome::Rejected {
                    index,
                    key: op.key().to_string(),
                });
                break;
            }
        }
        rejected
    };

    match rejected {
        Some(outcome) => {
            write_txn.abort()?;
            Ok(outcome)
        }
        None if cancel.is_cancelled() => {
            write_txn.abort()?;
            Err(StoreError::Cancelled)
        }
        None => {
            write_txn.commit()?;
            Ok(CommitOutcome::Applied)
        }
    }
}

fn add_member(
    members: &mut MembersTable<'_>,
    positions: &mut PositionsTable<'_>,
    sequences: &mut SequencesTable<'_>,
    set: &str,
    member: &str,
) -> StoreResult<()> {
    if members.get((set, member))?.is_some() {
        return Ok(());
    }

    let position = sequences.get(set)?.map(|guard| guard.value()).unwrap_or(0) + 1;
    sequences.insert(set, position)?;
    members.insert((set, member), position)?;
    positions.insert((set, position), member)?;
    Ok(())
}

fn remove_member(
    members: &mut MembersTable<'_>,
    positions: &mut PositionsTable<'_>,
    set: &str,
    member: &str,
) -> StoreResult<()> {
    let position = members.remove((set, member))?.map(|guard| guard.value());
    if let Some(position) = position {
        positions.remove((set, position))?;
    }
    Ok(())
}

#[async_trait]
impl RecordStore for RedbStore {
    async fn ping(&self) -> StoreResult<()> {
        self.blocking(|db| {
            let read_txn = db.begin_read()?;
            let _ = read_txn.open_table(RECORDS_TABLE)?;
            Ok(())
        })
        .await
    }

    async fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let key = key.to_string();
        self.blocking(move |db| read_one(db, &key)).await
    }

    async fn multi_get(&self, keys: &[String]) -> StoreResult<Vec<Option<Vec<u8>>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let keys = keys.to_vec();
        self.blocking(move |db| read_many(db, &keys)).await
    }

    async fn set_scan(
        &self,
        set: &str,
        cursor: u64,
        pattern: &str,
        count: usize,
    ) -> StoreResult<ScanPage> {
        let set = set.to_string();
        let pattern = pattern.to_string();
        self.blocking(move |db| scan(db, &set, cursor, &pattern, count))
            .await
    }

    async fn commit(&self, batch: Batch) -> StoreResult<CommitOutcome> {
        if batch.is_empty() {
            return Ok(CommitOutcome::Applied);
        }
        let ops = batch.into_ops();
        self.blocking_write(move |db, cancel| apply(db, ops, cancel))
            .await
    }
}
