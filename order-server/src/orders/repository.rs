//! Order repository
//!
//! Each order is stored as JSON under `order:<id>` and its key is a member of
//! the `orders` index set. Insert and delete touch both in one batch, so an
//! order is retrievable exactly when it is enumerable.
//!
//! Every store call is bounded by the repository's deadline. Dropping a
//! returned future cancels the call; a write that has not committed yet is
//! rolled back.

use super::error::{RepositoryError, RepositoryResult};
use super::keys::{ORDER_INDEX, order_key, parse_order_key};
use crate::store::{Batch, CommitOutcome, RecordStore, StoreError, StoreResult};
use shared::Order;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Default per-call store deadline
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Glob used when enumerating the index
const SCAN_PATTERN: &str = "*";

/// Where to resume enumeration and how many index entries to examine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FindAllPage {
    /// Cursor from the previous [`FindResult`], `0` to start
    pub offset: u64,
    /// Index entries examined per call (values below 1 are treated as 1)
    pub size: usize,
}

impl FindAllPage {
    pub fn first(size: usize) -> Self {
        Self { offset: 0, size }
    }
}

/// One page of orders
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindResult {
    pub orders: Vec<Order>,
    /// Cursor for the next page; `None` when enumeration is complete
    pub cursor: Option<u64>,
}

impl FindResult {
    pub fn is_exhausted(&self) -> bool {
        self.cursor.is_none()
    }
}

/// Order persistence over a [`RecordStore`]
///
/// Holds no mutable state of its own; clones share the same store.
#[derive(Clone)]
pub struct OrderRepository {
    store: Arc<dyn RecordStore>,
    timeout: Duration,
}

impl std::fmt::Debug for OrderRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderRepository")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OrderRepository {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_timeout(store, DEFAULT_STORE_TIMEOUT)
    }

    pub fn with_timeout(store: Arc<dyn RecordStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Underlying store (health checks)
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Insert a new order
    ///
    /// Fails with [`RepositoryError::AlreadyExists`] if the id is taken; the
    /// existing record and its index entry are left untouched.
    pub async fn insert(&self, order: &Order) -> RepositoryResult<()> {
        let key = order_key(order.order_id);
        let value = encode(order)?;

        let mut batch = Batch::new();
        batch
            .set_if_absent(key.as_str(), value)
            .set_add(ORDER_INDEX, key.as_str());

        match self.call("insert", &key, self.store.commit(batch)).await? {
            CommitOutcome::Applied => Ok(()),
            CommitOutcome::Rejected { .. } => Err(RepositoryError::AlreadyExists { key }),
        }
    }

    /// Fetch an order by id
    pub async fn find_by_id(&self, order_id: u64) -> RepositoryResult<Order> {
        let key = order_key(order_id);
        match self.call("get", &key, self.store.get(&key)).await? {
            Some(bytes) => decode(&key, &bytes),
            None => Err(RepositoryError::NotExist { key }),
        }
    }

    /// Overwrite an existing order
    ///
    /// Last writer wins. A missing order is reported as
    /// [`RepositoryError::NotExist`] and nothing is written.
    pub async fn update(&self, order: &Order) -> RepositoryResult<()> {
        let key = order_key(order.order_id);
        let value = encode(order)?;

        if self
            .call("update", &key, self.store.set_if_present(&key, value))
            .await?
        {
            Ok(())
        } else {
            Err(RepositoryError::NotExist { key })
        }
    }

    /// Remove an order and its index entry
    pub async fn delete_by_id(&self, order_id: u64) -> RepositoryResult<()> {
        let key = order_key(order_id);

        let mut batch = Batch::new();
        batch
            .delete(key.as_str())
            .set_remove(ORDER_INDEX, key.as_str());

        match self.call("delete", &key, self.store.commit(batch)).await? {
            CommitOutcome::Applied => Ok(()),
            CommitOutcome::Rejected { .. } => Err(RepositoryError::NotExist { key }),
        }
    }

    /// Fetch the next page of orders
    ///
    /// A page may hold fewer than `size` orders while `cursor` is still
    /// `Some`; callers keep going until it is `None`. Orders are fetched in
    /// one round trip and any that fail to decode fail the whole page.
    pub async fn find_all(&self, page: FindAllPage) -> RepositoryResult<FindResult> {
        let scan = self
            .call(
                "scan",
                ORDER_INDEX,
                self.store
                    .set_scan(ORDER_INDEX, page.offset, SCAN_PATTERN, page.size),
            )
            .await?;

        if scan.members.is_empty() {
            return Ok(FindResult {
                orders: Vec::new(),
                cursor: scan.next,
            });
        }

        let values = self
            .call("multi_get", ORDER_INDEX, self.store.multi_get(&scan.members))
            .await?;

        let mut orders = Vec::with_capacity(values.len());
        for (key, value) in scan.members.iter().zip(values) {
            // 记录与索引同事务写入，值缺失只可能是扫描之后被并发删除
            let Some(bytes) = value else {
                continue;
            };
            orders.push(decode(key, &bytes)?);
        }

        Ok(FindResult {
            orders,
            cursor: scan.next,
        })
    }

    /// Run one store call under the deadline, tagging failures with `op` and `key`
    async fn call<T, F>(&self, op: &'static str, key: &str, fut: F) -> RepositoryResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(|source| RepositoryError::store(op, key, source)),
            Err(_) => Err(RepositoryError::store(
                op,
                key,
                StoreError::Timeout(self.timeout),
            )),
        }
    }
}

fn encode(order: &Order) -> RepositoryResult<Vec<u8>> {
    serde_json::to_vec(order).map_err(|source| RepositoryError::Encode { source })
}

/// Decode the value stored under `key`; a body for a different id is corrupt
fn decode(key: &str, bytes: &[u8]) -> RepositoryResult<Order> {
    let order: Order = serde_json::from_slice(bytes).map_err(|source| RepositoryError::Corrupt {
        key: key.to_string(),
        source: Some(source),
    })?;

    if parse_order_key(key) != Some(order.order_id) {
        return Err(RepositoryError::Corrupt {
            key: key.to_string(),
            source: None,
        });
    }
    Ok(order)
}
