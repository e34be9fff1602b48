//! 订单仓储集成测试
//!
//! 内存 redb 后端 + 故障存储，覆盖记录与索引一致性、游标分页和错误分类

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use order_server::orders::keys::{ORDER_INDEX, order_key};
use order_server::store::{Batch, CommitOutcome, ScanPage, StoreResult};
use order_server::{
    FindAllPage, OrderRepository, RecordStore, RedbStore, RepositoryError, StoreError,
};
use shared::{LineItem, Order, OrderStatus, TransitionError};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn memory_store() -> Arc<RedbStore> {
    Arc::new(RedbStore::open_in_memory().expect("in-memory store"))
}

fn repository() -> OrderRepository {
    OrderRepository::new(memory_store())
}

fn order(id: u64) -> Order {
    Order::new(
        id,
        format!("c-{}", id % 7),
        vec![LineItem::new("sku-a", 2, 500)],
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    )
}

/// 循环翻页直到游标耗尽
async fn collect_all(repo: &OrderRepository, size: usize) -> Vec<Order> {
    let mut orders = Vec::new();
    let mut page = FindAllPage::first(size);
    loop {
        let result = repo.find_all(page).await.expect("find_all");
        orders.extend(result.orders);
        match result.cursor {
            Some(next) => {
                assert_ne!(next, 0, "a returned cursor is never the start sentinel");
                page.offset = next;
            }
            None => break,
        }
    }
    orders
}

// ========== Round trip and index consistency ==========

#[tokio::test]
async fn test_round_trip_preserves_every_field() {
    let repo = repository();
    let mut stored = order(42);
    stored.line_items.push(LineItem::new("sku-b", 1, 1999));
    stored.shipped_at = Some(stored.created_at + ChronoDuration::minutes(3));

    repo.insert(&stored).await.unwrap();
    assert_eq!(repo.find_by_id(42).await.unwrap(), stored);
}

#[tokio::test]
async fn test_retrievable_iff_enumerable() {
    let repo = repository();
    for id in 1..=20 {
        repo.insert(&order(id)).await.unwrap();
    }
    for id in (2..=20).step_by(3) {
        repo.delete_by_id(id).await.unwrap();
    }

    let listed: HashSet<u64> = collect_all(&repo, 4)
        .await
        .into_iter()
        .map(|o| o.order_id)
        .collect();

    for id in 1..=20 {
        let found = repo.find_by_id(id).await.is_ok();
        assert_eq!(found, listed.contains(&id), "order {id}");
    }
}

#[tokio::test]
async fn test_duplicate_insert_leaves_first_intact() {
    let repo = repository();
    repo.insert(&order(7)).await.unwrap();

    let mut impostor = order(7);
    impostor.customer_id = "someone-else".into();
    let err = repo.insert(&impostor).await.unwrap_err();
    assert!(matches!(err, RepositoryError::AlreadyExists { ref key } if key == "order:7"));

    assert_eq!(repo.find_by_id(7).await.unwrap(), order(7));
    let listed = collect_all(&repo, 10).await;
    assert_eq!(listed, vec![order(7)]);
}

#[tokio::test]
async fn test_delete_removes_record_and_index_entry() {
    let store = memory_store();
    let repo = OrderRepository::new(store.clone());
    repo.insert(&order(5)).await.unwrap();
    repo.delete_by_id(5).await.unwrap();

    assert!(repo.find_by_id(5).await.unwrap_err().is_not_exist());
    assert_eq!(store.get(&order_key(5)).await.unwrap(), None);
    let scan = store.set_scan(ORDER_INDEX, 0, "*", 100).await.unwrap();
    assert!(scan.members.is_empty());
}

#[tokio::test]
async fn test_delete_missing_is_not_exist() {
    let repo = repository();
    let err = repo.delete_by_id(404).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotExist { ref key } if key == "order:404"));
}

#[tokio::test]
async fn test_update_missing_writes_nothing() {
    let store = memory_store();
    let repo = OrderRepository::new(store.clone());

    let err = repo.update(&order(9)).await.unwrap_err();
    assert!(err.is_not_exist());
    assert_eq!(store.get(&order_key(9)).await.unwrap(), None);
    assert!(collect_all(&repo, 10).await.is_empty());
}

#[tokio::test]
async fn test_update_last_writer_wins() {
    let repo = repository();
    repo.insert(&order(11)).await.unwrap();

    let mut first = order(11);
    first.customer_id = "first".into();
    let mut second = order(11);
    second.customer_id = "second".into();

    repo.update(&first).await.unwrap();
    repo.update(&second).await.unwrap();
    assert_eq!(repo.find_by_id(11).await.unwrap().customer_id, "second");
}

// ========== Pagination ==========

#[tokio::test]
async fn test_pagination_completeness_for_every_page_size() {
    let repo = repository();
    const N: u64 = 37;
    for id in 0..N {
        repo.insert(&order(1000 + id)).await.unwrap();
    }

    for size in [1, 2, 5, 10, 36, 37, 38, 100] {
        let orders = collect_all(&repo, size).await;
        let ids: HashSet<u64> = orders.iter().map(|o| o.order_id).collect();
        assert_eq!(orders.len() as u64, N, "page size {size}");
        assert_eq!(ids.len() as u64, N, "page size {size} returned duplicates");
    }
}

#[tokio::test]
async fn test_page_never_exceeds_size() {
    let repo = repository();
    for id in 0..10 {
        repo.insert(&order(id)).await.unwrap();
    }

    let first = repo.find_all(FindAllPage::first(3)).await.unwrap();
    assert_eq!(first.orders.len(), 3);
    assert!(!first.is_exhausted());
}

#[tokio::test]
async fn test_empty_store_lists_nothing() {
    let repo = repository();
    let result = repo.find_all(FindAllPage::first(50)).await.unwrap();
    assert!(result.orders.is_empty());
    assert!(result.is_exhausted());
}

#[tokio::test]
async fn test_zero_page_size_still_progresses() {
    let repo = repository();
    for id in 0..3 {
        repo.insert(&order(id)).await.unwrap();
    }
    assert_eq!(collect_all(&repo, 0).await.len(), 3);
}

#[tokio::test]
async fn test_orders_present_for_whole_scan_are_listed_once() {
    let repo = repository();
    for id in 0..10 {
        repo.insert(&order(id)).await.unwrap();
    }

    let first = repo.find_all(FindAllPage::first(4)).await.unwrap();
    let mut seen: Vec<u64> = first.orders.iter().map(|o| o.order_id).collect();

    // 翻页期间：删除一个已返回的、一个未返回的，再新增一个
    repo.delete_by_id(seen[0]).await.unwrap();
    repo.delete_by_id(9).await.unwrap();
    repo.insert(&order(100)).await.unwrap();

    let mut page = FindAllPage {
        offset: first.cursor.unwrap(),
        size: 4,
    };
    loop {
        let result = repo.find_all(page).await.unwrap();
        seen.extend(result.orders.iter().map(|o| o.order_id));
        match result.cursor {
            Some(next) => page.offset = next,
            None => break,
        }
    }

    let unique: HashSet<u64> = seen.iter().copied().collect();
    assert_eq!(unique.len(), seen.len(), "no order listed twice");
    for id in 1..9 {
        assert!(unique.contains(&id), "order {id} was present throughout");
    }
    assert!(!unique.contains(&9));
}

// ========== Corruption ==========

async fn plant(store: &RedbStore, key: &str, bytes: &[u8]) {
    let mut batch = Batch::new();
    batch
        .set_if_absent(key, bytes.to_vec())
        .set_add(ORDER_INDEX, key);
    assert_eq!(store.commit(batch).await.unwrap(), CommitOutcome::Applied);
}

#[tokio::test]
async fn test_corrupt_value_is_not_reported_as_missing() {
    let store = memory_store();
    let repo = OrderRepository::new(store.clone());
    plant(&store, "order:13", b"{not json").await;

    let err = repo.find_by_id(13).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Corrupt { ref key, source: Some(_) } if key == "order:13"
    ));
}

#[tokio::test]
async fn test_corrupt_value_fails_whole_page() {
    let store = memory_store();
    let repo = OrderRepository::new(store.clone());
    repo.insert(&order(1)).await.unwrap();
    plant(&store, "order:2", b"[]").await;
    repo.insert(&order(3)).await.unwrap();

    let err = repo.find_all(FindAllPage::first(10)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Corrupt { ref key, .. } if key == "order:2"));
}

// ========== Concrete scenario ==========

#[tokio::test]
async fn test_order_lifecycle_1001() {
    let repo = repository();
    let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let fresh = Order::new(1001, "c-1", vec![LineItem::new("sku-a", 2, 500)], created_at);

    repo.insert(&fresh).await.unwrap();
    let mut current = repo.find_by_id(1001).await.unwrap();
    assert_eq!(current, fresh);

    // ship
    let shipped_at = created_at + ChronoDuration::hours(1);
    current.transition(OrderStatus::Shipped, shipped_at).unwrap();
    repo.update(&current).await.unwrap();
    let mut current = repo.find_by_id(1001).await.unwrap();
    assert_eq!(current.shipped_at, Some(shipped_at));

    // ship again is rejected and nothing is written
    let err = current
        .transition(OrderStatus::Shipped, shipped_at + ChronoDuration::hours(1))
        .unwrap_err();
    assert_eq!(err, TransitionError::AlreadyShipped(1001));
    assert_eq!(repo.find_by_id(1001).await.unwrap().shipped_at, Some(shipped_at));

    // complete
    let completed_at = shipped_at + ChronoDuration::days(2);
    current.transition(OrderStatus::Completed, completed_at).unwrap();
    repo.update(&current).await.unwrap();
    let current = repo.find_by_id(1001).await.unwrap();
    assert_eq!(current.completed_at, Some(completed_at));

    // delete
    repo.delete_by_id(1001).await.unwrap();
    let err = repo.find_by_id(1001).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotExist { ref key } if key == "order:1001"));
}

// ========== Concurrency ==========

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_all_land() {
    let repo = repository();
    const TASKS: u64 = 16;
    const PER_TASK: u64 = 25;

    let handles: Vec<_> = (0..TASKS)
        .map(|task| {
            let repo = repo.clone();
            tokio::spawn(async move {
                for i in 0..PER_TASK {
                    repo.insert(&order(task * 1000 + i)).await.unwrap();
                }
            })
        })
        .collect();
    for result in futures::future::join_all(handles).await {
        result.unwrap();
    }

    let ids: HashSet<u64> = collect_all(&repo, 64)
        .await
        .into_iter()
        .map(|o| o.order_id)
        .collect();
    assert_eq!(ids.len() as u64, TASKS * PER_TASK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_duplicate_inserts_only_one_wins() {
    let repo = repository();
    let attempts = (0..8).map(|_| {
        let repo = repo.clone();
        async move { repo.insert(&order(77)).await }
    });

    let results = futures::future::join_all(attempts).await;
    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    assert!(results.iter().all(|r| match r {
        Ok(()) => true,
        Err(e) => matches!(e, RepositoryError::AlreadyExists { .. }),
    }));
    assert_eq!(collect_all(&repo, 10).await.len(), 1);
}

// ========== Store failures ==========

/// 所有调用都失败的存储
struct FailingStore;

#[async_trait]
impl RecordStore for FailingStore {
    async fn ping(&self) -> StoreResult<()> {
        Err(StoreError::Unavailable("down".into()))
    }

    async fn get(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
        Err(StoreError::Unavailable("down".into()))
    }

    async fn multi_get(&self, _keys: &[String]) -> StoreResult<Vec<Option<Vec<u8>>>> {
        Err(StoreError::Unavailable("down".into()))
    }

    async fn set_scan(
        &self,
        _set: &str,
        _cursor: u64,
        _pattern: &str,
        _count: usize,
    ) -> StoreResult<ScanPage> {
        Err(StoreError::Unavailable("down".into()))
    }

    async fn commit(&self, _batch: Batch) -> StoreResult<CommitOutcome> {
        Err(StoreError::Unavailable("down".into()))
    }
}

/// 永不返回的存储
struct HangingStore;

#[async_trait]
impl RecordStore for HangingStore {
    async fn ping(&self) -> StoreResult<()> {
        std::future::pending().await
    }

    async fn get(&self, _key: &str) -> StoreResult<Option<Vec<u8>>> {
        std::future::pending().await
    }

    async fn multi_get(&self, _keys: &[String]) -> StoreResult<Vec<Option<Vec<u8>>>> {
        std::future::pending().await
    }

    async fn set_scan(
        &self,
        _set: &str,
        _cursor: u64,
        _pattern: &str,
        _count: usize,
    ) -> StoreResult<ScanPage> {
        std::future::pending().await
    }

    async fn commit(&self, _batch: Batch) -> StoreResult<CommitOutcome> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_store_failures_are_wrapped_with_operation() {
    let repo = OrderRepository::new(Arc::new(FailingStore));

    let err = repo.insert(&order(1)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Store { op: "insert", ref key, .. } if key == "order:1"));

    let err = repo.find_by_id(1).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Store { op: "get", .. }));

    let err = repo.update(&order(1)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Store { op: "update", .. }));

    let err = repo.delete_by_id(1).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Store { op: "delete", .. }));

    let err = repo.find_all(FindAllPage::first(10)).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Store { op: "scan", .. }));
}

#[tokio::test]
async fn test_store_deadline() {
    let repo = OrderRepository::with_timeout(Arc::new(HangingStore), Duration::from_millis(50));

    let err = repo.find_by_id(1).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Store {
            source: StoreError::Timeout(_),
            ..
        }
    ));
}

#[tokio::test]
async fn test_dropping_call_cancels_it() {
    let repo = OrderRepository::new(Arc::new(HangingStore));
    let outcome = tokio::time::timeout(Duration::from_millis(20), repo.find_by_id(1)).await;
    assert!(outcome.is_err(), "caller gave up before the store deadline");
}

// ========== On-disk ==========

#[tokio::test]
async fn test_orders_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.redb");

    {
        let repo = OrderRepository::new(Arc::new(RedbStore::open(&path).unwrap()));
        repo.insert(&order(1)).await.unwrap();
        repo.insert(&order(2)).await.unwrap();
    }

    let repo = OrderRepository::new(Arc::new(RedbStore::open(&path).unwrap()));
    assert_eq!(repo.find_by_id(2).await.unwrap(), order(2));
    assert_eq!(collect_all(&repo, 1).await.len(), 2);
}
