use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::{Config, Result};
use crate::orders::OrderRepository;
use crate::store::{RecordStore, RedbStore};

/// 服务器状态 - 所有请求共享
///
/// 克隆成本低，内部都是 `Arc`
#[derive(Clone, Debug)]
pub struct ServerState {
    /// 服务器配置
    pub config: Arc<Config>,
    /// 订单仓储
    pub orders: OrderRepository,
    started_at: Instant,
}

impl ServerState {
    /// 使用已有存储创建状态
    pub fn new(config: Config, store: Arc<dyn RecordStore>) -> Self {
        let orders = OrderRepository::with_timeout(store, config.store_timeout());
        Self {
            config: Arc::new(config),
            orders,
            started_at: Instant::now(),
        }
    }

    /// 初始化服务器状态
    ///
    /// 1. 创建工作目录
    /// 2. 打开 redb 数据库
    /// 3. ping 存储，确认可用后才返回
    pub async fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;

        let db_path = config.db_path();
        let store = RedbStore::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Order store opened");

        let state = Self::new(config.clone(), Arc::new(store));
        state.orders.store().ping().await?;

        Ok(state)
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        self.orders.store()
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
