//! Order Server - 订单管理服务
//!
//! # 架构概述
//!
//! - **存储** (`store`): 键值 + 集合抽象，redb 实现
//! - **订单仓储** (`orders`): 记录与索引集合的一致性、游标分页
//! - **HTTP API** (`api`): axum 路由和处理器
//! - **核心** (`core`): 配置、状态、服务器生命周期
//!
//! # 模块结构
//!
//! ```text
//! order-server/src/
//! ├── core/          # 配置、状态、错误、服务器
//! ├── store/         # RecordStore trait、批量写、redb 后端
//! ├── orders/        # 键布局、OrderRepository
//! ├── api/           # HTTP 路由和处理器
//! ├── middleware/    # 请求日志
//! └── utils/         # 日志初始化
//! ```

pub mod api;
pub mod core;
pub mod middleware;
pub mod orders;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerError, ServerState};
pub use orders::{FindAllPage, FindResult, OrderRepository, RepositoryError};
pub use store::{RecordStore, RedbStore, StoreError};

// Re-export logger functions
pub use utils::logger::init_logger_with_file;

/// 加载 .env 并初始化日志
pub fn setup_environment() -> Config {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    init_logger_with_file(
        Some(&config.log_level),
        Some(config.log_json),
        config.log_dir.as_deref(),
    );
    config
}
