use std::path::PathBuf;
use std::time::Duration;

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库文件) |
/// | DB_FILE | orders.redb | 数据库文件名 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | LIST_PAGE_SIZE | 50 | 列表每页扫描条数 |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | STORE_TIMEOUT_MS | 5000 | 单次存储调用超时(毫秒) |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | 优雅关闭等待时间(毫秒) |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 / 过滤规则 |
/// | LOG_JSON | false | JSON 格式日志 |
/// | LOG_DIR | (未设置) | 按天滚动的日志目录 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/orders HTTP_PORT=8080 cargo run -p order-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// 数据库文件名 (位于工作目录下)
    pub db_file: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// `GET /orders` 每页检查的索引条数
    pub list_page_size: usize,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 存储调用超时时间 (毫秒)
    pub store_timeout_ms: u64,
    /// 关闭超时时间 (毫秒)
    pub shutdown_timeout_ms: u64,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置或无法解析的变量使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            db_file: std::env::var("DB_FILE").unwrap_or_else(|_| "orders.redb".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            list_page_size: std::env::var("LIST_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|size: &usize| *size > 0)
                .unwrap_or(50),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30000),
            store_timeout_ms: std::env::var("STORE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|d| !d.is_empty()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库文件完整路径
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(&self.db_file)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
