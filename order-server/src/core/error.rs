use crate::store::StoreError;
use thiserror::Error;

/// 进程级错误 (启动、监听、关闭)
///
/// 请求级错误走 [`shared::AppError`]
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("存储初始化失败: {0}")]
    Store(#[from] StoreError),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
