//! Server Implementation
//!
//! HTTP 服务器启动和优雅关闭

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::api;
use crate::core::{Config, Result, ServerError, ServerState};

/// HTTP Server
pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    pub fn new(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    /// 绑定端口并运行，直到收到 Ctrl+C / SIGTERM
    pub async fn run(self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Order server listening on {}", addr);

        self.serve(listener, shutdown_signal()).await
    }

    /// 在给定监听器上运行，`shutdown` 完成后停止接收新连接
    ///
    /// 进行中的请求最多等待 `SHUTDOWN_TIMEOUT_MS`，超时后中止 serve 任务，
    /// 并等它退出后才返回。
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let grace = self.config.shutdown_timeout();
        let app = api::build_app(&self.state).with_state(self.state);

        let token = CancellationToken::new();
        let stop = token.clone();
        let serve = axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async move { stop.cancelled().await })
            .into_future();
        let mut server = tokio::spawn(serve);

        tokio::select! {
            result = &mut server => {
                // 未收到关闭信号就退出了，一般是监听出错
                return flatten(result);
            }
            _ = shutdown => {}
        }

        tracing::info!(grace_ms = grace.as_millis() as u64, "Shutting down...");
        token.cancel();

        match tokio::time::timeout(grace, &mut server).await {
            Ok(result) => flatten(result)?,
            Err(_) => {
                tracing::warn!("Grace period elapsed, aborting in-flight requests");
                server.abort();
                // 被中止的任务返回 JoinError::Cancelled，忽略
                let _ = server.await;
            }
        }

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

fn flatten(
    result: std::result::Result<std::io::Result<()>, tokio::task::JoinError>,
) -> Result<()> {
    match result {
        Ok(served) => served.map_err(ServerError::from),
        Err(e) => Err(ServerError::Internal(anyhow::anyhow!("Server task failed: {}", e))),
    }
}

/// 等待 Ctrl+C 或 SIGTERM
pub async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
