//! 健康检查路由

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

/// 健康检查路由 - 公共路由
pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    version: &'static str,
    /// ok | unavailable
    store: &'static str,
    uptime_seconds: u64,
}

/// 存储不可用时仍返回 200，由 `status` 字段体现降级
async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let store_ok = match tokio::time::timeout(state.config.store_timeout(), state.store().ping()).await
    {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Health check: store ping failed");
            false
        }
        Err(_) => {
            tracing::warn!("Health check: store ping timed out");
            false
        }
    };

    Json(HealthResponse {
        status: if store_ok { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        store: if store_ok { "ok" } else { "unavailable" },
        uptime_seconds: state.uptime().as_secs(),
    })
}
