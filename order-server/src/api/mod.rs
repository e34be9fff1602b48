//! HTTP API
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | `/orders` | 创建订单 |
//! | GET | `/orders?cursor=` | 分页列表 |
//! | GET | `/orders/{id}` | 获取订单 |
//! | PUT | `/orders/{id}` | 更新状态 |
//! | DELETE | `/orders/{id}` | 删除订单 |
//! | GET | `/health` | 健康检查 |

use axum::Router;
use axum::middleware as axum_middleware;
use http::{HeaderName, HeaderValue, StatusCode};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::core::ServerState;
use crate::middleware;

mod error;
pub mod health;
pub mod orders;

/// Request ID generator
#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Build a router with all routes registered (no middleware, no state)
pub fn build_router() -> Router<ServerState> {
    Router::new()
        .merge(orders::router())
        // Health API - public route
        .merge(health::router())
}

/// Build a fully configured application with all middleware
///
/// Used by the HTTP server and by tests driving the router directly.
pub fn build_app(state: &ServerState) -> Router<ServerState> {
    let x_request_id = HeaderName::from_static("x-request-id");

    build_router()
        // Timeout - 超时返回 408
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.request_timeout(),
        ))
        // CORS
        .layer(CorsLayer::permissive())
        // Request logging
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        // Trace
        .layer(TraceLayer::new_for_http())
        // Propagate request ID to response
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        // Request ID - outermost, so every inner layer sees it
        .layer(SetRequestIdLayer::new(x_request_id, XRequestId))
}
