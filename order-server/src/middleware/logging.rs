//! 请求日志中间件
//!
//! 每个请求一个 `request` span，完成时记一条事件

use axum::{
    extract::{MatchedPath, Request},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{Instrument, field, info, info_span, warn};

/// 请求日志中间件
///
/// span 字段：request_id、method、route (路由模板，如 `/orders/{id}`)，
/// 单个订单路由另带 order_id。完成事件只带 status 和 latency_ms，
/// 5xx 记 warn，其余记 info。
pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();

    // SetRequestIdLayer 在外层已写入；直连调用时没有则现场生成
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string());

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        route = route.as_deref().unwrap_or("<unmatched>"),
        order_id = field::Empty,
    );
    if let Some(order_id) = route
        .as_deref()
        .and_then(|route| order_id_segment(route, req.uri().path()))
    {
        span.record("order_id", order_id);
    }

    async move {
        let response = next.run(req).await;
        let status = response.status();
        let latency_ms = start.elapsed().as_millis() as u64;

        if is_failure(status) {
            warn!(status = status.as_u16(), latency_ms, "Request failed");
        } else {
            info!(status = status.as_u16(), latency_ms, "Request completed");
        }
        response
    }
    .instrument(span)
    .await
}

fn is_failure(status: StatusCode) -> bool {
    status.is_server_error()
}

/// `{id}` 路由参数的原始值
fn order_id_segment<'a>(route: &str, path: &'a str) -> Option<&'a str> {
    if !route.ends_with("/{id}") {
        return None;
    }
    path.rsplit('/').next().filter(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_segment() {
        assert_eq!(order_id_segment("/orders/{id}", "/orders/1001"), Some("1001"));
        assert_eq!(order_id_segment("/orders", "/orders"), None);
        assert_eq!(order_id_segment("/health", "/health"), None);
    }

    #[test]
    fn test_only_server_errors_are_failures() {
        assert!(is_failure(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(is_failure(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_failure(StatusCode::NOT_FOUND));
        assert!(!is_failure(StatusCode::CREATED));
    }
}
