//! Order API Handlers

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};

use crate::core::ServerState;
use crate::orders::{FindAllPage, RepositoryError};
use shared::util::{now_utc, parse_decimal_u64, random_order_id};
use shared::{
    AppError, AppResult, CreateOrderRequest, ErrorCode, ListOrdersQuery, Order, OrderListResponse,
    OrderStatus, UpdateOrderRequest,
};

/// 随机 ID 冲突时的最大尝试次数
const CREATE_ATTEMPTS: usize = 3;

/// POST /orders - 创建订单
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let Json(payload) = payload.map_err(|e| AppError::invalid_request(e.body_text()))?;
    if payload.customer_id.trim().is_empty() {
        return Err(AppError::with_message(
            ErrorCode::RequiredField,
            "customer_id is required",
        ));
    }

    let created_at = now_utc();
    let mut attempt = 0;
    loop {
        attempt += 1;
        let order = Order::new(
            random_order_id(),
            payload.customer_id.clone(),
            payload.line_items.clone(),
            created_at,
        );

        match state.orders.insert(&order).await {
            Ok(()) => {
                tracing::info!(order_id = order.order_id, "Order created");
                return Ok((StatusCode::CREATED, Json(order)));
            }
            Err(RepositoryError::AlreadyExists { key }) if attempt < CREATE_ATTEMPTS => {
                tracing::debug!(key = %key, "Order id collision, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// GET /orders?cursor= - 分页列出订单
///
/// `next` 缺省表示已遍历完
pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<ListOrdersQuery>, QueryRejection>,
) -> AppResult<Json<OrderListResponse>> {
    let Query(query) = query.map_err(|e| AppError::invalid_request(e.body_text()))?;
    let offset = query.cursor()?;

    let page = state
        .orders
        .find_all(FindAllPage {
            offset,
            size: state.config.list_page_size,
        })
        .await?;

    Ok(Json(OrderListResponse {
        items: page.orders,
        next: page.cursor,
    }))
}

/// GET /orders/{id} - 获取单个订单
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order_id = parse_id(&id)?;
    let order = state.orders.find_by_id(order_id).await?;
    Ok(Json(order))
}

/// PUT /orders/{id} - 更新订单状态 (shipped / completed)
///
/// 读-改-写，并发更新同一订单时后写者生效
pub async fn update_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> AppResult<Json<Order>> {
    let order_id = parse_id(&id)?;
    let Json(payload) = payload.map_err(|e| AppError::invalid_request(e.body_text()))?;
    let status: OrderStatus = payload.status.parse()?;

    let mut order = state.orders.find_by_id(order_id).await?;
    order.transition(status, now_utc())?;
    state.orders.update(&order).await?;

    tracing::info!(order_id, status = %status, "Order status updated");
    Ok(Json(order))
}

/// DELETE /orders/{id} - 删除订单
pub async fn delete_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let order_id = parse_id(&id)?;
    state.orders.delete_by_id(order_id).await?;

    tracing::info!(order_id, "Order deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(raw: &str) -> AppResult<u64> {
    parse_decimal_u64(raw)
        .ok_or_else(|| AppError::invalid_format(format!("Invalid order id: {}", raw)))
}
