// region:    --- Imports
use crate::bidding::commands;
use crate::clock::Clock;
use crate::query;
use crate::registry::AuctionRegistry;
use crate::socket;
use crate::socket::SocketHub;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tracing::info;
// endregion: --- Imports

/// 핸들러가 공유하는 상태 (레지스트리, 소켓 허브)
pub type AppState = (Arc<AuctionRegistry>, Arc<SocketHub>);

/// 서비스 기동 시각 (헬스 체크 uptime 계산용)
static STARTED_AT: OnceLock<Instant> = OnceLock::new();

/// 기동 시각 기록
pub fn mark_started() {
    let _ = STARTED_AT.set(Instant::now());
}

/// 전체 라우터 구성
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/api/items", get(handle_get_items))
        .route("/api/items/:id", get(handle_get_item))
        .route("/api/items/:id/bids", get(handle_get_item_bids))
        .route("/api/items/:id/reset", post(handle_reset_item))
        .route("/api/time", get(handle_get_time))
        .route("/api/health", get(handle_health))
        .route("/ws", get(socket::ws_handler))
        .with_state(state)
}

// region:    --- Query Handlers

/// 루트 안내
pub async fn handle_root() -> impl IntoResponse {
    Json(json!({
        "message": "Auction Platform API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "items": "/api/items",
            "time": "/api/time",
            "health": "/api/health",
            "socket": "/ws"
        }
    }))
}

/// 모든 상품 조회
pub async fn handle_get_items(State((registry, _)): State<AppState>) -> impl IntoResponse {
    info!("{:<12} --> 모든 상품 조회", "HandlerQuery");
    let items = query::handlers::get_all_items(&registry);
    Json(json!({
        "success": true,
        "data": items,
        "serverTime": registry.clock().now().timestamp_millis(),
    }))
}

/// 상품 조회
pub async fn handle_get_item(
    State((registry, _)): State<AppState>,
    Path(item_id): Path<String>,
) -> impl IntoResponse {
    info!("{:<12} --> 상품 조회 id: {}", "HandlerQuery", item_id);
    match query::handlers::get_item(&registry, &item_id) {
        Some(item) => Json(json!({
            "success": true,
            "data": item,
            "serverTime": registry.clock().now().timestamp_millis(),
        }))
        .into_response(),
        None => item_not_found(),
    }
}

/// 상품 입찰 이력 조회
pub async fn handle_get_item_bids(
    State((registry, _)): State<AppState>,
    Path(item_id): Path<String>,
) -> impl IntoResponse {
    info!(
        "{:<12} --> 상품 입찰 이력 조회 id: {}",
        "HandlerQuery", item_id
    );
    match query::handlers::get_bid_history(&registry, &item_id) {
        Some(bids) => Json(json!({ "success": true, "data": bids })).into_response(),
        None => item_not_found(),
    }
}

/// 서버 시각 조회
pub async fn handle_get_time(State((registry, _)): State<AppState>) -> impl IntoResponse {
    Json(query::handlers::get_server_time(registry.clock()))
}

/// 헬스 체크
pub async fn handle_health(State((registry, _)): State<AppState>) -> impl IntoResponse {
    let uptime = STARTED_AT.get_or_init(Instant::now).elapsed().as_secs_f64();
    Json(json!({
        "status": "healthy",
        "timestamp": registry.clock().now().timestamp_millis(),
        "uptime": uptime,
    }))
}

// endregion: --- Query Handlers

// region:    --- Command Handlers

/// 경매 리셋 요청 처리 (데모용 관리 기능)
pub async fn handle_reset_item(
    State((registry, _)): State<AppState>,
    Path(item_id): Path<String>,
) -> impl IntoResponse {
    match commands::handle_reset_item(&item_id, &registry) {
        Some(item) => Json(json!({ "success": true, "data": item })).into_response(),
        None => item_not_found(),
    }
}

// endregion: --- Command Handlers

fn item_not_found() -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Item not found" })),
    )
        .into_response()
}
