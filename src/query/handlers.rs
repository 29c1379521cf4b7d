// region:    --- Imports
use crate::auction::item::{BidRecord, ItemSnapshot};
use crate::clock::Clock;
use crate::registry::AuctionRegistry;
use serde::{Deserialize, Serialize};
use tracing::info;
// endregion: --- Imports

// region:    --- Query Handlers

/// 서버 시각 (클라이언트 시간 동기화용)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerTime {
    pub timestamp: i64,
    pub iso: String,
}

/// 모든 상품 스냅샷 조회 (시드 순서)
pub fn get_all_items(registry: &AuctionRegistry) -> Vec<ItemSnapshot> {
    info!("{:<12} --> 모든 상품 조회", "Query");
    let now = registry.clock().now();
    registry.iter().map(|item| item.snapshot(now)).collect()
}

/// 단일 상품 스냅샷 조회
pub fn get_item(registry: &AuctionRegistry, item_id: &str) -> Option<ItemSnapshot> {
    info!("{:<12} --> 상품 조회 id: {}", "Query", item_id);
    let now = registry.clock().now();
    registry.get(item_id).map(|item| item.snapshot(now))
}

/// 상품 입찰 이력 조회 (수락 순서)
pub fn get_bid_history(registry: &AuctionRegistry, item_id: &str) -> Option<Vec<BidRecord>> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "Query", item_id);
    registry.get(item_id).map(|item| item.bid_history())
}

/// 서버 시각 조회
pub fn get_server_time(clock: &dyn Clock) -> ServerTime {
    let now = clock.now();
    ServerTime {
        timestamp: now.timestamp_millis(),
        iso: now.to_rfc3339(),
    }
}

// endregion: --- Query Handlers
