/// 입찰 관련 커맨드 처리
/// 1. 입찰
/// 2. 경매 리셋
// region:    --- Imports
use crate::auction::events::BidTransition;
use crate::auction::item::ItemSnapshot;
use crate::bidding::model::BidError;
use crate::clock::Clock;
use crate::registry::AuctionRegistry;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Commands

/// 입찰 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PlaceBidCommand {
    pub item_id: String,
    pub bidder_id: String,
    pub amount: i64,
}

/// 1. 입찰
///
/// 상품당 한 호출만 검증/변경 구간에 들어간다. 수락 시 상태 전이를
/// 싱크로 내보내고, 거절은 요청자에게만 통지된다. 금액 형식 검증은
/// 경계(소켓 계층)에서 끝났다고 가정한다.
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    registry: &AuctionRegistry,
) -> Result<BidTransition, BidError> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    let now = registry.clock().now();
    let result = match registry.get(&cmd.item_id) {
        Some(item) => item.try_place_bid(&cmd.bidder_id, cmd.amount, now),
        None => Err(BidError::ItemNotFound),
    };

    match &result {
        Ok(transition) => {
            info!(
                "{:<12} --> 입찰 수락: {} 현재가 {}",
                "Command", transition.item_id, transition.current_bid
            );
            let sink = registry.sink();
            sink.on_bid_accepted(transition).await;

            // 밀려난 입찰자가 있고 본인이 아닐 때만 통지한다
            if let Some(previous) = transition.previous_bidder.as_deref() {
                if previous != transition.highest_bidder {
                    sink.on_outbid(
                        previous,
                        &transition.item_id,
                        transition.current_bid,
                        transition.previous_bid,
                    )
                    .await;
                }
            }
        }
        Err(error) => {
            warn!(
                "{:<12} --> 입찰 거절: {} ({})",
                "Command",
                cmd.item_id,
                error.code()
            );
            registry
                .sink()
                .on_bid_rejected(&cmd.bidder_id, &cmd.item_id, error)
                .await;
        }
    }

    result
}

/// 2. 경매 리셋 (데모 재시작용 관리 명령)
pub fn handle_reset_item(item_id: &str, registry: &AuctionRegistry) -> Option<ItemSnapshot> {
    info!("{:<12} --> 경매 리셋: {}", "Command", item_id);

    let now = registry.clock().now();
    registry.get(item_id).map(|item| item.reset(now))
}

// endregion: --- Commands
