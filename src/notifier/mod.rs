/// 알림 싱크 트레이트
/// 코어는 상태 전이 직후 이 인터페이스를 호출할 뿐, 전달 방식은 알지 못한다.
// region:    --- Imports
use crate::auction::events::{AuctionEnd, BidTransition};
use crate::bidding::model::BidError;
use async_trait::async_trait;
// endregion: --- Imports

// region:    --- Notification Sink Trait

#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// 입찰 수락 통지 (모든 관찰자 대상)
    async fn on_bid_accepted(&self, transition: &BidTransition);

    /// 입찰 거절 통지 (요청자에게만)
    async fn on_bid_rejected(&self, requester_id: &str, item_id: &str, error: &BidError);

    /// 최고 입찰자 교체 통지 (밀려난 사용자에게만)
    async fn on_outbid(
        &self,
        previous_bidder: &str,
        item_id: &str,
        current_bid: i64,
        previous_bid: i64,
    );

    /// 경매 종료 통지 (모든 관찰자 대상, 에포크당 1회)
    async fn on_auction_ended(&self, end: &AuctionEnd);
}

/// 아무 것도 전달하지 않는 싱크
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

#[async_trait]
impl NotificationSink for NullSink {
    async fn on_bid_accepted(&self, _transition: &BidTransition) {}

    async fn on_bid_rejected(&self, _requester_id: &str, _item_id: &str, _error: &BidError) {}

    async fn on_outbid(
        &self,
        _previous_bidder: &str,
        _item_id: &str,
        _current_bid: i64,
        _previous_bid: i64,
    ) {
    }

    async fn on_auction_ended(&self, _end: &AuctionEnd) {}
}

// endregion: --- Notification Sink Trait
