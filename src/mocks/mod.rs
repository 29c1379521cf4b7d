/// 테스트 지원용 목 구현 모음
// region:    --- Imports
use crate::auction::events::{AuctionEnd, BidTransition};
use crate::bidding::model::BidError;
use crate::clock::Clock;
use crate::notifier::NotificationSink;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
// endregion: --- Imports

// region:    --- Mock Clock

/// 제어 가능한 목 시계
#[derive(Debug, Clone)]
pub struct MockClock {
    current_millis: Arc<AtomicI64>,
}

impl MockClock {
    /// 주어진 epoch millis에서 시작하는 목 시계 생성
    pub fn new(initial_millis: i64) -> Self {
        Self {
            current_millis: Arc::new(AtomicI64::new(initial_millis)),
        }
    }

    /// 기준 시각(2024-01-01 00:00:00 UTC)에서 시작
    pub fn default_time() -> Self {
        Self::new(1_704_067_200_000)
    }

    /// 현재 시각을 특정 값으로 설정
    pub fn set(&self, millis: i64) {
        self.current_millis.store(millis, Ordering::SeqCst);
    }

    /// 지정한 시간만큼 전진
    pub fn advance(&self, duration: Duration) {
        self.current_millis
            .fetch_add(duration.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::default_time()
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.current_millis.load(Ordering::SeqCst))
            .expect("목 시계 값이 유효한 시각 범위를 벗어났습니다")
    }
}

// endregion: --- Mock Clock

// region:    --- Recording Sink

/// 싱크 호출 기록
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    BidAccepted(BidTransition),
    BidRejected {
        requester_id: String,
        item_id: String,
        code: String,
    },
    Outbid {
        previous_bidder: String,
        item_id: String,
        current_bid: i64,
        previous_bid: i64,
    },
    AuctionEnded(AuctionEnd),
}

/// 싱크 호출을 순서대로 기록하는 테스트용 구현체
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<SinkEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 기록된 이벤트 전체 복사
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 특정 상품의 종료 이벤트 수
    pub fn ended_count(&self, item_id: &str) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, SinkEvent::AuctionEnded(end) if end.item_id == item_id))
            .count()
    }

    fn record(&self, event: SinkEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn on_bid_accepted(&self, transition: &BidTransition) {
        self.record(SinkEvent::BidAccepted(transition.clone()));
    }

    async fn on_bid_rejected(&self, requester_id: &str, item_id: &str, error: &BidError) {
        self.record(SinkEvent::BidRejected {
            requester_id: requester_id.to_string(),
            item_id: item_id.to_string(),
            code: error.code().to_string(),
        });
    }

    async fn on_outbid(
        &self,
        previous_bidder: &str,
        item_id: &str,
        current_bid: i64,
        previous_bid: i64,
    ) {
        self.record(SinkEvent::Outbid {
            previous_bidder: previous_bidder.to_string(),
            item_id: item_id.to_string(),
            current_bid,
            previous_bid,
        });
    }

    async fn on_auction_ended(&self, end: &AuctionEnd) {
        self.record(SinkEvent::AuctionEnded(end.clone()));
    }
}

// endregion: --- Recording Sink

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_clock_initial_value() {
        let clock = MockClock::new(1_000_000);
        assert_eq!(clock.now_millis(), 1_000_000);
    }

    #[test]
    fn test_mock_clock_set_and_advance() {
        let clock = MockClock::new(1_000_000);
        clock.set(2_000_000);
        assert_eq!(clock.now_millis(), 2_000_000);

        clock.advance(Duration::seconds(5));
        assert_eq!(clock.now_millis(), 2_005_000);
    }

    #[test]
    fn test_mock_clock_clone_shares_state() {
        let first = MockClock::new(1_000_000);
        let second = first.clone();

        first.advance(Duration::milliseconds(500));
        assert_eq!(second.now_millis(), 1_000_500);
    }

    #[tokio::test]
    async fn test_recording_sink_keeps_call_order() {
        let sink = RecordingSink::new();
        sink.on_bid_rejected("user-a", "1", &BidError::ItemNotFound)
            .await;
        sink.on_auction_ended(&AuctionEnd {
            item_id: "1".to_string(),
            final_bid: 100,
            winner: None,
        })
        .await;

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SinkEvent::BidRejected { .. }));
        assert!(matches!(events[1], SinkEvent::AuctionEnded(_)));
        assert_eq!(sink.ended_count("1"), 1);
    }
}
