/// 경매 상태 업데이트 스케줄러
/// 주기적으로 레지스트리를 순회하며 마감이 지난 상품을 종료 처리한다.
/// 종료 전이는 입찰과 같은 상품 락 아래에서 일어난다.
// region:    --- Imports
use crate::clock::Clock;
use crate::registry::AuctionRegistry;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};
// endregion: --- Imports

// region:    --- Auction Scheduler

/// 경매 상태 업데이트 스케줄러
pub struct AuctionScheduler {
    registry: Arc<AuctionRegistry>,
    period: Duration,
}

/// 실행 중인 스케줄러의 중지 훅
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl SchedulerHandle {
    /// 스케줄러를 중지하고 루프 종료를 기다린다
    pub async fn shutdown(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.handle.await {
            error!("{:<12} --> 스케줄러 종료 대기 실패: {:?}", "Scheduler", e);
        }
    }
}

/// 경매 상태 업데이트 스케줄러 생성
impl AuctionScheduler {
    pub fn new(registry: Arc<AuctionRegistry>) -> Self {
        Self {
            registry,
            period: Duration::from_secs(1),
        }
    }

    /// 스위프 주기 변경 (테스트용)
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// 경매 상태 업데이트 스케줄러 시작
    pub fn start(self) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let registry = self.registry;
        let period = self.period;

        let handle = tokio::spawn(async move {
            let mut interval = interval(period);
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => {
                        info!("{:<12} --> 스케줄러 종료", "Scheduler");
                        break;
                    }
                    _ = interval.tick() => Self::sweep(&registry).await,
                }
            }
        });

        SchedulerHandle { stop_tx, handle }
    }

    /// 레지스트리 전체 스위프
    /// 상품 하나의 실패가 나머지 상품 처리를 막지 않는다.
    async fn sweep(registry: &AuctionRegistry) {
        let now = registry.clock().now();

        for item in registry.iter() {
            match item.check_and_end(now) {
                Ok(Some(end)) => {
                    info!(
                        "{:<12} --> 경매 종료: {} 최종가 {}",
                        "Scheduler", end.item_id, end.final_bid
                    );
                    registry.sink().on_auction_ended(&end).await;
                }
                Ok(None) => {}
                Err(e) => {
                    // 손상된 상품은 건너뛰고 스위프를 계속한다
                    error!("{:<12} --> 상품 상태 오류: {:?}", "Scheduler", e);
                }
            }
        }

        debug!("{:<12} --> 스위프 완료", "Scheduler");
    }
}

// endregion: --- Auction Scheduler

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::item::ItemSeed;
    use crate::bidding::commands::{handle_place_bid, PlaceBidCommand};
    use crate::bidding::model::BidError;
    use crate::mocks::{MockClock, RecordingSink, SinkEvent};
    use chrono::Duration as ChronoDuration;

    fn make_seed(id: &str, duration_minutes: i64) -> ItemSeed {
        ItemSeed {
            id: id.to_string(),
            title: format!("Item {id}"),
            description: "테스트 상품".to_string(),
            starting_price: 5000,
            image_url: String::new(),
            duration_minutes,
        }
    }

    fn make_registry(clock: &MockClock, sink: &Arc<RecordingSink>) -> Arc<AuctionRegistry> {
        Arc::new(AuctionRegistry::new(
            vec![make_seed("1", 5), make_seed("2", 10)],
            Arc::new(clock.clone()),
            Arc::clone(sink) as Arc<dyn crate::notifier::NotificationSink>,
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_ends_expired_items_exactly_once() {
        let clock = MockClock::default();
        let sink = Arc::new(RecordingSink::new());
        let registry = make_registry(&clock, &sink);

        handle_place_bid(
            PlaceBidCommand {
                item_id: "1".to_string(),
                bidder_id: "user-a".to_string(),
                amount: 5010,
            },
            &registry,
        )
        .await
        .unwrap();

        let handle = AuctionScheduler::new(Arc::clone(&registry))
            .with_period(Duration::from_millis(10))
            .start();

        // 첫 상품만 마감 경과
        clock.advance(ChronoDuration::minutes(6));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(sink.ended_count("1"), 1);
        assert_eq!(sink.ended_count("2"), 0);
        assert!(!registry.get("1").unwrap().is_active());
        assert!(registry.get("2").unwrap().is_active());

        let ended: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|event| matches!(event, SinkEvent::AuctionEnded(_)))
            .collect();
        assert!(matches!(
            &ended[0],
            SinkEvent::AuctionEnded(end)
                if end.final_bid == 5010 && end.winner.as_deref() == Some("user-a")
        ));

        // 이후 스위프가 반복돼도 종료 이벤트는 다시 나오지 않는다
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.ended_count("1"), 1);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_and_bids_share_the_same_serialization() {
        let clock = MockClock::default();
        let sink = Arc::new(RecordingSink::new());
        let registry = make_registry(&clock, &sink);

        let handle = AuctionScheduler::new(Arc::clone(&registry))
            .with_period(Duration::from_millis(10))
            .start();

        clock.advance(ChronoDuration::minutes(6));
        tokio::time::sleep(Duration::from_millis(100)).await;

        // 모니터가 종료시킨 상품에는 어떤 금액의 입찰도 들어갈 수 없다
        let result = handle_place_bid(
            PlaceBidCommand {
                item_id: "1".to_string(),
                bidder_id: "user-a".to_string(),
                amount: 99_999,
            },
            &registry,
        )
        .await;
        assert_eq!(result.unwrap_err(), BidError::AuctionEnded);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_the_sweep() {
        let clock = MockClock::default();
        let sink = Arc::new(RecordingSink::new());
        let registry = make_registry(&clock, &sink);

        let handle = AuctionScheduler::new(Arc::clone(&registry))
            .with_period(Duration::from_millis(10))
            .start();
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.shutdown().await;

        // 중지 후 마감이 지나도 종료 이벤트는 나오지 않는다
        clock.advance(ChronoDuration::minutes(20));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.ended_count("1"), 0);
        assert_eq!(sink.ended_count("2"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_item_is_swept_again_in_next_epoch() {
        let clock = MockClock::default();
        let sink = Arc::new(RecordingSink::new());
        let registry = make_registry(&clock, &sink);

        let handle = AuctionScheduler::new(Arc::clone(&registry))
            .with_period(Duration::from_millis(10))
            .start();

        clock.advance(ChronoDuration::minutes(6));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.ended_count("1"), 1);

        // 리셋으로 새 에포크 시작 후 다시 마감 경과
        registry.get("1").unwrap().reset(clock.now());
        clock.advance(ChronoDuration::minutes(6));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(sink.ended_count("1"), 2);

        handle.shutdown().await;
    }
}
