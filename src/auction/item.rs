/// 경매 상품 상태 머신
/// 상품별 락 하나로 입찰 수락과 종료 전이를 직렬화한다.
// region:    --- Imports
use crate::auction::events::{AuctionEnd, BidTransition};
use crate::bidding::model::{BidError, MIN_BID_INCREMENT};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError, TryLockError};
// endregion: --- Imports

// region:    --- Models

/// 상품 시드 (기동 시 1회 주입)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSeed {
    pub id: String,
    pub title: String,
    pub description: String,
    pub starting_price: i64,
    pub image_url: String,
    pub duration_minutes: i64,
}

/// 입찰 이력 레코드 (추가 후 불변)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BidRecord {
    pub user_id: String,
    pub amount: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// 조회/방송용 읽기 전용 프로젝션
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    pub id: String,
    pub title: String,
    pub description: String,
    pub starting_price: i64,
    pub current_bid: i64,
    pub highest_bidder: Option<String>,
    pub image_url: String,
    pub end_time: i64,
    pub is_active: bool,
    pub bid_count: usize,
    pub time_remaining: i64,
}

/// 스위프 중 건너뛰어야 하는 손상된 상품 상태
#[derive(Debug, thiserror::Error)]
#[error("상품 상태가 손상되었습니다: {item_id}")]
pub struct ItemStateError {
    pub item_id: String,
}

// endregion: --- Models

// region:    --- Auction Item

/// 입찰로 변하는 가변 상태. 상품 락 안에서만 읽고 쓴다.
#[derive(Debug)]
struct BidState {
    current_bid: i64,
    highest_bidder: Option<String>,
    bid_history: Vec<BidRecord>,
}

/// 경매 상품
///
/// `end_time`과 `active`는 락 없이 읽을 수 있도록 원자값으로 두고,
/// 전이(입찰 수락, 종료, 리셋)는 전부 `state` 락 안에서 일어난다.
pub struct AuctionItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub starting_price: i64,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    duration: Duration,
    /// epoch millis. 에포크 내에서는 고정이며 리셋만 갱신한다.
    end_time: AtomicI64,
    active: AtomicBool,
    state: Mutex<BidState>,
}

impl AuctionItem {
    /// 시드로부터 상품 생성 (초기 상태: Active)
    pub fn new(seed: ItemSeed, now: DateTime<Utc>) -> Self {
        let duration = Duration::minutes(seed.duration_minutes);
        Self {
            id: seed.id,
            title: seed.title,
            description: seed.description,
            starting_price: seed.starting_price,
            image_url: seed.image_url,
            created_at: now,
            duration,
            end_time: AtomicI64::new((now + duration).timestamp_millis()),
            active: AtomicBool::new(true),
            state: Mutex::new(BidState {
                current_bid: seed.starting_price,
                highest_bidder: None,
                bid_history: Vec::new(),
            }),
        }
    }

    /// 마감 시각 조회 (epoch millis)
    pub fn end_time_millis(&self) -> i64 {
        self.end_time.load(Ordering::Acquire)
    }

    /// 활성 여부 조회
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// 입찰 가능 여부 (활성 상태이면서 마감 전)
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && now.timestamp_millis() < self.end_time_millis()
    }

    /// 입찰 시도
    ///
    /// 상품 락을 즉시 획득하지 못하면 대기하지 않고 거절한다.
    /// 락 획득에 성공한 호출은 획득 시점의 상태를 기준으로 재검증되므로,
    /// 늦게 도착한 경쟁 입찰은 갱신된 현재가에 대해 평가된다.
    pub fn try_place_bid(
        &self,
        bidder_id: &str,
        amount: i64,
        now: DateTime<Utc>,
    ) -> Result<BidTransition, BidError> {
        // 마감 선검사. 종료된 경매는 경합 여부와 무관하게 거절
        if !self.is_open(now) {
            return Err(BidError::AuctionEnded);
        }

        let mut state = match self.state.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(BidError::BidInProgress),
            // 손상된 상태는 변경 경로에서 쓰지 않는다. 리셋이 복구 수단이다.
            Err(TryLockError::Poisoned(_)) => return Err(BidError::BidInProgress),
        };

        // 락 획득과 선검사 사이에 스위프가 종료시켰을 수 있다
        if !self.is_open(now) {
            return Err(BidError::AuctionEnded);
        }

        let minimum = state.current_bid + MIN_BID_INCREMENT;
        if amount < minimum {
            return Err(BidError::BidTooLow { minimum });
        }

        // 최고 입찰자는 자기 입찰을 갱신할 수 없다
        if state.highest_bidder.as_deref() == Some(bidder_id) {
            return Err(BidError::AlreadyHighest);
        }

        let previous_bid = state.current_bid;
        let previous_bidder = state.highest_bidder.replace(bidder_id.to_string());

        state.current_bid = amount;
        state.bid_history.push(BidRecord {
            user_id: bidder_id.to_string(),
            amount,
            timestamp: now,
        });

        Ok(BidTransition {
            item_id: self.id.clone(),
            current_bid: amount,
            highest_bidder: bidder_id.to_string(),
            previous_bidder,
            previous_bid,
            timestamp: now,
        })
    }

    /// 마감 시각이 지났으면 Ended로 전이한다
    ///
    /// 전이는 멱등적이며, 최종 상태는 에포크당 한 번만 반환된다.
    /// 입찰과 같은 락을 쓰므로 종료 처리 중에 입찰이 끼어들 수 없다.
    pub fn check_and_end(&self, now: DateTime<Utc>) -> Result<Option<AuctionEnd>, ItemStateError> {
        // 빠른 경로: 이미 종료됐거나 아직 마감 전이면 락 없이 통과
        if !self.is_active() || now.timestamp_millis() < self.end_time_millis() {
            return Ok(None);
        }

        let state = self.state.lock().map_err(|_| ItemStateError {
            item_id: self.id.clone(),
        })?;

        // 락을 기다리는 사이 다른 스위프가 먼저 전이했을 수 있다
        if !self.active.swap(false, Ordering::AcqRel) {
            return Ok(None);
        }

        Ok(Some(AuctionEnd {
            item_id: self.id.clone(),
            final_bid: state.current_bid,
            winner: state.highest_bidder.clone(),
        }))
    }

    /// 경매 리셋 (관리용). 새 에포크를 시작한다
    ///
    /// 상태 전체를 재초기화하므로 손상된 상품도 여기서 복구된다.
    pub fn reset(&self, now: DateTime<Utc>) -> ItemSnapshot {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        state.current_bid = self.starting_price;
        state.highest_bidder = None;
        state.bid_history.clear();
        self.end_time
            .store((now + self.duration).timestamp_millis(), Ordering::Release);
        self.active.store(true, Ordering::Release);

        self.snapshot_locked(&state, now)
    }

    /// 현재 상태의 스냅샷 생성
    pub fn snapshot(&self, now: DateTime<Utc>) -> ItemSnapshot {
        // 읽기 경로는 손상된 락이어도 내부 값을 그대로 읽는다
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        self.snapshot_locked(&state, now)
    }

    /// 입찰 이력 복사본 조회 (수락 순서)
    pub fn bid_history(&self) -> Vec<BidRecord> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.bid_history.clone()
    }

    fn snapshot_locked(&self, state: &BidState, now: DateTime<Utc>) -> ItemSnapshot {
        let end_time = self.end_time_millis();
        ItemSnapshot {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            starting_price: self.starting_price,
            current_bid: state.current_bid,
            highest_bidder: state.highest_bidder.clone(),
            image_url: self.image_url.clone(),
            end_time,
            is_active: self.is_active(),
            bid_count: state.bid_history.len(),
            time_remaining: (end_time - now.timestamp_millis()).max(0),
        }
    }

    /// 경합 테스트용. 상품 락을 잡은 채로 돌려준다
    #[cfg(test)]
    fn hold_lock_for_test(&self) -> std::sync::MutexGuard<'_, BidState> {
        self.state.lock().unwrap()
    }
}

// endregion: --- Auction Item
