use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 수락된 입찰이 만든 상태 전이
/// 입찰 성공 페이로드이자 방송 이벤트의 본문으로 쓰인다.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BidTransition {
    pub item_id: String,
    pub current_bid: i64,
    pub highest_bidder: String,
    pub previous_bidder: Option<String>,
    pub previous_bid: i64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

/// 경매 종료 이벤트
/// 에포크당 정확히 한 번 관측된다.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuctionEnd {
    pub item_id: String,
    pub final_bid: i64,
    pub winner: Option<String>,
}
