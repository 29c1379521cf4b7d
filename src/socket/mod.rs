/// 실시간 입찰 소켓 계층
/// 코어의 알림 싱크 호출을 웹소켓 와이어 메시지로 바꿔 전달한다.
/// 방송 채널 하나와 접속자별 직접 채널로 수신 대상을 구분한다.
// region:    --- Imports
use crate::auction::events::{AuctionEnd, BidTransition};
use crate::auction::item::ItemSnapshot;
use crate::bidding::commands::{handle_place_bid, PlaceBidCommand};
use crate::bidding::model::BidError;
use crate::clock::Clock;
use crate::notifier::NotificationSink;
use crate::query;
use crate::registry::AuctionRegistry;
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
// endregion: --- Imports

// region:    --- Wire Messages

/// 서버 → 클라이언트 메시지
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerMessage {
    /// 접속 직후 전체 상태 전송
    #[serde(rename_all = "camelCase")]
    InitialData {
        items: Vec<ItemSnapshot>,
        server_time: i64,
        user_id: String,
    },
    /// 수락된 입찰 방송
    #[serde(rename_all = "camelCase")]
    UpdateBid {
        item_id: String,
        current_bid: i64,
        highest_bidder: String,
        previous_bidder: Option<String>,
        timestamp: i64,
    },
    /// 입찰자 본인에게만 가는 성공 확인
    #[serde(rename_all = "camelCase")]
    BidSuccess {
        item_id: String,
        current_bid: i64,
        message: String,
    },
    /// 요청자에게만 가는 거절 통지
    #[serde(rename_all = "camelCase")]
    BidError {
        item_id: Option<String>,
        error: String,
        message: String,
    },
    /// 밀려난 입찰자에게만 가는 통지
    #[serde(rename_all = "camelCase")]
    Outbid {
        item_id: String,
        current_bid: i64,
        your_bid: i64,
        message: String,
    },
    /// 경매 종료 방송
    #[serde(rename_all = "camelCase")]
    AuctionEnded {
        item_id: String,
        final_bid: i64,
        winner: Option<String>,
    },
    /// 시간 동기화 응답
    #[serde(rename_all = "camelCase")]
    TimeSync { server_time: i64 },
}

/// 클라이언트 → 서버 메시지
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// 입찰 요청. 금액 형식은 경계에서 검증하므로 원시 JSON 값으로 받는다.
    #[serde(rename_all = "camelCase")]
    BidPlaced {
        item_id: String,
        bid_amount: serde_json::Value,
    },
    RequestSync,
}

// endregion: --- Wire Messages

// region:    --- Socket Hub

type DirectLane = mpsc::UnboundedSender<ServerMessage>;

/// 웹소켓 허브
///
/// 방송 채널 하나(모든 접속자)와 사용자별 직접 채널을 관리하며,
/// 코어에는 알림 싱크로 주입된다.
pub struct SocketHub {
    broadcast_tx: broadcast::Sender<ServerMessage>,
    sessions: Mutex<HashMap<String, DirectLane>>,
    next_session: AtomicU64,
}

impl SocketHub {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(256);
        Self {
            broadcast_tx,
            sessions: Mutex::new(HashMap::new()),
            next_session: AtomicU64::new(1),
        }
    }

    /// 새 세션 등록. 부여된 사용자 id와 수신 채널들을 돌려준다
    pub fn register(
        &self,
    ) -> (
        String,
        broadcast::Receiver<ServerMessage>,
        mpsc::UnboundedReceiver<ServerMessage>,
    ) {
        let user_id = format!("user-{}", self.next_session.fetch_add(1, Ordering::Relaxed));
        let (direct_tx, direct_rx) = mpsc::unbounded_channel();
        self.lock_sessions().insert(user_id.clone(), direct_tx);
        (user_id, self.broadcast_tx.subscribe(), direct_rx)
    }

    /// 세션 해제
    pub fn unregister(&self, user_id: &str) {
        self.lock_sessions().remove(user_id);
    }

    /// 접속 세션 수
    pub fn session_count(&self) -> usize {
        self.lock_sessions().len()
    }

    /// 모든 접속자에게 방송
    pub fn broadcast(&self, message: ServerMessage) {
        // 수신자가 없으면 전송이 실패하지만 오류는 아니다
        let _ = self.broadcast_tx.send(message);
    }

    /// 특정 사용자에게만 전송
    pub fn send_to(&self, user_id: &str, message: ServerMessage) {
        if let Some(lane) = self.lock_sessions().get(user_id) {
            if lane.send(message).is_err() {
                debug!("{:<12} --> 이미 끊어진 세션: {}", "Socket", user_id);
            }
        }
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<String, DirectLane>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SocketHub {
    fn default() -> Self {
        Self::new()
    }
}

/// 허브를 코어의 알림 싱크로 노출
#[async_trait]
impl NotificationSink for SocketHub {
    async fn on_bid_accepted(&self, transition: &BidTransition) {
        self.broadcast(ServerMessage::UpdateBid {
            item_id: transition.item_id.clone(),
            current_bid: transition.current_bid,
            highest_bidder: transition.highest_bidder.clone(),
            previous_bidder: transition.previous_bidder.clone(),
            timestamp: transition.timestamp.timestamp_millis(),
        });
    }

    async fn on_bid_rejected(&self, requester_id: &str, item_id: &str, error: &BidError) {
        self.send_to(
            requester_id,
            ServerMessage::BidError {
                item_id: Some(item_id.to_string()),
                error: error.code().to_string(),
                message: error.to_string(),
            },
        );
    }

    async fn on_outbid(
        &self,
        previous_bidder: &str,
        item_id: &str,
        current_bid: i64,
        previous_bid: i64,
    ) {
        self.send_to(
            previous_bidder,
            ServerMessage::Outbid {
                item_id: item_id.to_string(),
                current_bid,
                your_bid: previous_bid,
                message: "상위 입찰이 들어왔습니다".to_string(),
            },
        );
    }

    async fn on_auction_ended(&self, end: &AuctionEnd) {
        self.broadcast(ServerMessage::AuctionEnded {
            item_id: end.item_id.clone(),
            final_bid: end.final_bid,
            winner: end.winner.clone(),
        });
    }
}

// endregion: --- Socket Hub

// region:    --- WebSocket Handler

/// 웹소켓 업그레이드 핸들러
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State((registry, hub)): State<(Arc<AuctionRegistry>, Arc<SocketHub>)>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, registry, hub))
}

/// 접속 세션 처리
async fn handle_socket(socket: WebSocket, registry: Arc<AuctionRegistry>, hub: Arc<SocketHub>) {
    let (user_id, broadcast_rx, direct_rx) = hub.register();
    info!("{:<12} --> 클라이언트 접속: {}", "Socket", user_id);

    let (mut sender, receiver) = socket.split();

    // 접속 직후 전체 상태 전송
    let initial = ServerMessage::InitialData {
        items: query::handlers::get_all_items(&registry),
        server_time: registry.clock().now().timestamp_millis(),
        user_id: user_id.clone(),
    };
    if send_json(&mut sender, &initial).await.is_err() {
        hub.unregister(&user_id);
        return;
    }

    // 방송/직접 채널을 소켓으로 중계하는 송신 태스크
    let send_task = tokio::spawn(relay_outgoing(sender, broadcast_rx, direct_rx));

    // 수신 루프
    receive_incoming(receiver, &user_id, &registry, &hub).await;

    info!("{:<12} --> 클라이언트 종료: {}", "Socket", user_id);
    hub.unregister(&user_id);
    send_task.abort();
}

/// 방송 채널과 직접 채널을 하나의 소켓으로 중계한다
async fn relay_outgoing(
    mut sender: SplitSink<WebSocket, Message>,
    mut broadcast_rx: broadcast::Receiver<ServerMessage>,
    mut direct_rx: mpsc::UnboundedReceiver<ServerMessage>,
) {
    loop {
        let message = tokio::select! {
            direct = direct_rx.recv() => match direct {
                Some(message) => message,
                None => break,
            },
            outgoing = broadcast_rx.recv() => match outgoing {
                Ok(message) => message,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("{:<12} --> 방송 {}건 유실", "Socket", skipped);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        };

        if send_json(&mut sender, &message).await.is_err() {
            break;
        }
    }
}

/// 클라이언트 프레임 수신 루프
async fn receive_incoming(
    mut receiver: SplitStream<WebSocket>,
    user_id: &str,
    registry: &AuctionRegistry,
    hub: &SocketHub,
) {
    while let Some(Ok(frame)) = receiver.next().await {
        match frame {
            Message::Text(text) => handle_client_message(&text, user_id, registry, hub).await,
            Message::Close(_) => break,
            _ => {}
        }
    }
}

/// 클라이언트 메시지 한 건 처리
async fn handle_client_message(
    text: &str,
    user_id: &str,
    registry: &AuctionRegistry,
    hub: &SocketHub,
) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            debug!("{:<12} --> 해석할 수 없는 메시지: {}", "Socket", e);
            hub.send_to(user_id, invalid_input_error(None));
            return;
        }
    };

    match message {
        ClientMessage::BidPlaced {
            item_id,
            bid_amount,
        } => {
            // 금액은 코어 호출 전에 경계에서 검증한다
            let Some(amount) = bid_amount.as_i64().filter(|amount| *amount > 0) else {
                hub.send_to(user_id, invalid_input_error(Some(item_id)));
                return;
            };

            let cmd = PlaceBidCommand {
                item_id,
                bidder_id: user_id.to_string(),
                amount,
            };

            // 거절 통지는 코어가 싱크를 통해 요청자에게 전달한다
            if let Ok(transition) = handle_place_bid(cmd, registry).await {
                hub.send_to(
                    user_id,
                    ServerMessage::BidSuccess {
                        item_id: transition.item_id,
                        current_bid: transition.current_bid,
                        message: "입찰이 성공적으로 처리되었습니다".to_string(),
                    },
                );
            }
        }
        ClientMessage::RequestSync => {
            hub.send_to(
                user_id,
                ServerMessage::TimeSync {
                    server_time: registry.clock().now().timestamp_millis(),
                },
            );
        }
    }
}

fn invalid_input_error(item_id: Option<String>) -> ServerMessage {
    ServerMessage::BidError {
        item_id,
        error: BidError::InvalidInput.code().to_string(),
        message: BidError::InvalidInput.to_string(),
    }
}

/// 직렬화 후 텍스트 프레임으로 전송
async fn send_json(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let payload = serde_json::to_string(message).map_err(axum::Error::new)?;
    sender.send(Message::Text(payload)).await
}

// endregion: --- WebSocket Handler
