// region:    --- Imports
use auction_platform::clock::SystemClock;
use auction_platform::handlers;
use auction_platform::registry::AuctionRegistry;
use auction_platform::scheduler::AuctionScheduler;
use auction_platform::seed;
use auction_platform::socket::SocketHub;
use axum::http::{header, HeaderValue, Method};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    handlers::mark_started();

    // 환경 설정 (기본값: 로컬 데모)
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(5000);
    let cors_origin =
        std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

    // 소켓 허브 생성 (알림 싱크 겸 전달 계층)
    let hub = Arc::new(SocketHub::new());

    // 레지스트리 생성 (시드 + 시계 + 싱크 주입)
    let registry = Arc::new(AuctionRegistry::new(
        seed::sample_items(),
        Arc::new(SystemClock),
        hub.clone(),
    ));
    info!(
        "{:<12} --> 경매 상품 {}개 준비 완료",
        "Main",
        registry.len()
    );

    // 수명 주기 모니터 시작
    let scheduler = AuctionScheduler::new(Arc::clone(&registry)).start();

    // 테스트 페이지를 위한 cors 설정
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true),
        Err(_) => {
            warn!(
                "{:<12} --> CORS_ORIGIN 해석 실패, 모든 출처 허용: {}",
                "Main", cors_origin
            );
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    };

    // 라우터 설정
    let routes_all = handlers::routes((Arc::clone(&registry), Arc::clone(&hub))).layer(cors);

    // 리스너 생성
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행 (종료 시그널 수신 시 정상 종료)
    if let Err(err) = axum::serve(listener, routes_all.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("{:<12} --> Server error: {}", "Main", err);
    }

    // 수명 주기 모니터 중지
    scheduler.shutdown().await;
    info!("{:<12} --> 서버 종료 완료", "Main");
    Ok(())
}

/// 종료 시그널 대기
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("{:<12} --> 종료 시그널 수신 실패: {}", "Main", e);
    }
}
// endregion: --- Main
