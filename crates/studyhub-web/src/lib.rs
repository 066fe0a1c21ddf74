//! # studyhub-web
//!
//! 학습 도우미 백엔드 HTTP 서버.
//! Axum 기반 REST API.
//!
//! ## 기능
//! - AI 튜터 대화, 이미지 분석, 플래시카드 생성 (업스트림 AI 호출 + 호출 지표 기록)
//! - 호출 성능 지표 조회
//! - 학습 이력 조회, 학습 세션 저장

pub mod error;
pub mod handlers;
pub mod routes;

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use studyhub_core::config::WebConfig;
use studyhub_core::ports::completion::CompletionProvider;
use studyhub_core::ports::kv_store::KvStore;
use studyhub_metrics::{MetricsAggregator, MetricsRecorder};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// 포트 바인드 최대 시도 횟수
const MAX_PORT_ATTEMPTS: u16 = 10;

/// 웹 서버 애플리케이션 상태
#[derive(Clone)]
pub struct AppState {
    /// 키-값 로그 저장소
    pub store: Arc<dyn KvStore>,
    /// 업스트림 AI 제공자
    pub provider: Arc<dyn CompletionProvider>,
    /// 호출 지표 기록기
    pub recorder: MetricsRecorder,
    /// 호출 지표 집계기
    pub aggregator: MetricsAggregator,
}

impl AppState {
    /// 저장소와 제공자로 상태 구성. 기록기/집계기는 같은 저장소를 쓴다.
    pub fn new(store: Arc<dyn KvStore>, provider: Arc<dyn CompletionProvider>) -> Self {
        Self {
            recorder: MetricsRecorder::new(store.clone()),
            aggregator: MetricsAggregator::new(store.clone()),
            store,
            provider,
        }
    }
}

/// 라우터 구성 (CORS 전체 허용 + 요청 트레이스)
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// HTTP 서버
pub struct WebServer {
    config: WebConfig,
    state: AppState,
}

impl WebServer {
    /// 새 웹 서버 생성
    pub fn new(state: AppState, config: WebConfig) -> Self {
        Self { config, state }
    }

    /// 서버 실행
    ///
    /// 기본 포트에서 시작하여, 포트가 이미 사용 중이면 다음 포트를 시도한다.
    /// 최대 10개 포트를 시도한 후 실패하면 에러를 반환한다.
    pub async fn run(self, shutdown_rx: watch::Receiver<bool>) -> Result<(), std::io::Error> {
        let (listener, addr) = self.bind().await?;
        info!("StudyHub 서버 시작: http://{}", addr);
        serve(listener, self.state, shutdown_rx).await
    }

    /// 포트 바인드 (AddrInUse면 다음 포트)
    pub async fn bind(&self) -> Result<(TcpListener, SocketAddr), std::io::Error> {
        let host = if self.config.allow_external {
            "0.0.0.0"
        } else {
            "127.0.0.1"
        };

        let base_port = self.config.port;
        let mut last_error = None;

        let ports = candidate_ports(base_port);
        let last_port = ports.last().copied().unwrap_or(base_port);

        for (attempt, port) in ports.into_iter().enumerate() {
            let addr: SocketAddr = match format!("{}:{}", host, port).parse() {
                Ok(a) => a,
                Err(e) => {
                    error!("잘못된 주소 {}:{}: {}", host, port, e);
                    continue;
                }
            };

            match TcpListener::bind(addr).await {
                Ok(listener) => {
                    if attempt > 0 {
                        warn!("포트 {} 사용 불가, 대체 포트 {} 사용", base_port, port);
                    }
                    let local = listener.local_addr().unwrap_or(addr);
                    return Ok((listener, local));
                }
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                    warn!("포트 {} 이미 사용 중, 다음 포트 시도...", port);
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                format!(
                    "포트 {}-{} 모두 사용 불가",
                    base_port, last_port
                ),
            )
        }))
    }

    /// 서버 URL 반환
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.config.port)
    }
}

/// 바인드를 시도할 포트 목록. `u16::MAX`를 넘는 포트는 만들지 않는다.
fn candidate_ports(base_port: u16) -> Vec<u16> {
    (0..MAX_PORT_ATTEMPTS)
        .map_while(|attempt| base_port.checked_add(attempt))
        .collect()
}

/// 이미 바인드된 리스너로 서버 실행. 종료 신호를 받으면 진행 중 요청을 마치고 끝난다.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move {
            loop {
                if *shutdown_rx.borrow() {
                    info!("웹 서버 종료 신호 수신");
                    break;
                }
                if shutdown_rx.changed().await.is_err() {
                    break;
                }
            }
        })
        .await?;

    info!("StudyHub 서버 종료");
    Ok(())
}
