//! Mock 업스트림 모듈
//!
//! OpenAI 호환 `/chat/completions`를 흉내 내는 경량 axum 서버와,
//! 실제 어댑터(SQLite, 재시도 클라이언트)로 조립한 StudyHub 서버 기동 도우미.

#![allow(dead_code)]

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use studyhub_core::config::UpstreamConfig;
use studyhub_network::ai_client::OpenAiCompatibleClient;
use studyhub_network::retry::RetryPolicy;
use studyhub_storage::SqliteStorage;
use studyhub_web::{serve, AppState};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};

/// 업스트림이 돌려줄 응답 하나
#[derive(Debug, Clone)]
pub enum Scripted {
    /// 200 + 지정한 assistant 본문
    Reply(String),
    /// 지정 상태 코드 + 본문
    Fail(u16, String),
}

/// Mock 업스트림 상태
#[derive(Debug, Default)]
pub struct UpstreamState {
    script: Mutex<VecDeque<Scripted>>,
    /// 스크립트가 바닥났을 때 반복되는 응답
    fallback: Mutex<Option<Scripted>>,
    /// 수신한 요청 본문 (도착 순)
    requests: Mutex<Vec<Value>>,
}

/// Mock 업스트림 서버
pub struct MockUpstream {
    state: Arc<UpstreamState>,
    url: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockUpstream {
    /// 임의 포트에서 시작
    pub async fn start(script: Vec<Scripted>) -> Self {
        let state = Arc::new(UpstreamState {
            script: Mutex::new(script.into()),
            ..Default::default()
        });

        let app = Router::new()
            .route("/chat/completions", post(chat_completions))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            state,
            url: format!("http://{addr}"),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// 스크립트 소진 후 반복할 응답 지정
    pub fn repeat(self, response: Scripted) -> Self {
        *self.state.fallback.lock() = Some(response);
        self
    }

    /// 완성 엔드포인트 전체 URL
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.url)
    }

    /// 지금까지 받은 요청 수
    pub fn hits(&self) -> usize {
        self.state.requests.lock().len()
    }

    /// 마지막 요청 본문
    pub fn last_request(&self) -> Option<Value> {
        self.state.requests.lock().last().cloned()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn chat_completions(
    State(state): State<Arc<UpstreamState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.requests.lock().push(body);

    let next = state
        .script
        .lock()
        .pop_front()
        .or_else(|| state.fallback.lock().clone())
        .unwrap_or_else(|| Scripted::Fail(500, "script exhausted".to_string()));

    match next {
        Scripted::Reply(content) => (StatusCode::OK, Json(completion(&content))),
        Scripted::Fail(status, message) => (
            StatusCode::from_u16(status).unwrap(),
            Json(json!({ "error": { "message": message } })),
        ),
    }
}

/// OpenAI 호환 응답 본문
pub fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "model": "mock-model",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 8, "total_tokens": 20 }
    })
}

/// 테스트용 빠른 재시도 정책 (10ms, 20ms, 30ms)
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy::default()
        .with_max_retries(3)
        .with_base_delay(Duration::from_millis(10))
}

/// 실제 어댑터로 조립된 StudyHub 서버
pub struct RunningApp {
    pub base_url: String,
    pub storage: Arc<SqliteStorage>,
    shutdown_tx: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<Result<(), std::io::Error>>,
    _data_dir: TempDir,
}

impl RunningApp {
    /// 업스트림 엔드포인트를 가리키는 서버를 임의 포트에서 시작
    pub async fn start(endpoint: &str, policy: RetryPolicy) -> Self {
        let data_dir = TempDir::new().unwrap();
        let storage = Arc::new(SqliteStorage::open(&data_dir.path().join("studyhub.db")).unwrap());

        let upstream = UpstreamConfig {
            endpoint: endpoint.to_string(),
            api_key: "test-key".to_string(),
            request_timeout_ms: 5_000,
            ..Default::default()
        };
        let provider = Arc::new(OpenAiCompatibleClient::new(&upstream, policy).unwrap());
        let state = AppState::new(storage.clone(), provider);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(serve(listener, state, shutdown_rx));

        Self {
            base_url: format!("http://{addr}/api"),
            storage,
            shutdown_tx,
            handle,
            _data_dir: data_dir,
        }
    }

    /// `{base_url}{path}` URL
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// 종료 신호 후 서버 태스크 정상 종료 확인
    pub async fn shutdown(self) {
        self.shutdown_tx.send(true).unwrap();
        self.handle.await.unwrap().unwrap();
    }
}
