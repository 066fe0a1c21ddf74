//! 재시도 HTTP 클라이언트.
//!
//! 업스트림 호출 한 건을 [`HttpCall`]로 기술하고, [`RetryingHttpClient::execute`]가
//! 재시도 정책에 따라 최대 `max_retries + 1`회 시도한다.
//!
//! - 5xx, 429, 전송 계층 에러 → 대기 후 재시도
//! - 그 외 4xx, 2xx 본문 파싱 실패 → 즉시 종료
//! - 재시도 소진 시 마지막 시도의 실패를 그대로 반환

use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use studyhub_core::error::{CallFailure, CoreError};

use crate::retry::RetryPolicy;

pub use reqwest::Method;

/// 업스트림 호출 한 건의 기술
#[derive(Debug, Clone)]
pub struct HttpCall {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    bearer_token: Option<String>,
    body: Option<serde_json::Value>,
    max_retries: Option<u32>,
}

impl HttpCall {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            bearer_token: None,
            body: None,
            max_retries: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// 헤더 추가
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// `Authorization: Bearer` 헤더
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// JSON 본문
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// 이 호출에만 적용할 재시도 횟수
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }
}

/// 재시도 HTTP 클라이언트
///
/// 시도 1회의 타임아웃은 내부 `reqwest::Client`의 타임아웃이다.
#[derive(Debug, Clone)]
pub struct RetryingHttpClient {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl RetryingHttpClient {
    /// 시도당 타임아웃과 재시도 정책으로 생성
    pub fn new(timeout: Duration, policy: RetryPolicy) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Config(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self::with_client(client, policy))
    }

    /// 이미 구성된 `reqwest::Client` 사용
    pub fn with_client(client: reqwest::Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// 호출 실행. 성공 시 2xx 본문을 `T`로 파싱해 반환한다.
    pub async fn execute<T: DeserializeOwned>(&self, call: &HttpCall) -> Result<T, CallFailure> {
        let budget = call.max_retries.unwrap_or(self.policy.max_retries);
        let started = Instant::now();

        let mut outcome = self.attempt::<T>(call).await;
        let mut retries_used = 0;

        for retry in 1..=budget {
            let failure = match &outcome {
                Ok(_) => break,
                Err(failure) if !failure.is_retryable() => break,
                Err(failure) => failure,
            };

            let delay = self.policy.delay_for(retry);
            if !self.policy.allows_wait(started.elapsed(), delay) {
                warn!(
                    url = %call.url,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "재시도 시간 상한 도달, 중단"
                );
                break;
            }

            warn!(
                method = %call.method,
                url = %call.url,
                retry,
                budget,
                delay_ms = delay.as_millis() as u64,
                "업스트림 호출 실패: {failure}, 재시도 예정"
            );

            tokio::time::sleep(delay).await;
            retries_used = retry;
            outcome = self.attempt::<T>(call).await;
        }

        match &outcome {
            Ok(_) => debug!(url = %call.url, retries = retries_used, "업스트림 호출 성공"),
            Err(failure) if failure.is_retryable() => error!(
                url = %call.url,
                attempts = retries_used + 1,
                "업스트림 호출 최종 실패: {failure}"
            ),
            Err(failure) => warn!(
                url = %call.url,
                attempts = retries_used + 1,
                "업스트림 호출 실패 (재시도 불가): {failure}"
            ),
        }

        outcome
    }

    /// 시도 1회
    async fn attempt<T: DeserializeOwned>(&self, call: &HttpCall) -> Result<T, CallFailure> {
        let mut request = self.client.request(call.method.clone(), &call.url);
        for (name, value) in &call.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(token) = &call.bearer_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &call.body {
            request = request.json(body);
        }

        let resp = request.send().await.map_err(|e| CallFailure::Network {
            message: e.to_string(),
        })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| CallFailure::Network {
            message: format!("응답 본문 읽기 실패: {e}"),
        })?;

        if !status.is_success() {
            return Err(CallFailure::from_status(status.as_u16(), text));
        }

        serde_json::from_str(&text).map_err(|e| CallFailure::MalformedBody {
            message: e.to_string(),
            body: text,
        })
    }
}
