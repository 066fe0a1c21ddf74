//! 애플리케이션 설정 구조체.
//!
//! 웹 서버, 업스트림 AI API, 재시도 정책, 로그 저장소 경로 등 런타임 설정을
//! 정의한다. [`crate::config_manager::ConfigManager`]를 통해 JSON 파일에서 로드.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 웹 서버 설정
    #[serde(default)]
    pub web: WebConfig,
    /// 업스트림 AI API 설정
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// 재시도 정책
    #[serde(default)]
    pub retry: RetryConfig,
    /// 로그 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
}

// ============================================================
// 웹 서버 설정
// ============================================================

/// 웹 서버 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// 웹 서버 포트 (기본: 8787)
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// 외부 접근 허용 여부 (false: 127.0.0.1 only)
    #[serde(default)]
    pub allow_external: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_web_port(),
            allow_external: false,
        }
    }
}

// ============================================================
// 업스트림 AI API 설정
// ============================================================

/// OpenAI 호환 업스트림 API 설정
///
/// API 키는 설정 파일 또는 환경 변수(`STUDYHUB_API_KEY`, `GROQ_API_KEY`)로
/// 주입한다. 소스에 기본 키를 두지 않는다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// chat completion 엔드포인트 URL
    #[serde(default = "default_upstream_endpoint")]
    pub endpoint: String,
    /// API 키
    #[serde(default)]
    pub api_key: String,
    /// 대화/플래시카드 모델
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    /// 이미지 분석 모델
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    /// 시도 1회당 요청 타임아웃 (밀리초)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: default_upstream_endpoint(),
            api_key: String::new(),
            chat_model: default_chat_model(),
            vision_model: default_vision_model(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

// ============================================================
// 재시도 정책 설정
// ============================================================

/// 재시도 정책 설정
///
/// k번째 재시도 전 대기 시간 = `base_delay_ms * k`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// 첫 시도 이후 추가 시도 횟수
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// 기본 대기 시간 (밀리초)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// 전체 재시도 시퀀스 상한 (밀리초). None이면 시도 횟수로만 제한.
    #[serde(default)]
    pub max_elapsed_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_elapsed_ms: None,
        }
    }
}

// ============================================================
// 저장소 설정
// ============================================================

/// 로그 저장소 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite DB 파일 경로 (None이면 플랫폼 기본 경로)
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 시도 1회당 요청 타임아웃
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream.request_timeout_ms)
    }

    /// 재시도 기본 대기 시간
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry.base_delay_ms)
    }

    /// 설정값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.upstream.endpoint.trim().is_empty() {
            return Err(CoreError::Validation {
                field: "upstream.endpoint".to_string(),
                message: "엔드포인트가 비어 있음".to_string(),
            });
        }
        if self.upstream.request_timeout_ms == 0 {
            return Err(CoreError::Validation {
                field: "upstream.request_timeout_ms".to_string(),
                message: "0보다 커야 함".to_string(),
            });
        }
        if self.web.port == 0 {
            return Err(CoreError::Validation {
                field: "web.port".to_string(),
                message: "0보다 커야 함".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_web_port() -> u16 {
    8787
}
fn default_upstream_endpoint() -> String {
    "https://api.groq.com/openai/v1/chat/completions".to_string()
}
fn default_chat_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}
fn default_vision_model() -> String {
    "meta-llama/llama-4-scout-17b-16e-instruct".to_string()
}
fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_max_retries() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1_000
}
