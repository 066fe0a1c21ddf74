//! # studyhub-network
//!
//! 업스트림 AI API 네트워크 어댑터.
//! 선형 backoff 재시도 HTTP 클라이언트와 그 위에서 동작하는
//! OpenAI 호환 chat completion 클라이언트를 제공한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use studyhub_network::ai_client::OpenAiCompatibleClient;
//! use studyhub_network::retry::RetryPolicy;
//!
//! let policy = RetryPolicy::from_config(&config.retry);
//! let provider = OpenAiCompatibleClient::new(&config.upstream, policy)?;
//! ```

pub mod ai_client;
pub mod http_client;
pub mod retry;
