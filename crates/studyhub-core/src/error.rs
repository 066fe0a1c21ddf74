//! StudyHub 핵심 에러 타입.
//!
//! - [`CoreError`]: 설정, 저장소, 직렬화 등 도메인 공통 에러.
//!   모든 어댑터 crate는 자체 에러 타입에서 `From<CoreError>`로 래핑한다.
//! - [`CallFailure`]: 업스트림 AI API 호출의 최종 실패. 재시도 가능 여부를
//!   종류별로 고정한 닫힌 집합이다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 로그 저장소 에러 (연결, 쿼리, 잠금)
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

/// 업스트림 호출 실패. 재시도 루프가 끝난 뒤 호출자에게 돌려주는 값.
///
/// 재시도 분류:
/// - `Network`, `RateLimited`, `Server` → 재시도 대상
/// - `Rejected`, `MalformedBody` → 즉시 종료
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallFailure {
    /// 연결 실패, DNS 실패, 타임아웃 등 전송 계층 예외
    #[error("네트워크 에러: {message}")]
    Network {
        /// 전송 계층 에러 메시지
        message: String,
    },

    /// 429 Too Many Requests
    #[error("요청 한도 초과 (429)")]
    RateLimited {
        /// 업스트림 응답 본문 (원문)
        body: String,
    },

    /// 5xx 서버 에러
    #[error("업스트림 서버 에러 ({status})")]
    Server {
        /// HTTP 상태 코드
        status: u16,
        /// 업스트림 응답 본문 (원문)
        body: String,
    },

    /// 429를 제외한 4xx 클라이언트 에러
    #[error("업스트림 요청 거부 ({status})")]
    Rejected {
        /// HTTP 상태 코드
        status: u16,
        /// 업스트림 응답 본문 (원문)
        body: String,
    },

    /// 2xx 응답이지만 본문을 기대한 형식으로 해석할 수 없음
    #[error("응답 본문 파싱 실패: {message}")]
    MalformedBody {
        /// 파서 에러 메시지
        message: String,
        /// 업스트림 응답 본문 (원문)
        body: String,
    },
}

impl CallFailure {
    /// HTTP 상태 코드로 실패 분류. 2xx는 호출하지 않는다.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 => CallFailure::RateLimited { body },
            s if s >= 500 => CallFailure::Server { status: s, body },
            s => CallFailure::Rejected { status: s, body },
        }
    }

    /// 재시도 가능한 실패인지 판별
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CallFailure::Network { .. } | CallFailure::RateLimited { .. } | CallFailure::Server { .. }
        )
    }

    /// 업스트림 HTTP 상태 코드 (전송 계층/파싱 실패는 None)
    pub fn status(&self) -> Option<u16> {
        match self {
            CallFailure::RateLimited { .. } => Some(429),
            CallFailure::Server { status, .. } | CallFailure::Rejected { status, .. } => {
                Some(*status)
            }
            CallFailure::Network { .. } | CallFailure::MalformedBody { .. } => None,
        }
    }

    /// 호출자에게 그대로 노출할 상세 정보.
    ///
    /// HTTP 실패는 업스트림 본문 원문, 그 외에는 에러 메시지.
    pub fn details(&self) -> String {
        match self {
            CallFailure::Network { message } => message.clone(),
            CallFailure::RateLimited { body }
            | CallFailure::Server { body, .. }
            | CallFailure::Rejected { body, .. } => body.clone(),
            CallFailure::MalformedBody { message, .. } => message.clone(),
        }
    }
}
