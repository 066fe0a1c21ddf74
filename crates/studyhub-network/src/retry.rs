//! 재시도 정책.
//!
//! k번째 재시도(k ≥ 1) 전 대기 시간은 `base_delay * k`로 선형 증가한다.
//! 기본값(재시도 3회, 1초)이면 시도 1은 즉시, 2는 1초, 3은 2초, 4는 3초 후.

use std::time::Duration;

use studyhub_core::config::RetryConfig;

/// 기본 재시도 횟수 (첫 시도 제외)
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// 기본 대기 시간 단위
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1_000);

/// k번째 재시도 전 대기 시간
pub fn backoff_delay(base: Duration, retry: u32) -> Duration {
    base.saturating_mul(retry)
}

/// 재시도 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 첫 시도 이후 추가 시도 횟수
    pub max_retries: u32,
    /// 대기 시간 단위
    pub base_delay: Duration,
    /// 전체 시퀀스 상한 (None이면 시도 횟수로만 제한)
    pub max_elapsed: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_elapsed: None,
        }
    }
}

impl RetryPolicy {
    /// 설정에서 정책 생성
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_elapsed: config.max_elapsed_ms.map(Duration::from_millis),
        }
    }

    /// 재시도 횟수 설정
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// 대기 시간 단위 설정
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// 전체 시퀀스 상한 설정
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = Some(max_elapsed);
        self
    }

    /// k번째 재시도 전 대기 시간
    pub fn delay_for(&self, retry: u32) -> Duration {
        backoff_delay(self.base_delay, retry)
    }

    /// 재시도 예산을 모두 쓸 때의 총 대기 시간
    #[cfg(test)]
    fn total_backoff(&self, max_retries: u32) -> Duration {
        (1..=max_retries).fold(Duration::ZERO, |acc, retry| {
            acc.saturating_add(self.delay_for(retry))
        })
    }

    /// 지금까지 `elapsed`가 지났을 때 `delay`만큼 더 기다려도 상한 안인지
    pub fn allows_wait(&self, elapsed: Duration, delay: Duration) -> bool {
        match self.max_elapsed {
            Some(limit) => elapsed.saturating_add(delay) <= limit,
            None => true,
        }
    }
}
