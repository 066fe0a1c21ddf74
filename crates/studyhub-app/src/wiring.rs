//! 설정 오버라이드와 어댑터 조립 (DI 와이어링).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use studyhub_core::config::AppConfig;
use studyhub_core::config_manager::ConfigManager;
use studyhub_network::ai_client::OpenAiCompatibleClient;
use studyhub_network::retry::RetryPolicy;
use studyhub_storage::SqliteStorage;
use studyhub_web::AppState;

/// API 키 환경 변수 (앞쪽이 우선)
pub const API_KEY_ENV_VARS: [&str; 2] = ["STUDYHUB_API_KEY", "GROQ_API_KEY"];

/// 기본 DB 파일 이름
pub const DB_FILE_NAME: &str = "studyhub.db";

/// CLI 포트 오버라이드
pub fn apply_port_override(config: &mut AppConfig, port: Option<u16>) {
    if let Some(port) = port {
        config.web.port = port;
    }
}

/// 환경 변수의 API 키가 있으면 설정 파일 값보다 우선한다.
pub fn apply_env_api_key<F>(config: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let from_env = API_KEY_ENV_VARS.iter().find_map(|name| {
        lookup(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(|value| (*name, value))
    });

    if let Some((name, key)) = from_env {
        info!("업스트림 API 키: 환경 변수 {name} 사용");
        config.upstream.api_key = key;
    }
}

/// DB 경로 결정: `--data-dir` > 설정 파일 `storage.db_path` > 플랫폼 데이터 디렉토리
pub fn resolve_db_path(config: &AppConfig, data_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = data_dir {
        return Ok(dir.join(DB_FILE_NAME));
    }
    if let Some(path) = &config.storage.db_path {
        return Ok(path.clone());
    }
    let dir = ConfigManager::data_dir().context("데이터 디렉토리 결정 실패")?;
    Ok(dir.join(DB_FILE_NAME))
}

/// 저장소, AI 제공자, 지표 기록기/집계기를 조립해 서버 상태를 만든다.
pub fn build_state(config: &AppConfig, db_path: &Path) -> Result<AppState> {
    config.validate().context("설정 검증 실패")?;

    let storage = Arc::new(
        SqliteStorage::open(db_path)
            .with_context(|| format!("저장소 열기 실패: {}", db_path.display()))?,
    );

    let policy = RetryPolicy::from_config(&config.retry);
    let provider = Arc::new(
        OpenAiCompatibleClient::new(&config.upstream, policy).context("AI 클라이언트 생성 실패")?,
    );

    info!(
        db = %db_path.display(),
        endpoint = %config.upstream.endpoint,
        max_retries = policy.max_retries,
        base_delay_ms = policy.base_delay.as_millis() as u64,
        "어댑터 조립 완료"
    );

    Ok(AppState::new(storage, provider))
}
