//! # studyhub-app
//!
//! StudyHub 백엔드 바이너리 진입점.
//! 설정 로드, DI 와이어링, 라이프사이클 관리.

mod lifecycle;
mod wiring;

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use studyhub_core::config_manager::ConfigManager;
use studyhub_web::WebServer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::lifecycle::LifecycleManager;

/// StudyHub 학습 도우미 백엔드
#[derive(Parser, Debug)]
#[command(name = "studyhub")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 웹 서버 포트 (기본: 설정 파일, 8787)
    #[arg(long, short = 'p')]
    port: Option<u16>,

    /// 데이터 저장 경로 (기본: 플랫폼 데이터 디렉토리)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

/// tracing 초기화. `RUST_LOG`가 있으면 그쪽이 우선한다.
fn init_tracing(log_level: &str) {
    let log_filter = [
        "studyhub",
        "studyhub_app",
        "studyhub_core",
        "studyhub_network",
        "studyhub_storage",
        "studyhub_metrics",
        "studyhub_web",
        "tower_http",
    ]
    .iter()
    .map(|target| format!("{target}={log_level}"))
    .collect::<Vec<_>>()
    .join(",");

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    info!("StudyHub 서버 시작 준비");

    // 설정 로드
    let config_manager = match &args.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    }
    .map_err(|e| anyhow!("설정 로드 실패: {e}"))?;
    info!("설정 파일: {}", config_manager.config_path().display());

    let mut config = config_manager.get();
    wiring::apply_port_override(&mut config, args.port);
    wiring::apply_env_api_key(&mut config, |name| std::env::var(name).ok());

    // ── 어댑터 생성 (DI 와이어링) ──
    let db_path = wiring::resolve_db_path(&config, args.data_dir.as_deref())?;
    let state = wiring::build_state(&config, &db_path)?;

    let lifecycle = LifecycleManager::new();
    let server = WebServer::new(state, config.web.clone());
    info!("서버 주소: {}", server.url());

    let mut server_handle = tokio::spawn(server.run(lifecycle.subscribe()));

    tokio::select! {
        result = &mut server_handle => {
            // 시그널 전에 서버가 끝났다면 바인드 실패 등 오류
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(anyhow!("웹 서버 실행 실패: {e}")),
                Err(e) => Err(anyhow!("웹 서버 태스크 실패: {e}")),
            };
        }
        signal = lifecycle.wait_for_signal() => {
            if let Err(e) = signal {
                error!("시그널 핸들러 등록 실패: {e}");
                lifecycle.shutdown();
            }
        }
    }

    match server_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("웹 서버 종료 중 오류: {e}"),
        Err(e) => error!("웹 서버 태스크 실패: {e}"),
    }

    info!("StudyHub 서버 종료");
    Ok(())
}
