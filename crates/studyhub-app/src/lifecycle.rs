//! 서버 종료 조정.
//!
//! OS 종료 시그널을 받아 `watch` 채널로 웹 서버에 알린다. 웹 서버는
//! 진행 중인 요청(업스트림 재시도 포함)을 마친 뒤 끝난다.

use tokio::sync::watch;
use tracing::info;

/// 종료 신호 송신 측. 수신기는 [`LifecycleManager::subscribe`]로 나눠 준다.
pub struct LifecycleManager {
    shutdown_tx: watch::Sender<bool>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { shutdown_tx }
    }

    /// 웹 서버에 넘길 종료 수신기
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// 종료 신호 발송. 두 번째 호출부터는 아무 일도 하지 않는다.
    pub fn shutdown(&self) {
        let first = self.shutdown_tx.send_if_modified(|stopping| {
            let changed = !*stopping;
            *stopping = true;
            changed
        });
        if first {
            info!(subscribers = self.shutdown_tx.receiver_count(), "StudyHub 종료 시작");
        }
    }

    /// SIGINT/SIGTERM(Windows는 Ctrl+C)을 기다린 뒤 종료 신호 발송.
    /// 시그널 핸들러 등록 실패는 그대로 돌려준다.
    pub async fn wait_for_signal(&self) -> std::io::Result<()> {
        let received = received_signal().await?;
        info!(signal = received, "종료 시그널 수신");
        self.shutdown();
        Ok(())
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn received_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    })
}

#[cfg(not(unix))]
async fn received_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}
