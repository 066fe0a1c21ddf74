//! API 라우트 정의.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::AppState;

/// API 라우트 생성 (`/api` 아래에 중첩)
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        // AI 기능
        .route("/chat", post(handlers::chat::chat))
        .route("/analyze-image", post(handlers::vision::analyze_image))
        .route(
            "/generate-flashcards",
            post(handlers::flashcards::generate_flashcards),
        )
        // 호출 지표
        .route("/metrics", get(handlers::metrics::get_metrics))
        // 학습 기록
        .route("/history", get(handlers::history::get_history))
        .route("/save-session", post(handlers::session::save_session))
}
