//! 전체 스택 통합 테스트.
//!
//! HTTP 요청 → 핸들러 → 재시도 클라이언트 → mock 업스트림 → SQLite 기록 →
//! 지표/이력 조회까지 실제 어댑터로 검증한다.

mod mock_server;

use mock_server::{fast_policy, MockUpstream, RunningApp, Scripted};
use serde_json::{json, Value};
use studyhub_core::ports::kv_store::KvStore;

async fn post_json(client: &reqwest::Client, url: &str, body: Value) -> (u16, Value) {
    let resp = client.post(url).json(&body).send().await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

async fn get_json(client: &reqwest::Client, url: &str) -> (u16, Value) {
    let resp = client.get(url).send().await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn chat_success_is_logged_and_reported() {
    let upstream = MockUpstream::start(vec![Scripted::Reply("Photosynthesis converts light.".into())]).await;
    let app = RunningApp::start(&upstream.endpoint(), fast_policy()).await;
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        &app.url("/chat"),
        json!({ "message": "What is photosynthesis?", "subject": "Biology" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["response"], "Photosynthesis converts light.");
    assert_eq!(body["usage"]["total_tokens"], 20);
    assert!(body["conversationId"].as_str().unwrap().starts_with("conversation:"));

    // 업스트림 요청 형태
    let sent = upstream.last_request().unwrap();
    assert_eq!(sent["messages"][0]["role"], "system");
    assert!(sent["messages"][0]["content"].as_str().unwrap().contains("Biology"));
    assert_eq!(sent["messages"][1]["content"], "What is photosynthesis?");

    // 지표
    let (status, metrics) = get_json(&client, &app.url("/metrics")).await;
    assert_eq!(status, 200);
    assert_eq!(metrics["summary"]["Chat"]["totalCalls"], 1);
    assert_eq!(metrics["summary"]["Chat"]["successRate"], "100.00");
    assert_eq!(metrics["recentMetrics"][0]["endpoint"], "/chat/completions");
    assert_eq!(metrics["recentMetrics"][0]["success"], true);

    // 이력
    let (status, history) = get_json(&client, &app.url("/history?type=conversations")).await;
    assert_eq!(status, 200);
    let items = history["history"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["message"], "What is photosynthesis?");

    app.shutdown().await;
}

#[tokio::test]
async fn transient_failures_are_retried_into_one_success_metric() {
    let upstream = MockUpstream::start(vec![
        Scripted::Fail(503, "overloaded".into()),
        Scripted::Fail(500, "boom".into()),
        Scripted::Reply("ok".into()),
    ])
    .await;
    let app = RunningApp::start(&upstream.endpoint(), fast_policy()).await;
    let client = reqwest::Client::new();

    let (status, body) = post_json(&client, &app.url("/chat"), json!({ "message": "hi" })).await;

    assert_eq!(status, 200);
    assert_eq!(body["response"], "ok");
    assert_eq!(upstream.hits(), 3);

    let metrics = app.storage.get_by_prefix("api_metric:").await.unwrap();
    assert_eq!(metrics.len(), 1);
    assert_eq!(metrics[0]["success"], true);

    app.shutdown().await;
}

#[tokio::test]
async fn exhausted_retries_pass_status_through() {
    let upstream = MockUpstream::start(vec![])
        .await
        .repeat(Scripted::Fail(500, "upstream down".into()));
    let app = RunningApp::start(&upstream.endpoint(), fast_policy()).await;
    let client = reqwest::Client::new();

    let (status, body) = post_json(&client, &app.url("/chat"), json!({ "message": "hi" })).await;

    assert_eq!(status, 500);
    assert_eq!(body["error"], "Failed to get response from AI tutor");
    assert!(body["details"].as_str().unwrap().contains("upstream down"));
    // 첫 시도 + 재시도 3회
    assert_eq!(upstream.hits(), 4);

    let (_, metrics) = get_json(&client, &app.url("/metrics")).await;
    assert_eq!(metrics["summary"]["Chat"]["failedCalls"], 1);
    assert_eq!(metrics["summary"]["Chat"]["successRate"], "0.00");
    assert!(metrics["recentMetrics"][0]["errorMessage"]
        .as_str()
        .unwrap()
        .contains("upstream down"));

    // 실패한 대화는 기록되지 않는다
    let (_, history) = get_json(&client, &app.url("/history?type=conversations")).await;
    assert!(history["history"].as_array().unwrap().is_empty());

    app.shutdown().await;
}

#[tokio::test]
async fn flashcards_round_trip_through_history() {
    let generated = r#"```json
[{"question":"2+2?","answer":"4"},{"question":"3*3?","answer":"9"}]
```"#;
    let upstream = MockUpstream::start(vec![Scripted::Reply(generated.into())]).await;
    let app = RunningApp::start(&upstream.endpoint(), fast_policy()).await;
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        &app.url("/generate-flashcards"),
        json!({ "topic": "Arithmetic", "count": 2, "difficulty": "easy" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["flashcards"].as_array().unwrap().len(), 2);
    assert_eq!(body["flashcards"][1]["answer"], "9");
    assert!(body["flashcardSetId"]
        .as_str()
        .unwrap()
        .starts_with("flashcards:Arithmetic:"));

    let (_, history) = get_json(&client, &app.url("/history?type=flashcards")).await;
    assert_eq!(history["history"].as_array().unwrap().len(), 1);
    assert_eq!(history["history"][0]["topic"], "Arithmetic");

    let (_, metrics) = get_json(&client, &app.url("/metrics")).await;
    assert_eq!(metrics["summary"]["Flashcards"]["successfulCalls"], 1);

    app.shutdown().await;
}

#[tokio::test]
async fn image_analysis_uses_vision_model() {
    let upstream = MockUpstream::start(vec![Scripted::Reply("A labelled cell diagram.".into())]).await;
    let app = RunningApp::start(&upstream.endpoint(), fast_policy()).await;
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        &app.url("/analyze-image"),
        json!({ "imageBase64": "aGVsbG8=" }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["analysis"], "A labelled cell diagram.");

    let sent = upstream.last_request().unwrap();
    assert_eq!(sent["model"], "meta-llama/llama-4-scout-17b-16e-instruct");
    let parts = sent["messages"][0]["content"].as_array().unwrap();
    assert_eq!(parts[1]["image_url"]["url"], "data:image/jpeg;base64,aGVsbG8=");

    let (_, history) = get_json(&client, &app.url("/history?type=analyses")).await;
    assert_eq!(history["history"].as_array().unwrap().len(), 1);

    app.shutdown().await;
}

#[tokio::test]
async fn session_is_saved_without_upstream() {
    let upstream = MockUpstream::start(vec![]).await;
    let app = RunningApp::start(&upstream.endpoint(), fast_policy()).await;
    let client = reqwest::Client::new();

    let (status, body) = post_json(
        &client,
        &app.url("/save-session"),
        json!({ "sessionData": { "subject": "Math", "duration": 1800 } }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    let session_id = body["sessionId"].as_str().unwrap().to_string();
    assert!(session_id.starts_with("session:"));
    assert_eq!(upstream.hits(), 0);

    let stored = app.storage.get(&session_id).unwrap().unwrap();
    assert_eq!(stored["subject"], "Math");
    assert!(stored["timestamp"].is_i64());

    app.shutdown().await;
}
