//! Assistant tests
//!
//! Runs the completion client against a local fake of the OpenAI-compatible endpoint.

use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::routing::post;
use axum::{Json, Router};
use di::Ref;
use lead_intake_bot::core::assistant::{API_ERROR_REPLY, CALL_FAILED_REPLY, GrokAssistant};
use lead_intake_bot::core::configuration::{
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_SYSTEM_PROMPT, KEY_MODEL, KEY_TEMPERATURE,
    SettingsTable, StaticConfigurationSource,
};
use lead_intake_bot::core::traits::{Assistant, ConfigurationSource, DependencyError};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct Captured {
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

async fn completions(
    State(captured): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    captured.requests.lock().unwrap().push((auth, body));

    Json(json!({
        "id": "cmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": "Мы делаем CRM."}}]
    }))
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/v1")
}

/// Configuration source whose backing store can't be reached.
struct UnreachableSource;

#[async_trait]
impl ConfigurationSource for UnreachableSource {
    async fn fetch_prompt(&self) -> Result<String, DependencyError> {
        Err(DependencyError::Unavailable("connection refused".to_owned()))
    }

    async fn fetch_settings(&self) -> Result<SettingsTable, DependencyError> {
        Err(DependencyError::Unavailable("connection refused".to_owned()))
    }
}

/// Configuration source with a custom prompt and a partially valid table.
struct TableSource;

#[async_trait]
impl ConfigurationSource for TableSource {
    async fn fetch_prompt(&self) -> Result<String, DependencyError> {
        Ok("Отвечай как пират.".to_owned())
    }

    async fn fetch_settings(&self) -> Result<SettingsTable, DependencyError> {
        Ok(SettingsTable::from([
            (KEY_MODEL.to_owned(), "grok-2".to_owned()),
            (KEY_TEMPERATURE.to_owned(), "warm".to_owned()),
        ]))
    }
}

#[tokio::test]
async fn test_answer_sends_prompt_question_and_key() {
    let captured = Captured::default();
    let base = serve(
        Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(captured.clone()),
    )
    .await;
    let assistant = GrokAssistant::new(&base, "xai-secret", Ref::new(StaticConfigurationSource));

    let answer = assistant.answer("Что вы делаете?").await;
    assert_eq!(answer, "Мы делаем CRM.");

    let requests = captured.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer xai-secret"));
    assert_eq!(body["stream"], false);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], DEFAULT_SYSTEM_PROMPT);
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["messages"][1]["content"], "Что вы делаете?");
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unavailable_configuration_uses_defaults() {
    let captured = Captured::default();
    let base = serve(
        Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(captured.clone()),
    )
    .await;
    let assistant = GrokAssistant::new(&base, "key", Ref::new(UnreachableSource));

    assert_eq!(assistant.answer("Привет").await, "Мы делаем CRM.");

    let requests = captured.requests.lock().unwrap();
    let body = &requests[0].1;
    assert_eq!(body["model"], DEFAULT_MODEL);
    assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
    assert_eq!(body["messages"][0]["content"], DEFAULT_SYSTEM_PROMPT);
}

#[tokio::test]
async fn test_configuration_is_read_for_every_question() {
    let captured = Captured::default();
    let base = serve(
        Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(captured.clone()),
    )
    .await;
    let assistant = GrokAssistant::new(&base, "key", Ref::new(TableSource));

    assistant.answer("first").await;
    assistant.answer("second").await;

    let requests = captured.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    for (_, body) in requests.iter() {
        assert_eq!(body["model"], "grok-2");
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(body["messages"][0]["content"], "Отвечай как пират.");
    }
}

#[tokio::test]
async fn test_error_status_gives_apology() {
    let base = serve(Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
    ))
    .await;
    let assistant = GrokAssistant::new(&base, "key", Ref::new(StaticConfigurationSource));

    assert_eq!(assistant.answer("Привет").await, API_ERROR_REPLY);
}

#[tokio::test]
async fn test_unauthorized_gives_apology() {
    let base = serve(Router::new().route(
        "/v1/chat/completions",
        post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
    ))
    .await;
    let assistant = GrokAssistant::new(&base, "wrong", Ref::new(StaticConfigurationSource));

    assert_eq!(assistant.answer("Привет").await, API_ERROR_REPLY);
}

#[tokio::test]
async fn test_empty_choices_gives_call_failure() {
    let base = serve(Router::new().route(
        "/v1/chat/completions",
        post(|| async { Json(json!({"choices": []})) }),
    ))
    .await;
    let assistant = GrokAssistant::new(&base, "key", Ref::new(StaticConfigurationSource));

    assert_eq!(assistant.answer("Привет").await, CALL_FAILED_REPLY);
}

#[tokio::test]
async fn test_unreachable_api_gives_call_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let assistant = GrokAssistant::new(
        &format!("http://{addr}/v1"),
        "key",
        Ref::new(StaticConfigurationSource),
    );

    assert_eq!(assistant.answer("Привет").await, CALL_FAILED_REPLY);
}
