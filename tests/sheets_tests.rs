//! Spreadsheet configuration source tests
//!
//! Runs the Sheets client against a local fake of the v4 `values` endpoint.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use lead_intake_bot::core::configuration::{
    AiParameters, DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE,
};
use lead_intake_bot::core::traits::{ConfigurationSource, DependencyError};
use lead_intake_bot::infrastructure::sheets::SheetsConfigurationSource;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
struct FakeSheet {
    status: StatusCode,
    prompt: Option<&'static str>,
    table: Vec<Vec<&'static str>>,
    seen: Arc<Mutex<Vec<(String, String, Option<String>)>>>,
}

impl FakeSheet {
    fn new(prompt: Option<&'static str>, table: Vec<Vec<&'static str>>) -> FakeSheet {
        FakeSheet {
            status: StatusCode::OK,
            prompt,
            table,
            seen: Arc::default(),
        }
    }
}

async fn values(
    State(sheet): State<FakeSheet>,
    Path((spreadsheet, range)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    sheet
        .seen
        .lock()
        .unwrap()
        .push((spreadsheet, range.clone(), query.get("key").cloned()));

    if sheet.status != StatusCode::OK {
        return (sheet.status, Json(json!({"error": {"code": sheet.status.as_u16()}})))
            .into_response();
    }

    if range.ends_with("!B1") {
        match sheet.prompt {
            Some(prompt) => Json(json!({"range": range, "values": [[prompt]]})).into_response(),
            // The API leaves out `values` for an empty range.
            None => Json(json!({"range": range})).into_response(),
        }
    } else {
        Json(json!({"range": range, "majorDimension": "ROWS", "values": sheet.table}))
            .into_response()
    }
}

async fn serve(sheet: FakeSheet) -> SheetsConfigurationSource {
    let app = Router::new()
        .route("/v4/spreadsheets/:id/values/:range", get(values))
        .with_state(sheet);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    SheetsConfigurationSource::new(
        &format!("http://{addr}/v4"),
        "sheet-1".to_owned(),
        Some("api-key".to_owned()),
        "Настройки",
    )
}

#[tokio::test]
async fn test_reads_prompt_and_parameters() {
    let sheet = FakeSheet::new(
        Some("Ты консультант студии."),
        vec![
            vec!["System Prompt", "Ты консультант студии."],
            vec!["AI_Model", "grok-2"],
            vec!["AI_Temperature", "0.3"],
            vec!["AI_MaxTokens", "500"],
        ],
    );
    let source = serve(sheet.clone()).await;

    let snapshot = source.snapshot().await;

    assert_eq!(snapshot.prompt, "Ты консультант студии.");
    assert_eq!(
        snapshot.parameters,
        AiParameters {
            model: "grok-2".to_owned(),
            temperature: 0.3,
            max_tokens: 500,
        }
    );

    let mut seen = sheet.seen.lock().unwrap().clone();
    seen.sort();
    assert_eq!(
        seen,
        vec![
            (
                "sheet-1".to_owned(),
                "'Настройки'!A:B".to_owned(),
                Some("api-key".to_owned())
            ),
            (
                "sheet-1".to_owned(),
                "'Настройки'!B1".to_owned(),
                Some("api-key".to_owned())
            ),
        ]
    );
}

#[tokio::test]
async fn test_partial_table_keeps_other_defaults() {
    let source = serve(FakeSheet::new(
        Some("prompt"),
        vec![
            vec!["AI_Model", "grok-2"],
            vec!["AI_Temperature", "warm"],
            vec!["Unrelated"],
        ],
    ))
    .await;

    let parameters = source.ai_parameters().await;

    assert_eq!(parameters.model, "grok-2");
    assert_eq!(parameters.temperature, DEFAULT_TEMPERATURE);
    assert_eq!(parameters.max_tokens, AiParameters::default().max_tokens);
}

#[tokio::test]
async fn test_empty_prompt_cell_is_invalid_data() {
    let source = serve(FakeSheet::new(None, vec![])).await;

    assert!(matches!(
        source.fetch_prompt().await,
        Err(DependencyError::InvalidData(_))
    ));
    assert_eq!(source.prompt().await, DEFAULT_SYSTEM_PROMPT);
}

#[tokio::test]
async fn test_forbidden_sheet_falls_back_to_defaults() {
    let mut sheet = FakeSheet::new(Some("never read"), vec![vec!["AI_Model", "grok-2"]]);
    sheet.status = StatusCode::FORBIDDEN;
    let source = serve(sheet).await;

    assert!(matches!(
        source.fetch_settings().await,
        Err(DependencyError::Unavailable(_))
    ));

    let snapshot = source.snapshot().await;
    assert_eq!(snapshot.prompt, DEFAULT_SYSTEM_PROMPT);
    assert_eq!(snapshot.parameters, AiParameters::default());
}

#[tokio::test]
async fn test_server_error_is_unavailable() {
    let mut sheet = FakeSheet::new(Some("prompt"), vec![]);
    sheet.status = StatusCode::SERVICE_UNAVAILABLE;
    let source = serve(sheet).await;

    assert!(matches!(
        source.fetch_prompt().await,
        Err(DependencyError::Unavailable(_))
    ));
}
