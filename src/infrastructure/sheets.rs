//! Google Sheets backed configuration source.
//!
//! Reads the settings worksheet through the Sheets v4 `values` endpoint: the system prompt
//! lives in `B1`, the key/value table in columns `A:B`.

use crate::core::configuration::SettingsTable;
use crate::core::traits::{ConfigurationSource, DependencyError};
use crate::infrastructure::settings::Settings;
use async_trait::async_trait;
use di::{Ref, inject, injectable};
use log::info;
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

pub struct SheetsConfigurationSource {
    client: reqwest::Client,
    api_base: String,
    spreadsheet_id: String,
    api_key: Option<String>,
    worksheet: String,
}

#[injectable(ConfigurationSource)]
impl SheetsConfigurationSource {
    #[inject]
    pub fn create(settings: Ref<Settings>) -> SheetsConfigurationSource {
        SheetsConfigurationSource::new(
            &settings.sheets_api_base,
            settings.spreadsheet_id.clone().unwrap_or_default(),
            settings.sheets_api_key.clone(),
            &settings.settings_worksheet,
        )
    }
}

impl SheetsConfigurationSource {
    pub fn new(
        api_base: &str,
        spreadsheet_id: String,
        api_key: Option<String>,
        worksheet: &str,
    ) -> SheetsConfigurationSource {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        SheetsConfigurationSource {
            client,
            api_base: api_base.trim_end_matches('/').to_owned(),
            spreadsheet_id,
            api_key,
            worksheet: worksheet.to_owned(),
        }
    }

    fn range_url(&self, cells: &str) -> Result<Url, DependencyError> {
        if self.spreadsheet_id.is_empty() {
            return Err(DependencyError::Unavailable(
                "no spreadsheet configured".to_owned(),
            ));
        }

        let range = format!("'{}'!{cells}", self.worksheet);
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| DependencyError::Unavailable(format!("bad sheets API base: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| DependencyError::Unavailable("sheets API base can't be a base".into()))?
            .pop_if_empty()
            .extend([
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                range.as_str(),
            ]);
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }

        Ok(url)
    }

    async fn read_range(&self, cells: &str) -> Result<Vec<Vec<String>>, DependencyError> {
        let response = self
            .client
            .get(self.range_url(cells)?)
            .send()
            .await
            .map_err(|e| DependencyError::Unavailable(format!("request failed: {e}")))?;

        match response.status() {
            status if status.is_success() => {}
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => {
                return Err(DependencyError::Unavailable(format!(
                    "not authorized ({status})"
                )));
            }
            status => {
                return Err(DependencyError::Unavailable(format!(
                    "sheets API returned {status}"
                )));
            }
        }

        let range: ValueRange = response
            .json()
            .await
            .map_err(|e| DependencyError::InvalidData(format!("unreadable value range: {e}")))?;

        Ok(range.values)
    }
}

/// Builds the settings table from `A:B` rows, skipping rows with an empty key or value.
pub fn settings_from_rows(rows: Vec<Vec<String>>) -> SettingsTable {
    rows.into_iter()
        .filter_map(|row| {
            let mut cells = row.into_iter();
            let key = cells.next()?;
            let value = cells.next()?;
            (!key.is_empty() && !value.is_empty()).then_some((key, value))
        })
        .collect()
}

#[async_trait]
impl ConfigurationSource for SheetsConfigurationSource {
    async fn fetch_prompt(&self) -> Result<String, DependencyError> {
        let rows = self.read_range("B1").await?;

        match rows.into_iter().next().and_then(|row| row.into_iter().next()) {
            Some(prompt) if !prompt.trim().is_empty() => {
                info!("system prompt loaded from spreadsheet");
                Ok(prompt)
            }
            _ => Err(DependencyError::InvalidData("prompt cell is empty".to_owned())),
        }
    }

    async fn fetch_settings(&self) -> Result<SettingsTable, DependencyError> {
        let settings = settings_from_rows(self.read_range("A:B").await?);
        info!("loaded {} settings from spreadsheet", settings.len());
        Ok(settings)
    }
}
