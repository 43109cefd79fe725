use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{CellValue, SheetStore, StoreError, ValueInputMode};

#[derive(Debug, Clone)]
/// Public struct `GoogleSheetsConfig` used across Sheetwright components.
pub struct GoogleSheetsConfig {
    pub api_base: String,
    pub access_token: String,
    pub spreadsheet_id: String,
    pub request_timeout_ms: u64,
}

impl Default for GoogleSheetsConfig {
    fn default() -> Self {
        Self {
            api_base: "https://sheets.googleapis.com/v4".to_string(),
            access_token: String::new(),
            spreadsheet_id: String::new(),
            request_timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone)]
/// Sheets v4 values/batchUpdate client for one spreadsheet.
pub struct GoogleSheetsClient {
    client: reqwest::Client,
    config: GoogleSheetsConfig,
}

impl GoogleSheetsClient {
    pub fn new(config: GoogleSheetsConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = format!("Bearer {}", config.access_token.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer).map_err(|e| {
                StoreError::InvalidResponse(format!("invalid access token header: {e}"))
            })?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_millis(
                config.request_timeout_ms.max(1),
            ))
            .build()?;

        Ok(Self { client, config })
    }

    fn spreadsheet_url(&self) -> String {
        let base = self.config.api_base.trim_end_matches('/');
        format!("{base}/spreadsheets/{}", self.config.spreadsheet_id)
    }

    fn values_url(&self, range: &str) -> String {
        format!("{}/values/{range}", self.spreadsheet_url())
    }

    async fn expect_success(response: reqwest::Response) -> Result<String, StoreError> {
        let status = response.status();
        let raw = response.text().await?;
        if !status.is_success() {
            return Err(StoreError::HttpStatus {
                status: status.as_u16(),
                body: raw,
            });
        }
        Ok(raw)
    }
}

#[derive(Debug, Deserialize)]
struct ValueRangeResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetResponse {
    properties: SpreadsheetProperties,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetProperties {
    title: String,
}

#[async_trait]
impl SheetStore for GoogleSheetsClient {
    async fn read_range(&self, range: &str) -> Result<Vec<Vec<CellValue>>, StoreError> {
        let response = self.client.get(self.values_url(range)).send().await?;
        let raw = Self::expect_success(response).await?;
        let parsed: ValueRangeResponse = serde_json::from_str(&raw)?;
        Ok(parsed
            .values
            .iter()
            .map(|row| row.iter().map(CellValue::from_raw).collect())
            .collect())
    }

    async fn write_range(
        &self,
        range: &str,
        rows: &[Vec<CellValue>],
        mode: ValueInputMode,
    ) -> Result<(), StoreError> {
        let values: Vec<Vec<Value>> = rows
            .iter()
            .map(|row| row.iter().map(CellValue::to_raw).collect())
            .collect();
        let response = self
            .client
            .put(self.values_url(range))
            .query(&[("valueInputOption", mode.as_str())])
            .json(&json!({ "values": values }))
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn batch_update(&self, body: Value) -> Result<(), StoreError> {
        let response = self
            .client
            .post(format!("{}:batchUpdate", self.spreadsheet_url()))
            .json(&body)
            .send()
            .await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn spreadsheet_title(&self) -> Result<String, StoreError> {
        let response = self
            .client
            .get(self.spreadsheet_url())
            .query(&[("fields", "properties.title")])
            .send()
            .await?;
        let raw = Self::expect_success(response).await?;
        let parsed: SpreadsheetResponse = serde_json::from_str(&raw)?;
        Ok(parsed.properties.title)
    }
}
