//! Google Sheets `values` API client.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use super::token::TokenProvider;
use super::RemoteTable;
use crate::codec::{CellWrite, Grid};
use crate::error::{ConfigError, Result, SyncError};
use crate::storage::SyncConfig;

/// Response body of `values.get`.
#[derive(Debug, Deserialize)]
struct ValueRange {
    /// Absent entirely when the range is empty.
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

/// Error envelope returned on non-success responses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Sheets API client for one spreadsheet.
pub struct SheetsGateway {
    http: Client,
    base: Url,
    spreadsheet_id: String,
    tokens: Arc<dyn TokenProvider>,
}

impl SheetsGateway {
    /// Build a client from config.
    ///
    /// # Errors
    /// Returns an error if the config is incomplete or the base URL is invalid.
    pub fn new(config: &SyncConfig, tokens: Arc<dyn TokenProvider>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            http: Client::new(),
            base: config.api_url()?,
            spreadsheet_id: config.spreadsheet_id.clone(),
            tokens,
        })
    }

    /// `{base}/v4/spreadsheets/{id}/values/{tail}` with `tail` as one path
    /// segment so ranges like `'Week 1'!A:AL` are escaped correctly.
    fn values_url(&self, tail: &str) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::remote(format!("base URL cannot hold a path: {}", self.base)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", tail]);
        Ok(url)
    }

    /// `{base}/v4/spreadsheets/{id}/values:batchUpdate`.
    fn batch_url(&self) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| SyncError::remote(format!("base URL cannot hold a path: {}", self.base)))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values:batchUpdate"]);
        Ok(url)
    }

    fn bearer(&self) -> Result<String> {
        self.tokens
            .token()
            .ok_or_else(|| SyncError::Auth("no access token available".into()))
    }

    /// Map a response to an error unless it succeeded.
    ///
    /// A 401 means the token expired or was revoked: it is dropped so the next
    /// call reports `Auth` without a round trip.
    async fn check(&self, resp: Response) -> Result<Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or(body);

        if status == StatusCode::UNAUTHORIZED {
            warn!(%message, "remote store rejected the access token");
            self.tokens.invalidate();
            return Err(SyncError::Auth(format!("token rejected: {message}")));
        }

        Err(SyncError::Remote {
            status: Some(status.as_u16()),
            message,
        })
    }
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[async_trait]
impl RemoteTable for SheetsGateway {
    async fn read(&self, range: &str) -> Result<Grid> {
        let token = self.bearer()?;
        let url = self.values_url(range)?;
        debug!(%range, "reading remote range");

        let resp = self.http.get(url).bearer_auth(&token).send().await?;
        let body: ValueRange = self.check(resp).await?.json().await?;

        Ok(body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    async fn write_cell(&self, range: &str, value: &str) -> Result<()> {
        let token = self.bearer()?;
        let mut url = self.values_url(range)?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");
        debug!(%range, "writing single cell");

        let resp = self
            .http
            .put(url)
            .bearer_auth(&token)
            .json(&json!({
                "range": range,
                "majorDimension": "ROWS",
                "values": [[value]],
            }))
            .send()
            .await?;
        self.check(resp).await?;
        Ok(())
    }

    async fn batch_write(&self, writes: &[CellWrite]) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }
        let token = self.bearer()?;
        let url = self.batch_url()?;
        debug!(cells = writes.len(), "batch writing cells");

        let data: Vec<_> = writes
            .iter()
            .map(|w| json!({ "range": w.range, "values": [[w.value]] }))
            .collect();
        let resp = self
            .http
            .post(url)
            .bearer_auth(&token)
            .json(&json!({
                "valueInputOption": "USER_ENTERED",
                "data": data,
            }))
            .send()
            .await?;
        self.check(resp).await?;
        Ok(())
    }

    async fn append(&self, range_prefix: &str, rows: &[Vec<String>]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let token = self.bearer()?;
        let mut url = self.values_url(&format!("{range_prefix}:append"))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED")
            .append_pair("insertDataOption", "INSERT_ROWS");
        debug!(range = %range_prefix, rows = rows.len(), "appending rows");

        let resp = self
            .http
            .post(url)
            .bearer_auth(&token)
            .json(&json!({ "majorDimension": "ROWS", "values": rows }))
            .send()
            .await?;
        self.check(resp).await?;
        Ok(())
    }
}
