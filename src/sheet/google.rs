//! Google Sheets v4 REST client
//!
//! Thin [`Spreadsheet`] implementation over the Sheets HTTP API using a
//! pre-acquired bearer access token. Holds no report logic; every method
//! maps one-to-one onto an API call. Worksheet ids returned by `addSheet`
//! are cached so the grid-range formatting calls can refer to sheets by
//! title.

use super::Spreadsheet;
use crate::error::{Result, RightsizerError};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio::sync::Mutex;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

const HEADER_BACKGROUND: (f64, f64, f64) = (0.9, 0.9, 0.9);
const ALT_ROW_BACKGROUND: (f64, f64, f64) = (0.95, 0.95, 0.95);

pub struct GoogleSheetsClient {
    http: reqwest::Client,
    sheet_key: String,
    access_token: String,
    sheet_ids: Mutex<HashMap<String, i64>>,
}

fn color(rgb: (f64, f64, f64)) -> Value {
    json!({ "red": rgb.0, "green": rgb.1, "blue": rgb.2 })
}

fn solid_border() -> Value {
    json!({ "style": "SOLID", "color": { "red": 0.0, "green": 0.0, "blue": 0.0 } })
}

impl GoogleSheetsClient {
    pub fn new(sheet_key: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            sheet_key: sheet_key.into(),
            access_token: access_token.into(),
            sheet_ids: Mutex::new(HashMap::new()),
        }
    }

    async fn sheet_id(&self, title: &str) -> Result<i64> {
        self.sheet_ids
            .lock()
            .await
            .get(title)
            .copied()
            .ok_or_else(|| RightsizerError::Sheet(format!("Unknown worksheet: {}", title)))
    }

    async fn batch_update(&self, requests: Vec<Value>) -> Result<Value> {
        let url = format!("{}/{}:batchUpdate", SHEETS_API_BASE, self.sheet_key);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "requests": requests }))
            .send()
            .await
            .map_err(|e| RightsizerError::Sheet(format!("batchUpdate request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RightsizerError::Sheet(format!(
                "batchUpdate returned {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| RightsizerError::Sheet(format!("Invalid batchUpdate response: {}", e)))
    }
}

#[async_trait]
impl Spreadsheet for GoogleSheetsClient {
    async fn add_worksheet(&self, title: &str, rows: u32, cols: u32) -> Result<()> {
        let url = format!("{}/{}:batchUpdate", SHEETS_API_BASE, self.sheet_key);
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": { "rowCount": rows, "columnCount": cols }
                    }
                }
            }]
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| RightsizerError::Sheet(format!("addSheet request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            if text.contains("already exists") {
                return Err(RightsizerError::SheetExists(title.to_string()));
            }
            return Err(RightsizerError::Sheet(format!(
                "addSheet returned {}: {}",
                status, text
            )));
        }

        let reply: Value = response
            .json()
            .await
            .map_err(|e| RightsizerError::Sheet(format!("Invalid addSheet response: {}", e)))?;

        let sheet_id = reply
            .pointer("/replies/0/addSheet/properties/sheetId")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                RightsizerError::Sheet("addSheet response missing sheetId".to_string())
            })?;

        self.sheet_ids
            .lock()
            .await
            .insert(title.to_string(), sheet_id);
        Ok(())
    }

    async fn resize(&self, title: &str, rows: u32, cols: u32) -> Result<()> {
        let sheet_id = self.sheet_id(title).await?;
        self.batch_update(vec![json!({
            "updateSheetProperties": {
                "properties": {
                    "sheetId": sheet_id,
                    "gridProperties": { "rowCount": rows, "columnCount": cols }
                },
                "fields": "gridProperties(rowCount,columnCount)"
            }
        })])
        .await?;
        Ok(())
    }

    async fn update_values(&self, title: &str, values: &[Vec<String>]) -> Result<()> {
        // Worksheet titles contain '/', so the range segment must be
        // percent-encoded rather than formatted into the path directly
        let range = format!("'{}'!A1", title);
        let mut url = reqwest::Url::parse(&format!(
            "{}/{}/values/",
            SHEETS_API_BASE, self.sheet_key
        ))
        .map_err(|e| RightsizerError::Sheet(format!("Invalid values URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| RightsizerError::Sheet("Invalid values URL".to_string()))?
            .pop_if_empty()
            .push(&range);
        url.query_pairs_mut()
            .append_pair("valueInputOption", "USER_ENTERED");

        let response = self
            .http
            .put(url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "values": values }))
            .send()
            .await
            .map_err(|e| RightsizerError::Sheet(format!("values.update failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RightsizerError::Sheet(format!(
                "values.update returned {}: {}",
                status, body
            )));
        }
        Ok(())
    }

    async fn format_header(&self, title: &str, cols: u32) -> Result<()> {
        let sheet_id = self.sheet_id(title).await?;
        self.batch_update(vec![json!({
            "repeatCell": {
                "range": {
                    "sheetId": sheet_id,
                    "startRowIndex": 0,
                    "endRowIndex": 1,
                    "startColumnIndex": 0,
                    "endColumnIndex": cols
                },
                "cell": {
                    "userEnteredFormat": {
                        "backgroundColor": color(HEADER_BACKGROUND),
                        "textFormat": { "bold": true },
                        "horizontalAlignment": "CENTER"
                    }
                },
                "fields": "userEnteredFormat(backgroundColor,textFormat,horizontalAlignment)"
            }
        })])
        .await?;
        Ok(())
    }

    async fn apply_borders(&self, title: &str, rows: u32, cols: u32) -> Result<()> {
        let sheet_id = self.sheet_id(title).await?;
        self.batch_update(vec![json!({
            "updateBorders": {
                "range": {
                    "sheetId": sheet_id,
                    "startRowIndex": 0,
                    "endRowIndex": rows,
                    "startColumnIndex": 0,
                    "endColumnIndex": cols
                },
                "top": solid_border(),
                "bottom": solid_border(),
                "left": solid_border(),
                "right": solid_border(),
                "innerHorizontal": solid_border(),
                "innerVertical": solid_border()
            }
        })])
        .await?;
        Ok(())
    }

    async fn shade_row(&self, title: &str, row: u32, cols: u32) -> Result<()> {
        let sheet_id = self.sheet_id(title).await?;
        self.batch_update(vec![json!({
            "repeatCell": {
                "range": {
                    "sheetId": sheet_id,
                    "startRowIndex": row - 1,
                    "endRowIndex": row,
                    "startColumnIndex": 0,
                    "endColumnIndex": cols
                },
                "cell": {
                    "userEnteredFormat": { "backgroundColor": color(ALT_ROW_BACKGROUND) }
                },
                "fields": "userEnteredFormat(backgroundColor)"
            }
        })])
        .await?;
        Ok(())
    }

    async fn set_column_widths(&self, title: &str, widths: &[u32]) -> Result<()> {
        let sheet_id = self.sheet_id(title).await?;
        let requests: Vec<Value> = widths
            .iter()
            .enumerate()
            .map(|(index, width)| {
                json!({
                    "updateDimensionProperties": {
                        "range": {
                            "sheetId": sheet_id,
                            "dimension": "COLUMNS",
                            "startIndex": index,
                            "endIndex": index + 1
                        },
                        "properties": { "pixelSize": width },
                        "fields": "pixelSize"
                    }
                })
            })
            .collect();
        self.batch_update(requests).await?;
        Ok(())
    }
}
