// src/source/sheets.rs

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};
use url::Url;

use super::{SheetsAuth, TabularSource};
use crate::config::Config;
use crate::dataset::RawGrid;
use crate::error::ForageError;

static URL_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").expect("sheet URL regex"));
static BARE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("sheet ID regex"));

/// Pull the spreadsheet ID out of a sharing URL, or accept a bare ID.
pub fn spreadsheet_id(locator: &str) -> Result<String> {
    let locator = locator.trim();
    if let Some(caps) = URL_ID_RE.captures(locator) {
        return Ok(caps[1].to_string());
    }
    if BARE_ID_RE.is_match(locator) {
        return Ok(locator.to_string());
    }
    Err(anyhow!("cannot find a spreadsheet ID in {:?}", locator))
}

/// A1 range naming a whole worksheet.
fn worksheet_range(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

fn cell_text(v: Value) -> String {
    match v {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Reads one worksheet of one spreadsheet through the Sheets v4 values API.
#[derive(Debug, Clone)]
pub struct GoogleSheetsClient {
    http: Client,
    auth: SheetsAuth,
    api_base: Url,
    spreadsheet_id: String,
    worksheet: String,
}

impl GoogleSheetsClient {
    pub fn new(
        http: Client,
        auth: SheetsAuth,
        api_base: &str,
        locator: &str,
        worksheet: &str,
    ) -> Result<Self> {
        let api_base =
            Url::parse(api_base).with_context(|| format!("parsing API base {}", api_base))?;
        if api_base.cannot_be_a_base() {
            anyhow::bail!("API base {} cannot take path segments", api_base);
        }
        Ok(Self {
            http,
            auth,
            api_base,
            spreadsheet_id: spreadsheet_id(locator)?,
            worksheet: worksheet.to_string(),
        })
    }

    pub fn from_config(cfg: &Config, auth: SheetsAuth) -> Result<Self> {
        Self::new(
            Client::new(),
            auth,
            &cfg.api_base,
            &cfg.sheet_locator,
            &cfg.worksheet_name,
        )
    }

    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    fn values_url(&self) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                worksheet_range(&self.worksheet).as_str(),
            ]);
        }
        url.query_pairs_mut().append_pair("majorDimension", "ROWS");
        url
    }

    #[instrument(level = "info", skip(self), fields(sheet = %self.spreadsheet_id, worksheet = %self.worksheet))]
    async fn fetch_values(&self) -> Result<RawGrid> {
        let token = self
            .auth
            .access_token(&self.http)
            .await
            .context("authenticating to Google Sheets")?;
        let url = self.values_url();

        let body: ValueRange = self
            .http
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await
            .with_context(|| format!("GET {}", url))?
            .error_for_status()
            .with_context(|| format!("Non-success status {}", url))?
            .json()
            .await
            .with_context(|| format!("decoding values from {}", url))?;

        let grid: RawGrid = body
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect();
        info!(rows = grid.len(), "fetched worksheet");
        Ok(grid)
    }
}

impl TabularSource for GoogleSheetsClient {
    async fn fetch(&self) -> Result<RawGrid, ForageError> {
        self.fetch_values().await.map_err(|e| {
            let reason = format!("{:#}", e);
            warn!(error = %reason, "worksheet fetch failed");
            ForageError::SourceUnavailable(reason)
        })
    }
}
