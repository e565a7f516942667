// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{debug, info};

use crate::clean::ColumnNames;

pub const DEFAULT_SHEET: &str =
    "https://docs.google.com/spreadsheets/d/1U6OTPPOpwrBcE9CHDjfGcAu3SuvdViijPTYwZ0Zg74c";
pub const DEFAULT_WORKSHEET: &str = "Raw Data";
pub const DEFAULT_TTL_SECONDS: u64 = 600;
pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

/// Runtime settings, read from an optional YAML file and `FORAGE_*` env vars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spreadsheet URL or bare spreadsheet ID.
    pub sheet_locator: String,
    pub worksheet_name: String,
    pub columns: ColumnNames,
    pub ttl_seconds: u64,
    /// Path to a service-account JSON key file.
    pub credentials_path: Option<PathBuf>,
    pub listen_addr: SocketAddr,
    /// Sheets API root; only changed to point at a stand-in server.
    pub api_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheet_locator: DEFAULT_SHEET.into(),
            worksheet_name: DEFAULT_WORKSHEET.into(),
            columns: ColumnNames::default(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
            credentials_path: None,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            api_base: DEFAULT_API_BASE.into(),
        }
    }
}

impl Config {
    /// Defaults, overlaid by `path` (if given), then by the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        info!(
            sheet = %cfg.sheet_locator,
            worksheet = %cfg.worksheet_name,
            ttl_seconds = cfg.ttl_seconds,
            "configuration loaded"
        );
        Ok(cfg)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))
    }

    /// Overlay values from an environment lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("FORAGE_SHEET") {
            self.sheet_locator = v;
        }
        if let Some(v) = lookup("FORAGE_WORKSHEET") {
            self.worksheet_name = v;
        }
        if let Some(v) = lookup("FORAGE_ID_COLUMN") {
            self.columns.id = v;
        }
        if let Some(v) = lookup("FORAGE_PERIOD_COLUMN") {
            self.columns.period = v;
        }
        if let Some(v) = lookup("FORAGE_AMOUNT_COLUMN") {
            self.columns.amount = v;
        }
        if let Some(v) = lookup("FORAGE_TTL_SECONDS") {
            self.ttl_seconds = v
                .trim()
                .parse()
                .with_context(|| format!("FORAGE_TTL_SECONDS={v:?} is not a number"))?;
        }
        if let Some(v) = lookup("FORAGE_LISTEN_ADDR") {
            self.listen_addr = v
                .trim()
                .parse()
                .with_context(|| format!("FORAGE_LISTEN_ADDR={v:?} is not a socket address"))?;
        }
        if let Some(v) = lookup("FORAGE_API_BASE") {
            self.api_base = v;
        }
        if self.credentials_path.is_none() {
            if let Some(v) = lookup("GOOGLE_APPLICATION_CREDENTIALS") {
                debug!("using GOOGLE_APPLICATION_CREDENTIALS key file");
                self.credentials_path = Some(PathBuf::from(v));
            }
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Where the Sheets credential comes from. Never printed in full.
#[derive(Clone, PartialEq)]
pub enum CredentialSource {
    /// Service-account JSON blob.
    ServiceAccountJson(String),
    /// A ready-made OAuth access token.
    AccessToken(String),
}

impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::ServiceAccountJson(_) => f.write_str("ServiceAccountJson(<redacted>)"),
            CredentialSource::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
        }
    }
}

impl CredentialSource {
    /// Inline JSON (`FORAGE_SERVICE_ACCOUNT_JSON`) wins over a key file, which
    /// wins over a bare token (`FORAGE_ACCESS_TOKEN`).
    pub fn resolve<F>(cfg: &Config, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(json) = lookup("FORAGE_SERVICE_ACCOUNT_JSON") {
            return Ok(CredentialSource::ServiceAccountJson(json));
        }
        if let Some(path) = &cfg.credentials_path {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading credentials file {}", path.display()))?;
            return Ok(CredentialSource::ServiceAccountJson(json));
        }
        if let Some(token) = lookup("FORAGE_ACCESS_TOKEN") {
            return Ok(CredentialSource::AccessToken(token));
        }
        anyhow::bail!(
            "no Sheets credential: set FORAGE_SERVICE_ACCOUNT_JSON, \
             GOOGLE_APPLICATION_CREDENTIALS, credentials_path, or FORAGE_ACCESS_TOKEN"
        )
    }
}
