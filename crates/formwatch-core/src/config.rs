use crate::error::{RelayError, Result};
use reqwest::Url;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SHEET_RANGE: &str = "Form Responses 1";
pub const DEFAULT_STATE_FILE: &str = "processed_feedback.json";
pub const DEFAULT_INTERVAL: &str = "*/5 * * * *";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets/";

// ---------------------------------------------------------------------------
// SourceSettings
// ---------------------------------------------------------------------------

/// Raw inputs from which the data-source locator is resolved.
#[derive(Debug, Clone, Default)]
pub struct SourceSettings {
    pub source_url: Option<String>,
    pub sheet_id: Option<String>,
    pub api_key: Option<String>,
    pub sheet_range: Option<String>,
}

impl SourceSettings {
    /// An explicit URL wins; otherwise a Sheets API values URL is built from
    /// the spreadsheet id, range, and API key.
    pub fn resolve(&self) -> Result<String> {
        if let Some(url) = non_empty(self.source_url.as_deref()) {
            Url::parse(url).map_err(|e| {
                RelayError::InvalidConfiguration(format!("SHEETS_URL '{url}': {e}"))
            })?;
            return Ok(url.to_string());
        }

        let sheet_id = non_empty(self.sheet_id.as_deref())
            .ok_or_else(|| RelayError::ConfigurationMissing("SHEETS_URL or SHEET_ID".into()))?;
        let api_key = non_empty(self.api_key.as_deref())
            .ok_or_else(|| RelayError::ConfigurationMissing("GOOGLE_API_KEY".into()))?;
        let range = non_empty(self.sheet_range.as_deref()).unwrap_or(DEFAULT_SHEET_RANGE);

        sheets_values_url(sheet_id, range, api_key)
    }
}

/// `https://sheets.googleapis.com/v4/spreadsheets/{id}/values/{range}?key={key}`
pub fn sheets_values_url(sheet_id: &str, range: &str, api_key: &str) -> Result<String> {
    let mut url = Url::parse(SHEETS_API_BASE)
        .map_err(|e| RelayError::InvalidConfiguration(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| RelayError::InvalidConfiguration("sheets base url".into()))?
        .pop_if_empty()
        .push(sheet_id)
        .push("values")
        .push(range);
    url.query_pairs_mut().append_pair("key", api_key);
    Ok(url.to_string())
}

// ---------------------------------------------------------------------------
// IntegrationInfo
// ---------------------------------------------------------------------------

/// Static metadata advertised by the integration descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationInfo {
    pub app_name: String,
    pub app_description: String,
    pub app_logo: String,
    pub background_color: String,
    pub author: String,
    pub category: String,
    pub key_features: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Default for IntegrationInfo {
    fn default() -> Self {
        Self {
            app_name: "Form Monitoring".to_string(),
            app_description:
                "Automatically monitors feedback submissions and relays each new one to a webhook."
                    .to_string(),
            app_logo: String::new(),
            background_color: "#FFFFFF".to_string(),
            author: "formwatch".to_string(),
            category: "Communication & Collaboration".to_string(),
            key_features: vec![
                "Automatic feedback relay to a webhook.".to_string(),
                "Tracks relayed submissions so each is sent once.".to_string(),
                "Configurable update intervals.".to_string(),
                "Failed deliveries retried on the next tick.".to_string(),
            ],
            created_at: "2025-02-22".to_string(),
            updated_at: "2025-02-22".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// RelayConfig
// ---------------------------------------------------------------------------

/// Process-wide context, validated once at startup.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub source_url: String,
    pub webhook_url: String,
    pub state_path: PathBuf,
    pub http_timeout: Duration,
    /// Interval expression advertised to the orchestrator (cron syntax).
    pub interval: String,
    pub integration: IntegrationInfo,
}

impl RelayConfig {
    /// Validate the required values. Both the locator and the delivery
    /// target must be present; a zero timeout is rejected.
    pub fn new(
        source: &SourceSettings,
        webhook_url: Option<&str>,
        state_path: Option<PathBuf>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let source_url = source.resolve()?;
        let webhook_url = non_empty(webhook_url)
            .ok_or_else(|| RelayError::ConfigurationMissing("WEBHOOK_URL".into()))?;
        Url::parse(webhook_url).map_err(|e| {
            RelayError::InvalidConfiguration(format!("WEBHOOK_URL '{webhook_url}': {e}"))
        })?;

        let timeout_secs = timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(RelayError::InvalidConfiguration(
                "HTTP timeout must be at least one second".into(),
            ));
        }

        Ok(Self {
            source_url,
            webhook_url: webhook_url.to_string(),
            state_path: state_path.unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_FILE)),
            http_timeout: Duration::from_secs(timeout_secs),
            interval: DEFAULT_INTERVAL.to_string(),
            integration: IntegrationInfo::default(),
        })
    }

    pub fn with_interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = interval.into();
        self
    }

    pub fn with_integration(mut self, integration: IntegrationInfo) -> Self {
        self.integration = integration;
        self
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}
