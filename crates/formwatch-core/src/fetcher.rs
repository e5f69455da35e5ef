//! Reads the current full list of form rows from the spreadsheet source.
//!
//! The source answers a values read with `{ "values": [[...], ...] }`. The
//! first row is the header; every later row maps positionally:
//! column 0 → timestamp, column 1 → feedback.
//!
//! Short-row policy: a row without a non-blank timestamp is skipped, since it
//! cannot be deduplicated; a row with a timestamp but no feedback cell gets an
//! empty feedback string.

use crate::error::{RelayError, Result};
use crate::types::FormResponse;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ResponseSource: Send + Sync {
    /// Read every row currently at `locator`, oldest first.
    async fn fetch(&self, locator: &str) -> Result<Vec<FormResponse>>;
}

/// Soft-fail wrapper: any fetch error is logged and collapses to an empty
/// sequence so a bad tick never crashes the caller.
pub async fn fetch_or_empty<S>(source: &S, locator: &str) -> Vec<FormResponse>
where
    S: ResponseSource + ?Sized,
{
    match source.fetch(locator).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::warn!(locator = %redact_locator(locator), error = %e, "fetch failed; treating as no rows");
            Vec::new()
        }
    }
}

/// Longest error body kept from a failed source response, in chars.
const MAX_ERROR_BODY: usize = 300;

/// `locator` without its query string, which may carry an API key.
pub fn redact_locator(locator: &str) -> String {
    match reqwest::Url::parse(locator) {
        Ok(mut url) => {
            url.set_query(None);
            url.to_string()
        }
        Err(_) => locator.split('?').next().unwrap_or_default().to_string(),
    }
}

fn truncate_body(body: String) -> String {
    if body.chars().count() <= MAX_ERROR_BODY {
        return body;
    }
    let mut cut: String = body.chars().take(MAX_ERROR_BODY).collect();
    cut.push_str("...");
    cut
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Option<Vec<Vec<Value>>>,
}

/// Skip the header row and map each remaining row to a [`FormResponse`].
pub fn parse_rows(values: &[Vec<Value>]) -> Vec<FormResponse> {
    values
        .iter()
        .skip(1)
        .filter_map(|row| {
            let timestamp = row.first().map(cell_text)?;
            if timestamp.trim().is_empty() {
                tracing::debug!("skipping row without a timestamp");
                return None;
            }
            let feedback = row.get(1).map(cell_text).unwrap_or_default();
            Some(FormResponse {
                timestamp,
                feedback,
            })
        })
        .collect()
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// SheetsFetcher
// ---------------------------------------------------------------------------

/// HTTP implementation of [`ResponseSource`] for a Sheets-style values API.
#[derive(Clone)]
pub struct SheetsFetcher {
    client: reqwest::Client,
}

impl SheetsFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResponseSource for SheetsFetcher {
    async fn fetch(&self, locator: &str) -> Result<Vec<FormResponse>> {
        let redacted = redact_locator(locator);
        tracing::debug!(locator = %redacted, "fetching form responses");
        let unavailable = |e: reqwest::Error| RelayError::SourceUnavailable {
            locator: redacted.clone(),
            reason: e.without_url().to_string(),
        };
        let resp = self.client.get(locator).send().await.map_err(unavailable)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RelayError::SourceStatus {
                status: status.as_u16(),
                body: truncate_body(body),
            });
        }

        let range: ValueRange = resp.json().await.map_err(unavailable)?;
        let values = range.values.unwrap_or_default();
        if values.is_empty() {
            tracing::info!(locator = %redacted, "no data found");
            return Ok(Vec::new());
        }

        let rows = parse_rows(&values);
        tracing::debug!(count = rows.len(), "fetched form responses");
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
