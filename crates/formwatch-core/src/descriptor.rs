//! Integration descriptor served to the registering orchestrator, and the
//! trigger body it sends back on each tick.

use crate::config::{IntegrationInfo, RelayConfig};
use serde::{Deserialize, Serialize};

pub const SOURCE_SETTING: &str = "google sheets";
pub const INTERVAL_SETTING: &str = "interval";

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    pub label: String,
    #[serde(rename = "type", default = "default_setting_type")]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default: Option<String>,
}

fn default_setting_type() -> String {
    "text".to_string()
}

impl Setting {
    fn text(label: &str, default: &str) -> Self {
        Self {
            label: label.to_string(),
            kind: default_setting_type(),
            required: true,
            default: Some(default.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct DescriptorDates {
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Descriptions {
    pub app_name: String,
    pub app_description: String,
    pub app_logo: String,
    pub app_url: String,
    pub background_color: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrationDescriptor {
    pub date: DescriptorDates,
    pub descriptions: Descriptions,
    pub is_active: bool,
    pub integration_type: String,
    pub key_features: Vec<String>,
    pub integration_category: String,
    pub author: String,
    pub settings: Vec<Setting>,
    pub tick_url: String,
}

/// `{ "data": descriptor }` envelope expected by the orchestrator.
#[derive(Debug, Clone, Serialize)]
pub struct DescriptorEnvelope {
    pub data: IntegrationDescriptor,
}

impl IntegrationDescriptor {
    pub fn new(info: &IntegrationInfo, base_url: &str, locator: &str, interval: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            date: DescriptorDates {
                created_at: info.created_at.clone(),
                updated_at: info.updated_at.clone(),
            },
            descriptions: Descriptions {
                app_name: info.app_name.clone(),
                app_description: info.app_description.clone(),
                app_logo: info.app_logo.clone(),
                app_url: base_url.to_string(),
                background_color: info.background_color.clone(),
            },
            is_active: true,
            integration_type: "interval".to_string(),
            key_features: info.key_features.clone(),
            integration_category: info.category.clone(),
            author: info.author.clone(),
            settings: vec![
                Setting::text(SOURCE_SETTING, locator),
                Setting::text(INTERVAL_SETTING, interval),
            ],
            tick_url: format!("{base_url}/tick"),
        }
    }

    pub fn for_config(config: &RelayConfig, base_url: &str) -> Self {
        Self::new(
            &config.integration,
            base_url,
            &config.source_url,
            &config.interval,
        )
    }

    pub fn into_envelope(self) -> DescriptorEnvelope {
        DescriptorEnvelope { data: self }
    }
}

// ---------------------------------------------------------------------------
// TickRequest
// ---------------------------------------------------------------------------

/// Optional body of a trigger call. Anything it leaves out falls back to the
/// configured defaults, for that tick only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TickRequest {
    #[serde(default)]
    pub return_url: Option<String>,
    #[serde(default)]
    pub settings: Vec<Setting>,
}

/// Locator and delivery target chosen for one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickTargets {
    pub locator: String,
    pub target: String,
}

impl TickRequest {
    pub fn resolve(&self, config: &RelayConfig) -> TickTargets {
        let locator = self
            .settings
            .iter()
            .find(|s| s.label.eq_ignore_ascii_case(SOURCE_SETTING))
            .and_then(|s| s.default.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&config.source_url);
        let target = self
            .return_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&config.webhook_url);
        TickTargets {
            locator: locator.to_string(),
            target: target.to_string(),
        }
    }
}
