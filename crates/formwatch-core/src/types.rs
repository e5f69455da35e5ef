use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FormResponse
// ---------------------------------------------------------------------------

/// One submitted form row. `timestamp` is the opaque identity used for
/// deduplication; it is never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormResponse {
    pub timestamp: String,
    pub feedback: String,
}

impl FormResponse {
    pub fn new(timestamp: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            feedback: feedback.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// DeliveryPayload
// ---------------------------------------------------------------------------

pub const BOT_USERNAME: &str = "Form Monitor Bot";
pub const EVENT_NAME: &str = "form_feedback_event";

/// JSON body posted to the webhook for a single response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPayload {
    pub message: String,
    pub username: String,
    pub event_name: String,
    pub status: String,
}

impl From<&FormResponse> for DeliveryPayload {
    fn from(response: &FormResponse) -> Self {
        Self {
            message: format!(
                "New Feedback: {}\nSubmitted at: {}",
                response.feedback, response.timestamp
            ),
            username: BOT_USERNAME.to_string(),
            event_name: EVENT_NAME.to_string(),
            status: "success".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// TickReport
// ---------------------------------------------------------------------------

/// Counts from one fetch-diff-deliver-persist pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Rows returned by the fetch (zero when the source was unavailable).
    pub fetched: usize,
    /// Rows not yet tracked, for which a delivery was attempted.
    pub attempted: usize,
    pub delivered: usize,
    /// Rows already tracked before they were reached.
    pub skipped: usize,
    /// Attempted rows left untracked for retry on the next tick.
    pub failed: usize,
    /// Whether the end-of-tick write of the tracked set succeeded.
    pub persisted: bool,
}
