use chrono::{DateTime, Utc};
use formwatch_core::config::RelayConfig;
use formwatch_core::{HttpRelay, TickReport};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Outcome of the most recent completed tick.
#[derive(Debug, Clone, Serialize)]
pub struct LastTick {
    pub finished_at: DateTime<Utc>,
    pub report: TickReport,
}

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub relay: Arc<HttpRelay>,
    /// Held for the whole of a tick; a trigger that cannot take it is dropped.
    pub tick_lock: Arc<tokio::sync::Mutex<()>>,
    pub last_tick: Arc<Mutex<Option<LastTick>>>,
    /// Base URL advertised by the descriptor; derived from the request when unset.
    pub public_url: Option<String>,
}

impl AppState {
    pub fn new(config: RelayConfig, public_url: Option<String>) -> formwatch_core::Result<Self> {
        let relay = HttpRelay::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            relay: Arc::new(relay),
            tick_lock: Arc::new(tokio::sync::Mutex::new(())),
            last_tick: Arc::new(Mutex::new(None)),
            public_url: public_url
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
        })
    }

    pub fn tick_running(&self) -> bool {
        self.tick_lock.try_lock().is_err()
    }

    pub fn record_tick(&self, report: TickReport) {
        let entry = LastTick {
            finished_at: Utc::now(),
            report,
        };
        match self.last_tick.lock() {
            Ok(mut guard) => *guard = Some(entry),
            Err(poisoned) => *poisoned.into_inner() = Some(entry),
        }
    }

    pub fn last_tick(&self) -> Option<LastTick> {
        match self.last_tick.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
