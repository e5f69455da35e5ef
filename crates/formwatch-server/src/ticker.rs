//! Tick launching and the optional in-process poll timer.
//!
//! Every trigger, HTTP or timer, goes through [`try_start_tick`], which takes
//! the single tick guard before spawning. A trigger that arrives while a tick
//! is running is dropped.

use std::time::Duration;

use formwatch_core::descriptor::TickTargets;
use formwatch_core::TickReport;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::state::AppState;

/// Spawn one tick in the background. Returns `None` if a tick is already
/// in progress.
pub fn try_start_tick(app: &AppState, targets: TickTargets) -> Option<JoinHandle<TickReport>> {
    let guard = app.tick_lock.clone().try_lock_owned().ok()?;
    let app = app.clone();
    Some(tokio::spawn(async move {
        let report = app.relay.run_tick(&targets.locator, &targets.target).await;
        app.record_tick(report);
        drop(guard);
        report
    }))
}

/// Run a tick every `every` against the configured targets until the task
/// is aborted. The first tick fires immediately.
pub fn spawn_poller(app: AppState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            interval.tick().await;
            let targets = TickTargets {
                locator: app.config.source_url.clone(),
                target: app.config.webhook_url.clone(),
            };
            match try_start_tick(&app, targets) {
                Some(handle) => {
                    if let Err(e) = handle.await {
                        tracing::error!(error = %e, "scheduled tick panicked");
                    }
                }
                None => tracing::info!("tick already in progress; skipping scheduled tick"),
            }
        }
    })
}
