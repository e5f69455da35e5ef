use crate::output::{print_json, print_table};
use anyhow::Context;
use formwatch_core::config::RelayConfig;
use formwatch_core::HttpRelay;

/// One fetch-diff-deliver-persist pass against the configured source and
/// webhook. Per-row failures are in the report, not in the exit code.
pub fn run(config: &RelayConfig, json: bool) -> anyhow::Result<()> {
    let relay = HttpRelay::from_config(config).context("failed to build relay")?;

    let rt = tokio::runtime::Runtime::new()?;
    let report = rt.block_on(relay.run_tick(&config.source_url, &config.webhook_url));

    if json {
        return print_json(&report);
    }

    print_table(
        &["FETCHED", "ATTEMPTED", "DELIVERED", "SKIPPED", "FAILED", "PERSISTED"],
        &[vec![
            report.fetched.to_string(),
            report.attempted.to_string(),
            report.delivered.to_string(),
            report.skipped.to_string(),
            report.failed.to_string(),
            if report.persisted { "yes" } else { "no" }.to_string(),
        ]],
    );
    Ok(())
}
