use crate::output::print_json;
use anyhow::Context;
use formwatch_core::config::RelayConfig;
use formwatch_core::tracker::TrackedSet;
use formwatch_core::HttpRelay;

/// Read-only: unlike a tick, a missing state file is not created here and a
/// corrupt one is reported instead of being treated as empty.
pub fn run(config: &RelayConfig, json: bool) -> anyhow::Result<()> {
    let relay = HttpRelay::from_config(config).context("failed to build relay")?;
    let tracked = relay
        .tracked()
        .with_context(|| format!("failed to read {}", config.state_path.display()))?
        .unwrap_or_else(TrackedSet::new);

    if json {
        return print_json(&tracked);
    }

    if tracked.is_empty() {
        println!("No relayed responses.");
        return Ok(());
    }
    for id in tracked.iter() {
        println!("{id}");
    }
    Ok(())
}
