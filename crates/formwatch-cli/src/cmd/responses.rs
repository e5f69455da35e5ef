use crate::output::{print_json, print_table};
use anyhow::Context;
use formwatch_core::config::RelayConfig;
use formwatch_core::HttpRelay;

pub fn run(config: &RelayConfig, json: bool) -> anyhow::Result<()> {
    let relay = HttpRelay::from_config(config).context("failed to build relay")?;

    let rt = tokio::runtime::Runtime::new()?;
    let rows = rt.block_on(relay.responses(&config.source_url));

    if json {
        return print_json(&rows);
    }

    if rows.is_empty() {
        println!("No responses.");
        return Ok(());
    }

    let table: Vec<Vec<String>> = rows
        .into_iter()
        .map(|r| vec![r.timestamp, r.feedback.replace('\n', " ")])
        .collect();
    print_table(&["TIMESTAMP", "FEEDBACK"], &table);
    Ok(())
}
