use anyhow::Context;
use formwatch_core::config::RelayConfig;
use formwatch_server::AppState;
use std::time::Duration;

pub fn run(
    config: RelayConfig,
    port: u16,
    poll_interval_secs: Option<u64>,
    public_url: Option<String>,
) -> anyhow::Result<()> {
    let poll_every = match poll_interval_secs {
        Some(0) => anyhow::bail!("--poll-interval-secs must be at least 1"),
        Some(secs) => Some(Duration::from_secs(secs)),
        None => None,
    };
    let state = AppState::new(config, public_url).context("failed to build relay")?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
            .await
            .with_context(|| format!("failed to bind port {port}"))?;

        tokio::select! {
            res = formwatch_server::serve_on(state, listener, poll_every) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    })
}
