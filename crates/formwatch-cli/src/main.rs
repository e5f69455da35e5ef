mod cmd;
mod output;

use clap::{Parser, Subcommand};
use formwatch_core::config::{RelayConfig, SourceSettings, DEFAULT_INTERVAL};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "formwatch",
    about = "Poll a form-response spreadsheet and relay each new row to a webhook",
    version,
    propagate_version = true
)]
struct Cli {
    /// Full values URL of the response source (overrides --sheet-id)
    #[arg(long, global = true, env = "SHEETS_URL")]
    source_url: Option<String>,

    /// Spreadsheet id used to build a Sheets API values URL
    #[arg(long, global = true, env = "SHEET_ID")]
    sheet_id: Option<String>,

    /// API key appended to the built values URL
    #[arg(long, global = true, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Sheet range to read (default: "Form Responses 1")
    #[arg(long, global = true, env = "SHEET_RANGE")]
    sheet_range: Option<String>,

    /// Webhook that receives one notification per new row
    #[arg(long, global = true, env = "WEBHOOK_URL")]
    webhook_url: Option<String>,

    /// File holding the relayed identifiers (default: processed_feedback.json)
    #[arg(long, global = true, env = "STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Per-request timeout for fetch and delivery, in seconds
    #[arg(long, global = true, env = "HTTP_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Interval expression advertised in the integration descriptor
    #[arg(long, global = true, env = "TICK_INTERVAL", default_value = DEFAULT_INTERVAL)]
    interval: String,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (trigger, read, and descriptor endpoints)
    Serve {
        /// Port to listen on (0 = OS-assigned)
        #[arg(long, env = "PORT", default_value = "3000")]
        port: u16,

        /// Also tick in-process every N seconds
        #[arg(long, env = "POLL_INTERVAL_SECS")]
        poll_interval_secs: Option<u64>,

        /// Base URL advertised in the descriptor (default: derived from each request)
        #[arg(long, env = "PUBLIC_URL")]
        public_url: Option<String>,
    },

    /// Run one tick and print its report
    Tick,

    /// Print the rows currently at the source without relaying them
    Responses,

    /// Print the identifiers already relayed
    Tracked,
}

impl Cli {
    fn relay_config(&self) -> formwatch_core::Result<RelayConfig> {
        let source = SourceSettings {
            source_url: self.source_url.clone(),
            sheet_id: self.sheet_id.clone(),
            api_key: self.api_key.clone(),
            sheet_range: self.sheet_range.clone(),
        };
        let config = RelayConfig::new(
            &source,
            self.webhook_url.as_deref(),
            self.state_file.clone(),
            self.timeout_secs,
        )?;
        Ok(config.with_interval(self.interval.clone()))
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    let result = run(cli);

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.relay_config()?;

    match cli.command {
        Commands::Serve {
            port,
            poll_interval_secs,
            public_url,
        } => cmd::serve::run(config, port, poll_interval_secs, public_url),
        Commands::Tick => cmd::tick::run(&config, cli.json),
        Commands::Responses => cmd::responses::run(&config, cli.json),
        Commands::Tracked => cmd::tracked::run(&config, cli.json),
    }
}
