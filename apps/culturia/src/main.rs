mod config;
mod errors;
mod generation;
mod history;
mod llm_client;
mod models;

use anyhow::Result;
use chrono::Utc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::generation::generator::{run_daily, today_in_madrid, RunOutcome};
use crate::llm_client::LlmClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}=info", env!("CARGO_PKG_NAME")))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CulturIA generator v{}", env!("CARGO_PKG_VERSION"));

    // Fails with exit code 1 when GROQ_API_KEY is missing
    let config = Config::from_env()?;

    let llm = LlmClient::new(config.groq_api_key.clone(), config.groq_api_url.clone())?;
    let today = today_in_madrid(Utc::now());

    match run_daily(&llm, &config.history_path, today).await? {
        RunOutcome::Generated(record) => {
            info!("Done: day #{} saved", record.day_number);
        }
        RunOutcome::Skipped { date } => {
            info!("Done: nothing to do for {date}");
        }
    }

    Ok(())
}
