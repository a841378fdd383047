use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use handler::{Event, Handler};

mod collector;
mod config;
mod date_range;
mod error;
mod exchange_rate;
mod exporter;
mod handler;
mod notifier;
mod rates;
mod storage;

#[derive(Parser)]
#[command(version, about = "Collect daily USD/KRW rates and upload them as CSV")]
struct Cli {
    /// Raw invocation input, e.g. '{"start_date":"2025-10-01","end_date":"2025-10-05"}'
    #[arg(long)]
    event: Option<String>,

    /// First day to collect (YYYY-MM-DD), overrides the event
    #[arg(long)]
    start_date: Option<String>,

    /// Last day to collect (YYYY-MM-DD), overrides the event
    #[arg(long)]
    end_date: Option<String>,
}

impl Cli {
    fn into_event(self) -> Result<Event> {
        let mut event = match self.event.as_deref() {
            Some(raw) => serde_json::from_str(raw).context("Invalid --event JSON")?,
            None => Event::default(),
        };
        if self.start_date.is_some() {
            event.start_date = self.start_date;
        }
        if self.end_date.is_some() {
            event.end_date = self.end_date;
        }

        Ok(event)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let event = Cli::parse().into_event()?;
    let config = Config::from_env()?;
    let handler = Handler::new(&config)?;

    let response = handler.handle(event).await;
    println!("{}", serde_json::to_string(&response)?);

    if response.status_code != 200 {
        std::process::exit(1);
    }

    Ok(())
}
