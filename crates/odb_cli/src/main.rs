use anyhow::Context;
use clap::{Parser, Subcommand};
use odb_core::config::{BASE_URL, USER_AGENT};
use odb_core::prelude::SourceConfig;
use odb_scrapers::prelude::DevotionalService;
use odb_web::prelude::AppState;
use serde::Serialize;
use std::net::SocketAddr;
use tracing::info;
use url::Url;

mod duration;
mod logging;

use duration::HumanDuration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Our Daily Bread devotionals as JSON", long_about = None)]
pub struct Cli {
    /// Site the devotionals are scraped from
    #[arg(long, env = "ODB_BASE_URL", default_value = BASE_URL)]
    base_url: Url,
    /// Upstream request timeout (e.g. 15s, 1m)
    #[arg(long, env = "ODB_TIMEOUT", default_value = "15s")]
    timeout: HumanDuration,
    #[arg(long, env = "ODB_USER_AGENT", default_value = USER_AGENT)]
    user_agent: String,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "ODB_LOG", default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the HTTP API (default)
    Serve {
        #[arg(long, env = "ODB_BIND", default_value = "0.0.0.0:8000")]
        bind: SocketAddr,
    },
    /// Print today's devotional
    Today,
    /// Print the devotional for a date (YYYY-MM-DD)
    Date { date: String },
    /// Print the devotional for a slug
    Slug { slug: String },
    /// Print a page of recent devotionals
    List {
        #[arg(long, default_value_t = 10)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: usize,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    let config = SourceConfig::new()
        .with_base_url(cli.base_url.clone())
        .with_timeout(cli.timeout.0)
        .with_user_agent(cli.user_agent.clone());
    let service = DevotionalService::from_config(config).context("failed to build HTTP client")?;

    match cli.command.unwrap_or(Commands::Serve {
        bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
    }) {
        Commands::Serve { bind } => {
            info!("📖 Serving devotionals from {}", service.config().base_url());
            odb_web::serve(bind, AppState::new(service)).await?;
        }
        Commands::Today => print_json(&service.today().await?)?,
        Commands::Date { date } => print_json(&service.by_date(&date).await?)?,
        Commands::Slug { slug } => print_json(&service.by_slug(&slug).await?)?,
        Commands::List { limit, offset } => print_json(&service.list(limit, offset).await?)?,
    }

    Ok(())
}
