//! FactorLab CLI — refresh, panel, and store status commands.
//!
//! Commands:
//! - `refresh` — fetch the FMP datasets for the universe and store as Parquet
//! - `panel` — rebuild the processed and core_data tiers from raw artifacts
//! - `status` — report artifact counts and universe drift per dataset
//!
//! The API key is read from `FMP_API_KEY` (a `.env` file works).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use factorlab_core::config::RefreshConfig;
use factorlab_core::data::panel;
use factorlab_core::data::{
    fetch_sp500_constituents, DataStore, Endpoint, MarketCapEndpoint, PricesEndpoint,
    ProfileEndpoint, RateLimitedClient, RefreshEngine, SecFilingsEndpoint, StatementsEndpoint,
    Universe,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "factorlab", about = "FactorLab — market data refresh engine")]
struct Cli {
    /// Path to a TOML config file. Defaults are used when the file is absent.
    #[arg(long, default_value = "factorlab.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch datasets for the universe and store them as Parquet.
    Refresh {
        /// Refresh daily price history.
        #[arg(long, default_value_t = false)]
        prices: bool,

        /// Refresh company profiles.
        #[arg(long, default_value_t = false)]
        profiles: bool,

        /// Refresh market capitalization history (date-chunked).
        #[arg(long, default_value_t = false)]
        marketcap: bool,

        /// Refresh financial statements and SEC filing indexes.
        #[arg(long, default_value_t = false)]
        statements: bool,
    },
    /// Rebuild the processed and core_data tiers from raw artifacts.
    Panel,
    /// Report artifact counts and universe drift per dataset.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = if cli.config.exists() {
        RefreshConfig::from_file(&cli.config).map_err(anyhow::Error::msg)?
    } else {
        RefreshConfig::default()
    };

    match cli.command {
        Commands::Refresh {
            prices,
            profiles,
            marketcap,
            statements,
        } => {
            // no flags means everything
            let all = !(prices || profiles || marketcap || statements);
            refresh(
                &config,
                prices || all,
                profiles || all,
                marketcap || all,
                statements || all,
            )
            .await
        }
        Commands::Panel => build_panels(&config),
        Commands::Status => status(&config).await,
    }
}

fn api_key() -> Result<String> {
    std::env::var("FMP_API_KEY").context("FMP_API_KEY is not set")
}

async fn load_universe(config: &RefreshConfig) -> Result<Universe> {
    let universe = match &config.universe_file {
        Some(path) => Universe::from_file(path).map_err(anyhow::Error::msg)?,
        None => fetch_sp500_constituents(&api_key()?).await?,
    };
    if universe.is_empty() {
        bail!("symbol universe is empty");
    }
    tracing::info!(symbols = universe.len(), "universe loaded");
    Ok(universe)
}

async fn refresh(
    config: &RefreshConfig,
    prices: bool,
    profiles: bool,
    marketcap: bool,
    statements: bool,
) -> Result<()> {
    let key = api_key()?;
    let universe = load_universe(config).await?;

    let engine = RefreshEngine::new(
        RateLimitedClient::new(config.rate_limit, config.max_retries),
        DataStore::new(&config.store_dir),
    );

    let mut endpoints: Vec<Box<dyn Endpoint>> = Vec::new();
    if prices {
        endpoints.push(Box::new(PricesEndpoint::new(&key)));
    }
    if profiles {
        endpoints.push(Box::new(ProfileEndpoint::new(&key)));
    }
    if marketcap {
        endpoints.push(Box::new(MarketCapEndpoint::new(
            &key,
            config.start_date,
            config.chunk_days,
        )));
    }
    if statements {
        for period in &config.statement_periods {
            endpoints.push(Box::new(StatementsEndpoint::new(&key, period)));
        }
        for form in &config.sec_forms {
            endpoints.push(Box::new(SecFilingsEndpoint::new(&key, form)));
        }
    }

    for endpoint in &endpoints {
        let summary = engine
            .refresh(endpoint.as_ref(), universe.symbols())
            .await?;
        println!(
            "{}: {}/{} stored, {} skipped",
            endpoint.name(),
            summary.stored,
            summary.total,
            summary.skipped
        );
    }

    Ok(())
}

fn build_panels(config: &RefreshConfig) -> Result<()> {
    let universe = match &config.universe_file {
        Some(path) => Universe::from_file(path).map_err(anyhow::Error::msg)?,
        None => bail!("panel building needs a pinned universe file"),
    };
    let store = DataStore::new(&config.store_dir);

    let total_return = panel::build_processed_prices(&store, universe.symbols())?;
    println!("total_return: {} rows", total_return.height());

    let caps = panel::build_processed_marketcaps(&store, universe.symbols())?;
    println!("marketcap: {} rows", caps.height());

    let profiles = panel::combine_profiles(&store, universe.symbols())?;
    println!("all_profiles: {} rows", profiles.height());

    let base = panel::build_base_frame(&store, config.start_date)?;
    println!("base_frame: {} rows", base.height());

    Ok(())
}

async fn status(config: &RefreshConfig) -> Result<()> {
    let universe = load_universe(config).await?;
    let store = DataStore::new(&config.store_dir);

    let mut datasets = vec![
        "prices".to_string(),
        "marketcap".to_string(),
        "profiles".to_string(),
    ];
    for period in &config.statement_periods {
        datasets.push(format!("financial_statements/{period}"));
    }
    for form in &config.sec_forms {
        datasets.push(format!("financial_statements/sec/{form}"));
    }

    for dataset in &datasets {
        let snapshot = store.read_all(dataset, universe.symbols())?;
        println!(
            "{dataset}: {} artifacts, {} missing, {} extra",
            snapshot.artifacts.len(),
            snapshot.missing.len(),
            snapshot.extra.len()
        );
    }

    Ok(())
}
