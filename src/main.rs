use clap::{Parser, Subcommand};
use krakenwatch::alerts::{self, AlertLedger, ListingLog};
use krakenwatch::api::kraken::{KrakenClient, MarketData};
use krakenwatch::api::retry::CircuitBreaker;
use krakenwatch::monitor::{self, ListingMonitor, Monitor, OversoldMonitor};
use krakenwatch::store::SeenPairs;
use krakenwatch::{logging, Config};
use log::info;
use std::error::Error;

#[derive(Debug, Parser)]
#[command(name = "krakenwatch", version, about = "Kraken oversold and new-listing alerts")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Run a single poll cycle and exit
    #[arg(long, global = true)]
    once: bool,

    /// Log alerts instead of emailing them
    #[arg(long, global = true)]
    dry_run: bool,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Command {
    /// Alert on newly listed trading pairs
    Listings,
    /// Alert on oversold USD pairs near support
    Oversold,
}

impl Command {
    fn as_str(&self) -> &'static str {
        match self {
            Command::Listings => "listings",
            Command::Oversold => "oversold",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    logging::init(cli.command.as_str(), config.log_dir.as_deref());

    info!("Starting Kraken {} monitor...", cli.command.as_str());

    let market: Box<dyn MarketData> = Box::new(KrakenClient::new(&config.api)?);
    let sink = alerts::build_sink(&config.email, &config.api.retry, cli.dry_run)?;

    let every = match cli.command {
        Command::Listings => config.listings.interval,
        Command::Oversold => config.oversold.interval,
    };

    let mut watcher: Box<dyn Monitor> = match cli.command {
        Command::Listings => {
            let seen = SeenPairs::load(&config.listings.state_file)?;
            let listing_log = ListingLog::new(&config.listings.log_file);
            Box::new(ListingMonitor::new(
                market,
                seen,
                listing_log,
                sink,
                config.listings.alert_on_bootstrap,
            ))
        }
        Command::Oversold => {
            let ledger = AlertLedger::load(
                &config.oversold.ledger_file,
                config.oversold.alert_cooldown,
            )?;
            Box::new(OversoldMonitor::new(
                market,
                config.oversold.clone(),
                ledger,
                sink,
            ))
        }
    };

    if cli.once {
        let alerted = watcher.tick().await?;
        info!("Single {} cycle done, {} pairs alerted", watcher.name(), alerted);
        return Ok(());
    }

    let mut breaker = CircuitBreaker::new(config.api.breaker_threshold, config.api.breaker_cooldown);

    // Runs until a shutdown signal; the service manager handles restarts.
    tokio::select! {
        _ = monitor::run(watcher.as_mut(), every, &mut breaker) => {},
        _ = monitor::shutdown_signal() => {},
    };

    info!("Shutdown complete");
    Ok(())
}
