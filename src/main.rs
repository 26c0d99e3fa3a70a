use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use trip_flights::{
    pipeline, AnthropicClient, Browser as _, ChromeBrowser, Config, ExportOutcome, TerminalGate,
};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trip_flights=info")),
        )
        .init();

    let config = Config::parse();
    config.check_credentials()?;

    println!("\n{}", "=".repeat(70));
    println!("trip-flights - TripIt Flight Exporter");
    println!("{}\n", "=".repeat(70));

    tokio::runtime::Runtime::new()
        .context("Failed to init tokio runtime")?
        .block_on(async move {
            let completion = AnthropicClient::from_config(&config);
            info!("Using model {}", completion.model());

            let browser = tokio::task::spawn_blocking({
                let browser_ws = config.browser_ws.clone();
                let headless = config.headless;
                move || ChromeBrowser::open(browser_ws.as_deref(), headless)
            })
            .await
            .map_err(|e| anyhow::anyhow!("join error - {e:?}"))??;

            let summary = pipeline::run(&config, &browser, &completion, &TerminalGate).await;
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser tab - {e:?}");
            }
            let summary = summary?;

            println!(
                "Trips: {} found, {} failed. Flights: {} extracted, {} rejected.",
                summary.trips_discovered,
                summary.trips_failed,
                summary.flights_extracted,
                summary.flights_rejected
            );
            if let Some(ExportOutcome::Written { path, rows }) = &summary.export {
                println!("Export complete! {rows} flights saved to: {}", path.display());
            }

            anyhow::Ok(())
        })?;

    Ok(())
}
