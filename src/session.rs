use anyhow::Context;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::{browser::WaitUntil, Browser, Config};

/// Blocks until a human confirms the browser session is logged in.
#[async_trait]
pub trait LoginGate: Send + Sync {
    async fn confirm(&self) -> anyhow::Result<()>;
}

/// Prints the login instructions and waits for ENTER on stdin.
pub struct TerminalGate;

#[async_trait]
impl LoginGate for TerminalGate {
    async fn confirm(&self) -> anyhow::Result<()> {
        let rule = "=".repeat(70);
        println!("\n{rule}");
        println!("MANUAL LOGIN REQUIRED");
        println!("{rule}");
        println!("1. A browser window has opened to TripIt");
        println!("2. Please log in with your credentials");
        println!("3. Wait until you see your trips list");
        println!("4. Then come back here and press ENTER to continue");
        println!("{rule}\n");
        println!("Press ENTER once you're logged in and see your trips list...");

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .context("Failed to read login confirmation")?;
        Ok(())
    }
}

/// Opens the first listing page and hands over to the operator for the login.
pub async fn bootstrap(
    browser: &dyn Browser,
    gate: &dyn LoginGate,
    config: &Config,
) -> anyhow::Result<()> {
    let url = config.listing_url(1)?;
    info!("Open TripIt: {url}");
    browser
        .navigate(&url, WaitUntil::Committed, config.timing.navigation_timeout)
        .await
        .with_context(|| format!("Failed to open {url}"))?;

    gate.confirm().await?;
    tokio::time::sleep(config.timing.login_delay).await;
    info!("Login confirmed, continuing with export");

    Ok(())
}
