use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use clap::{Parser, ValueEnum};

pub const API_KEY_PLACEHOLDER: &str = "your-api-key-here";
pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";

/// Which half of the trip list to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TripsFilter {
    Past,
    Upcoming,
}

impl TripsFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripsFilter::Past => "past",
            TripsFilter::Upcoming => "upcoming",
        }
    }
}

/// Waits and delays used while driving the browser.
#[derive(Debug, Clone)]
pub struct Timing {
    pub navigation_timeout: Duration,
    pub selector_timeout: Duration,
    /// Sleep after a marker element shows up, so late content can render.
    pub settle_delay: Duration,
    /// Sleep between navigations.
    pub page_delay: Duration,
    /// Sleep after the operator confirms the login.
    pub login_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(15),
            selector_timeout: Duration::from_secs(10),
            settle_delay: Duration::from_secs(2),
            page_delay: Duration::from_secs(1),
            login_delay: Duration::from_secs(2),
        }
    }
}

impl Timing {
    pub fn immediate() -> Self {
        Self {
            navigation_timeout: Duration::from_millis(100),
            selector_timeout: Duration::from_millis(100),
            settle_delay: Duration::ZERO,
            page_delay: Duration::ZERO,
            login_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "trip-flights",
    about = "Export the flights of your TripIt trips to an OpenFlights CSV file"
)]
pub struct Config {
    /// Anthropic API key, see https://console.anthropic.com/settings/keys
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, env = "ANTHROPIC_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, env = "ANTHROPIC_BASE_URL", default_value = "https://api.anthropic.com")]
    pub api_base_url: String,

    #[arg(long, env = "TRIPS_FILTER", value_enum, default_value_t = TripsFilter::Past)]
    pub filter: TripsFilter,

    #[arg(long, env = "OUTPUT_FILE", default_value = "flights_export.csv")]
    pub output: PathBuf,

    #[arg(long, env = "TRIPIT_URL", default_value = "https://www.tripit.com")]
    pub site_url: reqwest::Url,

    /// DevTools websocket of an already running Chrome. A new window is launched when unset.
    #[arg(long, env = "BROWSER")]
    pub browser_ws: Option<String>,

    #[arg(long)]
    pub headless: bool,

    /// Characters of page text forwarded to the model.
    #[arg(long, default_value_t = 10_000)]
    pub transcript_chars: usize,

    #[arg(long, default_value_t = 2000)]
    pub max_tokens: u32,

    #[arg(skip)]
    pub timing: Timing,
}

impl Config {
    pub fn check_credentials(&self) -> anyhow::Result<()> {
        let key = self.api_key.trim();
        if key.is_empty() || key == API_KEY_PLACEHOLDER {
            anyhow::bail!(
                "Please set your Anthropic API key (--api-key or ANTHROPIC_API_KEY). \
                 Get your API key from: https://console.anthropic.com/settings/keys"
            );
        }
        Ok(())
    }

    pub fn listing_url(&self, page: usize) -> anyhow::Result<reqwest::Url> {
        let mut url = self
            .site_url
            .join("/app/trips")
            .with_context(|| format!("Invalid site url - {}", self.site_url))?;
        url.query_pairs_mut()
            .append_pair("trips_filter", self.filter.as_str())
            .append_pair("page", &page.to_string());
        Ok(url)
    }
}
