pub mod browser;
pub mod completion;
pub mod config;
pub mod discovery;
pub mod export;
pub mod flight;
pub mod parser;
pub mod pipeline;
pub mod session;
pub mod trip;

pub use browser::{Browser, ChromeBrowser, WaitUntil};
pub use completion::{AnthropicClient, Completion, CompletionError};
pub use config::{Config, Timing, TripsFilter};
pub use discovery::{ListingPage, TripReference};
pub use export::ExportOutcome;
pub use flight::{FlightRecord, ValidationError};
pub use pipeline::RunSummary;
pub use session::{LoginGate, TerminalGate};
pub use trip::TripPageContent;

pub(crate) fn flatten_error<T>(
    result: Result<anyhow::Result<T>, anyhow::Error>,
) -> anyhow::Result<T> {
    result?
}

#[macro_export]
macro_rules! selector {
    ($selector:literal) => {{
        static SELECTOR: once_cell::sync::OnceCell<scraper::Selector> =
            once_cell::sync::OnceCell::new();
        SELECTOR.get_or_init(|| scraper::Selector::parse($selector).unwrap())
    }};
}

#[macro_export]
macro_rules! regex {
    ($regex:literal) => {{
        static REGEX: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
        REGEX.get_or_init(|| regex::Regex::new($regex).unwrap())
    }};
}
