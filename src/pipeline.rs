use tracing::{error, info, warn};

use crate::{
    discovery::{self, TripReference},
    export::{self, ExportOutcome},
    flight,
    parser::{self, ParserLimits},
    session, trip, Browser, Completion, Config, FlightRecord, LoginGate,
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub trips_discovered: usize,
    pub trips_failed: usize,
    pub flights_extracted: usize,
    pub flights_rejected: usize,
    /// `None` when the run stopped before the export.
    pub export: Option<ExportOutcome>,
}

async fn process_trip(
    browser: &dyn Browser,
    completion: &dyn Completion,
    config: &Config,
    trip: &TripReference,
) -> anyhow::Result<Vec<FlightRecord>> {
    let content = trip::fetch_trip(browser, trip, &config.timing).await?;
    let limits = ParserLimits {
        transcript_chars: config.transcript_chars,
        max_tokens: config.max_tokens,
    };
    Ok(parser::extract_flights(completion, &content, limits).await)
}

/// Login, discovery, extraction and export, one step after another.
///
/// A failing trip only costs that trip's flights.
pub async fn run(
    config: &Config,
    browser: &dyn Browser,
    completion: &dyn Completion,
    gate: &dyn LoginGate,
) -> anyhow::Result<RunSummary> {
    let mut summary = RunSummary::default();

    session::bootstrap(browser, gate, config).await?;

    let trips = discovery::discover_trips(browser, config).await;
    summary.trips_discovered = trips.len();
    if trips.is_empty() {
        error!("No trips found! Make sure you're logged in correctly.");
        return Ok(summary);
    }

    info!("Processing {} trips", trips.len());
    let mut flights = Vec::new();
    for (idx, trip) in trips.iter().enumerate() {
        info!("[{}/{}]", idx + 1, trips.len());
        match process_trip(browser, completion, config, trip).await {
            Ok(found) => {
                summary.flights_extracted += found.len();
                let (admitted, rejected) = flight::validate_all(found);
                for reason in &rejected {
                    warn!("Rejected flight of {trip} - {reason}");
                }
                summary.flights_rejected += rejected.len();
                flights.extend(admitted);
            }
            Err(e) => {
                error!("Error processing trip {trip} - {e:?}");
                summary.trips_failed += 1;
            }
        }

        tokio::time::sleep(config.timing.page_delay).await;
    }

    summary.export = Some(export::export(flights, &config.output)?);

    Ok(summary)
}
