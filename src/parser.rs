use serde::Deserialize;
use tracing::{info, warn};

use crate::{regex, Completion, FlightRecord, TripPageContent};

/// Limits applied to one extraction call.
#[derive(Debug, Clone, Copy)]
pub struct ParserLimits {
    pub transcript_chars: usize,
    pub max_tokens: u32,
}

// the trip name is filled in from the page, the model never sees it as a field
#[derive(Debug, Deserialize)]
struct ExtractedFlight {
    flight_date: String,
    #[serde(default)]
    flight_time: Option<String>,
    origin: String,
    destination: String,
    flight_number: String,
}

pub fn build_prompt(trip_name: &str, transcript: &str) -> String {
    format!(
        r#"You are extracting flight information from a TripIt trip page.

Trip Name: {trip_name}

Here is the visible text from the page:
{transcript}

Please extract ONLY flight information. Ignore hotels, cars, and other activities.

For each flight segment, extract:
- flight_date: in YYYY-MM-DD format (look for dates like "Thu, Nov 6" and convert to "2025-11-06")
- flight_time: departure time with timezone (e.g., "9:23 PM PST")
- origin: origin airport IATA code (e.g., "SFO")
- destination: destination airport IATA code (e.g., "PIT")
- flight_number: airline code + number (e.g., "UA794")

Important notes:
- Look for text like "SFO - PIT" which indicates origin and destination
- Look for "Flight Number UA 794" or similar
- Each connecting flight should be a separate entry
- Ignore layover/connection time entries
- If you see no flights at all, return an empty array []

Return your response as a JSON array of objects ONLY. No explanation, just the JSON.

Example format:
[
  {{
    "flight_date": "2025-11-06",
    "flight_time": "9:23 PM PST",
    "origin": "SFO",
    "destination": "PIT",
    "flight_number": "UA794"
  }}
]
"#
    )
}

/// The span from the first `[` to the last `]` of a free-form response.
pub fn find_json_array(response: &str) -> Option<&str> {
    regex!(r"\[[\s\S]*\]")
        .find(response)
        .map(|found| found.as_str())
}

/// Reads the flights out of a model response, tagging each with `trip_name`.
///
/// Anything that does not look like a list of flights yields no records.
pub fn parse_response(response: &str, trip_name: &str) -> Vec<FlightRecord> {
    let Some(array) = find_json_array(response) else {
        return Vec::new();
    };
    let items = match serde_json::from_str::<Vec<serde_json::Value>>(array) {
        Ok(items) => items,
        Err(e) => {
            warn!("Failed to parse flights of {trip_name} - {e}");
            return Vec::new();
        }
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ExtractedFlight>(item) {
            Ok(flight) => Some(FlightRecord {
                flight_date: flight.flight_date,
                flight_time: flight.flight_time.unwrap_or_default(),
                origin: flight.origin,
                destination: flight.destination,
                flight_number: flight.flight_number,
                trip_name: trip_name.to_string(),
            }),
            Err(e) => {
                warn!("Skip flight entry of {trip_name} - {e}");
                None
            }
        })
        .collect()
}

/// Asks the model for the flights of one trip page. Never fails, a failed call yields no flights.
pub async fn extract_flights(
    completion: &dyn Completion,
    content: &TripPageContent,
    limits: ParserLimits,
) -> Vec<FlightRecord> {
    let prompt = build_prompt(
        &content.name,
        content.bounded_transcript(limits.transcript_chars),
    );

    match completion.complete(&prompt, limits.max_tokens).await {
        Ok(response) => {
            let flights = parse_response(&response, &content.name);
            if flights.is_empty() {
                info!("No flights found");
            } else {
                info!("Extracted {} flight(s)", flights.len());
            }
            flights
        }
        Err(e) => {
            warn!("Completion error for {} - {e}", content.name);
            Vec::new()
        }
    }
}
