//! OpenFlights CSV output.
//!
//! Only `Date`, `From`, `To` and `Flight_Number` are filled, the other columns are left for
//! manual completion after import.

use std::{
    cmp::Reverse,
    fmt,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};

use crate::FlightRecord;

pub const COLUMNS: [&str; 19] = [
    "Date",
    "From",
    "To",
    "Flight_Number",
    "Airline",
    "Distance",
    "Duration",
    "Seat",
    "Seat_Type",
    "Class",
    "Reason",
    "Plane",
    "Registration",
    "Trip",
    "Note",
    "From_OID",
    "To_OID",
    "Airline_OID",
    "Plane_OID",
];

#[derive(Debug, Default, Serialize)]
pub struct OutputRow<'a> {
    #[serde(rename = "Date")]
    date: &'a str,
    #[serde(rename = "From")]
    from: &'a str,
    #[serde(rename = "To")]
    to: &'a str,
    #[serde(rename = "Flight_Number")]
    flight_number: &'a str,
    #[serde(rename = "Airline")]
    airline: Option<&'a str>,
    #[serde(rename = "Distance")]
    distance: Option<&'a str>,
    #[serde(rename = "Duration")]
    duration: Option<&'a str>,
    #[serde(rename = "Seat")]
    seat: Option<&'a str>,
    #[serde(rename = "Seat_Type")]
    seat_type: Option<&'a str>,
    #[serde(rename = "Class")]
    class: Option<&'a str>,
    #[serde(rename = "Reason")]
    reason: Option<&'a str>,
    #[serde(rename = "Plane")]
    plane: Option<&'a str>,
    #[serde(rename = "Registration")]
    registration: Option<&'a str>,
    #[serde(rename = "Trip")]
    trip: Option<&'a str>,
    #[serde(rename = "Note")]
    note: Option<&'a str>,
    #[serde(rename = "From_OID")]
    from_oid: Option<&'a str>,
    #[serde(rename = "To_OID")]
    to_oid: Option<&'a str>,
    #[serde(rename = "Airline_OID")]
    airline_oid: Option<&'a str>,
    #[serde(rename = "Plane_OID")]
    plane_oid: Option<&'a str>,
}

impl<'a> From<&'a FlightRecord> for OutputRow<'a> {
    fn from(flight: &'a FlightRecord) -> Self {
        Self {
            date: &flight.flight_date,
            from: &flight.origin,
            to: &flight.destination,
            flight_number: &flight.flight_number,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { path: PathBuf, rows: usize },
    /// Nothing to export, no file was touched.
    Skipped,
}

/// Most recent departure first. Records without a readable departure go last, in input order.
pub fn sort_flights(flights: &mut [FlightRecord]) {
    flights.sort_by_key(|flight| Reverse(flight.sort_key()));
}

pub fn write_csv(path: &Path, flights: &[FlightRecord]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for flight in flights {
        writer.serialize(OutputRow::from(flight))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn shorten(name: &str) -> String {
    if name.chars().count() > 35 {
        format!("{}..", name.chars().take(33).collect::<String>())
    } else {
        name.to_string()
    }
}

pub fn write_verification_table(
    out: &mut impl fmt::Write,
    flights: &[FlightRecord],
) -> fmt::Result {
    let rule = "=".repeat(120);
    writeln!(out, "{rule}")?;
    writeln!(out, "EXTRACTED FLIGHTS - VERIFICATION TABLE (Most Recent First)")?;
    writeln!(out, "{rule}")?;
    writeln!(
        out,
        "{:<35} {:<12} {:<15} {:<12} {:<10}",
        "Trip Name", "Date", "Time", "Route", "Flight"
    )?;
    writeln!(out, "{}", "-".repeat(120))?;
    for flight in flights {
        let route = format!("{} → {}", flight.origin, flight.destination);
        writeln!(
            out,
            "{:<35} {:<12} {:<15} {:<12} {:<10}",
            shorten(&flight.trip_name),
            flight.flight_date,
            flight.flight_time,
            route,
            flight.flight_number
        )?;
    }
    writeln!(out, "{rule}")
}

/// Sorts the flights, writes them to `path` and prints the verification table.
pub fn export(mut flights: Vec<FlightRecord>, path: &Path) -> anyhow::Result<ExportOutcome> {
    if flights.is_empty() {
        warn!("No flights to save!");
        return Ok(ExportOutcome::Skipped);
    }

    sort_flights(&mut flights);
    write_csv(path, &flights)?;
    info!(
        "Successfully exported {} flights to {}",
        flights.len(),
        path.display()
    );

    let mut table = String::new();
    write_verification_table(&mut table, &flights)?;
    println!("\n{table}");

    Ok(ExportOutcome::Written {
        path: path.to_path_buf(),
        rows: flights.len(),
    })
}
