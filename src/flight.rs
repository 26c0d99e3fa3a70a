use chrono::{NaiveDate, NaiveDateTime};
use itertools::{Either, Itertools as _};
use thiserror::Error;

/// One flight segment as read off a trip page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightRecord {
    /// `YYYY-MM-DD`
    pub flight_date: String,
    /// Departure time with timezone, e.g. `9:23 PM PST`
    pub flight_time: String,
    pub origin: String,
    pub destination: String,
    pub flight_number: String,
    pub trip_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("flight date {0:?} is not YYYY-MM-DD")]
    BadDate(String),
    #[error("{field} {code:?} is not a three letter airport code")]
    BadAirport { field: &'static str, code: String },
    #[error("flight number is empty")]
    MissingFlightNumber,
}

fn airport_code(field: &'static str, code: &str) -> Result<String, ValidationError> {
    let code = code.trim();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code.to_ascii_uppercase())
    } else {
        Err(ValidationError::BadAirport {
            field,
            code: code.to_string(),
        })
    }
}

impl FlightRecord {
    /// Checks the shape of the fields the export relies on.
    ///
    /// `flight_time` is left alone, records with an unreadable time sort last instead.
    pub fn validated(self) -> Result<Self, ValidationError> {
        let flight_date = self.flight_date.trim();
        if NaiveDate::parse_from_str(flight_date, "%Y-%m-%d").is_err() {
            return Err(ValidationError::BadDate(self.flight_date));
        }
        let origin = airport_code("origin", &self.origin)?;
        let destination = airport_code("destination", &self.destination)?;
        let flight_number = self.flight_number.trim();
        if flight_number.is_empty() {
            return Err(ValidationError::MissingFlightNumber);
        }

        Ok(Self {
            flight_date: flight_date.to_string(),
            flight_number: flight_number.to_string(),
            origin,
            destination,
            ..self
        })
    }

    /// Local departure time, ignoring the timezone abbreviation.
    pub fn departure(&self) -> Option<NaiveDateTime> {
        let mut tokens = self.flight_time.split_whitespace();
        let clock = tokens.next()?;
        let meridiem = tokens.next()?;
        NaiveDateTime::parse_from_str(
            &format!("{} {clock} {meridiem}", self.flight_date.trim()),
            "%Y-%m-%d %I:%M %p",
        )
        .ok()
    }

    pub fn sort_key(&self) -> NaiveDateTime {
        self.departure().unwrap_or(NaiveDateTime::MIN)
    }
}

/// Splits records into the admitted ones and the reasons the rest were rejected.
pub fn validate_all(
    records: impl IntoIterator<Item = FlightRecord>,
) -> (Vec<FlightRecord>, Vec<ValidationError>) {
    records.into_iter().partition_map(|record| match record.validated() {
        Ok(record) => Either::Left(record),
        Err(e) => Either::Right(e),
    })
}
