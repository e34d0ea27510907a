//! Nightly rates and stay pricing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::model::AccommodationType;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("Please select an accommodation type")]
    MissingAccommodation,
    #[error("Unknown accommodation type: {0}")]
    UnknownAccommodation(String),
    #[error("Invalid date format")]
    InvalidDate,
    #[error("Departure must be after arrival")]
    DepartureNotAfterArrival,
    #[error("Booking total is too large")]
    TotalOverflow,
}

#[derive(Debug, Clone)]
pub struct RateTable {
    rates: Vec<(AccommodationType, Decimal)>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self::new(vec![
            (AccommodationType::Deluxe, Decimal::new(28900, 2)),
            (AccommodationType::Standard, Decimal::new(12900, 2)),
            (AccommodationType::Romantic, Decimal::new(34900, 2)),
            (AccommodationType::Family, Decimal::new(15900, 2)),
            (AccommodationType::Executive, Decimal::new(19900, 2)),
            (AccommodationType::Premium, Decimal::new(25900, 2)),
        ])
    }
}

impl RateTable {
    pub fn new(rates: Vec<(AccommodationType, Decimal)>) -> Self {
        Self { rates }
    }

    pub fn nightly_rate(&self, kind: AccommodationType) -> Option<Decimal> {
        self.rates
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, rate)| *rate)
    }

    /// Resolve a category name from the booking form.
    pub fn resolve(&self, name: Option<&str>) -> Result<(AccommodationType, Decimal), PricingError> {
        let name = name
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(PricingError::MissingAccommodation)?;
        AccommodationType::parse(name)
            .and_then(|kind| self.nightly_rate(kind).map(|rate| (kind, rate)))
            .ok_or_else(|| PricingError::UnknownAccommodation(name.to_string()))
    }

    /// Price a stay from the raw form values.
    pub fn quote(
        &self,
        accommodation: Option<&str>,
        room_count: i64,
        arrival: &str,
        departure: &str,
    ) -> Result<Quote, PricingError> {
        let arrival = parse_date(arrival)?;
        let departure = parse_date(departure)?;
        let nights = (departure - arrival).num_days();
        if nights <= 0 {
            return Err(PricingError::DepartureNotAfterArrival);
        }
        let (accommodation, nightly_rate) = self.resolve(accommodation)?;
        let per_room = nightly_rate
            .checked_mul(Decimal::from(nights))
            .ok_or(PricingError::TotalOverflow)?;
        let total = per_room
            .checked_mul(Decimal::from(room_count))
            .ok_or(PricingError::TotalOverflow)?;
        Ok(Quote {
            accommodation,
            arrival,
            departure,
            nights,
            room_count,
            nightly_rate,
            per_room,
            total,
        })
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate, PricingError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| PricingError::InvalidDate)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub accommodation: AccommodationType,
    pub arrival: NaiveDate,
    pub departure: NaiveDate,
    pub nights: i64,
    pub room_count: i64,
    pub nightly_rate: Decimal,
    /// Charge for one room over the whole stay.
    pub per_room: Decimal,
    pub total: Decimal,
}
