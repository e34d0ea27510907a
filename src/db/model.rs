//! Insert payloads accepted by repositories.
//!
//! Keep these structs focused on the columns being written. Validation lives
//! in higher layers (`catalog`, `booking`, `contact`).

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::model::{AccommodationType, Amenity, LocalizedText, Tag};

/// A room as authored by an editor (the import file format).
#[derive(Debug, Clone, Deserialize)]
pub struct NewRoom {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub descriptions: LocalizedText,
    #[serde(default)]
    pub image: Option<String>,
    pub price: Decimal,
    pub capacity: i64,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub amenities: Vec<Amenity>,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
    pub guest_count: i64,
    pub room_count: i64,
    pub accommodation_type: AccommodationType,
    pub additional_notes: Option<String>,
    pub primary_guest: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub order_id: String,
    pub amount_cents: i64,
}

#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}
