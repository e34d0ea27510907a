//! Booking submission: validate, price, persist, then open a payment session.

use anyhow::anyhow;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db::{self, NewBooking, Pool};
use crate::gateway::{Customer, GatewayError, LineItem, PaymentGateway, SessionRequest};
use crate::model::decimal_to_cents;
use crate::pricing::{PricingError, Quote, RateTable};
use crate::validate::{self, ValidationErrors};

const ORDER_ID_ATTEMPTS: u32 = 3;
const MAX_GUEST_NAME: usize = 100;
const MAX_PHONE: usize = 20;
pub const LINE_ITEM_ID: &str = "room-booking";

/// Raw booking form as posted by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingForm {
    pub arrival_date: Option<String>,
    pub departure_date: Option<String>,
    pub guest_count: Option<String>,
    pub room_count: Option<String>,
    pub accommodation_type: Option<String>,
    pub additional_notes: Option<String>,
    pub primary_guest: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct GuestDetails {
    guest_count: i64,
    room_count: i64,
    primary_guest: String,
    contact_email: String,
    contact_phone: String,
    notes: Option<String>,
}

impl BookingForm {
    fn validate(&self) -> Result<GuestDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let guest_count = validate::positive_int(&mut errors, "guest_count", self.guest_count.as_deref());
        let room_count = validate::positive_int(&mut errors, "room_count", self.room_count.as_deref());
        let primary_guest = validate::required_text(
            &mut errors,
            "primary_guest",
            self.primary_guest.as_deref(),
            Some(MAX_GUEST_NAME),
        );
        let contact_email =
            validate::required_email(&mut errors, "contact_email", self.contact_email.as_deref());
        let contact_phone = validate::required_text(
            &mut errors,
            "contact_phone",
            self.contact_phone.as_deref(),
            Some(MAX_PHONE),
        );
        errors.into_result()?;

        let notes = self
            .additional_notes
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        Ok(GuestDetails {
            guest_count,
            room_count,
            primary_guest,
            contact_email,
            contact_phone,
            notes,
        })
    }
}

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    InvalidInput(#[from] PricingError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl BookingError {
    /// Worth resubmitting the same form later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BookingError::Gateway(_) | BookingError::Storage(_))
    }

    /// Message safe to show to the visitor.
    pub fn user_message(&self) -> String {
        match self {
            BookingError::Validation(errors) => errors.to_string(),
            BookingError::InvalidInput(err) => err.to_string(),
            BookingError::Gateway(_) => {
                "Payment service is temporarily unavailable. Please try again.".to_string()
            }
            BookingError::Storage(_) => {
                "We could not save your booking. Please try again.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingReceipt {
    pub booking_id: i64,
    pub order_id: String,
    pub snap_token: String,
    pub redirect_url: Option<String>,
    pub quote: Quote,
}

impl BookingReceipt {
    pub fn total(&self) -> Decimal {
        self.quote.total
    }
}

type OrderIdSource = Arc<dyn Fn() -> String + Send + Sync>;

pub fn new_order_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("BOOK-{}", &hex[..10])
}

#[derive(Clone)]
pub struct BookingService {
    pool: Pool,
    rates: RateTable,
    gateway: Arc<dyn PaymentGateway>,
    finish_url: String,
    order_ids: OrderIdSource,
}

impl BookingService {
    pub fn new(pool: Pool, rates: RateTable, gateway: Arc<dyn PaymentGateway>, finish_url: String) -> Self {
        Self {
            pool,
            rates,
            gateway,
            finish_url,
            order_ids: Arc::new(new_order_id),
        }
    }

    /// Replace the order id generator.
    pub fn with_order_ids(mut self, source: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.order_ids = Arc::new(source);
        self
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    /// Create a pending booking and attach a gateway session to it.
    ///
    /// A gateway failure leaves the pending row in place; the visitor may
    /// resubmit and a fresh booking is created.
    #[instrument(skip_all)]
    pub async fn submit(&self, form: &BookingForm) -> Result<BookingReceipt, BookingError> {
        let guest = form.validate()?;
        let quote = self.rates.quote(
            form.accommodation_type.as_deref(),
            guest.room_count,
            form.arrival_date.as_deref().unwrap_or_default(),
            form.departure_date.as_deref().unwrap_or_default(),
        )?;
        let amount_cents = decimal_to_cents(quote.total).ok_or(PricingError::TotalOverflow)?;

        let (booking_id, order_id) = self.insert_pending(&guest, &quote, amount_cents).await?;
        info!(%order_id, total = %quote.total, nights = quote.nights, "booking created");

        let request = SessionRequest {
            order_id: order_id.clone(),
            gross_amount: quote.total,
            customer: Customer {
                first_name: guest.primary_guest.clone(),
                email: guest.contact_email.clone(),
                phone: guest.contact_phone.clone(),
            },
            item: LineItem {
                id: LINE_ITEM_ID.to_string(),
                price: quote.per_room,
                quantity: quote.room_count,
                name: format!("{} Room", quote.accommodation.as_str()),
            },
            arrival: quote.arrival,
            departure: quote.departure,
            notes: guest.notes.clone(),
            finish_url: self.finish_url.clone(),
        };

        let session = match self.gateway.create_session(&request).await {
            Ok(session) => session,
            Err(err) => {
                warn!(%order_id, error = %err, "payment session failed; booking left pending");
                return Err(err.into());
            }
        };
        db::attach_session_token(&self.pool, booking_id, &session.token).await?;
        info!(%order_id, "payment session attached");

        Ok(BookingReceipt {
            booking_id,
            order_id,
            snap_token: session.token,
            redirect_url: session.redirect_url,
            quote,
        })
    }

    async fn insert_pending(
        &self,
        guest: &GuestDetails,
        quote: &Quote,
        amount_cents: i64,
    ) -> Result<(i64, String), BookingError> {
        for attempt in 1..=ORDER_ID_ATTEMPTS {
            let order_id = (self.order_ids)();
            let row = NewBooking {
                arrival_date: quote.arrival,
                departure_date: quote.departure,
                guest_count: guest.guest_count,
                room_count: guest.room_count,
                accommodation_type: quote.accommodation,
                additional_notes: guest.notes.clone(),
                primary_guest: guest.primary_guest.clone(),
                contact_email: guest.contact_email.clone(),
                contact_phone: guest.contact_phone.clone(),
                order_id: order_id.clone(),
                amount_cents,
            };
            match db::insert_booking(&self.pool, &row).await? {
                Some(id) => return Ok((id, order_id)),
                None => warn!(attempt, %order_id, "order id already taken; regenerating"),
            }
        }
        Err(BookingError::Storage(anyhow!(
            "no unique order id after {} attempts",
            ORDER_ID_ATTEMPTS
        )))
    }
}
