use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Everything the gateway needs to open a payment session for one booking.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRequest {
    pub order_id: String,
    pub gross_amount: Decimal,
    pub customer: Customer,
    pub item: LineItem,
    pub arrival: NaiveDate,
    pub departure: NaiveDate,
    pub notes: Option<String>,
    pub finish_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub first_name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    pub token: String,
    pub redirect_url: Option<String>,
}

/// Snap `POST /v1/transactions` body.
#[derive(Debug, Serialize)]
pub struct SnapTransaction<'a> {
    pub transaction_details: TransactionDetails<'a>,
    pub customer_details: &'a Customer,
    pub item_details: [&'a LineItem; 1],
    pub custom_field1: String,
    pub custom_field2: String,
    pub custom_field3: String,
    pub callbacks: Callbacks<'a>,
}

#[derive(Debug, Serialize)]
pub struct TransactionDetails<'a> {
    pub order_id: &'a str,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_amount: Decimal,
}

#[derive(Debug, Serialize)]
pub struct Callbacks<'a> {
    pub finish: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SnapResponse {
    pub token: Option<String>,
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub error_messages: Vec<String>,
}
