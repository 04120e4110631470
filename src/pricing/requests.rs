//! Request DTOs for pricing API endpoints.

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::line_item::{LineItem, NewLineItem};
use super::rules::QuoteRates;

/// Request to add a product to a quote (validate + snapshot)
#[derive(Debug, Deserialize)]
pub struct AddLineItemRequest {
    pub product_id: Uuid,
    pub quantity: i64,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub width: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub height: Option<Decimal>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub margin_percent: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub tolerance: Option<Decimal>,
}

impl From<&AddLineItemRequest> for NewLineItem {
    fn from(req: &AddLineItemRequest) -> Self {
        NewLineItem {
            product_id: req.product_id,
            quantity: req.quantity,
            width: req.width,
            height: req.height,
            location: req.location.clone(),
            margin_percent: req.margin_percent,
        }
    }
}

/// Request to price a list of line items
#[derive(Debug, Deserialize)]
pub struct CalculateQuoteRequest {
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub rates: QuoteRates,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub tolerance: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub adjusted_price: Option<Decimal>,
    #[serde(default)]
    pub include_iva: bool,
}
