//! Response DTOs for pricing API endpoints.
//!
//! Amounts are rounded to cents here, at the display boundary; the
//! calculators keep full precision.

use rust_decimal::Decimal;
use serde::Serialize;

use super::calculators::{round_money, LineBreakdown, QuoteBreakdown, QuoteTotals};
use super::line_item::LineItem;

/// Round to cents for responses and persistence.
pub fn cents(amount: Decimal) -> Decimal {
    round_money(amount, 2)
}

/// Per-line figures, rounded
#[derive(Debug, Serialize)]
pub struct LineBreakdownResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub base_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub protection: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub installation: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub applied_margin_percent: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub margin: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub discount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub agent_commission: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub seller_commission: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub subtotal: Decimal,
}

impl From<&LineBreakdown> for LineBreakdownResponse {
    fn from(line: &LineBreakdown) -> Self {
        Self {
            base_cost: cents(line.base_cost),
            protection: cents(line.protection),
            installation: cents(line.installation),
            applied_margin_percent: line.applied_margin_percent,
            margin: cents(line.margin),
            discount: cents(line.discount),
            agent_commission: cents(line.agent_commission),
            seller_commission: cents(line.seller_commission),
            unit_price: cents(line.unit_price),
            subtotal: cents(line.subtotal),
        }
    }
}

/// A line item together with its computed figures
#[derive(Debug, Serialize)]
pub struct PricedLineResponse {
    pub item: LineItem,
    pub calculated: LineBreakdownResponse,
}

/// Quote totals, rounded
#[derive(Debug, Serialize)]
pub struct QuoteTotalsResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub total_base: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_protection: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_installation: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_margin: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub subtotal_list_price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_discounts: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub net_subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub min_allowed_price: Decimal,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub adjusted_price: Option<Decimal>,
    pub adjusted_price_rejected: bool,
    #[serde(with = "rust_decimal::serde::str")]
    pub tax_base: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub iva: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub grand_total: Decimal,
}

impl From<&QuoteTotals> for QuoteTotalsResponse {
    fn from(totals: &QuoteTotals) -> Self {
        Self {
            total_base: cents(totals.total_base),
            total_protection: cents(totals.total_protection),
            total_installation: cents(totals.total_installation),
            total_margin: cents(totals.total_margin),
            subtotal_list_price: cents(totals.subtotal_list_price),
            total_discounts: cents(totals.total_discounts),
            net_subtotal: cents(totals.net_subtotal),
            min_allowed_price: cents(totals.min_allowed_price),
            adjusted_price: totals.adjusted_price.map(cents),
            adjusted_price_rejected: totals.adjusted_price_rejected,
            tax_base: cents(totals.tax_base),
            iva: cents(totals.iva),
            grand_total: cents(totals.grand_total),
        }
    }
}

/// Response for a full quote calculation
#[derive(Debug, Serialize)]
pub struct QuoteBreakdownResponse {
    pub lines: Vec<PricedLineResponse>,
    pub totals: QuoteTotalsResponse,
    pub currency: &'static str,
}

impl QuoteBreakdownResponse {
    pub fn new(items: Vec<LineItem>, breakdown: &QuoteBreakdown) -> Self {
        let lines = items
            .into_iter()
            .zip(&breakdown.lines)
            .map(|(item, line)| PricedLineResponse {
                item,
                calculated: line.into(),
            })
            .collect();
        Self {
            lines,
            totals: (&breakdown.totals).into(),
            currency: "MXN",
        }
    }
}
