//! Core pricing calculation functions.
//!
//! Pure functions for quote pricing math - no database access.
//!
//! Each line runs through a cascading gross-up: margin, then discount, then
//! agent commission, then seller commission. Every stage grows the running
//! figure so the stage's amount is its percentage of the *resulting* price,
//! not of the cost it started from. The seller stage uses
//! `cost + margin + discount + agent` as its base.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use super::error::PricingError;
use super::line_item::{LineItem, ProductKind};
use super::rules::PricingRules;

/// Mexican VAT applied on top of the final price when enabled.
pub const IVA_RATE: Decimal = dec!(0.16);

/// Non-admin adjusted prices must be at least this share of the net subtotal.
pub const MIN_ADJUSTED_PRICE_RATIO: Decimal = dec!(0.90);

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
///
/// Banker's rounding rounds to the nearest even number when the value is exactly
/// halfway between two possibilities. This reduces cumulative rounding bias.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use smartblinds_web::pricing::round_money;
///
/// assert_eq!(round_money(dec!(2.5), 0), dec!(2));   // rounds to even
/// assert_eq!(round_money(dec!(3.5), 0), dec!(4));   // rounds to even
/// assert_eq!(round_money(dec!(1.234), 2), dec!(1.23));
/// ```
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Billable area per unit: at least one square meter.
pub fn effective_area(width: Decimal, height: Decimal) -> Result<Decimal, PricingError> {
    width
        .checked_mul(height)
        .map(|area| area.max(Decimal::ONE))
        .ok_or_else(|| too_large("width"))
}

fn too_large(field: &str) -> PricingError {
    PricingError::invalid_item(field, "is too large to price")
}

/// Product of `terms`, or an invalid-input error naming `field` on overflow.
fn checked_product(terms: &[Decimal], field: &str) -> Result<Decimal, PricingError> {
    terms
        .iter()
        .try_fold(Decimal::ONE, |acc, term| acc.checked_mul(*term))
        .ok_or_else(|| too_large(field))
}

/// Sum of `values`, or an invalid-input error naming `field` on overflow.
fn checked_sum(
    values: impl IntoIterator<Item = Decimal>,
    field: &str,
) -> Result<Decimal, PricingError> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
        .ok_or_else(|| too_large(field))
}

/// Amount to add to `base` so that it makes up `percent` of the grossed-up total.
///
/// `base / (1 - percent/100) - base`. A percent of 100 or more has no finite
/// answer and is rejected.
pub fn gross_up(base: Decimal, percent: Decimal, field: &str) -> Result<Decimal, PricingError> {
    let keep = Decimal::ONE - percent / Decimal::ONE_HUNDRED;
    if keep <= Decimal::ZERO {
        return Err(PricingError::invalid_rate(field, percent));
    }
    let grossed = base.checked_div(keep).ok_or_else(|| too_large(field))?;
    Ok(grossed - base)
}

/// Cost breakdown for one line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineBreakdown {
    pub base_cost: Decimal,
    pub protection: Decimal,
    pub installation: Decimal,
    /// Line margin plus the volume markup, for fabric lines.
    pub applied_margin_percent: Decimal,
    pub margin: Decimal,
    pub discount: Decimal,
    pub agent_commission: Decimal,
    pub seller_commission: Decimal,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Quote-wide figures the per-line pipeline depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteContext {
    /// Installation price per fabric unit from the fabric-count tier.
    pub installation_price: Decimal,
    /// Extra margin for fabric lines from the volume tier.
    pub volume_markup_percent: Decimal,
}

impl QuoteContext {
    /// Resolve the tiers for a list of items.
    ///
    /// Both tiers are keyed by the number of fabric lines on the quote.
    pub fn for_items(items: &[LineItem], rules: &PricingRules) -> Self {
        let fabric_lines = items.iter().filter(|item| item.kind.is_fabric()).count();
        let fabric_lines = u32::try_from(fabric_lines).unwrap_or(u32::MAX);
        Self {
            installation_price: rules.installation_price(fabric_lines),
            volume_markup_percent: rules.volume_markup_percent(fabric_lines),
        }
    }
}

/// Price a single line.
pub fn price_line(
    item: &LineItem,
    rules: &PricingRules,
    context: &QuoteContext,
) -> Result<LineBreakdown, PricingError> {
    let rates = &rules.rates;
    let quantity = Decimal::from(item.quantity);

    let (base_cost, protection, installation, applied_margin_percent) = match &item.kind {
        ProductKind::Fabric { width, height, .. } => {
            let area = effective_area(*width, *height)?;
            let base = checked_product(&[area, item.unit_cost, quantity], "unit_cost")?;
            let protection = base * (rates.protection_percent / Decimal::ONE_HUNDRED);
            let installation =
                checked_product(&[context.installation_price, quantity], "quantity")?;
            (
                base,
                protection,
                installation,
                item.margin_percent + context.volume_markup_percent,
            )
        }
        ProductKind::Other => (
            checked_product(&[item.unit_cost, quantity], "unit_cost")?,
            Decimal::ZERO,
            Decimal::ZERO,
            item.margin_percent,
        ),
    };

    let cost_total = checked_sum([base_cost, protection, installation], "unit_cost")?;

    let margin = gross_up(cost_total, applied_margin_percent, "margin_percent")?;
    let after_margin = checked_sum([cost_total, margin], "margin_percent")?;

    let discount = gross_up(after_margin, rates.discount_percent, "discount_percent")?;
    let after_discount = checked_sum([after_margin, discount], "discount_percent")?;

    let agent_commission = gross_up(
        after_discount,
        rates.agent_commission_percent,
        "agent_commission_percent",
    )?;

    let seller_base = checked_sum(
        [cost_total, margin, discount, agent_commission],
        "agent_commission_percent",
    )?;
    let seller_commission = gross_up(
        seller_base,
        rates.seller_commission_percent,
        "seller_commission_percent",
    )?;

    let subtotal = checked_sum([seller_base, seller_commission], "seller_commission_percent")?;

    Ok(LineBreakdown {
        base_cost,
        protection,
        installation,
        applied_margin_percent,
        margin,
        discount,
        agent_commission,
        seller_commission,
        unit_price: subtotal / quantity,
        subtotal,
    })
}

/// Manual final price and tax options for a quote.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceAdjustment {
    pub adjusted_price: Option<Decimal>,
    pub include_iva: bool,
    /// Administrators may set any positive adjusted price.
    pub actor_is_admin: bool,
}

/// Aggregate figures for a quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteTotals {
    pub total_base: Decimal,
    pub total_protection: Decimal,
    pub total_installation: Decimal,
    pub total_margin: Decimal,
    pub subtotal_list_price: Decimal,
    pub total_discounts: Decimal,
    pub net_subtotal: Decimal,
    /// Lowest adjusted price a non-admin may set.
    pub min_allowed_price: Decimal,
    /// The adjusted price, when it was accepted.
    pub adjusted_price: Option<Decimal>,
    /// True when an adjusted price was given but fell below the floor.
    pub adjusted_price_rejected: bool,
    pub tax_base: Decimal,
    pub iva: Decimal,
    pub grand_total: Decimal,
}

/// Full breakdown: one entry per line (same order as the input) plus totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteBreakdown {
    pub lines: Vec<LineBreakdown>,
    pub totals: QuoteTotals,
}

/// Decide whether a manual price is accepted.
///
/// Returns the accepted price, if any. Prices that are missing or not positive
/// are ignored; non-admins must stay at or above 90% of the net subtotal.
pub fn accept_adjusted_price(
    net_subtotal: Decimal,
    adjustment: &PriceAdjustment,
) -> Option<Decimal> {
    let price = adjustment.adjusted_price.filter(|p| *p > Decimal::ZERO)?;
    if adjustment.actor_is_admin || price >= net_subtotal * MIN_ADJUSTED_PRICE_RATIO {
        Some(price)
    } else {
        None
    }
}

/// Price every line and aggregate.
///
/// Recomputes everything from the raw items and rules; nothing is cached.
pub fn price_quote(
    items: &[LineItem],
    rules: &PricingRules,
    adjustment: &PriceAdjustment,
) -> Result<QuoteBreakdown, PricingError> {
    rules.validate()?;
    for item in items {
        item.validate()?;
    }

    let context = QuoteContext::for_items(items, rules);
    let lines = items
        .iter()
        .map(|item| price_line(item, rules, &context))
        .collect::<Result<Vec<_>, _>>()?;

    let total_base = checked_sum(lines.iter().map(|l| l.base_cost), "items")?;
    let total_protection = checked_sum(lines.iter().map(|l| l.protection), "items")?;
    let total_installation = checked_sum(lines.iter().map(|l| l.installation), "items")?;
    let total_margin = checked_sum(lines.iter().map(|l| l.margin), "items")?;
    let subtotal_list_price = checked_sum(lines.iter().map(|l| l.subtotal), "items")?;
    let total_discounts = checked_sum(lines.iter().map(|l| l.discount), "items")?;
    let net_subtotal = subtotal_list_price - total_discounts;

    let adjusted_price = accept_adjusted_price(net_subtotal, adjustment);
    let adjusted_price_rejected = adjustment
        .adjusted_price
        .is_some_and(|p| p > Decimal::ZERO)
        && adjusted_price.is_none();

    let tax_base = adjusted_price.unwrap_or(net_subtotal);
    let iva = if adjustment.include_iva {
        tax_base * IVA_RATE
    } else {
        Decimal::ZERO
    };
    let grand_total = checked_sum([tax_base, iva], "adjusted_price")?;

    Ok(QuoteBreakdown {
        lines,
        totals: QuoteTotals {
            total_base,
            total_protection,
            total_installation,
            total_margin,
            subtotal_list_price,
            total_discounts,
            net_subtotal,
            min_allowed_price: net_subtotal * MIN_ADJUSTED_PRICE_RATIO,
            adjusted_price,
            adjusted_price_rejected,
            tax_base,
            iva,
            grand_total,
        },
    })
}
