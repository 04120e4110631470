//! Quote line items and the add-product operation.
//!
//! A line item snapshots the catalog cost at the moment it is added, so later
//! catalog price changes never touch an item already on a quote.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::PricingError;
use super::models::CatalogProduct;
use super::rules::validate_percent;

/// Margin used when neither the form nor the catalog provides one.
pub const FALLBACK_MARGIN_PERCENT: Decimal = dec!(25);

/// Which cost terms apply to a line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductKind {
    /// Priced by area, with protection and installation.
    Fabric {
        width: Decimal,
        height: Decimal,
        #[serde(default)]
        location: String,
    },
    /// Priced per unit.
    Other,
}

impl ProductKind {
    pub fn is_fabric(&self) -> bool {
        matches!(self, ProductKind::Fabric { .. })
    }
}

/// A product on a quote, with its cost snapshot and display strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Uuid,
    pub kind: ProductKind,
    pub quantity: u32,
    pub unit_cost: Decimal,
    pub margin_percent: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub measures_label: String,
}

impl LineItem {
    /// Re-check an item that arrives from outside (e.g. a save request).
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.quantity == 0 {
            return Err(PricingError::invalid_item("quantity", "must be at least 1"));
        }
        if self.unit_cost < Decimal::ZERO {
            return Err(PricingError::invalid_item("unit_cost", "must not be negative"));
        }
        validate_percent("margin_percent", self.margin_percent)?;
        if let ProductKind::Fabric { width, height, .. } = &self.kind {
            check_dimension("width", Some(*width))?;
            check_dimension("height", Some(*height))?;
        }
        Ok(())
    }
}

/// Form input for adding a product to a quote.
#[derive(Debug, Clone, Default)]
pub struct NewLineItem {
    pub product_id: Uuid,
    pub quantity: i64,
    pub width: Option<Decimal>,
    pub height: Option<Decimal>,
    pub location: Option<String>,
    pub margin_percent: Option<Decimal>,
}

fn check_dimension(field: &str, value: Option<Decimal>) -> Result<Decimal, PricingError> {
    match value {
        Some(v) if v > Decimal::ZERO => Ok(v),
        Some(_) => Err(PricingError::invalid_item(field, "must be positive")),
        None => Err(PricingError::invalid_item(field, "is required for fabric products")),
    }
}

/// `"{w}x{h}m"` with the tolerance added to both sides, two decimals each.
pub fn measures_label(
    width: Decimal,
    height: Decimal,
    tolerance: Decimal,
) -> Result<String, PricingError> {
    let padded = |field: &str, value: Decimal| {
        value
            .checked_add(tolerance)
            .map(|v| v.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
            .ok_or_else(|| PricingError::invalid_item(field, "is too large"))
    };
    Ok(format!("{:.2}x{:.2}m", padded("width", width)?, padded("height", height)?))
}

/// Validate form input against a catalog snapshot and build the line item.
///
/// Nothing is created when validation fails.
pub fn build_line_item(
    product: &CatalogProduct,
    input: &NewLineItem,
    tolerance: Decimal,
) -> Result<LineItem, PricingError> {
    if input.quantity < 1 {
        return Err(PricingError::invalid_item("quantity", "must be at least 1"));
    }
    let quantity = u32::try_from(input.quantity)
        .map_err(|_| PricingError::invalid_item("quantity", "is too large"))?;

    if product.cost < Decimal::ZERO {
        return Err(PricingError::invalid_item("unit_cost", "catalog cost must not be negative"));
    }

    let margin_percent = input
        .margin_percent
        .or(product.default_margin_percent)
        .unwrap_or(FALLBACK_MARGIN_PERCENT);
    validate_percent("margin_percent", margin_percent)?;

    let (kind, description, label) = if product.is_fabric() {
        let width = check_dimension("width", input.width)?;
        let height = check_dimension("height", input.height)?;
        let location = input.location.clone().unwrap_or_default();
        let label = measures_label(width, height, tolerance)?;
        let description = format!(
            "Persianas Manuales de {}, {} pza {}, {} {}",
            location,
            quantity,
            label,
            product.blind_type.as_deref().unwrap_or_default(),
            product.model_name.as_deref().unwrap_or_default(),
        )
        .trim_end()
        .to_string();
        (
            ProductKind::Fabric {
                width,
                height,
                location,
            },
            description,
            label,
        )
    } else {
        (
            ProductKind::Other,
            product.description.clone().unwrap_or_default(),
            product.size_label.clone().unwrap_or_default(),
        )
    };

    Ok(LineItem {
        product_id: product.id,
        kind,
        quantity,
        unit_cost: product.cost,
        margin_percent,
        description,
        measures_label: label,
    })
}
