//! Database models for pricing queries.
//!
//! These models use sqlx's FromRow derive for direct database deserialization.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::error::PricingError;
use super::rules::{InstallationTier, VolumeMarkupTier};

/// Product from catalog_products
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CatalogProduct {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    /// "fabric" or "other"
    pub kind: String,
    pub cost: Decimal,
    pub default_margin_percent: Option<Decimal>,
    pub blind_type: Option<String>,
    pub model_name: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub size_label: Option<String>,
}

impl CatalogProduct {
    pub fn is_fabric(&self) -> bool {
        self.kind.eq_ignore_ascii_case("fabric")
    }
}

/// Row from installation_tiers
#[derive(Debug, Clone, FromRow)]
pub struct InstallationTierRow {
    pub id: Uuid,
    pub min_count: i32,
    pub max_count: i32,
    pub price: Decimal,
}

impl TryFrom<InstallationTierRow> for InstallationTier {
    type Error = PricingError;

    fn try_from(row: InstallationTierRow) -> Result<Self, Self::Error> {
        Ok(InstallationTier {
            min: non_negative(row.min_count, row.id)?,
            max: non_negative(row.max_count, row.id)?,
            price: row.price,
        })
    }
}

/// Row from volume_markup_tiers
#[derive(Debug, Clone, FromRow)]
pub struct VolumeMarkupTierRow {
    pub id: Uuid,
    pub min_pieces: i32,
    pub max_pieces: i32,
    pub extra_margin_percent: Decimal,
}

impl TryFrom<VolumeMarkupTierRow> for VolumeMarkupTier {
    type Error = PricingError;

    fn try_from(row: VolumeMarkupTierRow) -> Result<Self, Self::Error> {
        Ok(VolumeMarkupTier {
            min_pieces: non_negative(row.min_pieces, row.id)?,
            max_pieces: non_negative(row.max_pieces, row.id)?,
            extra_margin_percent: row.extra_margin_percent,
        })
    }
}

fn non_negative(value: i32, tier_id: Uuid) -> Result<u32, PricingError> {
    u32::try_from(value).map_err(|_| PricingError::InvalidTier {
        message: format!("tier {} has negative bound {}", tier_id, value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tier_row_conversion() {
        let row = InstallationTierRow {
            id: Uuid::nil(),
            min_count: 1,
            max_count: 5,
            price: dec!(50),
        };
        let tier = InstallationTier::try_from(row).unwrap();
        assert_eq!(tier, InstallationTier { min: 1, max: 5, price: dec!(50) });
    }

    #[test]
    fn test_tier_row_rejects_negative_bound() {
        let row = VolumeMarkupTierRow {
            id: Uuid::nil(),
            min_pieces: -1,
            max_pieces: 5,
            extra_margin_percent: dec!(5),
        };
        assert!(matches!(
            VolumeMarkupTier::try_from(row),
            Err(PricingError::InvalidTier { .. })
        ));
    }

    #[test]
    fn test_product_kind_is_case_insensitive() {
        let product = CatalogProduct {
            id: Uuid::nil(),
            sku: "X".to_string(),
            name: "X".to_string(),
            kind: "Fabric".to_string(),
            cost: dec!(1),
            default_margin_percent: None,
            blind_type: None,
            model_name: None,
            color: None,
            description: None,
            size_label: None,
        };
        assert!(product.is_fabric());
    }
}
