//! Quote-level pricing rules: rate percentages and count-based tiers.
//!
//! All percentages are plain numbers (25 means 25%). Rules are validated when
//! they enter the system so the calculators never see a rate that would make a
//! gross-up denominator zero or negative.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::PricingError;

/// Tolerance in meters added to both dimensions for the measures label.
pub const DEFAULT_TOLERANCE: Decimal = dec!(0.15);

/// Check that `value` is a usable percentage (`0 <= value < 100`).
pub fn validate_percent(field: &str, value: Decimal) -> Result<Decimal, PricingError> {
    if value < Decimal::ZERO || value >= Decimal::ONE_HUNDRED {
        return Err(PricingError::invalid_rate(field, value));
    }
    Ok(value)
}

/// Inclusive count range used for tier lookup.
pub trait TierRange {
    fn bounds(&self) -> (u32, u32);

    fn contains(&self, count: u32) -> bool {
        let (min, max) = self.bounds();
        count >= min && count <= max
    }
}

/// First tier whose `[min, max]` contains `count`.
///
/// Tier lists are expected to be disjoint, so the first match is the only match.
pub fn find_tier<T: TierRange>(tiers: &[T], count: u32) -> Option<&T> {
    tiers.iter().find(|tier| tier.contains(count))
}

/// Installation price per fabric unit, chosen by the number of fabric lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstallationTier {
    pub min: u32,
    pub max: u32,
    pub price: Decimal,
}

impl TierRange for InstallationTier {
    fn bounds(&self) -> (u32, u32) {
        (self.min, self.max)
    }
}

/// Extra margin applied to fabric lines, chosen by the number of fabric pieces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeMarkupTier {
    pub min_pieces: u32,
    pub max_pieces: u32,
    pub extra_margin_percent: Decimal,
}

impl TierRange for VolumeMarkupTier {
    fn bounds(&self) -> (u32, u32) {
        (self.min_pieces, self.max_pieces)
    }
}

/// The globally configured tier tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TierSet {
    pub installation: Vec<InstallationTier>,
    pub volume_markup: Vec<VolumeMarkupTier>,
}

impl TierSet {
    pub fn validate(&self) -> Result<(), PricingError> {
        validate_tiers(&self.installation, &self.volume_markup)
    }
}

fn validate_tiers(
    installation: &[InstallationTier],
    volume_markup: &[VolumeMarkupTier],
) -> Result<(), PricingError> {
    for tier in installation {
        if tier.min > tier.max {
            return Err(PricingError::InvalidTier {
                message: format!("installation tier {}-{} has min above max", tier.min, tier.max),
            });
        }
        if tier.price < Decimal::ZERO {
            return Err(PricingError::InvalidTier {
                message: format!(
                    "installation tier {}-{} has negative price {}",
                    tier.min, tier.max, tier.price
                ),
            });
        }
    }
    for tier in volume_markup {
        if tier.min_pieces > tier.max_pieces {
            return Err(PricingError::InvalidTier {
                message: format!(
                    "volume markup tier {}-{} has min above max",
                    tier.min_pieces, tier.max_pieces
                ),
            });
        }
        validate_percent("extra_margin_percent", tier.extra_margin_percent)?;
    }
    Ok(())
}

/// Quote-level rates. Missing values default to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuoteRates {
    pub protection_percent: Decimal,
    pub discount_percent: Decimal,
    pub agent_commission_percent: Decimal,
    pub seller_commission_percent: Decimal,
}

impl QuoteRates {
    pub fn validate(&self) -> Result<(), PricingError> {
        validate_percent("protection_percent", self.protection_percent)?;
        validate_percent("discount_percent", self.discount_percent)?;
        validate_percent("agent_commission_percent", self.agent_commission_percent)?;
        validate_percent("seller_commission_percent", self.seller_commission_percent)?;
        Ok(())
    }
}

/// Everything the calculators need besides the line items.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingRules {
    pub installation_tiers: Vec<InstallationTier>,
    pub volume_markup_tiers: Vec<VolumeMarkupTier>,
    pub rates: QuoteRates,
    pub tolerance: Decimal,
}

impl PricingRules {
    /// Build validated rules from the configured tiers and per-quote rates.
    pub fn new(tiers: &TierSet, rates: QuoteRates, tolerance: Decimal) -> Result<Self, PricingError> {
        let rules = Self {
            installation_tiers: tiers.installation.clone(),
            volume_markup_tiers: tiers.volume_markup.clone(),
            rates,
            tolerance,
        };
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), PricingError> {
        self.rates.validate()?;
        if self.tolerance < Decimal::ZERO {
            return Err(PricingError::ConfigurationError {
                message: format!("Tolerance must not be negative, got {}", self.tolerance),
                errors: vec!["tolerance < 0".to_string()],
            });
        }
        validate_tiers(&self.installation_tiers, &self.volume_markup_tiers)
    }

    /// Installation price per unit for a quote with `fabric_count` fabric lines.
    pub fn installation_price(&self, fabric_count: u32) -> Decimal {
        if fabric_count == 0 {
            return Decimal::ZERO;
        }
        find_tier(&self.installation_tiers, fabric_count)
            .map(|tier| tier.price)
            .unwrap_or(Decimal::ZERO)
    }

    /// Extra margin percent for a quote with `fabric_pieces` fabric lines.
    pub fn volume_markup_percent(&self, fabric_pieces: u32) -> Decimal {
        find_tier(&self.volume_markup_tiers, fabric_pieces)
            .map(|tier| tier.extra_margin_percent)
            .unwrap_or(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> TierSet {
        TierSet {
            installation: vec![
                InstallationTier { min: 1, max: 5, price: dec!(50) },
                InstallationTier { min: 6, max: 10, price: dec!(40) },
            ],
            volume_markup: vec![VolumeMarkupTier {
                min_pieces: 3,
                max_pieces: 20,
                extra_margin_percent: dec!(5),
            }],
        }
    }

    #[test]
    fn test_validate_percent_bounds() {
        assert!(validate_percent("p", dec!(0)).is_ok());
        assert!(validate_percent("p", dec!(99.99)).is_ok());
        assert!(validate_percent("p", dec!(100)).is_err());
        assert!(validate_percent("p", dec!(150)).is_err());
        assert!(validate_percent("p", dec!(-1)).is_err());
    }

    #[test]
    fn test_installation_tier_inclusive_upper_bound() {
        let rules = PricingRules {
            installation_tiers: vec![InstallationTier { min: 1, max: 5, price: dec!(50) }],
            volume_markup_tiers: vec![],
            rates: QuoteRates::default(),
            tolerance: DEFAULT_TOLERANCE,
        };
        assert_eq!(rules.installation_price(5), dec!(50));
        assert_eq!(rules.installation_price(1), dec!(50));
        // No higher tier configured
        assert_eq!(rules.installation_price(6), dec!(0));
        assert_eq!(rules.installation_price(0), dec!(0));
    }

    #[test]
    fn test_tier_lookup_picks_matching_range() {
        let rules = PricingRules::new(&tiers(), QuoteRates::default(), DEFAULT_TOLERANCE).unwrap();
        assert_eq!(rules.installation_price(7), dec!(40));
        assert_eq!(rules.volume_markup_percent(2), dec!(0));
        assert_eq!(rules.volume_markup_percent(3), dec!(5));
        assert_eq!(rules.volume_markup_percent(21), dec!(0));
    }

    #[test]
    fn test_rules_reject_rate_of_one_hundred() {
        let rates = QuoteRates {
            discount_percent: dec!(100),
            ..QuoteRates::default()
        };
        let err = PricingRules::new(&tiers(), rates, DEFAULT_TOLERANCE).unwrap_err();
        assert_eq!(err, PricingError::invalid_rate("discount_percent", dec!(100)));
    }

    #[test]
    fn test_tier_set_rejects_inverted_range() {
        let set = TierSet {
            installation: vec![InstallationTier { min: 6, max: 5, price: dec!(10) }],
            volume_markup: vec![],
        };
        assert!(matches!(set.validate(), Err(PricingError::InvalidTier { .. })));
    }

    #[test]
    fn test_tier_set_rejects_markup_of_one_hundred() {
        let set = TierSet {
            installation: vec![],
            volume_markup: vec![VolumeMarkupTier {
                min_pieces: 1,
                max_pieces: 2,
                extra_margin_percent: dec!(100),
            }],
        };
        assert!(matches!(set.validate(), Err(PricingError::InvalidRate { .. })));
    }

    #[test]
    fn test_quote_rates_default_to_zero_when_missing() {
        let rates: QuoteRates = serde_json::from_str(r#"{"discount_percent": "10"}"#).unwrap();
        assert_eq!(rates.discount_percent, dec!(10));
        assert_eq!(rates.protection_percent, dec!(0));
        assert_eq!(rates.agent_commission_percent, dec!(0));
        assert_eq!(rates.seller_commission_percent, dec!(0));
    }
}
