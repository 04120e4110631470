//! Pricing error types.

use rust_decimal::Decimal;

/// Pricing calculation error types
#[derive(Debug, Clone, PartialEq)]
pub enum PricingError {
    /// A percentage outside `0 <= p < 100`, or a combined margin that reaches 100.
    InvalidRate { field: String, value: Decimal },
    /// A line item that can't be added to a quote.
    InvalidLineItem { field: String, reason: String },
    /// A malformed installation or volume markup tier.
    InvalidTier { message: String },
    UnknownProduct { product_id: String },
    ConfigurationError {
        message: String,
        errors: Vec<String>,
    },
}

impl PricingError {
    pub fn invalid_rate(field: impl Into<String>, value: Decimal) -> Self {
        PricingError::InvalidRate {
            field: field.into(),
            value,
        }
    }

    pub fn invalid_item(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PricingError::InvalidLineItem {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable name, used as `error_type` in API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            PricingError::InvalidRate { .. } => "invalid_rate",
            PricingError::InvalidLineItem { .. } => "invalid_line_item",
            PricingError::InvalidTier { .. } => "invalid_tier",
            PricingError::UnknownProduct { .. } => "unknown_product",
            PricingError::ConfigurationError { .. } => "configuration_error",
        }
    }
}

impl std::fmt::Display for PricingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingError::InvalidRate { field, value } => {
                write!(f, "Invalid rate {}={}: must be at least 0 and below 100", field, value)
            }
            PricingError::InvalidLineItem { field, reason } => {
                write!(f, "Invalid line item field {}: {}", field, reason)
            }
            PricingError::InvalidTier { message } => write!(f, "Invalid tier: {}", message),
            PricingError::UnknownProduct { product_id } => {
                write!(f, "No catalog product found for {}", product_id)
            }
            PricingError::ConfigurationError { message, .. } => {
                write!(f, "Configuration error: {}", message)
            }
        }
    }
}

impl std::error::Error for PricingError {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_pricing_error_display() {
        let err = PricingError::invalid_rate("discount_percent", dec!(100));
        assert!(err.to_string().contains("discount_percent=100"));
        assert_eq!(err.kind(), "invalid_rate");

        let err = PricingError::invalid_item("width", "must be positive");
        assert!(err.to_string().contains("width"));

        let err = PricingError::UnknownProduct {
            product_id: "123".to_string(),
        };
        assert!(err.to_string().contains("123"));

        let err = PricingError::ConfigurationError {
            message: "test error".to_string(),
            errors: vec![],
        };
        assert!(err.to_string().contains("test error"));
    }
}
