//! Quote (sales order) models

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::pricing::line_item::{LineItem, ProductKind};
use crate::pricing::responses::cents;
use crate::pricing::{QuoteBreakdown, QuoteRates};

/// Lifecycle of a quote. Only `New` quotes accept product changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    New,
    Finalized,
    Authorized,
    Cancelled,
}

impl QuoteStatus {
    /// Value stored in `quotes.status`
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::New => "new",
            QuoteStatus::Finalized => "finalized",
            QuoteStatus::Authorized => "authorized",
            QuoteStatus::Cancelled => "cancelled",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuoteStatus::New => "New",
            QuoteStatus::Finalized => "Finalized",
            QuoteStatus::Authorized => "Authorized",
            QuoteStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, QuoteStatus::New)
    }

    pub fn can_add_products(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown quote status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for QuoteStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(QuoteStatus::New),
            "finalized" => Ok(QuoteStatus::Finalized),
            "authorized" => Ok(QuoteStatus::Authorized),
            "cancelled" | "canceled" => Ok(QuoteStatus::Cancelled),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Quote header from the quotes table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Quote {
    pub id: Uuid,
    pub project_name: String,
    pub client_id: Uuid,
    pub created_by: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    pub project_type_id: Uuid,
    pub shipping_id: Option<Uuid>,
    pub quoted_line: String,
    pub status: String,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub list_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub final_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub iva: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub discount_percent: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub list_price_with_discount: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub tolerance: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl Quote {
    pub fn status(&self) -> Result<QuoteStatus, UnknownStatus> {
        self.status.parse()
    }
}

/// Open quote row for the quotes list
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QuoteSummary {
    pub id: Uuid,
    pub project_name: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub client_name: Option<String>,
    pub creator_name: Option<String>,
    pub agent_name: Option<String>,
}

/// Persisted quote line with every computed amount
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct QuoteItem {
    pub position: i32,
    pub product_id: Uuid,
    pub quantity: i32,
    pub description: String,
    pub measures_label: String,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub width: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub height: Option<Decimal>,
    pub location: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_cost: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub protection: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub installation: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub margin_percent: Decimal,
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

/// Quote header with its items and derived status flags
#[derive(Debug, Clone, Serialize)]
pub struct QuoteDetail {
    #[serde(flatten)]
    pub quote: Quote,
    pub status_label: String,
    pub can_add_products: bool,
    pub items: Vec<QuoteItem>,
}

impl QuoteDetail {
    pub fn new(quote: Quote, items: Vec<QuoteItem>) -> Result<Self, UnknownStatus> {
        let status = quote.status()?;
        Ok(Self {
            quote,
            status_label: status.label().to_string(),
            can_add_products: status.can_add_products(),
            items,
        })
    }
}

/// Request body for creating a quote
#[derive(Debug, Clone, Deserialize)]
pub struct NewQuote {
    pub client_id: Uuid,
    pub project_type_id: Uuid,
    pub quoted_line: String,
    #[serde(default)]
    pub agent_id: Option<Uuid>,
    #[serde(default)]
    pub shipping_id: Option<Uuid>,
    #[serde(default)]
    pub project_name: Option<String>,
}

impl NewQuote {
    pub fn validate(&self) -> Result<(), String> {
        if self.quoted_line.trim().is_empty() {
            return Err("quoted_line is required".to_string());
        }
        Ok(())
    }

    /// The caller-supplied project name, if it is not blank.
    pub fn explicit_project_name(&self) -> Option<&str> {
        self.project_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

fn code(value: &str, len: usize, strip_spaces: bool) -> String {
    value
        .chars()
        .filter(|c| !(strip_spaces && c.is_whitespace()))
        .take(len)
        .collect::<String>()
        .to_uppercase()
}

/// Build a quote folio such as `RESSHFI0305-42`.
///
/// Three letters of the project type (spaces removed), two of the sales
/// channel, two of the client type, the month and day, then the running
/// number `existing_quotes + 1`.
pub fn generate_folio(
    project_type: &str,
    channel: &str,
    client_type: &str,
    date: NaiveDate,
    existing_quotes: i64,
) -> String {
    format!(
        "{}{}{}{:02}{:02}-{}",
        code(project_type, 3, true),
        code(channel, 2, false),
        code(client_type, 2, false),
        date.month(),
        date.day(),
        existing_quotes + 1
    )
}

/// Everything written to the database when a quote is saved.
///
/// Amounts are rounded to cents here and nowhere earlier.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedQuote {
    pub items: Vec<QuoteItem>,
    pub list_price: Decimal,
    pub final_price: Decimal,
    pub iva: Decimal,
    pub discount_percent: Decimal,
    pub list_price_with_discount: Decimal,
    pub tolerance: Decimal,
}

impl PricedQuote {
    /// Pair each item with its computed line and derive the quote aggregates.
    pub fn from_breakdown(
        items: &[LineItem],
        breakdown: &QuoteBreakdown,
        rates: &QuoteRates,
        tolerance: Decimal,
    ) -> Self {
        let totals = &breakdown.totals;
        let list_price = totals.subtotal_list_price;
        let discount_percent = rates.discount_percent;

        let items = items
            .iter()
            .zip(&breakdown.lines)
            .enumerate()
            .map(|(position, (item, line))| {
                let (width, height, location) = match &item.kind {
                    ProductKind::Fabric {
                        width,
                        height,
                        location,
                    } => (Some(*width), Some(*height), Some(location.clone())),
                    ProductKind::Other => (None, None, None),
                };
                QuoteItem {
                    position: i32::try_from(position).unwrap_or(i32::MAX),
                    product_id: item.product_id,
                    quantity: i32::try_from(item.quantity).unwrap_or(i32::MAX),
                    description: item.description.clone(),
                    measures_label: item.measures_label.clone(),
                    width,
                    height,
                    location,
                    unit_cost: cents(item.unit_cost),
                    protection: cents(line.protection),
                    installation: cents(line.installation),
                    margin_percent: item.margin_percent,
                    margin: cents(line.margin),
                    discount: cents(line.discount),
                    agent_commission: cents(line.agent_commission),
                    seller_commission: cents(line.seller_commission),
                    unit_price: cents(line.unit_price),
                    subtotal: cents(line.subtotal),
                }
            })
            .collect();

        Self {
            items,
            list_price: cents(list_price),
            final_price: cents(totals.adjusted_price.unwrap_or(totals.grand_total)),
            iva: cents(totals.iva),
            discount_percent,
            list_price_with_discount: cents(
                list_price - list_price * (discount_percent / Decimal::ONE_HUNDRED),
            ),
            tolerance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::rules::{InstallationTier, PricingRules, TierSet, VolumeMarkupTier};
    use crate::pricing::{price_quote, PriceAdjustment};
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_round_trips_through_storage_value() {
        for status in [
            QuoteStatus::New,
            QuoteStatus::Finalized,
            QuoteStatus::Authorized,
            QuoteStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<QuoteStatus>(), Ok(status));
        }
        assert!("archived".parse::<QuoteStatus>().is_err());
    }

    #[test]
    fn test_only_new_quotes_accept_products() {
        assert!(QuoteStatus::New.can_add_products());
        assert!(!QuoteStatus::Finalized.can_add_products());
        assert!(!QuoteStatus::Authorized.can_add_products());
        assert!(QuoteStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_generate_folio() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(
            generate_folio("Res idencial", "Showroom", "Final", date, 41),
            "RESSHFI0305-42"
        );
    }

    #[test]
    fn test_generate_folio_with_short_names() {
        let date = NaiveDate::from_ymd_opt(2024, 11, 23).unwrap();
        assert_eq!(generate_folio("Ob", "w", "", date, 0), "OBW1123-1");
    }

    #[test]
    fn test_blank_project_name_is_ignored() {
        let quote = NewQuote {
            client_id: Uuid::nil(),
            project_type_id: Uuid::nil(),
            quoted_line: "Roller".to_string(),
            agent_id: None,
            shipping_id: None,
            project_name: Some("   ".to_string()),
        };
        assert_eq!(quote.explicit_project_name(), None);
        assert!(quote.validate().is_ok());
    }

    #[test]
    fn test_priced_quote_uses_accepted_adjusted_price() {
        let items = vec![LineItem {
            product_id: Uuid::nil(),
            kind: ProductKind::Fabric {
                width: dec!(2),
                height: dec!(1),
                location: "Kitchen".to_string(),
            },
            quantity: 1,
            unit_cost: dec!(100),
            margin_percent: dec!(20),
            description: "Persianas Manuales".to_string(),
            measures_label: "2.15x1.15m".to_string(),
        }];
        let tiers = TierSet {
            installation: vec![InstallationTier { min: 1, max: 5, price: dec!(50) }],
            volume_markup: vec![],
        };
        let rates = QuoteRates {
            discount_percent: dec!(10),
            ..QuoteRates::default()
        };
        let rules = PricingRules::new(&tiers, rates, dec!(0.15)).unwrap();
        let adjustment = PriceAdjustment {
            adjusted_price: Some(dec!(1)),
            include_iva: false,
            actor_is_admin: true,
        };
        let breakdown = price_quote(&items, &rules, &adjustment).unwrap();

        let priced = PricedQuote::from_breakdown(&items, &breakdown, &rates, dec!(0.15));
        assert_eq!(priced.final_price, dec!(1.00));
        assert_eq!(priced.items.len(), 1);
        assert_eq!(priced.items[0].location.as_deref(), Some("Kitchen"));
        assert_eq!(priced.list_price, cents(breakdown.totals.subtotal_list_price));
        assert_eq!(
            priced.list_price_with_discount,
            cents(breakdown.totals.subtotal_list_price * dec!(0.9))
        );
    }

    #[test]
    fn test_saved_margin_is_the_line_margin() {
        let items = vec![LineItem {
            product_id: Uuid::nil(),
            kind: ProductKind::Fabric {
                width: dec!(1),
                height: dec!(1),
                location: String::new(),
            },
            quantity: 1,
            unit_cost: dec!(100),
            margin_percent: dec!(20),
            description: String::new(),
            measures_label: String::new(),
        }];
        let tiers = TierSet {
            installation: vec![],
            volume_markup: vec![VolumeMarkupTier {
                min_pieces: 1,
                max_pieces: 5,
                extra_margin_percent: dec!(5),
            }],
        };
        let rates = QuoteRates::default();
        let rules = PricingRules::new(&tiers, rates, dec!(0.15)).unwrap();
        let breakdown = price_quote(&items, &rules, &PriceAdjustment::default()).unwrap();
        assert_eq!(breakdown.lines[0].applied_margin_percent, dec!(25));

        let priced = PricedQuote::from_breakdown(&items, &breakdown, &rates, dec!(0.15));
        assert_eq!(priced.items[0].margin_percent, dec!(20));
        assert_eq!(priced.items[0].margin, cents(breakdown.lines[0].margin));
    }
}
