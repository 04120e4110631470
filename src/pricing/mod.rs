//! Quote pricing engine.
//!
//! Turns a list of line items and the quote's pricing rules into an itemized
//! breakdown and a payable total. The calculators are pure; `services` wires
//! them to the catalog and tier tables.

pub mod calculators;
pub mod error;
pub mod line_item;
pub mod models;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod rules;
pub mod services;

// Re-export commonly used items
pub use calculators::{price_quote, round_money, PriceAdjustment, QuoteBreakdown, QuoteTotals};
pub use error::PricingError;
pub use line_item::{LineItem, ProductKind};
pub use routes::router;
pub use rules::{PricingRules, QuoteRates, TierSet};
