//! Sales report models

use chrono::{DateTime, Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::pricing::responses::cents;

/// Name used for groups whose key is missing
pub const UNCLASSIFIED: &str = "Unclassified";

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 500;

/// Query-string filters for the sales report
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportFilters {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Matches creator or client name
    pub search: Option<String>,
    pub project_type: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Return every detail row instead of one page
    #[serde(default)]
    pub export: bool,
}

impl ReportFilters {
    pub fn validate(&self) -> Result<(), String> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err("start_date must not be after end_date".to_string());
            }
        }
        Ok(())
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Inclusive lower bound: start of `start_date`
    pub fn created_from(&self) -> Option<DateTime<Utc>> {
        self.start_date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Exclusive upper bound: start of the day after `end_date`
    pub fn created_before(&self) -> Option<DateTime<Utc>> {
        self.end_date
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// `ILIKE` pattern for the search term, with wildcards escaped
    pub fn search_pattern(&self) -> Option<String> {
        let term = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        Some(format!("%{}%", escaped))
    }

    pub fn project_type(&self) -> Option<&str> {
        self.project_type.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Headline KPIs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralStats {
    #[serde(with = "rust_decimal::serde::str")]
    pub sales: Decimal,
    pub orders: i64,
    pub items: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub average_ticket: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub average_items: Decimal,
}

impl GeneralStats {
    /// Averages are zero when there are no orders.
    pub fn from_totals(sales: Decimal, orders: i64, items: i64) -> Self {
        let (average_ticket, average_items) = if orders > 0 {
            let orders = Decimal::from(orders);
            (cents(sales / orders), cents(Decimal::from(items) / orders))
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };
        Self {
            sales: cents(sales),
            orders,
            items,
            average_ticket,
            average_items,
        }
    }
}

/// Grouped aggregate as returned by the database
#[derive(Debug, Clone, FromRow)]
pub struct GroupRow {
    pub name: Option<String>,
    pub count: i64,
    pub total: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotal {
    pub name: String,
    pub count: i64,
    #[serde(with = "rust_decimal::serde::str")]
    pub total: Decimal,
}

impl From<GroupRow> for GroupTotal {
    fn from(row: GroupRow) -> Self {
        Self {
            name: row
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| UNCLASSIFIED.to_string()),
            count: row.count,
            total: cents(row.total.unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DayTotal {
    pub day: NaiveDate,
    pub count: i64,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub total: Option<Decimal>,
}

/// Detail row: one per quote line (or one per quote without lines)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportRow {
    pub quote_id: Uuid,
    pub project_name: String,
    pub created_at: DateTime<Utc>,
    pub client_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub creator_name: Option<String>,
    pub sales_channel: Option<String>,
    pub project_type: Option<String>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub final_price: Option<Decimal>,
    pub sku: Option<String>,
    pub quantity: Option<i32>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub width: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub height: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub line_total: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportPage {
    pub page: i64,
    /// Absent when exporting
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SalesReport {
    pub general: GeneralStats,
    pub by_creator: Vec<GroupTotal>,
    pub by_channel: Vec<GroupTotal>,
    pub by_project_type: Vec<GroupTotal>,
    pub by_day: Vec<DayTotal>,
    pub rows: Vec<ReportRow>,
    pub meta: ReportPage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    #[test]
    fn test_general_stats_averages() {
        let stats = GeneralStats::from_totals(dec!(1000), 3, 7);
        assert_eq!(stats.average_ticket, dec!(333.33));
        assert_eq!(stats.average_items, dec!(2.33));
        assert_eq!(stats.sales, dec!(1000));
    }

    #[test]
    fn test_general_stats_without_orders() {
        let stats = GeneralStats::from_totals(Decimal::ZERO, 0, 0);
        assert_eq!(stats.average_ticket, Decimal::ZERO);
        assert_eq!(stats.average_items, Decimal::ZERO);
    }

    #[test]
    fn test_date_bounds_cover_whole_days() {
        let filters = ReportFilters {
            start_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 2, 29),
            ..ReportFilters::default()
        };
        assert_eq!(
            filters.created_from(),
            Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            filters.created_before(),
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let filters = ReportFilters {
            start_date: NaiveDate::from_ymd_opt(2024, 5, 2),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..ReportFilters::default()
        };
        assert!(filters.validate().is_err());
    }

    #[test]
    fn test_pagination_defaults_and_bounds() {
        let filters = ReportFilters::default();
        assert_eq!((filters.page(), filters.limit(), filters.offset()), (1, 50, 0));

        let filters = ReportFilters {
            page: Some(3),
            limit: Some(10_000),
            ..ReportFilters::default()
        };
        assert_eq!(filters.limit(), MAX_PAGE_SIZE);
        assert_eq!(filters.offset(), 2 * MAX_PAGE_SIZE);

        let filters = ReportFilters {
            page: Some(0),
            ..ReportFilters::default()
        };
        assert_eq!(filters.page(), 1);
    }

    #[test]
    fn test_huge_page_saturates_offset() {
        let filters = ReportFilters {
            page: Some(i64::MAX),
            limit: Some(MAX_PAGE_SIZE),
            ..ReportFilters::default()
        };
        assert_eq!(filters.offset(), i64::MAX);
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        let filters = ReportFilters {
            search: Some(" 50%_off ".to_string()),
            ..ReportFilters::default()
        };
        assert_eq!(filters.search_pattern().as_deref(), Some("%50\\%\\_off%"));

        let blank = ReportFilters {
            search: Some("  ".to_string()),
            ..ReportFilters::default()
        };
        assert_eq!(blank.search_pattern(), None);
    }

    #[test]
    fn test_missing_group_name_is_unclassified() {
        let group = GroupTotal::from(GroupRow {
            name: None,
            count: 2,
            total: Some(dec!(10.006)),
        });
        assert_eq!(group.name, UNCLASSIFIED);
        assert_eq!(group.total, dec!(10.01));
    }
}
