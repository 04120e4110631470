//! Sales report queries
//!
//! Every query shares the same joins and filter clause; filters are always
//! bound parameters.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::Result;
use crate::models::quote::QuoteStatus;
use crate::models::report::{DayTotal, GroupRow, ReportFilters, ReportRow};

const REPORT_JOINS: &str = r#"
    FROM quotes q
    LEFT JOIN clients c ON c.id = q.client_id
    LEFT JOIN sales_channels sc ON sc.id = c.sales_channel_id
    LEFT JOIN users u ON u.id = q.created_by
    LEFT JOIN project_types pt ON pt.id = q.project_type_id
"#;

/// Grouping keys for the breakdown charts
#[derive(Debug, Clone, Copy)]
pub enum Grouping {
    Creator,
    Channel,
    ProjectType,
}

impl Grouping {
    fn column(self) -> &'static str {
        match self {
            Grouping::Creator => "u.full_name",
            Grouping::Channel => "sc.name",
            Grouping::ProjectType => "pt.name",
        }
    }
}

fn report_query<'a>(
    select: &str,
    extra_join: &str,
    filters: &'a ReportFilters,
) -> QueryBuilder<'a, Postgres> {
    let mut query = QueryBuilder::new(select);
    query.push(REPORT_JOINS);
    query.push(extra_join);

    query.push(" WHERE q.status <> ");
    query.push_bind(QuoteStatus::New.as_str());
    if let Some(from) = filters.created_from() {
        query.push(" AND q.created_at >= ");
        query.push_bind(from);
    }
    if let Some(before) = filters.created_before() {
        query.push(" AND q.created_at < ");
        query.push_bind(before);
    }
    if let Some(pattern) = filters.search_pattern() {
        query.push(" AND (u.full_name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR c.name ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
    if let Some(project_type) = filters.project_type() {
        query.push(" AND pt.name = ");
        query.push_bind(project_type);
    }
    query
}

/// Order count and sales total (sum of final prices)
pub async fn totals(pool: &PgPool, filters: &ReportFilters) -> Result<(i64, Decimal)> {
    let (orders, sales): (i64, Option<Decimal>) =
        report_query("SELECT COUNT(q.id), SUM(q.final_price)", "", filters)
            .build_query_as()
            .fetch_one(pool)
            .await?;
    Ok((orders, sales.unwrap_or_default()))
}

/// Units sold across all lines
pub async fn items_sold(pool: &PgPool, filters: &ReportFilters) -> Result<i64> {
    let (items,): (Option<i64>,) = report_query(
        "SELECT SUM(COALESCE(qi.quantity, 1))::BIGINT",
        " JOIN quote_items qi ON qi.quote_id = q.id",
        filters,
    )
    .build_query_as()
    .fetch_one(pool)
    .await?;
    Ok(items.unwrap_or(0))
}

/// Totals grouped by creator (top 10), channel or project type
pub async fn group_totals(
    pool: &PgPool,
    filters: &ReportFilters,
    grouping: Grouping,
) -> Result<Vec<GroupRow>> {
    let column = grouping.column();
    let select = format!(
        "SELECT {} AS name, COUNT(q.id) AS count, SUM(q.final_price) AS total",
        column
    );
    let mut query = report_query(&select, "", filters);
    query.push(format!(" GROUP BY {} ORDER BY total DESC NULLS LAST", column));
    if matches!(grouping, Grouping::Creator) {
        query.push(" LIMIT 10");
    }

    let rows = query.build_query_as::<GroupRow>().fetch_all(pool).await?;
    Ok(rows)
}

/// Totals per calendar day, oldest first
pub async fn daily_totals(pool: &PgPool, filters: &ReportFilters) -> Result<Vec<DayTotal>> {
    let mut query = report_query(
        "SELECT q.created_at::date AS day, COUNT(q.id) AS count, SUM(q.final_price) AS total",
        "",
        filters,
    );
    query.push(" GROUP BY day ORDER BY day ASC");

    let rows = query.build_query_as::<DayTotal>().fetch_all(pool).await?;
    Ok(rows)
}

/// Detail rows, newest first; paginated unless exporting
pub async fn detail_rows(pool: &PgPool, filters: &ReportFilters) -> Result<Vec<ReportRow>> {
    let mut query = report_query(
        r#"
        SELECT
            q.id AS quote_id,
            q.project_name,
            q.created_at,
            c.name AS client_name,
            c.city,
            c.state,
            u.full_name AS creator_name,
            sc.name AS sales_channel,
            pt.name AS project_type,
            q.final_price,
            p.sku,
            qi.quantity,
            qi.width,
            qi.height,
            qi.subtotal AS line_total
        "#,
        r#"
        LEFT JOIN quote_items qi ON qi.quote_id = q.id
        LEFT JOIN catalog_products p ON p.id = qi.product_id
        "#,
        filters,
    );
    query.push(" ORDER BY q.created_at DESC, qi.position ASC");
    if !filters.export {
        query.push(" LIMIT ");
        query.push_bind(filters.limit());
        query.push(" OFFSET ");
        query.push_bind(filters.offset());
    }

    let rows = query.build_query_as::<ReportRow>().fetch_all(pool).await?;
    Ok(rows)
}
