//! Sales report handler

use axum::{
    extract::{Query, State},
    Json,
};

use crate::db;
use crate::db::reports::Grouping;
use crate::error::{AppError, Result};
use crate::models::report::{GeneralStats, GroupTotal, ReportFilters, ReportPage, SalesReport};
use crate::AppState;

/// KPIs, breakdowns and detail rows for finalized quotes
pub async fn sales(
    State(state): State<AppState>,
    Query(filters): Query<ReportFilters>,
) -> Result<Json<SalesReport>> {
    filters.validate().map_err(AppError::Validation)?;
    let pool = &state.db;

    let (totals, items, by_creator, by_channel, by_project_type, by_day, rows) =
        tokio::try_join!(
            db::reports::totals(pool, &filters),
            db::reports::items_sold(pool, &filters),
            db::reports::group_totals(pool, &filters, Grouping::Creator),
            db::reports::group_totals(pool, &filters, Grouping::Channel),
            db::reports::group_totals(pool, &filters, Grouping::ProjectType),
            db::reports::daily_totals(pool, &filters),
            db::reports::detail_rows(pool, &filters),
        )?;
    let (orders, sales) = totals;

    tracing::debug!(orders, rows = rows.len(), "Sales report built");

    Ok(Json(SalesReport {
        general: GeneralStats::from_totals(sales, orders, items),
        by_creator: by_creator.into_iter().map(GroupTotal::from).collect(),
        by_channel: by_channel.into_iter().map(GroupTotal::from).collect(),
        by_project_type: by_project_type.into_iter().map(GroupTotal::from).collect(),
        by_day,
        rows,
        meta: ReportPage {
            page: filters.page(),
            limit: (!filters.export).then_some(filters.limit()),
        },
    }))
}
