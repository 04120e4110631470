//! Quote route handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, Result};
use crate::middleware::Actor;
use crate::models::{NewQuote, PricedQuote, Quote, QuoteDetail, QuoteSummary};
use crate::pricing::calculators::PriceAdjustment;
use crate::pricing::requests::CalculateQuoteRequest;
use crate::pricing::responses::QuoteBreakdownResponse;
use crate::pricing::rules::DEFAULT_TOLERANCE;
use crate::pricing::services;
use crate::AppState;

/// Open quotes, newest first
pub async fn list_open(State(state): State<AppState>) -> Result<Json<Vec<QuoteSummary>>> {
    let quotes = db::quotes::list_open_quotes(&state.db).await?;
    Ok(Json(quotes))
}

/// Create a quote; the actor becomes its creator
pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(input): Json<NewQuote>,
) -> Result<(StatusCode, Json<Quote>)> {
    input.validate().map_err(AppError::Validation)?;
    let quote = db::quotes::create_quote(&state.db, &input, actor.user_id).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// Quote header with its items
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuoteDetail>> {
    let quote = db::quotes::get_quote(&state.db, id).await?;
    let items = db::quotes::get_quote_items(&state.db, id).await?;
    let detail = QuoteDetail::new(quote, items).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(detail))
}

#[derive(Debug, Serialize)]
pub struct SaveQuoteResponse {
    pub quote_id: Uuid,
    #[serde(flatten)]
    pub breakdown: QuoteBreakdownResponse,
}

/// Recompute the quote server-side and persist items and aggregates.
///
/// Client-sent totals are never trusted; only the raw items and rates are.
pub async fn save_items(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    actor: Actor,
    Json(req): Json<CalculateQuoteRequest>,
) -> Result<Json<SaveQuoteResponse>> {
    let tolerance = req.tolerance.unwrap_or(DEFAULT_TOLERANCE);
    let adjustment = PriceAdjustment {
        adjusted_price: req.adjusted_price,
        include_iva: req.include_iva,
        actor_is_admin: actor.is_admin,
    };
    let breakdown = services::calculate_quote(
        &state.db,
        &state.cache,
        &req.items,
        req.rates,
        tolerance,
        &adjustment,
    )
    .await?;

    let priced = PricedQuote::from_breakdown(&req.items, &breakdown, &req.rates, tolerance);
    db::quotes::save_priced_quote(&state.db, id, &priced).await?;

    Ok(Json(SaveQuoteResponse {
        quote_id: id,
        breakdown: QuoteBreakdownResponse::new(req.items, &breakdown),
    }))
}
