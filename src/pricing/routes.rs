//! Pricing API routes.
//!
//! - `POST /api/pricing/line-items` validates an add-product form and returns
//!   the line item with its catalog snapshot.
//! - `POST /api/pricing/calculate` prices a list of items.
//! - `GET /api/pricing/tiers` returns the configured tier tables.
//! - `GET /api/pricing/products/:id` returns a catalog product snapshot.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::error::Result;
use crate::middleware::Actor;
use crate::AppState;

use super::calculators::PriceAdjustment;
use super::line_item::{LineItem, NewLineItem};
use super::models::CatalogProduct;
use super::requests::{AddLineItemRequest, CalculateQuoteRequest};
use super::responses::QuoteBreakdownResponse;
use super::rules::{TierSet, DEFAULT_TOLERANCE};
use super::services;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pricing/line-items", post(add_line_item))
        .route("/api/pricing/calculate", post(calculate))
        .route("/api/pricing/tiers", get(tiers))
        .route("/api/pricing/products/:id", get(product))
}

async fn add_line_item(
    State(state): State<AppState>,
    Json(req): Json<AddLineItemRequest>,
) -> Result<Json<LineItem>> {
    let input = NewLineItem::from(&req);
    let tolerance = req.tolerance.unwrap_or(DEFAULT_TOLERANCE);
    let item = services::add_line_item(&state.db, &state.cache, &input, tolerance).await?;
    Ok(Json(item))
}

async fn calculate(
    State(state): State<AppState>,
    actor: Actor,
    Json(req): Json<CalculateQuoteRequest>,
) -> Result<Json<QuoteBreakdownResponse>> {
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
        req.tolerance.unwrap_or(DEFAULT_TOLERANCE),
        &adjustment,
    )
    .await?;

    Ok(Json(QuoteBreakdownResponse::new(req.items, &breakdown)))
}

async fn tiers(State(state): State<AppState>) -> Result<Json<TierSet>> {
    let tiers = services::load_tiers(&state.db, &state.cache).await?;
    Ok(Json((*tiers).clone()))
}

async fn product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CatalogProduct>> {
    let product = services::load_product(&state.db, &state.cache, id).await?;
    Ok(Json((*product).clone()))
}
