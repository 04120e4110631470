//! Pricing service functions with database access.
//!
//! These functions resolve catalog snapshots and tier tables through the cache
//! (falling back to the database) and hand them to the pure calculators.

use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::{AppCache, TIERS_KEY};
use crate::error::AppError;

use super::calculators::{price_quote, PriceAdjustment, QuoteBreakdown};
use super::error::PricingError;
use super::line_item::{build_line_item, LineItem, NewLineItem};
use super::models::CatalogProduct;
use super::queries;
use super::rules::{InstallationTier, PricingRules, QuoteRates, TierSet, VolumeMarkupTier};

/// Read and validate the tier tables from the database.
pub async fn fetch_tiers(pool: &PgPool) -> Result<TierSet, AppError> {
    let installation = queries::get_installation_tiers(pool)
        .await?
        .into_iter()
        .map(InstallationTier::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    let volume_markup = queries::get_volume_markup_tiers(pool)
        .await?
        .into_iter()
        .map(VolumeMarkupTier::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    let tiers = TierSet {
        installation,
        volume_markup,
    };
    tiers.validate()?;
    Ok(tiers)
}

/// Current tier tables, from cache when possible.
pub async fn load_tiers(pool: &PgPool, cache: &AppCache) -> Result<Arc<TierSet>, AppError> {
    if let Some(cached) = cache.tiers.get(TIERS_KEY).await {
        tracing::debug!("Cache HIT for pricing tiers");
        return Ok(cached);
    }

    tracing::debug!("Cache MISS for pricing tiers");
    let tiers = Arc::new(fetch_tiers(pool).await?);
    cache.tiers.insert(TIERS_KEY.to_string(), tiers.clone()).await;
    Ok(tiers)
}

/// Catalog product snapshot, from cache when possible.
pub async fn load_product(
    pool: &PgPool,
    cache: &AppCache,
    product_id: Uuid,
) -> Result<Arc<CatalogProduct>, AppError> {
    if let Some(cached) = cache.products.get(&product_id).await {
        tracing::debug!("Cache HIT for catalog product: {}", product_id);
        return Ok(cached);
    }

    tracing::debug!("Cache MISS for catalog product: {}", product_id);
    let product = queries::find_catalog_product(pool, product_id)
        .await?
        .ok_or_else(|| PricingError::UnknownProduct {
            product_id: product_id.to_string(),
        })?;
    let product = Arc::new(product);
    cache.products.insert(product_id, product.clone()).await;
    Ok(product)
}

/// Validate an add-product form and snapshot the catalog into a line item.
pub async fn add_line_item(
    pool: &PgPool,
    cache: &AppCache,
    input: &NewLineItem,
    tolerance: Decimal,
) -> Result<LineItem, AppError> {
    let product = load_product(pool, cache, input.product_id).await?;
    let item = build_line_item(&product, input, tolerance)?;
    tracing::debug!(
        product_id = %item.product_id,
        quantity = item.quantity,
        "Line item built"
    );
    Ok(item)
}

/// Price a list of items under the current tiers and the given quote rates.
pub async fn calculate_quote(
    pool: &PgPool,
    cache: &AppCache,
    items: &[LineItem],
    rates: QuoteRates,
    tolerance: Decimal,
    adjustment: &PriceAdjustment,
) -> Result<QuoteBreakdown, AppError> {
    let tiers = load_tiers(pool, cache).await?;
    let rules = PricingRules::new(&tiers, rates, tolerance)?;
    let breakdown = price_quote(items, &rules, adjustment)?;
    if breakdown.totals.adjusted_price_rejected {
        tracing::info!(
            net_subtotal = %breakdown.totals.net_subtotal,
            "Adjusted price below floor, using net subtotal"
        );
    }
    Ok(breakdown)
}
