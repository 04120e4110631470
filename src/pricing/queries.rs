//! Database queries for the pricing engine.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

use super::models::{CatalogProduct, InstallationTierRow, VolumeMarkupTierRow};

/// Get an active catalog product by id
pub async fn find_catalog_product(
    pool: &PgPool,
    product_id: Uuid,
) -> Result<Option<CatalogProduct>, AppError> {
    let product = sqlx::query_as::<_, CatalogProduct>(
        r#"
        SELECT
            id, sku, name, kind, cost, default_margin_percent,
            blind_type, model_name, color, description, size_label
        FROM catalog_products
        WHERE id = $1
          AND active = true
        "#,
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

/// Get all active catalog products (for cache warming)
pub async fn get_active_products(pool: &PgPool) -> Result<Vec<CatalogProduct>, AppError> {
    let products = sqlx::query_as::<_, CatalogProduct>(
        r#"
        SELECT
            id, sku, name, kind, cost, default_margin_percent,
            blind_type, model_name, color, description, size_label
        FROM catalog_products
        WHERE active = true
        ORDER BY sku
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(products)
}

/// Get installation tiers ordered by lower bound
pub async fn get_installation_tiers(pool: &PgPool) -> Result<Vec<InstallationTierRow>, AppError> {
    let tiers = sqlx::query_as::<_, InstallationTierRow>(
        r#"
        SELECT id, min_count, max_count, price
        FROM installation_tiers
        ORDER BY min_count
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(tiers)
}

/// Get volume markup tiers ordered by lower bound
pub async fn get_volume_markup_tiers(pool: &PgPool) -> Result<Vec<VolumeMarkupTierRow>, AppError> {
    let tiers = sqlx::query_as::<_, VolumeMarkupTierRow>(
        r#"
        SELECT id, min_pieces, max_pieces, extra_margin_percent
        FROM volume_markup_tiers
        ORDER BY min_pieces
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(tiers)
}
