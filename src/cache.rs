//! In-memory caching using moka
//!
//! Caches the catalog snapshot and the tier tables the pricing engine reads on
//! every recalculation. Both change rarely, so a periodic warmer keeps them
//! fresh and TTLs bound staleness.

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};
use uuid::Uuid;

use crate::pricing::models::CatalogProduct;
use crate::pricing::rules::TierSet;
use crate::pricing::services;

/// Key of the single tier-set entry
pub const TIERS_KEY: &str = "tiers";

/// Application cache holding catalog products and pricing tiers
#[derive(Clone)]
pub struct AppCache {
    /// Catalog products (id -> product)
    pub products: Cache<Uuid, Arc<CatalogProduct>>,
    /// Installation and volume markup tiers (singleton)
    pub tiers: Cache<String, Arc<TierSet>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Catalog: 5000 products, 30 min TTL, 10 min idle
            products: Cache::builder()
                .max_capacity(5_000)
                .time_to_live(Duration::from_secs(30 * 60))
                .time_to_idle(Duration::from_secs(10 * 60))
                .build(),

            // Tiers: 1 entry, 15 min TTL
            tiers: Cache::builder()
                .max_capacity(1)
                .time_to_live(Duration::from_secs(15 * 60))
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            products_size: self.products.entry_count(),
            tiers_cached: self.tiers.entry_count() > 0,
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.products.invalidate_all();
        self.tiers.invalidate_all();
        info!("All caches invalidated");
    }

    /// Store a tier set as the current one
    pub async fn put_tiers(&self, tiers: TierSet) {
        self.tiers.insert(TIERS_KEY.to_string(), Arc::new(tiers)).await;
        self.tiers.run_pending_tasks().await;
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub products_size: u64,
    pub tiers_cached: bool,
}

/// Start background cache warmer
///
/// Warms the cache on startup and refreshes every `refresh`.
pub async fn start_cache_warmer(cache: AppCache, db: PgPool, refresh: Duration) {
    let mut interval = interval(refresh);
    loop {
        // First tick completes immediately, which gives the initial warm-up
        interval.tick().await;
        warm_cache(&cache, &db).await;
    }
}

/// Warm the cache with the tier tables and the active catalog
pub async fn warm_cache(cache: &AppCache, db: &PgPool) {
    info!("Starting cache warm-up...");

    match services::fetch_tiers(db).await {
        Ok(tiers) => cache.put_tiers(tiers).await,
        Err(e) => warn!("Failed to warm tier cache: {}", e),
    }

    match crate::pricing::queries::get_active_products(db).await {
        Ok(products) => {
            for product in products {
                cache.products.insert(product.id, Arc::new(product)).await;
            }
        }
        Err(e) => warn!("Failed to warm catalog cache: {}", e),
    }

    cache.products.run_pending_tasks().await;
    info!("Cache warm-up complete. Stats: {:?}", cache.stats());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::rules::InstallationTier;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_put_tiers_is_visible() {
        let cache = AppCache::new();
        cache
            .put_tiers(TierSet {
                installation: vec![InstallationTier { min: 1, max: 3, price: dec!(20) }],
                volume_markup: vec![],
            })
            .await;

        let tiers = cache.tiers.get(TIERS_KEY).await.unwrap();
        assert_eq!(tiers.installation.len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_all_clears_tiers() {
        let cache = AppCache::new();
        cache.put_tiers(TierSet::default()).await;
        cache.invalidate_all();
        assert!(cache.tiers.get(TIERS_KEY).await.is_none());
    }
}
