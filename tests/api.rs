//! Router-level tests. The pool connects lazily and is never used: every
//! request here is served from the pre-warmed cache or rejected before any
//! query runs.

use std::str::FromStr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use smartblinds_web::cache::AppCache;
use smartblinds_web::config::AppConfig;
use smartblinds_web::pricing::models::CatalogProduct;
use smartblinds_web::pricing::rules::{InstallationTier, TierSet, VolumeMarkupTier};
use smartblinds_web::{app, AppState};

const TEST_DATABASE_URL: &str = "postgres://localhost/smartblinds_test";

async fn test_app() -> (Router, AppCache) {
    let pool = PgPoolOptions::new()
        .connect_lazy(TEST_DATABASE_URL)
        .expect("lazy pool");
    let config = AppConfig::from_lookup(|key| {
        (key == "DATABASE_URL").then(|| TEST_DATABASE_URL.to_string())
    })
    .expect("config");

    let cache = AppCache::new();
    cache
        .put_tiers(TierSet {
            installation: vec![
                InstallationTier { min: 1, max: 5, price: dec!(30) },
                InstallationTier { min: 6, max: 20, price: dec!(25) },
            ],
            volume_markup: vec![VolumeMarkupTier {
                min_pieces: 10,
                max_pieces: 50,
                extra_margin_percent: dec!(5),
            }],
        })
        .await;

    let state = AppState {
        db: pool,
        cache: cache.clone(),
        config: Arc::new(config),
    };
    (app(state), cache)
}

fn roller_fabric(id: Uuid) -> CatalogProduct {
    CatalogProduct {
        id,
        sku: "ROL-BLK-01".to_string(),
        name: "Roller blackout".to_string(),
        kind: "fabric".to_string(),
        cost: dec!(200),
        default_margin_percent: Some(dec!(20)),
        blind_type: Some("Roller".to_string()),
        model_name: Some("Blackout".to_string()),
        color: Some("White".to_string()),
        description: None,
        size_label: None,
    }
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn money(value: &Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("decimal string")).expect("decimal")
}

fn single_other_item(cost: &str) -> Value {
    json!({
        "product_id": Uuid::nil(),
        "kind": { "type": "other" },
        "quantity": 1,
        "unit_cost": cost,
        "margin_percent": "0"
    })
}

#[tokio::test]
async fn health_reports_cached_tiers() {
    let (app, _) = test_app().await;
    let (status, body) = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cache"]["tiers_cached"], true);
}

#[tokio::test]
async fn tiers_are_served_from_cache() {
    let (app, _) = test_app().await;
    let (status, body) = send(
        app,
        Request::get("/api/pricing/tiers").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["installation"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["volume_markup"][0]["min_pieces"], 10);
}

#[tokio::test]
async fn calculate_single_fabric_line() {
    let (app, _) = test_app().await;
    let request = post_json(
        "/api/pricing/calculate",
        json!({
            "items": [{
                "product_id": Uuid::nil(),
                "kind": { "type": "fabric", "width": "1", "height": "2", "location": "Bedroom" },
                "quantity": 1,
                "unit_cost": "200",
                "margin_percent": "20"
            }],
            "rates": { "protection_percent": "10" }
        }),
    );
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let line = &body["lines"][0]["calculated"];
    assert_eq!(money(&line["base_cost"]), dec!(400));
    assert_eq!(money(&line["protection"]), dec!(40));
    assert_eq!(money(&line["installation"]), dec!(30));
    assert_eq!(money(&line["margin"]), dec!(117.5));
    assert_eq!(money(&body["totals"]["grand_total"]), dec!(587.5));
    assert_eq!(body["currency"], "MXN");
}

#[tokio::test]
async fn adjusted_price_below_floor_is_rejected_for_non_admins() {
    let (app, _) = test_app().await;
    let request = post_json(
        "/api/pricing/calculate",
        json!({
            "items": [single_other_item("100")],
            "adjusted_price": "50"
        }),
    );
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totals"]["adjusted_price_rejected"], true);
    assert_eq!(body["totals"]["adjusted_price"], Value::Null);
    assert_eq!(money(&body["totals"]["min_allowed_price"]), dec!(90));
    assert_eq!(money(&body["totals"]["grand_total"]), dec!(100));
}

#[tokio::test]
async fn admins_may_set_any_positive_adjusted_price() {
    let (app, _) = test_app().await;
    let mut request = post_json(
        "/api/pricing/calculate",
        json!({
            "items": [single_other_item("100")],
            "adjusted_price": "50",
            "include_iva": true
        }),
    );
    request
        .headers_mut()
        .insert("x-actor-role", "admin".parse().unwrap());
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(money(&body["totals"]["adjusted_price"]), dec!(50));
    assert_eq!(money(&body["totals"]["iva"]), dec!(8));
    assert_eq!(money(&body["totals"]["grand_total"]), dec!(58));
}

#[tokio::test]
async fn rate_of_one_hundred_percent_is_unprocessable() {
    let (app, _) = test_app().await;
    let request = post_json(
        "/api/pricing/calculate",
        json!({
            "items": [single_other_item("100")],
            "rates": { "discount_percent": "100" }
        }),
    );
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_type"], "invalid_rate");
    assert_eq!(body["details"]["field"], "discount_percent");
}

#[tokio::test]
async fn oversized_measures_are_unprocessable() {
    let (app, _) = test_app().await;
    let request = post_json(
        "/api/pricing/calculate",
        json!({
            "items": [{
                "product_id": Uuid::nil(),
                "kind": {
                    "type": "fabric",
                    "width": "1000000000000000",
                    "height": "1000000000000000",
                    "location": "Hall"
                },
                "quantity": 1,
                "unit_cost": "1",
                "margin_percent": "0"
            }]
        }),
    );
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_type"], "invalid_line_item");
    assert_eq!(body["details"]["field"], "width");
}

#[tokio::test]
async fn invalid_actor_header_is_a_bad_request() {
    let (app, _) = test_app().await;
    let mut request = post_json("/api/pricing/calculate", json!({ "items": [] }));
    request
        .headers_mut()
        .insert("x-actor-id", "not-a-uuid".parse().unwrap());
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
}

#[tokio::test]
async fn add_line_item_snapshots_cached_product() {
    let (app, cache) = test_app().await;
    let product_id = Uuid::new_v4();
    cache
        .products
        .insert(product_id, Arc::new(roller_fabric(product_id)))
        .await;

    let request = post_json(
        "/api/pricing/line-items",
        json!({
            "product_id": product_id,
            "quantity": 2,
            "width": "1",
            "height": "2",
            "location": "Bedroom"
        }),
    );
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quantity"], 2);
    assert_eq!(body["kind"]["type"], "fabric");
    assert_eq!(money(&body["margin_percent"]), dec!(20));
    assert_eq!(body["measures_label"], "1.15x2.15m");
    assert_eq!(
        body["description"],
        "Persianas Manuales de Bedroom, 2 pza 1.15x2.15m, Roller Blackout"
    );
}

#[tokio::test]
async fn add_fabric_without_width_is_rejected() {
    let (app, cache) = test_app().await;
    let product_id = Uuid::new_v4();
    cache
        .products
        .insert(product_id, Arc::new(roller_fabric(product_id)))
        .await;

    let request = post_json(
        "/api/pricing/line-items",
        json!({ "product_id": product_id, "quantity": 1, "height": "2" }),
    );
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error_type"], "invalid_line_item");
    assert_eq!(body["details"]["field"], "width");
}

#[tokio::test]
async fn client_without_sales_channel_is_rejected() {
    let (app, _) = test_app().await;
    let (status, body) = send(app, post_json("/api/clients", json!({ "name": "Ana" }))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation error: sales_channel_id is required");
}

#[tokio::test]
async fn template_without_name_is_rejected() {
    let (app, _) = test_app().await;
    let (status, _) = send(
        app,
        post_json("/api/messaging/templates", json!({ "name": " ", "content": "Hola" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn report_with_inverted_dates_is_rejected() {
    let (app, _) = test_app().await;
    let request = Request::get("/api/reports/sales?start_date=2024-05-02&end_date=2024-05-01")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error_type"], "validation_error");
}
