//! HTTP route handlers

pub mod clients;
pub mod health;
pub mod messaging;
pub mod quotes;
pub mod reports;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::AppState;

/// Routes outside the pricing API
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/quotes", get(quotes::list_open).post(quotes::create))
        .route("/api/quotes/:id", get(quotes::detail))
        .route("/api/quotes/:id/items", put(quotes::save_items))
        .route(
            "/api/quotes/:id/messages/templates/:template_id",
            get(messaging::render_for_quote),
        )
        .route(
            "/api/quotes/:id/messages/sequences/:sequence_id",
            get(messaging::plan_for_quote),
        )
        .route("/api/clients", get(clients::list).post(clients::create))
        .route("/api/clients/:id", put(clients::update))
        .route(
            "/api/sales-channels",
            get(clients::list_channels).post(clients::create_channel),
        )
        .route(
            "/api/messaging/templates",
            get(messaging::list_templates).post(messaging::create_template),
        )
        .route("/api/messaging/templates/order", post(messaging::reorder_templates))
        .route(
            "/api/messaging/templates/:id",
            put(messaging::update_template).delete(messaging::delete_template),
        )
        .route(
            "/api/messaging/sequences",
            get(messaging::list_sequences).post(messaging::create_sequence),
        )
        .route(
            "/api/messaging/sequences/:id",
            put(messaging::update_sequence).delete(messaging::delete_sequence),
        )
        .route(
            "/api/messaging/sequences/:id/steps",
            get(messaging::list_steps).post(messaging::create_step),
        )
        .route(
            "/api/messaging/steps/:id",
            put(messaging::update_step).delete(messaging::delete_step),
        )
        .route("/api/reports/sales", get(reports::sales))
}
