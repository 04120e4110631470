//! Client registry route handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, Result};
use crate::models::{Client, ClientInput, ClientWithChannel, NewSalesChannel, SalesChannel};
use crate::AppState;

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ClientWithChannel>>> {
    let clients = db::clients::list_clients(&state.db).await?;
    Ok(Json(clients))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<ClientInput>,
) -> Result<(StatusCode, Json<Client>)> {
    let channel_id = input.validate().map_err(AppError::Validation)?;
    let client = db::clients::create_client(&state.db, &input, channel_id).await?;
    tracing::info!(client_id = %client.id, "Client created");
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<ClientInput>,
) -> Result<Json<Client>> {
    let channel_id = input.validate().map_err(AppError::Validation)?;
    let client = db::clients::update_client(&state.db, id, &input, channel_id).await?;
    Ok(Json(client))
}

pub async fn list_channels(State(state): State<AppState>) -> Result<Json<Vec<SalesChannel>>> {
    let channels = db::clients::list_sales_channels(&state.db).await?;
    Ok(Json(channels))
}

pub async fn create_channel(
    State(state): State<AppState>,
    Json(input): Json<NewSalesChannel>,
) -> Result<(StatusCode, Json<SalesChannel>)> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    let channel = db::clients::create_sales_channel(&state.db, name).await?;
    Ok((StatusCode::CREATED, Json(channel)))
}
