//! Message template and sequence handlers
//!
//! Admin CRUD for templates and sequences, plus rendering them for a quote.
//! Nothing here sends messages.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::db;
use crate::error::{AppError, Result};
use crate::models::{
    plan_sequence, render_template, MessageContext, MessageSequence, MessageTemplate,
    PlannedMessage, SequenceInput, SequenceStep, StepInput, TemplateInput, TemplateOrder,
};
use crate::AppState;

fn require_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    Ok(())
}

pub async fn list_templates(State(state): State<AppState>) -> Result<Json<Vec<MessageTemplate>>> {
    Ok(Json(db::messaging::list_templates(&state.db).await?))
}

pub async fn create_template(
    State(state): State<AppState>,
    Json(input): Json<TemplateInput>,
) -> Result<(StatusCode, Json<MessageTemplate>)> {
    require_name(&input.name)?;
    let template = db::messaging::create_template(&state.db, &input).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<TemplateInput>,
) -> Result<Json<MessageTemplate>> {
    require_name(&input.name)?;
    Ok(Json(db::messaging::update_template(&state.db, id, &input).await?))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    db::messaging::delete_template(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_templates(
    State(state): State<AppState>,
    Json(order): Json<TemplateOrder>,
) -> Result<StatusCode> {
    db::messaging::reorder_templates(&state.db, &order).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_sequences(State(state): State<AppState>) -> Result<Json<Vec<MessageSequence>>> {
    Ok(Json(db::messaging::list_sequences(&state.db).await?))
}

pub async fn create_sequence(
    State(state): State<AppState>,
    Json(input): Json<SequenceInput>,
) -> Result<(StatusCode, Json<MessageSequence>)> {
    require_name(&input.name)?;
    let sequence = db::messaging::create_sequence(&state.db, &input).await?;
    Ok((StatusCode::CREATED, Json(sequence)))
}

pub async fn update_sequence(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<SequenceInput>,
) -> Result<Json<MessageSequence>> {
    require_name(&input.name)?;
    Ok(Json(db::messaging::update_sequence(&state.db, id, &input).await?))
}

pub async fn delete_sequence(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    db::messaging::delete_sequence(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_steps(
    State(state): State<AppState>,
    Path(sequence_id): Path<Uuid>,
) -> Result<Json<Vec<SequenceStep>>> {
    Ok(Json(db::messaging::list_steps(&state.db, sequence_id).await?))
}

pub async fn create_step(
    State(state): State<AppState>,
    Path(sequence_id): Path<Uuid>,
    Json(input): Json<StepInput>,
) -> Result<(StatusCode, Json<SequenceStep>)> {
    input.validate().map_err(AppError::Validation)?;
    let step = db::messaging::create_step(&state.db, sequence_id, &input).await?;
    Ok((StatusCode::CREATED, Json(step)))
}

pub async fn update_step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(input): Json<StepInput>,
) -> Result<Json<SequenceStep>> {
    input.validate().map_err(AppError::Validation)?;
    Ok(Json(db::messaging::update_step(&state.db, id, &input).await?))
}

pub async fn delete_step(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    db::messaging::delete_step(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Messages addressed to a quote's client
#[derive(Debug, Serialize)]
pub struct MessagePlan {
    pub quote_id: Uuid,
    pub phone: Option<String>,
    pub messages: Vec<PlannedMessage>,
}

/// Placeholder values and phone number for a quote
async fn quote_context(
    state: &AppState,
    quote_id: Uuid,
) -> Result<(String, MessageContext, Option<String>)> {
    let quote = db::quotes::get_quote(&state.db, quote_id).await?;
    let client = db::clients::get_quote_client(&state.db, quote_id).await?;
    let (client_name, phone) = match client {
        Some(client) => (Some(client.name), client.phone),
        None => (None, None),
    };

    let ctx = MessageContext {
        client_name,
        discount_percent: quote.discount_percent,
        list_price: quote.list_price,
        final_price: quote.final_price,
    };
    Ok((quote.project_name, ctx, phone))
}

pub async fn render_for_quote(
    State(state): State<AppState>,
    Path((quote_id, template_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessagePlan>> {
    let template = db::messaging::get_template(&state.db, template_id).await?;
    let (project_name, ctx, phone) = quote_context(&state, quote_id).await?;

    Ok(Json(MessagePlan {
        quote_id,
        phone,
        messages: vec![render_template(&template, &project_name, &ctx)],
    }))
}

pub async fn plan_for_quote(
    State(state): State<AppState>,
    Path((quote_id, sequence_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<MessagePlan>> {
    let steps = db::messaging::list_steps(&state.db, sequence_id).await?;
    let (_, ctx, phone) = quote_context(&state, quote_id).await?;

    let messages = plan_sequence(&steps, &ctx);
    tracing::debug!(%quote_id, %sequence_id, messages = messages.len(), "Sequence planned");
    Ok(Json(MessagePlan {
        quote_id,
        phone,
        messages,
    }))
}
