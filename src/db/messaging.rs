//! Message template and sequence queries

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::messaging::TemplateOrder;
use crate::models::{
    MessageSequence, MessageTemplate, SequenceInput, SequenceStep, StepInput, TemplateInput,
};

pub async fn list_templates(pool: &PgPool) -> Result<Vec<MessageTemplate>> {
    let templates = sqlx::query_as::<_, MessageTemplate>(
        r#"
        SELECT id, name, kind, content, media_url, visible, sort_order
        FROM message_templates
        ORDER BY sort_order ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(templates)
}

pub async fn get_template(pool: &PgPool, template_id: Uuid) -> Result<MessageTemplate> {
    let template = sqlx::query_as::<_, MessageTemplate>(
        r#"
        SELECT id, name, kind, content, media_url, visible, sort_order
        FROM message_templates
        WHERE id = $1
        "#,
    )
    .bind(template_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("template {}", template_id)))?;

    Ok(template)
}

/// Insert a template at the end of the list
pub async fn create_template(pool: &PgPool, input: &TemplateInput) -> Result<MessageTemplate> {
    let template = sqlx::query_as::<_, MessageTemplate>(
        r#"
        INSERT INTO message_templates (name, kind, content, media_url, visible, sort_order)
        VALUES (
            $1, $2, $3, $4, $5,
            COALESCE((SELECT MAX(sort_order) FROM message_templates), 0) + 1
        )
        RETURNING id, name, kind, content, media_url, visible, sort_order
        "#,
    )
    .bind(&input.name)
    .bind(&input.kind)
    .bind(&input.content)
    .bind(&input.media_url)
    .bind(input.visible)
    .fetch_one(pool)
    .await?;

    Ok(template)
}

/// Update a template's content; its position is unchanged
pub async fn update_template(
    pool: &PgPool,
    template_id: Uuid,
    input: &TemplateInput,
) -> Result<MessageTemplate> {
    let template = sqlx::query_as::<_, MessageTemplate>(
        r#"
        UPDATE message_templates
        SET name = $2, kind = $3, content = $4, media_url = $5, visible = $6
        WHERE id = $1
        RETURNING id, name, kind, content, media_url, visible, sort_order
        "#,
    )
    .bind(template_id)
    .bind(&input.name)
    .bind(&input.kind)
    .bind(&input.content)
    .bind(&input.media_url)
    .bind(input.visible)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("template {}", template_id)))?;

    Ok(template)
}

pub async fn delete_template(pool: &PgPool, template_id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM message_templates WHERE id = $1")
        .bind(template_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("template {}", template_id)));
    }
    Ok(())
}

/// Renumber templates 1..n in the given order, all or nothing
pub async fn reorder_templates(pool: &PgPool, order: &TemplateOrder) -> Result<()> {
    let mut tx = pool.begin().await?;

    for (template_id, position) in order.positions() {
        sqlx::query("UPDATE message_templates SET sort_order = $2 WHERE id = $1")
            .bind(template_id)
            .bind(position)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    tracing::debug!(count = order.ids.len(), "Templates reordered");
    Ok(())
}

/// Sequences, newest first
pub async fn list_sequences(pool: &PgPool) -> Result<Vec<MessageSequence>> {
    let sequences = sqlx::query_as::<_, MessageSequence>(
        r#"
        SELECT id, name, description, created_at
        FROM message_sequences
        ORDER BY created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(sequences)
}

pub async fn create_sequence(pool: &PgPool, input: &SequenceInput) -> Result<MessageSequence> {
    let sequence = sqlx::query_as::<_, MessageSequence>(
        r#"
        INSERT INTO message_sequences (name, description)
        VALUES ($1, $2)
        RETURNING id, name, description, created_at
        "#,
    )
    .bind(&input.name)
    .bind(&input.description)
    .fetch_one(pool)
    .await?;

    Ok(sequence)
}

pub async fn update_sequence(
    pool: &PgPool,
    sequence_id: Uuid,
    input: &SequenceInput,
) -> Result<MessageSequence> {
    let sequence = sqlx::query_as::<_, MessageSequence>(
        r#"
        UPDATE message_sequences
        SET name = $2, description = $3
        WHERE id = $1
        RETURNING id, name, description, created_at
        "#,
    )
    .bind(sequence_id)
    .bind(&input.name)
    .bind(&input.description)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("sequence {}", sequence_id)))?;

    Ok(sequence)
}

/// Delete a sequence together with its steps
pub async fn delete_sequence(pool: &PgPool, sequence_id: Uuid) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM message_sequence_steps WHERE sequence_id = $1")
        .bind(sequence_id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM message_sequences WHERE id = $1")
        .bind(sequence_id)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("sequence {}", sequence_id)));
    }

    tx.commit().await?;
    Ok(())
}

/// Steps of a sequence in sort order
pub async fn list_steps(pool: &PgPool, sequence_id: Uuid) -> Result<Vec<SequenceStep>> {
    let steps = sqlx::query_as::<_, SequenceStep>(
        r#"
        SELECT
            id, sequence_id, kind, content,
            COALESCE(media_urls, '[]'::jsonb) AS media_urls,
            COALESCE(delay_seconds, 0) AS delay_seconds,
            active, sort_order
        FROM message_sequence_steps
        WHERE sequence_id = $1
        ORDER BY sort_order ASC
        "#,
    )
    .bind(sequence_id)
    .fetch_all(pool)
    .await?;

    Ok(steps)
}

/// Append a step to the end of a sequence
pub async fn create_step(
    pool: &PgPool,
    sequence_id: Uuid,
    input: &StepInput,
) -> Result<SequenceStep> {
    let step = sqlx::query_as::<_, SequenceStep>(
        r#"
        INSERT INTO message_sequence_steps (
            sequence_id, kind, content, media_urls, delay_seconds, active, sort_order
        )
        VALUES (
            $1, $2, $3, $4, $5, $6,
            COALESCE(
                (SELECT MAX(sort_order) FROM message_sequence_steps WHERE sequence_id = $1),
                0
            ) + 1
        )
        RETURNING
            id, sequence_id, kind, content, media_urls, delay_seconds, active, sort_order
        "#,
    )
    .bind(sequence_id)
    .bind(&input.kind)
    .bind(&input.content)
    .bind(Json(&input.media_urls))
    .bind(input.delay_seconds)
    .bind(input.active)
    .fetch_one(pool)
    .await?;

    Ok(step)
}

pub async fn update_step(pool: &PgPool, step_id: Uuid, input: &StepInput) -> Result<SequenceStep> {
    let step = sqlx::query_as::<_, SequenceStep>(
        r#"
        UPDATE message_sequence_steps
        SET kind = $2, content = $3, media_urls = $4, delay_seconds = $5, active = $6
        WHERE id = $1
        RETURNING
            id, sequence_id, kind, content, media_urls, delay_seconds, active, sort_order
        "#,
    )
    .bind(step_id)
    .bind(&input.kind)
    .bind(&input.content)
    .bind(Json(&input.media_urls))
    .bind(input.delay_seconds)
    .bind(input.active)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("step {}", step_id)))?;

    Ok(step)
}

pub async fn delete_step(pool: &PgPool, step_id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM message_sequence_steps WHERE id = $1")
        .bind(step_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("step {}", step_id)));
    }
    Ok(())
}
