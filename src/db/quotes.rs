//! Quote queries, including the transactional save

use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::quote::{
    generate_folio, NewQuote, PricedQuote, Quote, QuoteItem, QuoteStatus, QuoteSummary,
};

/// Create a quote in `new` status, generating a folio when no name is given.
pub async fn create_quote(
    pool: &PgPool,
    input: &NewQuote,
    created_by: Option<Uuid>,
) -> Result<Quote> {
    let project_name = match input.explicit_project_name() {
        Some(name) => name.to_string(),
        None => next_folio(pool, input.client_id, input.project_type_id).await?,
    };

    let quote = sqlx::query_as::<_, Quote>(
        r#"
        INSERT INTO quotes (
            project_name, client_id, created_by, agent_id, project_type_id,
            shipping_id, quoted_line, status
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING
            id, project_name, client_id, created_by, agent_id, project_type_id,
            shipping_id, quoted_line, status, list_price, final_price, iva,
            discount_percent, list_price_with_discount, tolerance, created_at
        "#,
    )
    .bind(&project_name)
    .bind(input.client_id)
    .bind(created_by)
    .bind(input.agent_id)
    .bind(input.project_type_id)
    .bind(input.shipping_id)
    .bind(input.quoted_line.trim())
    .bind(QuoteStatus::New.as_str())
    .fetch_one(pool)
    .await?;

    tracing::info!(quote_id = %quote.id, project_name = %quote.project_name, "Quote created");
    Ok(quote)
}

async fn next_folio(pool: &PgPool, client_id: Uuid, project_type_id: Uuid) -> Result<String> {
    let (channel, client_type) = sqlx::query_as::<_, (Option<String>, Option<String>)>(
        r#"
        SELECT sc.name, c.client_type
        FROM clients c
        LEFT JOIN sales_channels sc ON sc.id = c.sales_channel_id
        WHERE c.id = $1
        "#,
    )
    .bind(client_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("client {}", client_id)))?;

    let project_type: String = sqlx::query_scalar("SELECT name FROM project_types WHERE id = $1")
        .bind(project_type_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("project type {}", project_type_id)))?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM quotes")
        .fetch_one(pool)
        .await?;

    Ok(generate_folio(
        &project_type,
        channel.as_deref().unwrap_or_default(),
        client_type.as_deref().unwrap_or_default(),
        Utc::now().date_naive(),
        existing,
    ))
}

/// Open (`new`) quotes, newest first
pub async fn list_open_quotes(pool: &PgPool) -> Result<Vec<QuoteSummary>> {
    let quotes = sqlx::query_as::<_, QuoteSummary>(
        r#"
        SELECT
            q.id,
            q.project_name,
            q.status,
            q.created_at,
            c.name AS client_name,
            creator.full_name AS creator_name,
            agent.full_name AS agent_name
        FROM quotes q
        LEFT JOIN clients c ON c.id = q.client_id
        LEFT JOIN users creator ON creator.id = q.created_by
        LEFT JOIN users agent ON agent.id = q.agent_id
        WHERE q.status = $1
        ORDER BY q.created_at DESC
        "#,
    )
    .bind(QuoteStatus::New.as_str())
    .fetch_all(pool)
    .await?;

    Ok(quotes)
}

/// Get a quote header by id
pub async fn get_quote(pool: &PgPool, quote_id: Uuid) -> Result<Quote> {
    let quote = sqlx::query_as::<_, Quote>(
        r#"
        SELECT
            id, project_name, client_id, created_by, agent_id, project_type_id,
            shipping_id, quoted_line, status, list_price, final_price, iva,
            discount_percent, list_price_with_discount, tolerance, created_at
        FROM quotes
        WHERE id = $1
        "#,
    )
    .bind(quote_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("quote {}", quote_id)))?;

    Ok(quote)
}

/// Items of a quote in their saved order
pub async fn get_quote_items(pool: &PgPool, quote_id: Uuid) -> Result<Vec<QuoteItem>> {
    let items = sqlx::query_as::<_, QuoteItem>(
        r#"
        SELECT
            position, product_id, quantity, description, measures_label,
            width, height, location, unit_cost, protection, installation,
            margin_percent, margin, discount, agent_commission,
            seller_commission, unit_price, subtotal
        FROM quote_items
        WHERE quote_id = $1
        ORDER BY position
        "#,
    )
    .bind(quote_id)
    .fetch_all(pool)
    .await?;

    Ok(items)
}

/// Writes a save performs once the quote row is locked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SaveAction {
    ClearItems,
    ReplaceItemsAndFinalize,
}

/// Decide what a save may write, given the locked row's stored status.
///
/// Terminal quotes are `Forbidden`; nothing is written for them.
fn plan_save(status: &str, item_count: usize) -> Result<SaveAction> {
    let status = status
        .parse::<QuoteStatus>()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if status.is_terminal() {
        return Err(AppError::Forbidden(format!(
            "products of a {} quote cannot be modified",
            status.label().to_lowercase()
        )));
    }

    Ok(if item_count == 0 {
        SaveAction::ClearItems
    } else {
        SaveAction::ReplaceItemsAndFinalize
    })
}

/// Replace a quote's items and aggregates, and finalize it.
///
/// Runs in one transaction holding a row lock on the quote. Terminal quotes
/// are rejected with `Forbidden`. An empty item list only clears the items.
pub async fn save_priced_quote(
    pool: &PgPool,
    quote_id: Uuid,
    priced: &PricedQuote,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    let status: String = sqlx::query_scalar("SELECT status FROM quotes WHERE id = $1 FOR UPDATE")
        .bind(quote_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("quote {}", quote_id)))?;

    // Dropping `tx` on an early return rolls back and releases the lock.
    let action = plan_save(&status, priced.items.len())?;

    sqlx::query("DELETE FROM quote_items WHERE quote_id = $1")
        .bind(quote_id)
        .execute(&mut *tx)
        .await?;

    if action == SaveAction::ClearItems {
        tx.commit().await?;
        tracing::info!(quote_id = %quote_id, "Quote items cleared");
        return Ok(());
    }

    let mut insert: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO quote_items (
            quote_id, position, product_id, quantity, description, measures_label,
            width, height, location, unit_cost, protection, installation,
            margin_percent, margin, discount, agent_commission,
            seller_commission, unit_price, subtotal
        ) ",
    );
    insert.push_values(&priced.items, |mut row, item| {
        row.push_bind(quote_id)
            .push_bind(item.position)
            .push_bind(item.product_id)
            .push_bind(item.quantity)
            .push_bind(&item.description)
            .push_bind(&item.measures_label)
            .push_bind(item.width)
            .push_bind(item.height)
            .push_bind(&item.location)
            .push_bind(item.unit_cost)
            .push_bind(item.protection)
            .push_bind(item.installation)
            .push_bind(item.margin_percent)
            .push_bind(item.margin)
            .push_bind(item.discount)
            .push_bind(item.agent_commission)
            .push_bind(item.seller_commission)
            .push_bind(item.unit_price)
            .push_bind(item.subtotal);
    });
    insert.build().execute(&mut *tx).await?;

    sqlx::query(
        r#"
        UPDATE quotes
        SET status = $2,
            list_price = $3,
            final_price = $4,
            iva = $5,
            discount_percent = $6,
            list_price_with_discount = $7,
            tolerance = $8
        WHERE id = $1
        "#,
    )
    .bind(quote_id)
    .bind(QuoteStatus::Finalized.as_str())
    .bind(priced.list_price)
    .bind(priced.final_price)
    .bind(priced.iva)
    .bind(priced.discount_percent)
    .bind(priced.list_price_with_discount)
    .bind(priced.tolerance)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        quote_id = %quote_id,
        items = priced.items.len(),
        final_price = %priced.final_price,
        "Quote saved and finalized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_quotes_are_forbidden() {
        for status in [
            QuoteStatus::Finalized,
            QuoteStatus::Authorized,
            QuoteStatus::Cancelled,
        ] {
            for item_count in [0, 3] {
                let err = plan_save(status.as_str(), item_count).unwrap_err();
                assert!(matches!(err, AppError::Forbidden(_)), "{:?}", err);
            }
        }
    }

    #[test]
    fn test_finalized_quote_message_names_status() {
        match plan_save(QuoteStatus::Finalized.as_str(), 1) {
            Err(AppError::Forbidden(message)) => assert!(message.contains("finalized")),
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[test]
    fn test_new_quote_save_actions() {
        assert_eq!(
            plan_save(QuoteStatus::New.as_str(), 2).unwrap(),
            SaveAction::ReplaceItemsAndFinalize
        );
        assert_eq!(
            plan_save(QuoteStatus::New.as_str(), 0).unwrap(),
            SaveAction::ClearItems
        );
    }

    #[test]
    fn test_unknown_stored_status_is_internal() {
        let err = plan_save("archived", 1).unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}
