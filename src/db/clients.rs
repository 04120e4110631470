//! Client and sales channel queries

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{Client, ClientInput, ClientWithChannel, SalesChannel};

/// All clients with their channel name, in creation order
pub async fn list_clients(pool: &PgPool) -> Result<Vec<ClientWithChannel>> {
    let clients = sqlx::query_as::<_, ClientWithChannel>(
        r#"
        SELECT
            c.id, c.name, c.phone, c.email, c.address, c.state, c.city,
            c.neighborhood, c.postal_code, c.frequent, c.sales_channel_id,
            c.client_type, c.created_at,
            sc.name AS sales_channel_name
        FROM clients c
        LEFT JOIN sales_channels sc ON sc.id = c.sales_channel_id
        ORDER BY c.created_at ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(clients)
}

/// Insert a client. `sales_channel_id` must already be validated.
pub async fn create_client(
    pool: &PgPool,
    input: &ClientInput,
    sales_channel_id: Uuid,
) -> Result<Client> {
    let client = sqlx::query_as::<_, Client>(
        r#"
        INSERT INTO clients (
            name, phone, email, address, state, city, neighborhood,
            postal_code, frequent, sales_channel_id, client_type
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING
            id, name, phone, email, address, state, city, neighborhood,
            postal_code, frequent, sales_channel_id, client_type, created_at
        "#,
    )
    .bind(input.name.trim())
    .bind(&input.phone)
    .bind(&input.email)
    .bind(&input.address)
    .bind(&input.state)
    .bind(&input.city)
    .bind(&input.neighborhood)
    .bind(&input.postal_code)
    .bind(input.frequent)
    .bind(sales_channel_id)
    .bind(&input.client_type)
    .fetch_one(pool)
    .await?;

    Ok(client)
}

/// Overwrite a client's fields
pub async fn update_client(
    pool: &PgPool,
    client_id: Uuid,
    input: &ClientInput,
    sales_channel_id: Uuid,
) -> Result<Client> {
    let client = sqlx::query_as::<_, Client>(
        r#"
        UPDATE clients
        SET name = $2, phone = $3, email = $4, address = $5, state = $6,
            city = $7, neighborhood = $8, postal_code = $9, frequent = $10,
            sales_channel_id = $11, client_type = $12
        WHERE id = $1
        RETURNING
            id, name, phone, email, address, state, city, neighborhood,
            postal_code, frequent, sales_channel_id, client_type, created_at
        "#,
    )
    .bind(client_id)
    .bind(input.name.trim())
    .bind(&input.phone)
    .bind(&input.email)
    .bind(&input.address)
    .bind(&input.state)
    .bind(&input.city)
    .bind(&input.neighborhood)
    .bind(&input.postal_code)
    .bind(input.frequent)
    .bind(sales_channel_id)
    .bind(&input.client_type)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("client {}", client_id)))?;

    Ok(client)
}

/// The client a quote belongs to
pub async fn get_quote_client(pool: &PgPool, quote_id: Uuid) -> Result<Option<Client>> {
    let client = sqlx::query_as::<_, Client>(
        r#"
        SELECT
            c.id, c.name, c.phone, c.email, c.address, c.state, c.city,
            c.neighborhood, c.postal_code, c.frequent, c.sales_channel_id,
            c.client_type, c.created_at
        FROM clients c
        JOIN quotes q ON q.client_id = c.id
        WHERE q.id = $1
        "#,
    )
    .bind(quote_id)
    .fetch_optional(pool)
    .await?;

    Ok(client)
}

pub async fn list_sales_channels(pool: &PgPool) -> Result<Vec<SalesChannel>> {
    let channels = sqlx::query_as::<_, SalesChannel>(
        "SELECT id, name FROM sales_channels ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(channels)
}

pub async fn create_sales_channel(pool: &PgPool, name: &str) -> Result<SalesChannel> {
    let channel = sqlx::query_as::<_, SalesChannel>(
        "INSERT INTO sales_channels (name) VALUES ($1) RETURNING id, name",
    )
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(channel)
}
