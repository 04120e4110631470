//! Client registry models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Client from the clients table
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub postal_code: Option<String>,
    pub frequent: bool,
    pub sales_channel_id: Uuid,
    /// Free-form classification, e.g. "Final" or "Distributor"
    pub client_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Client joined with its sales channel name
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ClientWithChannel {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub client: Client,
    pub sales_channel_name: Option<String>,
}

/// Create/update body for a client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientInput {
    #[serde(default)]
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub postal_code: Option<String>,
    #[serde(default)]
    pub frequent: bool,
    pub sales_channel_id: Option<Uuid>,
    pub client_type: Option<String>,
}

impl ClientInput {
    /// Name and sales channel are required. Returns the channel id.
    pub fn validate(&self) -> Result<Uuid, String> {
        if self.name.trim().is_empty() {
            return Err("name is required".to_string());
        }
        self.sales_channel_id
            .ok_or_else(|| "sales_channel_id is required".to_string())
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SalesChannel {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSalesChannel {
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_requires_name_and_channel() {
        let mut input = ClientInput::default();
        assert_eq!(input.validate(), Err("name is required".to_string()));

        input.name = "Ana".to_string();
        assert_eq!(input.validate(), Err("sales_channel_id is required".to_string()));

        let channel = Uuid::new_v4();
        input.sales_channel_id = Some(channel);
        assert_eq!(input.validate(), Ok(channel));
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let input = ClientInput {
            name: "   ".to_string(),
            sales_channel_id: Some(Uuid::nil()),
            ..ClientInput::default()
        };
        assert!(input.validate().is_err());
    }
}
