//! Acting user extractor.
//!
//! Authentication happens upstream; the gateway forwards the user id and role
//! in `X-Actor-Id` and `X-Actor-Role`. Handlers only need to know who is
//! acting and whether they are an administrator (admins may bypass the
//! adjusted-price floor).

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::AppError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The user performing the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Option<Uuid>,
    pub is_admin: bool,
}

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = match parts.headers.get(ACTOR_ID_HEADER) {
            Some(value) => {
                let raw = value
                    .to_str()
                    .map_err(|_| AppError::Validation("X-Actor-Id is not valid text".to_string()))?;
                let id = Uuid::parse_str(raw.trim())
                    .map_err(|_| AppError::Validation(format!("X-Actor-Id is not a UUID: {}", raw)))?;
                Some(id)
            }
            None => None,
        };

        let is_admin = parts
            .headers
            .get(ACTOR_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|role| role.trim().eq_ignore_ascii_case("admin"));

        Ok(Self { user_id, is_admin })
    }
}
