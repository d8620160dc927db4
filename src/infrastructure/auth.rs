use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::env;

use axum::{
    async_trait,
    extract::{FromRequestParts, Json},
    http::{request::Parts, StatusCode},
};
use serde_json::json;

use crate::domain::{Actor, DomainError};
use crate::infrastructure::AppState;

type Rejection = (StatusCode, Json<serde_json::Value>);

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // username
    pub role: String,
    pub exp: usize,
}

fn unauthorized(message: &str) -> Rejection {
    (StatusCode::UNAUTHORIZED, Json(json!({ "error": message })))
}

#[async_trait]
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
{
    type Rejection = Rejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| unauthorized("Missing Authorization header"))?;

        let Some(token) = auth_header.strip_prefix("Bearer ") else {
            return Err(unauthorized("Invalid Authorization header format"));
        };

        decode_jwt(token).map_err(|_| unauthorized("Invalid or expired token"))
    }
}

/// The authenticated user of a request, resolved through the identity provider.
#[derive(Debug, Clone)]
pub struct RequestActor(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for RequestActor {
    type Rejection = Rejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = Claims::from_request_parts(parts, state).await?;

        match state.identity.resolve_username(&claims.sub).await {
            Ok(actor) => Ok(RequestActor(actor)),
            Err(DomainError::NotFound) => Err(unauthorized("Unknown user")),
            Err(e) => {
                tracing::error!("Failed to resolve user '{}': {}", claims.sub, e);
                Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Failed to resolve user" })),
                ))
            }
        }
    }
}

fn get_jwt_secret() -> Result<String, String> {
    match env::var("JWT_SECRET") {
        Ok(secret) => Ok(secret),
        Err(_) if cfg!(debug_assertions) => Ok("secret".to_string()),
        Err(_) => Err("JWT_SECRET environment variable must be set in production".to_string()),
    }
}

pub fn create_jwt(username: &str, role: &str) -> Result<String, String> {
    let secret = get_jwt_secret()?;
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| "token expiry overflow".to_string())?
        .timestamp();

    let claims = Claims {
        sub: username.to_owned(),
        role: role.to_owned(),
        exp: expiration as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| e.to_string())
}

pub fn decode_jwt(token: &str) -> Result<Claims, String> {
    let secret = get_jwt_secret()?;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_round_trip() {
        let token = create_jwt("expert", "monitoring_expert").expect("Failed to create JWT");
        let claims = decode_jwt(&token).expect("Failed to verify JWT");
        assert_eq!(claims.sub, "expert");
        assert_eq!(claims.role, "monitoring_expert");
    }

    #[test]
    fn test_tampered_token_rejected() {
        let token = create_jwt("expert", "admin").unwrap();
        assert!(decode_jwt(&format!("{}x", token)).is_err());
    }
}
