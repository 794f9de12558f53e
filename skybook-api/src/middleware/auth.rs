use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use skybook_core::identity::{AuthContext, Caller, Role};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims issued by the identity provider. `sub` is the account uuid.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

impl Claims {
    fn into_caller(self) -> Result<Caller, AppError> {
        let account_id = Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::AuthenticationError("Invalid subject".to_string()))?;
        let role: Role = self
            .role
            .parse()
            .map_err(|_| AppError::AuthenticationError("Invalid role".to_string()))?;
        Ok(Caller { account_id, role })
    }
}

// ============================================================================
// Identity Extractor
// ============================================================================

/// Caller identity for a request. A missing `Authorization` header yields
/// `AuthContext::Anonymous`; the core decides whether that is acceptable.
#[derive(Debug, Clone, Copy)]
pub struct Identity(pub AuthContext);

impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // 1. Extract token from Authorization header
        let Some(header) = parts.headers.get(axum::http::header::AUTHORIZATION) else {
            return Ok(Identity(AuthContext::Anonymous));
        };

        let token = header
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::AuthenticationError("Malformed Authorization header".to_string()))?;

        // 2. Decode and validate JWT
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.auth.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| {
            tracing::debug!("Rejected bearer token: {}", e);
            AppError::AuthenticationError("Invalid token".to_string())
        })?;

        // 3. Map claims onto a caller
        let caller = token_data.claims.into_caller()?;
        Ok(Identity(AuthContext::Authenticated(caller)))
    }
}
