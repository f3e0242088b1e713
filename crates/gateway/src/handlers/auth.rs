//! Account handlers: registration, login, token validation

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;
use ideahub_common::{
    accounts::{AuthSession, Credentials, Registration},
    db::models::UserRole,
    errors::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// Identity behind a token
#[derive(Serialize)]
pub struct TokenInfo {
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

/// Create an account
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<Registration>,
) -> Result<(StatusCode, Json<AuthSession>)> {
    let session = state.accounts.register(request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Exchange credentials for a token
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<AuthSession>> {
    let session = state.accounts.login(credentials).await?;

    tracing::info!(user_id = %session.user.id, "User logged in");

    Ok(Json(session))
}

/// Report who a token belongs to
pub async fn validate_token(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<TokenInfo>> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::MissingField {
            field: "token".to_string(),
        })?;

    let user = state.accounts.resolve_token(&token).await?;
    let role = user.user_role();

    Ok(Json(TokenInfo {
        username: user.username,
        email: user.email,
        role,
    }))
}
