//! Authenticated-user extractors

use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use ideahub_common::{
    auth::extract_bearer,
    db::models::User,
    errors::{AppError, Result},
};

use crate::AppState;

/// The user behind a valid `Authorization: Bearer <token>` header
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// A [`CurrentUser`] with the admin role
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

fn please_authenticate() -> AppError {
    AppError::Unauthorized {
        message: "Please authenticate".to_string(),
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(extract_bearer)
            .ok_or_else(please_authenticate)?;

        match state.accounts.resolve_token(token).await {
            Ok(user) => Ok(CurrentUser(user)),
            Err(e) if e.is_server_error() => Err(e),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected bearer token");
                Err(please_authenticate())
            }
        }
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AppError::Forbidden {
                message: "Admin access required".to_string(),
            });
        }

        Ok(AdminUser(user))
    }
}
