//! AI assistant proxy

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use ideahub_common::errors::{AppError, Result};

#[derive(Debug, Deserialize, Validate)]
pub struct AskRequest {
    #[validate(length(min = 1, max = 8000))]
    pub text: String,
}

#[derive(Serialize)]
pub struct AskResponse {
    pub answer: String,
}

/// Forward a prompt to the configured completion provider
pub async fn ask(State(state): State<AppState>, Json(request): Json<AskRequest>) -> Result<Json<AskResponse>> {
    request.validate()?;

    let client = state.assistant.as_ref().ok_or_else(|| AppError::ServiceUnavailable {
        message: "AI assistant is not configured".to_string(),
    })?;

    let answer = client.complete(&request.text).await?;

    Ok(Json(AskResponse { answer }))
}
