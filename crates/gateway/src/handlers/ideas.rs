//! Idea handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extractors::CurrentUser;
use crate::AppState;
use ideahub_common::{
    db::{models::Idea, IdeaWithOwner},
    errors::{AppError, Result},
};

/// Body for creating or editing an idea.
///
/// Missing fields deserialize as `None`; on create they are treated as empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IdeaInput {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Submit a new idea through the admission pipeline
pub async fn create_idea(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(input): Json<IdeaInput>,
) -> Result<(StatusCode, Json<Idea>)> {
    let title = input.title.unwrap_or_default();
    let description = input.description.unwrap_or_default();

    let idea = state
        .admission
        .submit(&title, &description, user.id)
        .await
        .map_err(AppError::from)?;

    Ok((StatusCode::CREATED, Json(idea)))
}

/// The caller's own ideas
pub async fn list_my_ideas(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<IdeaWithOwner>>> {
    let ideas = state.repo.list_ideas_by_owner(user.id).await?;
    Ok(Json(ideas))
}

/// Edit a pending idea the caller owns
pub async fn update_idea(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(idea_id): Path<Uuid>,
    Json(input): Json<IdeaInput>,
) -> Result<Json<Idea>> {
    if input.title.is_none() && input.description.is_none() {
        return Err(AppError::Validation {
            message: "At least one of title or description is required".to_string(),
            field: None,
        });
    }

    let existing = state
        .repo
        .find_editable_idea(idea_id, user.id)
        .await?
        .ok_or_else(|| AppError::IdeaNotFound {
            id: idea_id.to_string(),
        })?;

    let title = input.title.as_deref().unwrap_or(&existing.title);
    let description = input.description.as_deref().unwrap_or(&existing.description);

    state
        .admission
        .check_revision(idea_id, title, description)
        .await
        .map_err(AppError::from)?;

    let idea = state
        .repo
        .update_idea_content(idea_id, user.id, input.title, input.description)
        .await?;

    tracing::info!(idea_id = %idea.id, owner_id = %user.id, "Idea updated");

    Ok(Json(idea))
}

/// Delete an idea the caller owns
pub async fn delete_idea(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(idea_id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    if !state.repo.delete_owned_idea(idea_id, user.id).await? {
        return Err(AppError::IdeaNotFound {
            id: idea_id.to_string(),
        });
    }

    tracing::info!(idea_id = %idea_id, owner_id = %user.id, "Idea deleted");

    Ok(Json(MessageResponse {
        message: "Idea deleted successfully".to_string(),
    }))
}

/// Approved ideas, newest first
pub async fn list_approved(State(state): State<AppState>) -> Result<Json<Vec<IdeaWithOwner>>> {
    let ideas = state.repo.list_approved_with_owner().await?;
    Ok(Json(ideas))
}

/// Search approved ideas by title, description or owner username
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<IdeaWithOwner>>> {
    let query = query
        .query
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::MissingField {
            field: "query".to_string(),
        })?;

    let ideas = state.repo.search_approved(&query).await?;
    Ok(Json(ideas))
}
