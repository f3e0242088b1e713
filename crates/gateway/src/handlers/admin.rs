//! Administration handlers (admin role only)

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ideas::MessageResponse;
use crate::extractors::AdminUser;
use crate::AppState;
use ideahub_common::{
    db::{
        models::{Idea, IdeaStatus, User, UserRole},
        IdeaWithOwner, StatusCount,
    },
    errors::{AppError, Result},
};

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    pub user_ids: Vec<Uuid>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    pub message: String,
    pub deleted_count: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: u64,
    pub total_admins: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaStats {
    pub total_ideas: u64,
    pub ideas_by_status: Vec<StatusCount>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaStatusStats {
    pub approved_count: u64,
    pub pending_count: u64,
}

fn idea_not_found(id: Uuid) -> AppError {
    AppError::NotFound {
        resource_type: "Idea".to_string(),
        id: id.to_string(),
    }
}

/// Every idea with its owner
pub async fn list_ideas(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<IdeaWithOwner>>> {
    let ideas = state.repo.list_ideas_with_owner().await?;
    Ok(Json(ideas))
}

/// Moderate an idea
pub async fn update_idea_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(idea_id): Path<Uuid>,
    Json(request): Json<StatusUpdate>,
) -> Result<Json<Idea>> {
    let status: IdeaStatus = request.status.parse().map_err(|message| AppError::Validation {
        message,
        field: Some("status".to_string()),
    })?;

    let idea = state.repo.set_idea_status(idea_id, status).await?;

    tracing::info!(
        idea_id = %idea_id,
        admin_id = %admin.id,
        status = %status,
        "Idea status changed"
    );

    Ok(Json(idea))
}

pub async fn delete_idea(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(idea_id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    if !state.repo.delete_idea(idea_id).await? {
        return Err(idea_not_found(idea_id));
    }

    tracing::info!(idea_id = %idea_id, admin_id = %admin.id, "Idea deleted by admin");

    Ok(Json(MessageResponse {
        message: "Idea deleted successfully".to_string(),
    }))
}

/// Accounts with the regular user role
pub async fn list_users(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<Vec<User>>> {
    let users = state.repo.list_users_by_role(UserRole::User).await?;
    Ok(Json(users))
}

/// Delete a user and all of their ideas
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    if state.repo.delete_users_with_ideas(&[user_id]).await? == 0 {
        return Err(AppError::UserNotFound {
            id: user_id.to_string(),
        });
    }

    tracing::info!(user_id = %user_id, admin_id = %admin.id, "User deleted");

    Ok(Json(MessageResponse {
        message: "User and associated ideas deleted successfully".to_string(),
    }))
}

pub async fn bulk_delete_users(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>> {
    if request.user_ids.is_empty() {
        return Err(AppError::Validation {
            message: "No users selected".to_string(),
            field: Some("userIds".to_string()),
        });
    }

    let deleted_count = state.repo.delete_users_with_ideas(&request.user_ids).await?;

    tracing::info!(
        requested = request.user_ids.len(),
        deleted = deleted_count,
        admin_id = %admin.id,
        "Users bulk deleted"
    );

    Ok(Json(BulkDeleteResponse {
        message: "Users and associated ideas deleted successfully".to_string(),
        deleted_count,
    }))
}

pub async fn user_stats(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<UserStats>> {
    Ok(Json(UserStats {
        total_users: state.repo.count_users_by_role(UserRole::User).await?,
        total_admins: state.repo.count_users_by_role(UserRole::Admin).await?,
    }))
}

pub async fn idea_stats(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<IdeaStats>> {
    Ok(Json(IdeaStats {
        total_ideas: state.repo.count_ideas().await?,
        ideas_by_status: state.repo.idea_status_counts().await?,
    }))
}

pub async fn idea_status_stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<IdeaStatusStats>> {
    Ok(Json(IdeaStatusStats {
        approved_count: state.repo.count_ideas_by_status(IdeaStatus::Approved).await?,
        pending_count: state.repo.count_ideas_by_status(IdeaStatus::Pending).await?,
    }))
}
