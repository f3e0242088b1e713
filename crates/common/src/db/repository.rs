//! Repository pattern for database operations
//!
//! All queries for users and ideas go through [`Repository`], which also
//! backs the admission pipeline as its [`IdeaStore`].

use crate::admission::IdeaStore;
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Public owner fields attached to listed ideas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<User> for OwnerSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// An idea joined with its owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaWithOwner {
    #[serde(flatten)]
    pub idea: Idea,
    pub owner: Option<OwnerSummary>,
}

impl From<(Idea, Option<User>)> for IdeaWithOwner {
    fn from((idea, owner): (Idea, Option<User>)) -> Self {
        Self {
            idea,
            owner: owner.map(OwnerSummary::from),
        }
    }
}

/// Number of ideas in one status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a new user with an already-hashed password
    pub async fn create_user(
        &self,
        username: String,
        email: String,
        password_hash: String,
        role: UserRole,
    ) -> Result<User> {
        let user = UserActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            role: Set(role.into()),
            created_at: Set(chrono::Utc::now().into()),
        };

        user.insert(self.write_conn()).await.map_err(Into::into)
    }

    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        UserEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Email.eq(email))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// List users with the given role, oldest first
    pub async fn list_users_by_role(&self, role: UserRole) -> Result<Vec<User>> {
        UserEntity::find()
            .filter(UserColumn::Role.eq(role.as_str()))
            .order_by_asc(UserColumn::CreatedAt)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn count_users_by_role(&self, role: UserRole) -> Result<u64> {
        UserEntity::find()
            .filter(UserColumn::Role.eq(role.as_str()))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Delete users together with all of their ideas.
    ///
    /// Returns the number of users removed.
    pub async fn delete_users_with_ideas(&self, user_ids: &[Uuid]) -> Result<u64> {
        if user_ids.is_empty() {
            return Ok(0);
        }

        let txn = self.write_conn().begin().await?;

        IdeaEntity::delete_many()
            .filter(IdeaColumn::OwnerId.is_in(user_ids.iter().copied()))
            .exec(&txn)
            .await?;

        let result = UserEntity::delete_many()
            .filter(UserColumn::Id.is_in(user_ids.iter().copied()))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        Ok(result.rows_affected)
    }

    // ========================================================================
    // Idea Operations
    // ========================================================================

    /// Every stored idea, oldest first with ties broken by id
    pub async fn list_ideas(&self) -> Result<Vec<Idea>> {
        IdeaEntity::find()
            .order_by_asc(IdeaColumn::CreatedAt)
            .order_by_asc(IdeaColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Insert a new `pending` idea
    pub async fn insert_idea(&self, title: &str, description: &str, owner_id: Uuid) -> Result<Idea> {
        let now = chrono::Utc::now();

        let idea = IdeaActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            description: Set(description.to_string()),
            status: Set(IdeaStatus::Pending.into()),
            owner_id: Set(owner_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        idea.insert(self.write_conn()).await.map_err(Into::into)
    }

    pub async fn find_idea_by_id(&self, id: Uuid) -> Result<Option<Idea>> {
        IdeaEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find an idea the given user owns and can still edit
    pub async fn find_editable_idea(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Idea>> {
        IdeaEntity::find_by_id(id)
            .filter(IdeaColumn::OwnerId.eq(owner_id))
            .filter(IdeaColumn::Status.eq(IdeaStatus::Pending.as_str()))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// All ideas with their owners, oldest first
    pub async fn list_ideas_with_owner(&self) -> Result<Vec<IdeaWithOwner>> {
        let rows = IdeaEntity::find()
            .find_also_related(UserEntity)
            .order_by_asc(IdeaColumn::CreatedAt)
            .order_by_asc(IdeaColumn::Id)
            .all(self.read_conn())
            .await?;

        Ok(rows.into_iter().map(IdeaWithOwner::from).collect())
    }

    /// Ideas owned by one user, oldest first
    pub async fn list_ideas_by_owner(&self, owner_id: Uuid) -> Result<Vec<IdeaWithOwner>> {
        let rows = IdeaEntity::find()
            .find_also_related(UserEntity)
            .filter(IdeaColumn::OwnerId.eq(owner_id))
            .order_by_asc(IdeaColumn::CreatedAt)
            .order_by_asc(IdeaColumn::Id)
            .all(self.read_conn())
            .await?;

        Ok(rows.into_iter().map(IdeaWithOwner::from).collect())
    }

    /// Approved ideas with their owners, newest first
    pub async fn list_approved_with_owner(&self) -> Result<Vec<IdeaWithOwner>> {
        let rows = IdeaEntity::find()
            .find_also_related(UserEntity)
            .filter(IdeaColumn::Status.eq(IdeaStatus::Approved.as_str()))
            .order_by_desc(IdeaColumn::CreatedAt)
            .order_by_desc(IdeaColumn::Id)
            .all(self.read_conn())
            .await?;

        Ok(rows.into_iter().map(IdeaWithOwner::from).collect())
    }

    /// Approved ideas whose title, description or owner username contains
    /// `query`, ignoring case. Newest first.
    pub async fn search_approved(&self, query: &str) -> Result<Vec<IdeaWithOwner>> {
        let needle = query.to_lowercase();

        let matches = self
            .list_approved_with_owner()
            .await?
            .into_iter()
            .filter(|entry| {
                entry.idea.title.to_lowercase().contains(&needle)
                    || entry.idea.description.to_lowercase().contains(&needle)
                    || entry
                        .owner
                        .as_ref()
                        .is_some_and(|owner| owner.username.to_lowercase().contains(&needle))
            })
            .collect();

        Ok(matches)
    }

    /// Replace the content of an editable idea.
    ///
    /// The idea must belong to `owner_id` and still be pending. Status is
    /// reset to `pending` and `updated_at` refreshed.
    pub async fn update_idea_content(
        &self,
        id: Uuid,
        owner_id: Uuid,
        title: Option<String>,
        description: Option<String>,
    ) -> Result<Idea> {
        let mut idea: IdeaActiveModel = self
            .find_editable_idea(id, owner_id)
            .await?
            .ok_or_else(|| AppError::IdeaNotFound { id: id.to_string() })?
            .into();

        if let Some(title) = title {
            idea.title = Set(title);
        }

        if let Some(description) = description {
            idea.description = Set(description);
        }

        idea.status = Set(IdeaStatus::Pending.into());
        idea.updated_at = Set(chrono::Utc::now().into());

        idea.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Set the moderation status of any idea
    pub async fn set_idea_status(&self, id: Uuid, status: IdeaStatus) -> Result<Idea> {
        let mut idea: IdeaActiveModel = IdeaEntity::find_by_id(id)
            .one(self.write_conn())
            .await?
            .ok_or_else(|| AppError::NotFound {
                resource_type: "Idea".to_string(),
                id: id.to_string(),
            })?
            .into();

        idea.status = Set(status.into());
        idea.updated_at = Set(chrono::Utc::now().into());

        idea.update(self.write_conn()).await.map_err(Into::into)
    }

    /// Delete an idea by ID
    pub async fn delete_idea(&self, id: Uuid) -> Result<bool> {
        let result = IdeaEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Delete an idea only if `owner_id` owns it
    pub async fn delete_owned_idea(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let result = IdeaEntity::delete_many()
            .filter(IdeaColumn::Id.eq(id))
            .filter(IdeaColumn::OwnerId.eq(owner_id))
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_ideas(&self) -> Result<u64> {
        IdeaEntity::find()
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    pub async fn count_ideas_by_status(&self, status: IdeaStatus) -> Result<u64> {
        IdeaEntity::find()
            .filter(IdeaColumn::Status.eq(status.as_str()))
            .count(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Idea counts grouped by status, only for statuses that occur
    pub async fn idea_status_counts(&self) -> Result<Vec<StatusCount>> {
        let rows: Vec<(String, i64)> = IdeaEntity::find()
            .select_only()
            .column(IdeaColumn::Status)
            .column_as(Expr::col(IdeaColumn::Id).count(), "count")
            .group_by(IdeaColumn::Status)
            .order_by_asc(IdeaColumn::Status)
            .into_tuple()
            .all(self.read_conn())
            .await?;

        Ok(rows
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect())
    }
}

#[async_trait]
impl IdeaStore for Repository {
    async fn list_all(&self) -> Result<Vec<Idea>> {
        self.list_ideas().await
    }

    async fn insert(&self, title: &str, description: &str, owner_id: Uuid) -> Result<Idea> {
        self.insert_idea(title, description, owner_id).await
    }
}
