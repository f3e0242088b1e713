//! Storage interface required by the admission pipeline

use crate::db::models::{Idea, IdeaStatus};
use crate::errors::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Read-all and insert-one access to stored ideas
#[async_trait]
pub trait IdeaStore: Send + Sync {
    /// Snapshot of every stored idea, in a stable order
    async fn list_all(&self) -> Result<Vec<Idea>>;

    /// Store a new `pending` idea, assigning its id and timestamps
    async fn insert(&self, title: &str, description: &str, owner_id: Uuid) -> Result<Idea>;
}

/// In-process idea store for tests and local tooling
#[derive(Default)]
pub struct MemoryIdeaStore {
    ideas: RwLock<Vec<Idea>>,
}

impl MemoryIdeaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ideas(ideas: Vec<Idea>) -> Self {
        Self {
            ideas: RwLock::new(ideas),
        }
    }

    pub async fn len(&self) -> usize {
        self.ideas.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.ideas.read().await.is_empty()
    }
}

#[async_trait]
impl IdeaStore for MemoryIdeaStore {
    async fn list_all(&self) -> Result<Vec<Idea>> {
        Ok(self.ideas.read().await.clone())
    }

    async fn insert(&self, title: &str, description: &str, owner_id: Uuid) -> Result<Idea> {
        let now = Utc::now();
        let idea = Idea {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: description.to_string(),
            status: IdeaStatus::Pending.into(),
            owner_id,
            created_at: now.into(),
            updated_at: now.into(),
        };

        self.ideas.write().await.push(idea.clone());
        Ok(idea)
    }
}
