//! Idea admission pipeline

use super::{find_exact_duplicate, DuplicateGuard, IdeaField, IdeaStore, Rejection};
use crate::db::models::Idea;
use crate::errors::AppError;
use crate::metrics;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Validates, de-duplicates and stores new ideas.
///
/// Holds no state between calls: each submission reads a fresh snapshot from
/// the store.
pub struct AdmissionPipeline<S> {
    store: S,
    guard: DuplicateGuard,
}

impl<S: IdeaStore> AdmissionPipeline<S> {
    pub fn new(store: S) -> Self {
        Self::with_guard(store, DuplicateGuard::default())
    }

    pub fn with_guard(store: S, guard: DuplicateGuard) -> Self {
        Self { store, guard }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Submit a new idea on behalf of `owner_id`.
    ///
    /// On success the stored idea is returned with status `pending`.
    pub async fn submit(&self, title: &str, description: &str, owner_id: Uuid) -> Result<Idea, Rejection> {
        let outcome = self.admit(title, description, owner_id).await;

        match &outcome {
            Ok(idea) => {
                info!(idea_id = %idea.id, owner_id = %owner_id, "Idea admitted");
                metrics::record_admission("accepted");
            }
            Err(rejection @ Rejection::Persistence { .. }) => {
                warn!(owner_id = %owner_id, error = %rejection, "Idea admission failed");
                metrics::record_admission(rejection.kind());
            }
            Err(rejection) => {
                debug!(owner_id = %owner_id, reason = rejection.kind(), "Idea rejected");
                metrics::record_admission(rejection.kind());
            }
        }

        outcome
    }

    /// Run the content gates for an edit of an existing idea, comparing
    /// against every other stored idea.
    pub async fn check_revision(&self, idea_id: Uuid, title: &str, description: &str) -> Result<(), Rejection> {
        check_presence(title, description)?;
        let snapshot = self.store.list_all().await.map_err(persistence)?;
        self.evaluate_against(title, description, snapshot.iter().filter(move |idea| idea.id != idea_id))
    }

    /// Apply gates 1-4 to a candidate against an explicit snapshot.
    pub fn evaluate(&self, title: &str, description: &str, snapshot: &[Idea]) -> Result<(), Rejection> {
        self.evaluate_against(title, description, snapshot.iter())
    }

    async fn admit(&self, title: &str, description: &str, owner_id: Uuid) -> Result<Idea, Rejection> {
        check_presence(title, description)?;

        let snapshot = self.store.list_all().await.map_err(persistence)?;
        self.evaluate(title, description, &snapshot)?;

        self.store
            .insert(title, description, owner_id)
            .await
            .map_err(persistence)
    }

    fn evaluate_against<'a, I>(&self, title: &str, description: &str, existing: I) -> Result<(), Rejection>
    where
        I: Iterator<Item = &'a Idea> + Clone,
    {
        check_presence(title, description)?;

        if let Some(field) = find_exact_duplicate(title, description, existing.clone()) {
            return Err(Rejection::Uniqueness { field });
        }

        let started = Instant::now();
        let conflict = self.guard.find_conflict(title, description, existing.clone());
        metrics::record_guard_scan(started.elapsed().as_secs_f64(), existing.count());

        match conflict {
            Some(conflict) => Err(Rejection::Similarity {
                field: conflict.field(),
                conflicting_idea_id: conflict.idea_id(),
            }),
            None => Ok(()),
        }
    }
}

fn check_presence(title: &str, description: &str) -> Result<(), Rejection> {
    if title.is_empty() {
        return Err(Rejection::Validation { field: IdeaField::Title });
    }
    if description.is_empty() {
        return Err(Rejection::Validation { field: IdeaField::Description });
    }
    Ok(())
}

fn persistence(err: AppError) -> Rejection {
    Rejection::Persistence {
        message: err.to_string(),
    }
}
