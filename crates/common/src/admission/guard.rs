//! Exact and near-duplicate detection against a snapshot of stored ideas

use super::{IdeaField, SIMILARITY_THRESHOLD};
use crate::db::models::Idea;
use crate::similarity::similarity;
use uuid::Uuid;

/// A stored idea the candidate collides with
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conflict<'a> {
    Title(&'a Idea),
    Description(&'a Idea),
}

impl<'a> Conflict<'a> {
    pub fn field(&self) -> IdeaField {
        match self {
            Conflict::Title(_) => IdeaField::Title,
            Conflict::Description(_) => IdeaField::Description,
        }
    }

    pub fn idea(&self) -> &'a Idea {
        match self {
            Conflict::Title(idea) | Conflict::Description(idea) => idea,
        }
    }

    pub fn idea_id(&self) -> Uuid {
        self.idea().id
    }
}

/// Stateless near-duplicate detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuplicateGuard {
    threshold: f64,
}

impl Default for DuplicateGuard {
    fn default() -> Self {
        Self::new(SIMILARITY_THRESHOLD)
    }
}

impl DuplicateGuard {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Return the first stored idea whose title or description scores strictly
    /// above the threshold against the candidate.
    ///
    /// Ideas are visited in iteration order, regardless of status. For each
    /// idea the title is compared before the description.
    pub fn find_conflict<'a, I>(&self, title: &str, description: &str, existing: I) -> Option<Conflict<'a>>
    where
        I: IntoIterator<Item = &'a Idea>,
    {
        for idea in existing {
            if similarity(title, &idea.title) > self.threshold {
                return Some(Conflict::Title(idea));
            }
            if similarity(description, &idea.description) > self.threshold {
                return Some(Conflict::Description(idea));
            }
        }
        None
    }
}

/// Exact case-insensitive match of the title against every stored title, then
/// of the description against every stored description.
pub fn find_exact_duplicate<'a, I>(title: &str, description: &str, existing: I) -> Option<IdeaField>
where
    I: IntoIterator<Item = &'a Idea>,
    I::IntoIter: Clone,
{
    let mut existing = existing.into_iter();
    let title = title.to_lowercase();
    let description = description.to_lowercase();

    if existing.clone().any(|idea| idea.title.to_lowercase() == title) {
        return Some(IdeaField::Title);
    }
    if existing.any(|idea| idea.description.to_lowercase() == description) {
        return Some(IdeaField::Description);
    }
    None
}
