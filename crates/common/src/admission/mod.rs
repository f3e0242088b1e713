//! Idea admission
//!
//! Every new idea passes through a fixed sequence of gates before it is
//! stored:
//! 1. title and description are present
//! 2. no stored idea has the same title, ignoring case
//! 3. no stored idea has the same description, ignoring case
//! 4. no stored idea is a near-duplicate by title or description
//!    ([`DuplicateGuard`], Jaccard similarity strictly above the threshold)
//!
//! The checks read a snapshot of all stored ideas and then insert, with no
//! lock held in between. Two concurrent submissions that resemble each other
//! can therefore both be admitted; the store is the only serialization point
//! and it enforces no content constraints.

mod guard;
mod pipeline;
mod store;

pub use guard::{find_exact_duplicate, Conflict, DuplicateGuard};
pub use pipeline::AdmissionPipeline;
pub use store::{IdeaStore, MemoryIdeaStore};

use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Similarity above which a candidate counts as a near-duplicate.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

/// The idea field a rejection refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdeaField {
    Title,
    Description,
}

impl IdeaField {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdeaField::Title => "title",
            IdeaField::Description => "description",
        }
    }
}

impl fmt::Display for IdeaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a submission was not admitted
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("Title and description are required")]
    Validation { field: IdeaField },

    #[error("An idea with this {field} already exists in the system")]
    Uniqueness { field: IdeaField },

    #[error("An idea with a very similar {field} already exists in the system")]
    Similarity {
        field: IdeaField,
        conflicting_idea_id: Uuid,
    },

    #[error("Failed to store idea: {message}")]
    Persistence { message: String },
}

impl Rejection {
    /// Short label used for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::Validation { .. } => "validation",
            Rejection::Uniqueness { .. } => "uniqueness",
            Rejection::Similarity { .. } => "similarity",
            Rejection::Persistence { .. } => "persistence",
        }
    }
}

impl From<Rejection> for AppError {
    fn from(rejection: Rejection) -> Self {
        let message = rejection.to_string();
        match rejection {
            Rejection::Validation { field } => AppError::Validation {
                message,
                field: Some(field.to_string()),
            },
            Rejection::Uniqueness { field } => AppError::Duplicate {
                message,
                field: Some(field.to_string()),
            },
            Rejection::Similarity {
                field,
                conflicting_idea_id,
            } => AppError::SimilarIdea {
                field: field.to_string(),
                conflicting_idea_id,
            },
            Rejection::Persistence { message } => AppError::Persistence { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use axum::http::StatusCode;

    #[test]
    fn test_rejection_messages() {
        assert_eq!(
            Rejection::Uniqueness { field: IdeaField::Title }.to_string(),
            "An idea with this title already exists in the system"
        );
        assert_eq!(
            Rejection::Similarity {
                field: IdeaField::Description,
                conflicting_idea_id: Uuid::nil(),
            }
            .to_string(),
            "An idea with a very similar description already exists in the system"
        );
    }

    #[test]
    fn test_rejection_to_app_error() {
        let err: AppError = Rejection::Validation { field: IdeaField::Description }.into();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: AppError = Rejection::Uniqueness { field: IdeaField::Title }.into();
        assert_eq!(err.code(), ErrorCode::DuplicateIdea);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let id = Uuid::new_v4();
        let err: AppError = Rejection::Similarity {
            field: IdeaField::Title,
            conflicting_idea_id: id,
        }
        .into();
        assert_eq!(err.code(), ErrorCode::SimilarIdea);
        assert_eq!(
            err.details(),
            Some(serde_json::json!({ "field": "title", "conflicting_idea_id": id }))
        );

        let err: AppError = Rejection::Persistence { message: "gone".into() }.into();
        assert_eq!(err.code(), ErrorCode::PersistenceError);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
