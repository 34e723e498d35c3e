//! # DomainError
//!
//! Centralized error handling for the Inkwell engine.
//! Every port and service returns these typed failures; an operation that
//! fails has not changed any state.

use thiserror::Error;

/// The primary error type for all engine operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Resource not found (e.g., Post, Comment, User, Notification)
    #[error("{entity} not found with ID {id}")]
    NotFound { entity: &'static str, id: String },

    /// Reply targeting a missing or deleted top-level comment, or a reply-of-a-reply
    #[error("invalid parent comment: {0}")]
    InvalidParent(String),

    #[error("users cannot follow themselves")]
    SelfFollow,

    /// Archive requested without a moderation reason
    #[error("a reason is required to archive a post")]
    ReasonRequired,

    /// Caller is neither the owner nor an admin for a gated mutation
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Lost a race or collided with an existing resource (e.g., handle taken)
    #[error("conflict: {0}")]
    Conflict(String),

    /// Input failed validation (e.g., empty comment body)
    #[error("validation error: {0}")]
    Validation(String),

    /// Infrastructure failure inside an adapter
    #[error("internal service error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Short machine-readable kind, used by the API layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidParent(_) => "invalid_parent",
            Self::SelfFollow => "self_follow",
            Self::ReasonRequired => "reason_required",
            Self::Unauthorized(_) => "unauthorized",
            Self::Conflict(_) => "conflict",
            Self::Validation(_) => "validation",
            Self::Internal(_) => "internal",
        }
    }
}

/// A specialized Result type for engine logic.
pub type Result<T> = std::result::Result<T, DomainError>;
