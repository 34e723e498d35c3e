use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuditAction {
    ArchivePost,
    RestorePost,
    VerifyUser,
    UnverifyUser,
    DismissReport,
}

/// The entity an audit entry refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum EntityRef {
    Post(Uuid),
    User(UserId),
    Report(Uuid),
}

/// Append-only record of a moderation action. Never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub actor_id: UserId,
    pub action: AuditAction,
    pub entity: EntityRef,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditLogEntry {
    pub fn new(
        actor_id: UserId,
        action: AuditAction,
        entity: EntityRef,
        detail: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            actor_id,
            action,
            entity,
            detail,
            created_at: now,
        }
    }
}
