use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Follow,
    Mention,
    Moderation,
    Newsletter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    /// `None` for system-originated notices.
    pub source_user_id: Option<UserId>,
    pub message: String,
    pub post_id: Option<Uuid>,
}

/// An entry in a recipient's append-only notification log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub payload: NotificationPayload,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
}

/// A notification that has not been delivered yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub recipient_id: UserId,
    pub kind: NotificationKind,
    pub payload: NotificationPayload,
}

impl NotificationDraft {
    pub fn into_notification(self, now: DateTime<Utc>) -> Notification {
        Notification {
            id: Uuid::now_v7(),
            recipient_id: self.recipient_id,
            kind: self.kind,
            payload: self.payload,
            created_at: now,
            is_read: false,
        }
    }
}

impl Notification {
    /// Returns `true` only when this call changed the flag.
    pub fn mark_read(&mut self) -> bool {
        !std::mem::replace(&mut self.is_read, true)
    }
}

/// A recipient's notifications with the unread count derived from the same items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
}

impl From<Vec<Notification>> for NotificationPage {
    fn from(notifications: Vec<Notification>) -> Self {
        let unread_count = notifications.iter().filter(|n| !n.is_read).count();
        Self {
            notifications,
            unread_count,
        }
    }
}
