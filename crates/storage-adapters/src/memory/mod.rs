//! # In-memory keyed tables
//!
//! Every entity lives in a `DashMap` keyed by its id. An operation is a single
//! read-modify-write performed while holding the entry's shard lock, which
//! makes it serializable per entity without any global lock.
//!
//! ## Lock order
//!
//! Some units span two tables. They always acquire in this order and never
//! re-enter a table they already hold:
//!
//! - comment thread (per post) → post record
//! - follow edge → adjacency lists
//! - user profile → handle index
//! - open-report index → report

mod audit;
mod comments;
mod follows;
mod notifications;
mod posts;
mod reports;
mod users;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use domains::{
    AuditLogEntry, Comment, FollowEdge, Notification, Post, Report, UserId, UserProfile,
};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// A post plus the per-viewer bookkeeping the view window needs.
#[derive(Debug, Clone)]
struct PostRecord {
    post: Post,
    last_viewed: HashMap<UserId, DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
struct Adjacency {
    followers: Vec<UserId>,
    following: Vec<UserId>,
}

/// One store implementing every repository port.
///
/// Wrap it in an `Arc` and hand clones to each service as the port it needs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    posts: DashMap<Uuid, PostRecord>,
    /// Post id → comments in insertion order.
    threads: DashMap<Uuid, Vec<Comment>>,
    /// Comment id → post id.
    comment_index: DashMap<Uuid, Uuid>,
    edges: DashMap<(UserId, UserId), FollowEdge>,
    adjacency: DashMap<UserId, Adjacency>,
    /// Recipient → notifications, oldest first.
    notifications: DashMap<UserId, Vec<Notification>>,
    audit: RwLock<Vec<AuditLogEntry>>,
    users: DashMap<UserId, UserProfile>,
    /// Handle → owning user.
    handles: DashMap<String, UserId>,
    reports: DashMap<Uuid, Report>,
    /// (post, reporter) → the reporter's open report on that post.
    open_reports: DashMap<(Uuid, UserId), Uuid>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires a read lock on the audit log, recovering from poison if necessary.
    fn audit_read(&self) -> RwLockReadGuard<'_, Vec<AuditLogEntry>> {
        self.audit.read().unwrap_or_else(|poisoned| {
            tracing::error!("audit log lock was poisoned on read, recovering");
            poisoned.into_inner()
        })
    }

    /// Acquires a write lock on the audit log, recovering from poison if necessary.
    fn audit_write(&self) -> RwLockWriteGuard<'_, Vec<AuditLogEntry>> {
        self.audit.write().unwrap_or_else(|poisoned| {
            tracing::error!("audit log lock was poisoned on write, recovering");
            poisoned.into_inner()
        })
    }
}
