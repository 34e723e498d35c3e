use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Open,
    /// Closed by archiving the reported post.
    Resolved,
    /// Closed without action.
    Dismissed,
}

/// A reader's complaint about a post, waiting in the moderation queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub post_id: Uuid,
    pub reporter_id: UserId,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    pub handled_by: Option<UserId>,
    pub handled_at: Option<DateTime<Utc>>,
}

impl Report {
    pub fn new(post_id: Uuid, reporter_id: UserId, reason: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            post_id,
            reporter_id,
            reason,
            status: ReportStatus::Open,
            created_at: now,
            handled_by: None,
            handled_at: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == ReportStatus::Open
    }

    /// Moves an open report to `status`. Returns false when it was already closed.
    pub fn close(&mut self, status: ReportStatus, actor: &UserId, now: DateTime<Utc>) -> bool {
        if !self.is_open() || status == ReportStatus::Open {
            return false;
        }
        self.status = status;
        self.handled_by = Some(actor.clone());
        self.handled_at = Some(now);
        true
    }

    pub fn reopen(&mut self) {
        self.status = ReportStatus::Open;
        self.handled_by = None;
        self.handled_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_report_closes_once() {
        let mut report = Report::new(Uuid::now_v7(), "reader".into(), "spam".into(), Utc::now());
        assert!(report.is_open());
        assert!(!report.close(ReportStatus::Open, &"admin".into(), Utc::now()));
        assert!(report.close(ReportStatus::Dismissed, &"admin".into(), Utc::now()));
        assert!(!report.close(ReportStatus::Resolved, &"admin".into(), Utc::now()));
        assert_eq!(report.status, ReportStatus::Dismissed);
        assert_eq!(report.handled_by, Some("admin".into()));

        report.reopen();
        assert!(report.is_open() && report.handled_at.is_none());
    }
}
