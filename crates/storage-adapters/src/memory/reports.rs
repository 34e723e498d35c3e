use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use domains::{DomainError, Report, ReportRepository, ReportStatus, Result, UserId};
use uuid::Uuid;

use super::MemoryStore;

#[async_trait]
impl ReportRepository for MemoryStore {
    async fn file(&self, report: Report) -> Result<()> {
        // The index entry stays locked until the report itself is stored.
        match self
            .open_reports
            .entry((report.post_id, report.reporter_id.clone()))
        {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "{} already reported post {}",
                report.reporter_id, report.post_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(report.id);
                self.reports.insert(report.id, report);
                Ok(())
            }
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Report>> {
        Ok(self.reports.get(&id).map(|r| r.clone()))
    }

    async fn list(&self) -> Result<Vec<Report>> {
        let mut reports: Vec<Report> = self.reports.iter().map(|r| r.clone()).collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reports)
    }

    async fn close(
        &self,
        id: Uuid,
        status: ReportStatus,
        actor: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Report> {
        let closed = {
            let mut report = self
                .reports
                .get_mut(&id)
                .ok_or_else(|| DomainError::not_found("Report", id))?;
            if !report.close(status, actor, now) {
                return Err(DomainError::Conflict(format!("report {id} is already closed")));
            }
            report.clone()
        };
        // The report guard is gone before the index is locked.
        self.open_reports
            .remove_if(&(closed.post_id, closed.reporter_id.clone()), |_, open| *open == id);
        Ok(closed)
    }

    async fn reopen(&self, id: Uuid) -> Result<Report> {
        let report = self
            .reports
            .get(&id)
            .map(|r| r.clone())
            .ok_or_else(|| DomainError::not_found("Report", id))?;
        match self
            .open_reports
            .entry((report.post_id, report.reporter_id.clone()))
        {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "{} has a newer open report on post {}",
                report.reporter_id, report.post_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(id);
                let mut stored = self
                    .reports
                    .get_mut(&id)
                    .ok_or_else(|| DomainError::not_found("Report", id))?;
                stored.reopen();
                Ok(stored.clone())
            }
        }
    }
}
