use async_trait::async_trait;
use domains::{AuditLogEntry, AuditLogRepository, Result};

use super::MemoryStore;

#[async_trait]
impl AuditLogRepository for MemoryStore {
    async fn append(&self, entry: AuditLogEntry) -> Result<()> {
        self.audit_write().push(entry);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<AuditLogEntry>> {
        Ok(self.audit_read().iter().rev().cloned().collect())
    }
}
