use async_trait::async_trait;
use domains::{DomainError, Notification, NotificationRepository, Result, UserId};
use uuid::Uuid;

use super::MemoryStore;

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn append(&self, notification: Notification) -> Result<()> {
        self.notifications
            .entry(notification.recipient_id.clone())
            .or_default()
            .push(notification);
        Ok(())
    }

    async fn list_for(&self, recipient: &UserId) -> Result<Vec<Notification>> {
        Ok(self
            .notifications
            .get(recipient)
            .map(|log| log.iter().rev().cloned().collect())
            .unwrap_or_default())
    }

    async fn mark_read(&self, recipient: &UserId, id: Uuid) -> Result<Notification> {
        let mut log = self
            .notifications
            .get_mut(recipient)
            .ok_or_else(|| DomainError::not_found("Notification", id))?;
        let entry = log
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| DomainError::not_found("Notification", id))?;
        entry.mark_read();
        Ok(entry.clone())
    }

    async fn mark_all_read(&self, recipient: &UserId) -> Result<usize> {
        Ok(self
            .notifications
            .get_mut(recipient)
            .map(|mut log| log.iter_mut().map(|n| n.mark_read()).filter(|changed| *changed).count())
            .unwrap_or(0))
    }
}
