use std::collections::HashSet;

use async_trait::async_trait;
use domains::{Authorizer, Result, UserId};
use tracing::debug;

/// Grants the admin role to a fixed set of user ids loaded from configuration.
///
/// # Developer Note
/// The set is read once at startup. Changing admins means restarting the
/// server with new settings; there is no runtime role management.
#[derive(Debug, Clone, Default)]
pub struct StaticRoleAuthorizer {
    admins: HashSet<UserId>,
}

impl StaticRoleAuthorizer {
    /// Blank ids are ignored; surrounding whitespace is trimmed.
    pub fn new<I, S>(admin_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let admins = admin_ids
            .into_iter()
            .map(|id| id.as_ref().trim().to_string())
            .filter(|id| !id.is_empty())
            .map(UserId::from)
            .collect();
        Self { admins }
    }

    pub fn admin_count(&self) -> usize {
        self.admins.len()
    }
}

#[async_trait]
impl Authorizer for StaticRoleAuthorizer {
    async fn is_admin(&self, actor: &UserId) -> Result<bool> {
        let granted = self.admins.contains(actor);
        debug!(%actor, granted, "admin role checked");
        Ok(granted)
    }
}
