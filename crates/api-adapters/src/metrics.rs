//! # Metrics
//!
//! A single Prometheus counter family, `inkwell_actions_total{action}`,
//! incremented by the handlers after an operation succeeds.

use std::sync::Arc;

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

/// Engagement actions the API counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    CreatePost,
    EditPost,
    Like,
    Bookmark,
    Repost,
    Share,
    View,
    Comment,
    DeleteComment,
    React,
    Follow,
    Archive,
    Restore,
    Verify,
    Newsletter,
    Report,
    ResolveReport,
    DismissReport,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::CreatePost => "create_post",
            Action::EditPost => "edit_post",
            Action::Like => "like",
            Action::Bookmark => "bookmark",
            Action::Repost => "repost",
            Action::Share => "share",
            Action::View => "view",
            Action::Comment => "comment",
            Action::DeleteComment => "delete_comment",
            Action::React => "react",
            Action::Follow => "follow",
            Action::Archive => "archive",
            Action::Restore => "restore",
            Action::Verify => "verify",
            Action::Newsletter => "newsletter",
            Action::Report => "report",
            Action::ResolveReport => "resolve_report",
            Action::DismissReport => "dismiss_report",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, EncodeLabelSet)]
struct ActionLabels {
    action: String,
}

/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    actions: Family<ActionLabels, Counter>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();
        let actions = Family::<ActionLabels, Counter>::default();
        registry.register(
            "inkwell_actions",
            "Engagement actions completed",
            actions.clone(),
        );
        Self {
            registry: Arc::new(registry),
            actions,
        }
    }

    pub fn record(&self, action: Action) {
        self.actions
            .get_or_create(&ActionLabels {
                action: action.as_str().to_string(),
            })
            .inc();
    }

    /// Current value for one action.
    pub fn count(&self, action: Action) -> u64 {
        self.actions
            .get_or_create(&ActionLabels {
                action: action.as_str().to_string(),
            })
            .get()
    }

    /// Prometheus text exposition format.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        encode(&mut out, &self.registry)?;
        Ok(out)
    }
}
