//! # Domain Models
//!
//! These structs represent the core entities of the engagement engine.
//! We use UUID v7 for time-ordered, globally unique identification of
//! everything the engine creates. Users are the exception: their ids come
//! from the external identity provider and are kept opaque.

mod audit;
mod comment;
mod notification;
mod post;
mod report;
mod social;

pub use audit::*;
pub use comment::*;
pub use notification::*;
pub use post::*;
pub use report::*;
pub use social::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a user as issued by the external identity provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
