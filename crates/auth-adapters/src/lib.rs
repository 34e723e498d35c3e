//! # auth-adapters
//!
//! Implementations of the [`Authorizer`] port. Identity is verified upstream;
//! these adapters only answer role questions about an already-trusted id.

#[cfg(feature = "static-roles")]
mod static_roles;

#[cfg(feature = "static-roles")]
pub use static_roles::StaticRoleAuthorizer;

pub use domains::Authorizer;
