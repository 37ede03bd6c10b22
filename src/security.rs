//! # Session gating
//!
//! Routes declared `secured` are only dispatched when the request carries a
//! valid session. What "valid" means is decided by a [`SessionValidator`],
//! injected into the dispatcher. The default, [`RequireSessionId`], accepts
//! any session that has a non-empty id, which is what a servlet container's
//! `getSession(false)` check amounts to.
//!
//! ```rust
//! use routegate::router::Route;
//! use routegate::security::{Session, SessionValidator};
//!
//! struct AdminOnly;
//!
//! impl SessionValidator for AdminOnly {
//!     fn validate(&self, _route: &Route, session: Option<&Session>) -> bool {
//!         session.and_then(|s| s.attribute("role")) == Some("admin")
//!     }
//! }
//! ```

use crate::router::Route;
use std::collections::HashMap;

/// Session identity resolved by the host for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    id: Option<String>,
    attributes: HashMap<String, String>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            attributes: HashMap::new(),
        }
    }

    /// A session object without an id (created but never established).
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Decides whether a request may reach a secured route.
pub trait SessionValidator: Send + Sync {
    fn validate(&self, route: &Route, session: Option<&Session>) -> bool;
}

/// Accepts any session with a non-empty id.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireSessionId;

impl SessionValidator for RequireSessionId {
    fn validate(&self, _route: &Route, session: Option<&Session>) -> bool {
        session
            .and_then(Session::id)
            .is_some_and(|id| !id.trim().is_empty())
    }
}
