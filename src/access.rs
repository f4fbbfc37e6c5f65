//! Access control for every user-facing handler.
//!
//! [`AccessGuard`] holds the fixed set of authorized identities and is
//! injected into the controller instead of being read from a global. Each
//! handler calls it first; a denied caller gets the rejection notice and
//! the gated operation never runs.

use std::collections::HashSet;
use std::future::Future;

use crate::models::UserId;

/// Result of gating an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gated<T> {
    /// The caller is authorized and the operation ran.
    Allowed(T),
    /// The caller is not authorized; carries the fixed rejection notice.
    Denied(String),
}

#[derive(Debug, Clone)]
pub struct AccessGuard {
    allowed: HashSet<UserId>,
    denial: String,
}

impl AccessGuard {
    pub fn new(allowed: impl IntoIterator<Item = UserId>, denial: impl Into<String>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
            denial: denial.into(),
        }
    }

    pub fn is_allowed(&self, user: UserId) -> bool {
        self.allowed.contains(&user)
    }

    /// The notice shown to rejected callers.
    pub fn denial(&self) -> &str {
        &self.denial
    }

    /// Runs `op` only if `user` is authorized.
    pub async fn run<T, F, Fut>(&self, user: UserId, op: F) -> Gated<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        if !self.is_allowed(user) {
            tracing::warn!(user = %user, "access denied");
            return Gated::Denied(self.denial.clone());
        }
        Gated::Allowed(op().await)
    }
}
