//! Per-user session state.
//!
//! Each user has their own slot holding the [`InstructionIndex`] for the
//! category they last picked. Selecting a category replaces the slot
//! wholesale; idle sessions are evicted by a periodic sweep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::index::InstructionIndex;
use crate::models::UserId;

pub struct Session {
    pub index: Option<InstructionIndex>,
    pub last_active: Instant,
}

impl Session {
    fn new(now: Instant) -> Self {
        Self {
            index: None,
            last_active: now,
        }
    }
}

/// Thread-safe session store.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<UserId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record activity, creating the session on first contact.
    pub async fn touch(&self, user: UserId) {
        let now = Instant::now();
        let mut map = self.sessions.write().await;
        map.entry(user)
            .or_insert_with(|| Session::new(now))
            .last_active = now;
    }

    /// Replace the user's loaded index. Never merges with the previous one.
    pub async fn replace_index(&self, user: UserId, index: InstructionIndex) {
        let now = Instant::now();
        let mut map = self.sessions.write().await;
        let session = map.entry(user).or_insert_with(|| Session::new(now));
        session.index = Some(index);
        session.last_active = now;
    }

    /// Run `f` against the user's loaded index, if any.
    ///
    /// `f` runs under the shared read lock so searches by different users
    /// proceed concurrently; activity is recorded afterwards.
    pub async fn with_index<R>(
        &self,
        user: UserId,
        f: impl FnOnce(&InstructionIndex) -> R,
    ) -> Option<R> {
        let result = {
            let map = self.sessions.read().await;
            let session = map.get(&user)?;
            session.index.as_ref().map(f)
        };
        self.mark_active(user).await;
        result
    }

    /// Refresh `last_active` for an existing session.
    async fn mark_active(&self, user: UserId) {
        let mut map = self.sessions.write().await;
        if let Some(session) = map.get_mut(&user) {
            session.last_active = Instant::now();
        }
    }

    /// Drop sessions idle for longer than `max_idle`. Returns how many went.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut map = self.sessions.write().await;
        let before = map.len();
        map.retain(|user, session| {
            let stale = now.duration_since(session.last_active) > max_idle;
            if stale {
                tracing::info!(user = %user, "evicting idle session");
            }
            !stale
        });
        before - map.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Periodically evict idle sessions until the process exits.
    pub fn spawn_sweeper(&self, interval: Duration, max_idle: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let evicted = store.evict_idle(max_idle).await;
                let count = store.len().await;
                tracing::debug!(evicted, sessions = count, "session sweep");
            }
        })
    }
}
