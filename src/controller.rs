//! Chat command handling, independent of any chat transport.
//!
//! The [`Controller`] receives the four inbound events the bot knows about
//! (start, category selection, back-to-menu, free text) and answers each
//! with a [`Reply`]: plain or HTML text plus an optional keyboard. Every
//! event passes the [`AccessGuard`] first. No error leaves this module;
//! every failure becomes a user-facing message.

use std::sync::Arc;
use std::time::Instant;

use crate::access::{AccessGuard, Gated};
use crate::config::Config;
use crate::fetcher::{fetch_category, PageSource, Pagination};
use crate::index::InstructionIndex;
use crate::models::UserId;
use crate::render::{compose_results, RenderOutcome};
use crate::session::SessionStore;

/// A single outbound text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub text: String,
    /// Send with HTML parse mode.
    pub html: bool,
}

impl OutgoingMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: false,
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: true,
        }
    }
}

/// Keyboard attached to the last message of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Inline buttons, one per category label.
    Categories(Vec<String>),
    /// A reply keyboard with a single back-to-menu button.
    BackToMenu(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reply {
    pub messages: Vec<OutgoingMessage>,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            messages: vec![OutgoingMessage::plain(text)],
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    /// Concatenated message texts, for logging and tests.
    pub fn joined(&self) -> String {
        self.messages
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct Controller {
    config: Arc<Config>,
    guard: AccessGuard,
    sessions: SessionStore,
    source: Arc<dyn PageSource>,
    paging: Pagination,
}

impl Controller {
    pub fn new(config: Arc<Config>, source: Arc<dyn PageSource>) -> Self {
        let guard = AccessGuard::new(config.allowed_users(), config.messages.access_denied.clone());
        let paging = Pagination::from_config(&config.repository);
        Self {
            config,
            guard,
            sessions: SessionStore::new(),
            source,
            paging,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// `/start`: show the category menu.
    pub async fn start(&self, user: UserId) -> Reply {
        self.gated(user, || async {
            tracing::info!(user = %user, "start");
            self.sessions.touch(user).await;
            self.menu()
        })
        .await
    }

    /// A category button was pressed: load its folders into the session.
    pub async fn select_category(&self, user: UserId, label: &str) -> Reply {
        self.gated(user, || async { self.load_category(user, label).await })
            .await
    }

    /// Free text: either the back-to-menu trigger or a search term.
    pub async fn text(&self, user: UserId, text: &str) -> Reply {
        if text == self.config.messages.back_to_menu {
            return self.start(user).await;
        }
        self.gated(user, || async { self.search(user, text.trim()).await })
            .await
    }

    async fn gated<F, Fut>(&self, user: UserId, op: F) -> Reply
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Reply>,
    {
        match self.guard.run(user, op).await {
            Gated::Allowed(reply) => reply,
            Gated::Denied(notice) => Reply::text(notice),
        }
    }

    fn menu(&self) -> Reply {
        let labels = self
            .config
            .categories
            .iter()
            .map(|c| c.label.clone())
            .collect();
        Reply::text(self.config.messages.choose_category.clone())
            .with_keyboard(Keyboard::Categories(labels))
    }

    async fn load_category(&self, user: UserId, label: &str) -> Reply {
        let messages = &self.config.messages;
        let Some(category) = self.config.category(label) else {
            tracing::warn!(user = %user, category = label, "unknown category");
            return Reply::text(messages.category_not_found.clone());
        };

        let started = Instant::now();
        let outcome =
            fetch_category(self.source.as_ref(), &category.folder_ids, &self.paging).await;
        tracing::info!(
            user = %user,
            category = label,
            items = outcome.items.len(),
            complete = outcome.complete,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "category loaded"
        );

        self.sessions
            .replace_index(
                user,
                InstructionIndex::new(label, outcome.items, outcome.complete),
            )
            .await;

        Reply::text(messages.category_selected.replace("{category}", label))
            .with_keyboard(Keyboard::BackToMenu(messages.back_to_menu.clone()))
    }

    async fn search(&self, user: UserId, term: &str) -> Reply {
        let messages = &self.config.messages;
        let links = self
            .sessions
            .with_index(user, |index| {
                if index.is_empty() {
                    return None;
                }
                if !index.is_complete() {
                    tracing::debug!(
                        user = %user,
                        category = index.category(),
                        "searching an index with missing pages"
                    );
                }
                Some(index.search(term))
            })
            .await
            .flatten();

        let Some(links) = links else {
            return Reply::text(messages.data_not_loaded.clone());
        };

        match compose_results(&links, &messages.multiple_found, &self.config.render) {
            RenderOutcome::Empty => Reply::text(messages.not_found.replace("{term}", term)),
            RenderOutcome::Messages(texts) => Reply {
                messages: texts.into_iter().map(OutgoingMessage::html).collect(),
                keyboard: None,
            },
            RenderOutcome::TooMany => {
                tracing::warn!(user = %user, term, hits = links.len(), "too many results to send");
                Reply::text(messages.too_many.clone())
            }
        }
    }
}
