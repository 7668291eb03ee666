//! Ordered catalog of conversation summaries.
//!
//! Entries are not kept live automatically: the protocols reconcile the
//! entry of the active conversation whenever its title or status changes.

use chrono::{DateTime, Local};
use colloquy_core::{Conversation, ConversationApi, ConversationId, ConversationSummary};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::SessionError;

/// Result of a successful catalog refresh.
#[derive(Debug, Clone)]
pub struct Listing {
    pub entries: Vec<ConversationSummary>,
    /// True for the first refresh that ever succeeded.
    pub first_load: bool,
}

/// Published catalog contents.
#[derive(Debug, Clone, Default)]
pub struct CatalogView {
    entries: Vec<ConversationSummary>,
    /// Clock value of the last local write per conversation.
    written: HashMap<ConversationId, u64>,
}

impl CatalogView {
    /// Most recent first.
    #[must_use]
    pub fn entries(&self) -> &[ConversationSummary] {
        &self.entries
    }

    fn mark(&mut self, id: ConversationId, clock: &AtomicU64) {
        self.written
            .insert(id, clock.fetch_add(1, Ordering::AcqRel) + 1);
    }

    /// Adopt a listing fetched when the clock read `started`, keeping local
    /// writes made since then.
    fn adopt(&mut self, mut listing: Vec<ConversationSummary>, started: u64) {
        for local in &self.entries {
            if !self.written.get(&local.id).is_some_and(|&at| at > started) {
                continue;
            }
            match listing.iter_mut().find(|e| e.id == local.id) {
                Some(entry) => {
                    entry.title.clone_from(&local.title);
                    entry.status = local.status;
                }
                None => listing.push(local.clone()),
            }
        }
        listing.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        self.entries = listing;
    }
}

#[derive(Debug)]
pub struct ConversationCatalog {
    state: watch::Sender<CatalogView>,
    clock: AtomicU64,
    loaded: AtomicBool,
}

impl Default for ConversationCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationCatalog {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(CatalogView::default());
        Self {
            state,
            clock: AtomicU64::new(0),
            loaded: AtomicBool::new(false),
        }
    }

    /// Title used when the caller does not supply one.
    #[must_use]
    pub fn default_title(now: DateTime<Local>) -> String {
        format!("Chat {}", now.format("%Y-%m-%d %H:%M"))
    }

    /// Most recent first.
    #[must_use]
    pub fn entries(&self) -> Vec<ConversationSummary> {
        self.state.borrow().entries.clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CatalogView> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn get(&self, id: ConversationId) -> Option<ConversationSummary> {
        self.state.borrow().entries.iter().find(|e| e.id == id).cloned()
    }

    #[must_use]
    pub fn most_recent(&self) -> Option<ConversationSummary> {
        self.state.borrow().entries.first().cloned()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.borrow().entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    /// Replace the catalog with the server's list.
    ///
    /// Entries created or reconciled while the request was in flight keep
    /// their local title and status. On failure the last known entries are
    /// kept.
    pub async fn list<A>(&self, api: &A) -> Result<Listing, SessionError>
    where
        A: ConversationApi + ?Sized,
    {
        let started = self.clock.load(Ordering::Acquire);
        let listing = api.list_conversations().await.map_err(|e| {
            warn!("Listing conversations failed, keeping last known catalog: {e}");
            SessionError::Fetch(e)
        })?;

        self.state.send_modify(|view| view.adopt(listing, started));
        let entries = self.entries();
        info!("Catalog refreshed: {} conversations", entries.len());

        let first_load = !self.loaded.swap(true, Ordering::AcqRel);

        Ok(Listing {
            entries,
            first_load,
        })
    }

    /// Create a conversation and prepend it without re-fetching the list.
    ///
    /// A blank title is replaced by [`Self::default_title`].
    pub async fn create<A>(&self, api: &A, title: &str) -> Result<Conversation, SessionError>
    where
        A: ConversationApi + ?Sized,
    {
        let title = match title.trim() {
            "" => Self::default_title(Local::now()),
            trimmed => trimmed.to_string(),
        };

        let conversation = api
            .create_conversation(&title)
            .await
            .map_err(SessionError::Create)?;

        info!(
            "Created conversation {} ({:?})",
            conversation.id, conversation.title
        );

        let entry = conversation.summary_entry();
        self.state.send_modify(|view| {
            view.entries.retain(|e| e.id != entry.id);
            view.mark(entry.id, &self.clock);
            view.entries.insert(0, entry);
        });

        Ok(conversation)
    }

    /// Copy title and status from `summary` into the matching entry.
    ///
    /// Returns false if the catalog does not know the id or nothing changed.
    pub fn reconcile(&self, summary: &ConversationSummary) -> bool {
        self.state.send_if_modified(|view| {
            let Some(entry) = view.entries.iter_mut().find(|e| e.id == summary.id) else {
                return false;
            };
            let changed = entry.title != summary.title || entry.status != summary.status;
            entry.title.clone_from(&summary.title);
            entry.status = summary.status;
            view.mark(summary.id, &self.clock);
            changed
        })
    }
}
