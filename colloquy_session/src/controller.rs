//! Entry point that wires the catalog, the active session and the two
//! optimistic protocols to one remote service.

use colloquy_core::{Conversation, ConversationApi, ConversationId, ConversationSummary};
use tracing::{debug, info, warn};

use crate::active::ActiveSession;
use crate::catalog::ConversationCatalog;
use crate::error::SessionError;
use crate::lanes::RequestLanes;
use crate::lifecycle::{EndOutcome, LifecycleTransitionProtocol};
use crate::query::{QueryHistory, run_query};
use crate::send::{OptimisticMessageProtocol, SendOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The conversation is now active.
    Loaded,
    /// A later selection, or a newer send or end on the same conversation,
    /// won; this result was dropped.
    Superseded,
}

/// Owns the session stores for the lifetime of a client.
///
/// All state-changing interaction goes through here. The stores are plain
/// values, so tests can drive a controller against a fake service.
pub struct SessionController<A> {
    api: A,
    catalog: ConversationCatalog,
    session: ActiveSession,
    lanes: RequestLanes,
}

impl<A> SessionController<A>
where
    A: ConversationApi,
{
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            catalog: ConversationCatalog::new(),
            session: ActiveSession::new(),
            lanes: RequestLanes::new(),
        }
    }

    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub const fn catalog(&self) -> &ConversationCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn session(&self) -> &ActiveSession {
        &self.session
    }

    /// Refresh the catalog. On the first successful refresh, with nothing
    /// active yet, the most recent conversation is selected.
    pub async fn refresh(&self) -> Result<Vec<ConversationSummary>, SessionError> {
        let listing = self.catalog.list(&self.api).await?;

        if listing.first_load && self.session.active_id().is_none() {
            if let Some(latest) = listing.entries.first() {
                info!("Auto-selecting most recent conversation {}", latest.id);
                self.select(latest.id).await?;
            }
        }

        Ok(listing.entries)
    }

    /// Create a conversation and make it active.
    pub async fn create_conversation(&self, title: &str) -> Result<Conversation, SessionError> {
        let conversation = self.catalog.create(&self.api, title).await?;
        self.session.supersede_loads();
        self.session.replace(conversation.clone());
        Ok(conversation)
    }

    /// Load `id` from the server and make it active.
    ///
    /// On failure the previously active conversation is kept.
    pub async fn select(&self, id: ConversationId) -> Result<SelectOutcome, SessionError> {
        let ticket = self.session.begin_load(id);

        match self.api.get_conversation(id).await {
            Ok(conversation) => {
                let entry = conversation.summary_entry();
                if self.session.install(&ticket, conversation) {
                    self.catalog.reconcile(&entry);
                    info!("Conversation {id} is now active");
                    Ok(SelectOutcome::Loaded)
                } else {
                    debug!("Load of conversation {id} superseded by a later selection or write");
                    Ok(SelectOutcome::Superseded)
                }
            }
            Err(e) if !ticket.is_current() => {
                debug!("Superseded load of conversation {id} failed: {e}");
                Ok(SelectOutcome::Superseded)
            }
            Err(e) => {
                warn!("Loading conversation {id} failed: {e}");
                Err(SessionError::Load { id, source: e })
            }
        }
    }

    /// Send `content` to the active conversation.
    pub async fn send_message(&self, content: &str) -> Result<SendOutcome, SessionError> {
        OptimisticMessageProtocol {
            api: &self.api,
            session: &self.session,
            catalog: &self.catalog,
            lanes: &self.lanes,
        }
        .send(content)
        .await
    }

    /// End the active conversation once `confirm` agrees.
    pub async fn end_conversation<F>(&self, confirm: F) -> Result<EndOutcome, SessionError>
    where
        F: FnOnce(&Conversation) -> bool,
    {
        LifecycleTransitionProtocol {
            api: &self.api,
            session: &self.session,
            catalog: &self.catalog,
            lanes: &self.lanes,
        }
        .end(confirm)
        .await
    }

    pub async fn query(
        &self,
        history: &mut QueryHistory,
        query: &str,
    ) -> Result<Option<String>, SessionError> {
        run_query(&self.api, history, query).await
    }
}
