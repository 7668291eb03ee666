//! The single fully loaded conversation currently shown in detail.
//!
//! State is published through a `watch` channel so that observers always
//! see a well-defined value while requests are suspended in flight. Only the
//! protocols in this crate write to it.

use colloquy_core::{Conversation, ConversationId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::warn;

/// Snapshot of the active session.
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    conversation: Option<Conversation>,
    pending_loads: usize,
    sends: HashMap<ConversationId, usize>,
    summarizing: HashSet<ConversationId>,
    /// Epoch of the last protocol write per conversation.
    written: HashMap<ConversationId, u64>,
}

impl SessionView {
    #[must_use]
    pub const fn conversation(&self) -> Option<&Conversation> {
        self.conversation.as_ref()
    }

    #[must_use]
    pub fn active_id(&self) -> Option<ConversationId> {
        self.conversation.as_ref().map(|c| c.id)
    }

    /// True while at least one `select` is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.pending_loads > 0
    }

    /// True while a send targets the active conversation.
    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.active_id()
            .is_some_and(|id| self.sends.contains_key(&id))
    }

    /// True while the active conversation waits for its end response.
    #[must_use]
    pub fn is_generating_summary(&self) -> bool {
        self.active_id()
            .is_some_and(|id| self.summarizing.contains(&id))
    }
}

#[derive(Debug, Clone, Copy)]
enum Flag {
    Sending(ConversationId),
    Summarizing(ConversationId),
}

/// Clears its flag when dropped, whichever way the owning protocol exits.
#[must_use]
pub(crate) struct FlagGuard<'a> {
    session: &'a ActiveSession,
    flag: Flag,
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        let flag = self.flag;
        self.session.state.send_modify(|view| match flag {
            Flag::Sending(id) => {
                if let Some(count) = view.sends.get_mut(&id) {
                    *count -= 1;
                    if *count == 0 {
                        view.sends.remove(&id);
                    }
                }
            }
            Flag::Summarizing(id) => {
                view.summarizing.remove(&id);
            }
        });
    }
}

/// Ticket for one `select`. Only the newest ticket may install its result,
/// and only if no protocol wrote its conversation after the ticket was issued.
///
/// Holding a ticket keeps the loading flag raised; dropping it lowers it.
#[must_use]
pub(crate) struct LoadTicket<'a> {
    session: &'a ActiveSession,
    number: u64,
    target: ConversationId,
    issued: u64,
}

impl LoadTicket<'_> {
    pub(crate) fn is_current(&self) -> bool {
        self.session.latest_load.load(Ordering::Acquire) == self.number
    }
}

impl Drop for LoadTicket<'_> {
    fn drop(&mut self) {
        self.session
            .state
            .send_modify(|view| view.pending_loads = view.pending_loads.saturating_sub(1));
    }
}

/// Holder of at most one conversation.
#[derive(Debug)]
pub struct ActiveSession {
    state: watch::Sender<SessionView>,
    latest_load: AtomicU64,
    epoch: AtomicU64,
}

impl Default for ActiveSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveSession {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionView::default());
        Self {
            state,
            latest_load: AtomicU64::new(0),
            epoch: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionView {
        self.state.borrow().clone()
    }

    /// Receive every state change from now on.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn active_id(&self) -> Option<ConversationId> {
        self.state.borrow().active_id()
    }

    /// Read the current view without cloning it.
    pub(crate) fn peek<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SessionView) -> R,
    {
        f(&self.state.borrow())
    }

    /// Whole-object replacement with an authoritative conversation.
    pub(crate) fn replace(&self, conversation: Conversation) {
        let conversation = authoritative(conversation);
        self.state
            .send_modify(|view| view.conversation = Some(conversation));
    }

    fn tick(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Replace the active conversation only if it is still `id`.
    pub(crate) fn replace_if_active(&self, id: ConversationId, conversation: Conversation) -> bool {
        let conversation = authoritative(conversation);
        self.state.send_if_modified(|view| {
            if view.active_id() != Some(id) {
                return false;
            }
            view.conversation = Some(conversation);
            view.written.insert(id, self.tick());
            true
        })
    }

    /// Replace the message list and title of the active conversation with
    /// the authoritative ones, only if it is still `id`. Status and summary
    /// stay local so a late send response cannot undo an end transition.
    pub(crate) fn replace_messages(&self, id: ConversationId, conversation: Conversation) -> bool {
        let incoming = authoritative(conversation);
        self.state.send_if_modified(|view| match view.conversation.as_mut() {
            Some(current) if current.id == id => {
                current.messages = incoming.messages;
                current.title = incoming.title;
                view.written.insert(id, self.tick());
                true
            }
            _ => false,
        })
    }

    /// Apply a local, non-authoritative change to the active conversation
    /// if it is still `id`. Fields `f` does not touch are kept.
    pub(crate) fn mutate<F, R>(&self, id: ConversationId, f: F) -> Option<R>
    where
        F: FnOnce(&mut Conversation) -> R,
    {
        let mut out = None;
        self.state.send_if_modified(|view| match view.conversation.as_mut() {
            Some(current) if current.id == id => {
                out = Some(f(current));
                view.written.insert(id, self.tick());
                true
            }
            _ => false,
        });
        out
    }

    pub(crate) fn begin_load(&self, target: ConversationId) -> LoadTicket<'_> {
        let number = self.latest_load.fetch_add(1, Ordering::AcqRel) + 1;
        let issued = self.tick();
        self.state.send_modify(|view| view.pending_loads += 1);
        LoadTicket {
            session: self,
            number,
            target,
            issued,
        }
    }

    /// Invalidate every outstanding load ticket.
    pub(crate) fn supersede_loads(&self) {
        self.latest_load.fetch_add(1, Ordering::AcqRel);
    }

    /// Install a loaded conversation if `ticket` is still the newest one and
    /// nothing newer was written to its conversation meanwhile.
    pub(crate) fn install(&self, ticket: &LoadTicket<'_>, conversation: Conversation) -> bool {
        let conversation = authoritative(conversation);
        self.state.send_if_modified(|view| {
            let overtaken = view
                .written
                .get(&ticket.target)
                .is_some_and(|&at| at > ticket.issued);
            if overtaken || !ticket.is_current() {
                return false;
            }
            view.conversation = Some(conversation);
            true
        })
    }

    pub(crate) fn begin_send(&self, id: ConversationId) -> FlagGuard<'_> {
        self.state
            .send_modify(|view| *view.sends.entry(id).or_insert(0) += 1);
        FlagGuard {
            session: self,
            flag: Flag::Sending(id),
        }
    }

    pub(crate) fn begin_summary(&self, id: ConversationId) -> FlagGuard<'_> {
        self.state.send_modify(|view| {
            view.summarizing.insert(id);
        });
        FlagGuard {
            session: self,
            flag: Flag::Summarizing(id),
        }
    }
}

fn authoritative(mut conversation: Conversation) -> Conversation {
    if let Err(e) = conversation.check_invariants() {
        warn!(
            "Conversation {} from server violates record invariants: {e}",
            conversation.id
        );
    }
    conversation.normalize();
    conversation
}
