//! Optimistic message sending.
//!
//! A send appends a provisional user message right away, asks the server to
//! store it, then either adopts the server's message list wholesale or
//! removes exactly the provisional entry it added.

use colloquy_core::{ConversationApi, ConversationId, Message, MessageId};
use tracing::{debug, info, warn};

use crate::active::ActiveSession;
use crate::catalog::ConversationCatalog;
use crate::error::SessionError;
use crate::lanes::RequestLanes;

/// State of a single send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPhase {
    Idle,
    Sending,
    Confirmed,
    RolledBack,
}

impl SendPhase {
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Sending) | (Self::Sending, Self::Confirmed | Self::RolledBack)
        )
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::RolledBack)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank content, nothing active, or the active conversation has ended.
    Skipped,
    /// The active conversation now shows the server's message list.
    Confirmed { message_count: usize },
    /// The server stored the message, but another conversation became
    /// active meanwhile, so the response was dropped.
    Detached,
}

struct SendAttempt {
    conversation: ConversationId,
    local_id: MessageId,
    phase: SendPhase,
}

impl SendAttempt {
    const fn new(conversation: ConversationId, local_id: MessageId) -> Self {
        Self {
            conversation,
            local_id,
            phase: SendPhase::Idle,
        }
    }

    fn advance(&mut self, next: SendPhase) {
        debug_assert!(
            self.phase.can_advance_to(next),
            "illegal send transition {:?} -> {next:?}",
            self.phase
        );
        debug!(
            "Send {} on conversation {}: {:?} -> {next:?}",
            self.local_id, self.conversation, self.phase
        );
        self.phase = next;
    }
}

pub(crate) struct OptimisticMessageProtocol<'a, A: ?Sized> {
    pub(crate) api: &'a A,
    pub(crate) session: &'a ActiveSession,
    pub(crate) catalog: &'a ConversationCatalog,
    pub(crate) lanes: &'a RequestLanes,
}

impl<A> OptimisticMessageProtocol<'_, A>
where
    A: ConversationApi + ?Sized,
{
    pub(crate) async fn send(&self, content: &str) -> Result<SendOutcome, SessionError> {
        if content.trim().is_empty() {
            return Ok(SendOutcome::Skipped);
        }

        let Some(target) = self.session.peek(|view| {
            view.conversation()
                .filter(|c| c.is_active())
                .map(|c| c.id)
        }) else {
            return Ok(SendOutcome::Skipped);
        };

        let _lane = self.lanes.acquire(target).await;

        let provisional = Message::provisional(content);
        let mut attempt = SendAttempt::new(target, provisional.id);

        // The conversation may have ended or been swapped out while queued.
        let appended = self.session.mutate(target, |c| {
            if !c.is_active() {
                return false;
            }
            c.push_message(provisional);
            true
        });
        if appended != Some(true) {
            debug!("Conversation {target} no longer accepts messages, skipping send");
            return Ok(SendOutcome::Skipped);
        }

        attempt.advance(SendPhase::Sending);
        let _sending = self.session.begin_send(target);

        match self.api.send_message(target, content).await {
            Ok(conversation) => {
                attempt.advance(SendPhase::Confirmed);
                self.catalog.reconcile(&conversation.summary_entry());

                let message_count = conversation.messages.len();
                if self.session.replace_messages(target, conversation) {
                    info!("Message confirmed on conversation {target}");
                    Ok(SendOutcome::Confirmed { message_count })
                } else {
                    debug!("Conversation {target} is no longer active, dropping send response");
                    Ok(SendOutcome::Detached)
                }
            }
            Err(e) => {
                let local_id = attempt.local_id;
                let removed = self
                    .session
                    .mutate(target, |c| c.remove_message(local_id))
                    .flatten();
                attempt.advance(SendPhase::RolledBack);

                if removed.is_none() {
                    debug!("Provisional message {local_id} was not in the active session");
                }
                warn!("Send to conversation {target} failed, provisional message rolled back: {e}");

                Err(SessionError::SendFailed {
                    id: target,
                    source: e,
                })
            }
        }
    }
}
