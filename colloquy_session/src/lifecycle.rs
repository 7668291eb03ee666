//! Ending a conversation.
//!
//! The conversation is marked ended locally before the server is asked to
//! end it and produce a summary. A failed request leaves the local status at
//! `Ended`; reloading the conversation shows the server's view.

use colloquy_core::{Conversation, ConversationApi, ConversationId, ConversationStatus};
use tracing::{debug, info, warn};

use crate::active::ActiveSession;
use crate::catalog::ConversationCatalog;
use crate::error::SessionError;
use crate::lanes::RequestLanes;

/// State of a conversation's end transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndPhase {
    Active,
    EndingRequested,
    Ended { summary: Option<String> },
}

impl EndPhase {
    #[must_use]
    pub const fn can_advance_to(&self, next: &Self) -> bool {
        matches!(
            (self, next),
            (Self::Active, Self::EndingRequested) | (Self::EndingRequested, Self::Ended { .. })
        )
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndOutcome {
    /// Nothing active, or the active conversation had already ended.
    Skipped,
    /// The confirmation step said no.
    Declined,
    /// The active conversation now holds the server's ended record.
    Ended { summary: Option<String> },
    /// The server ended the conversation, but another one became active
    /// meanwhile, so only the catalog was updated.
    Detached { summary: Option<String> },
}

struct EndAttempt {
    conversation: ConversationId,
    phase: EndPhase,
}

impl EndAttempt {
    const fn new(conversation: ConversationId) -> Self {
        Self {
            conversation,
            phase: EndPhase::Active,
        }
    }

    fn advance(&mut self, next: EndPhase) {
        debug_assert!(
            self.phase.can_advance_to(&next),
            "illegal end transition {:?} -> {next:?}",
            self.phase
        );
        debug!(
            "End of conversation {}: {:?} -> {next:?}",
            self.conversation, self.phase
        );
        self.phase = next;
    }
}

pub(crate) struct LifecycleTransitionProtocol<'a, A: ?Sized> {
    pub(crate) api: &'a A,
    pub(crate) session: &'a ActiveSession,
    pub(crate) catalog: &'a ConversationCatalog,
    pub(crate) lanes: &'a RequestLanes,
}

impl<A> LifecycleTransitionProtocol<'_, A>
where
    A: ConversationApi + ?Sized,
{
    pub(crate) async fn end<F>(&self, confirm: F) -> Result<EndOutcome, SessionError>
    where
        F: FnOnce(&Conversation) -> bool,
    {
        let Some(current) = self
            .session
            .peek(|view| view.conversation().filter(|c| c.is_active()).cloned())
        else {
            return Ok(EndOutcome::Skipped);
        };

        if !confirm(&current) {
            info!("Ending conversation {} declined", current.id);
            return Ok(EndOutcome::Declined);
        }

        let target = current.id;
        let mut attempt = EndAttempt::new(target);

        // Marked ended before waiting for the lane; only the request queues
        // behind a send in flight.
        let optimistic = self
            .session
            .mutate(target, |c| {
                if !c.is_active() {
                    return None;
                }
                c.transition(ConversationStatus::Ended).ok()?;
                c.summary = None;
                Some(c.summary_entry())
            })
            .flatten();
        let Some(entry) = optimistic else {
            debug!("Conversation {target} is no longer active, skipping end");
            return Ok(EndOutcome::Skipped);
        };
        attempt.advance(EndPhase::EndingRequested);
        self.catalog.reconcile(&entry);

        let _summarizing = self.session.begin_summary(target);
        let _lane = self.lanes.acquire(target).await;

        match self.api.end_conversation(target).await {
            Ok(conversation) => {
                if !conversation.status.is_ended() {
                    warn!("Server reported conversation {target} as still active after ending");
                }
                let summary = conversation.summary.clone();
                attempt.advance(EndPhase::Ended {
                    summary: summary.clone(),
                });
                self.catalog.reconcile(&conversation.summary_entry());

                if self.session.replace_if_active(target, conversation) {
                    info!(
                        "Conversation {target} ended ({})",
                        if summary.is_some() {
                            "summary attached"
                        } else {
                            "no summary"
                        }
                    );
                    Ok(EndOutcome::Ended { summary })
                } else {
                    debug!("Conversation {target} is no longer active, dropping end response");
                    Ok(EndOutcome::Detached { summary })
                }
            }
            Err(e) => {
                attempt.advance(EndPhase::Ended { summary: None });
                warn!("Ending conversation {target} failed, local status stays ended: {e}");
                Err(SessionError::EndFailed {
                    id: target,
                    source: e,
                })
            }
        }
    }
}
