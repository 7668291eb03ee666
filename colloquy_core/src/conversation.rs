//! Conversation and message records.
//!
//! The remote service owns these records. The client only holds copies and
//! the provisional messages it appended itself while a send is in flight.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Server-assigned conversation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(i64);

impl ConversationId {
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Message identifier.
///
/// Confirmed messages carry the id the server assigned. Messages appended
/// locally before confirmation carry a uuid that cannot collide with any
/// server id and is never sent over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Remote(i64),
    Provisional(Uuid),
}

impl MessageId {
    #[must_use]
    pub const fn is_provisional(&self) -> bool {
        matches!(self, Self::Provisional(_))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(id) => write!(f, "{id}"),
            Self::Provisional(id) => write!(f, "local:{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("you"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Build a user message that exists only locally until the server
    /// confirms it.
    #[must_use]
    pub fn provisional(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::Provisional(Uuid::now_v7()),
            content: content.into(),
            sender: Sender::User,
            timestamp: Utc::now(),
        }
    }

    #[must_use]
    pub const fn is_provisional(&self) -> bool {
        self.id.is_provisional()
    }
}

/// Lifecycle status. `Ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Active,
    Ended,
}

impl ConversationStatus {
    #[must_use]
    pub const fn is_ended(self) -> bool {
        matches!(self, Self::Ended)
    }

    /// Whether moving from `self` to `next` respects the lifecycle.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Active, _) | (Self::Ended, Self::Ended)
        )
    }
}

impl fmt::Display for ConversationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Ended => f.write_str("ended"),
        }
    }
}

/// Lightweight catalog entry for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: String,
    pub status: ConversationStatus,
    pub start_time: DateTime<Utc>,
}

/// A fully loaded conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub status: ConversationStatus,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("duplicate message id {0}")]
    DuplicateMessageId(MessageId),

    #[error("message at position {index} is older than its predecessor")]
    OutOfOrder { index: usize },

    #[error("conversation {0} carries a summary but has not ended")]
    SummaryBeforeEnd(ConversationId),

    #[error("illegal status transition {from} -> {to}")]
    IllegalTransition {
        from: ConversationStatus,
        to: ConversationStatus,
    },
}

impl Conversation {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.status.is_ended()
    }

    #[must_use]
    pub fn summary_entry(&self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            title: self.title.clone(),
            status: self.status,
            start_time: self.start_time,
        }
    }

    /// Move to `next`, refusing transitions out of `Ended`.
    pub fn transition(&mut self, next: ConversationStatus) -> Result<(), ModelError> {
        if !self.status.can_transition_to(next) {
            return Err(ModelError::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Remove the message with `id`, if present.
    pub fn remove_message(&mut self, id: MessageId) -> Option<Message> {
        let position = self.messages.iter().position(|m| m.id == id)?;
        Some(self.messages.remove(position))
    }

    #[must_use]
    pub fn provisional_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_provisional()).count()
    }

    /// Report the first violated record invariant.
    pub fn check_invariants(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::with_capacity(self.messages.len());
        for message in &self.messages {
            if !seen.insert(message.id) {
                return Err(ModelError::DuplicateMessageId(message.id));
            }
        }

        if let Some(index) = self
            .messages
            .windows(2)
            .position(|pair| pair[1].timestamp < pair[0].timestamp)
        {
            return Err(ModelError::OutOfOrder { index: index + 1 });
        }

        if self.summary.is_some() && self.is_active() {
            return Err(ModelError::SummaryBeforeEnd(self.id));
        }

        Ok(())
    }

    /// Stable-sort messages into chronological order.
    pub fn normalize(&mut self) {
        self.messages.sort_by_key(|m| m.timestamp);
    }
}
