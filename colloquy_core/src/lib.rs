#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Shared conversation model and the remote service contract.

pub mod api;
pub mod conversation;

pub use api::{
    ConversationApi, CreateConversationRequest, DEFAULT_BASE_URL, QueryRequest, QueryResponse,
    SendMessageRequest,
};
pub use conversation::{
    Conversation, ConversationId, ConversationStatus, ConversationSummary, Message, MessageId,
    ModelError, Sender,
};
