//! Contract of the remote conversation service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::conversation::{Conversation, ConversationId, ConversationSummary};

/// Where the service listens unless configured otherwise.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

#[derive(Debug, Clone, Serialize)]
pub struct CreateConversationRequest<'a> {
    pub title: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
}

/// Remote service that owns the authoritative conversation data.
///
/// Every method maps to one request. Any transport failure or non-success
/// status comes back as an error; callers never inspect partial bodies.
#[async_trait]
pub trait ConversationApi: Send + Sync {
    async fn list_conversations(&self) -> anyhow::Result<Vec<ConversationSummary>>;

    async fn create_conversation(&self, title: &str) -> anyhow::Result<Conversation>;

    async fn get_conversation(&self, id: ConversationId) -> anyhow::Result<Conversation>;

    /// Append a user message. The returned conversation includes the stored
    /// message and any assistant reply generated synchronously.
    async fn send_message(&self, id: ConversationId, content: &str)
    -> anyhow::Result<Conversation>;

    /// End a conversation. The summary may still be `None` if generation
    /// failed on the server.
    async fn end_conversation(&self, id: ConversationId) -> anyhow::Result<Conversation>;

    async fn query(&self, query: &str) -> anyhow::Result<QueryResponse>;
}

#[async_trait]
impl<T> ConversationApi for Arc<T>
where
    T: ConversationApi + ?Sized,
{
    async fn list_conversations(&self) -> anyhow::Result<Vec<ConversationSummary>> {
        (**self).list_conversations().await
    }

    async fn create_conversation(&self, title: &str) -> anyhow::Result<Conversation> {
        (**self).create_conversation(title).await
    }

    async fn get_conversation(&self, id: ConversationId) -> anyhow::Result<Conversation> {
        (**self).get_conversation(id).await
    }

    async fn send_message(
        &self,
        id: ConversationId,
        content: &str,
    ) -> anyhow::Result<Conversation> {
        (**self).send_message(id, content).await
    }

    async fn end_conversation(&self, id: ConversationId) -> anyhow::Result<Conversation> {
        (**self).end_conversation(id).await
    }

    async fn query(&self, query: &str) -> anyhow::Result<QueryResponse> {
        (**self).query(query).await
    }
}
