use anyhow::Context;
use async_trait::async_trait;
use colloquy_core::{
    Conversation, ConversationApi, ConversationId, ConversationSummary, CreateConversationRequest,
    QueryRequest, QueryResponse, SendMessageRequest,
};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::retry::{RetryPolicy, retry_with_backoff};

/// `ConversationApi` over the service's REST endpoints.
///
/// Reads (`list`, `get`) follow the configured retry policy. Writes are sent
/// exactly once.
pub struct HttpConversationApi {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HttpConversationApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let base_url = base_url.into();
        info!("Creating HttpConversationApi for {base_url}");
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            retry: RetryPolicy::none(),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url.trim_end_matches('/'))
    }

    async fn get_json<T>(&self, path: &str) -> anyhow::Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        retry_with_backoff(|| self.try_get(&url), &self.retry).await
    }

    /// Helper method to send a single GET request
    async fn try_get<T>(&self, url: &str) -> anyhow::Result<T>
    where
        T: DeserializeOwned,
    {
        debug!("GET {url}");
        let body = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()?
            .json::<T>()
            .await
            .with_context(|| format!("decoding response of GET {url}"))?;
        Ok(body)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> anyhow::Result<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        debug!("POST {url}");
        let body = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?
            .error_for_status()?
            .json::<T>()
            .await
            .with_context(|| format!("decoding response of POST {url}"))?;
        Ok(body)
    }
}

#[async_trait]
impl ConversationApi for HttpConversationApi {
    async fn list_conversations(&self) -> anyhow::Result<Vec<ConversationSummary>> {
        self.get_json("conversations/").await
    }

    async fn create_conversation(&self, title: &str) -> anyhow::Result<Conversation> {
        self.post_json("conversations/", &CreateConversationRequest { title })
            .await
    }

    async fn get_conversation(&self, id: ConversationId) -> anyhow::Result<Conversation> {
        self.get_json(&format!("conversations/{id}/")).await
    }

    async fn send_message(
        &self,
        id: ConversationId,
        content: &str,
    ) -> anyhow::Result<Conversation> {
        self.post_json(
            &format!("conversations/{id}/messages/"),
            &SendMessageRequest { content },
        )
        .await
    }

    async fn end_conversation(&self, id: ConversationId) -> anyhow::Result<Conversation> {
        info!("Requesting end of conversation {id}");
        self.post_json(&format!("conversations/{id}/end/"), &json!({}))
            .await
    }

    async fn query(&self, query: &str) -> anyhow::Result<QueryResponse> {
        self.post_json("query/", &QueryRequest { query }).await
    }
}
