//! In-memory stand-in for the conversation service.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use colloquy_core::{
    Conversation, ConversationApi, ConversationId, ConversationStatus, ConversationSummary,
    Message, MessageId, QueryResponse, Sender,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    List,
    Create,
    Get,
    Send,
    End,
    Query,
}

/// Holds one request until the test releases it.
#[derive(Debug, Default)]
pub struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    /// Wait until the gated request has reached the server.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[derive(Debug, Default)]
struct ServerState {
    conversations: BTreeMap<i64, Conversation>,
    next_conversation_id: i64,
    next_message_id: i64,
    clock: i64,
    failing: HashSet<Endpoint>,
    summary: Option<String>,
}

impl ServerState {
    fn tick(&mut self) -> DateTime<Utc> {
        self.clock += 1;
        base_time() + Duration::seconds(self.clock)
    }

    fn message(&mut self, content: &str, sender: Sender) -> Message {
        self.next_message_id += 1;
        Message {
            id: MessageId::Remote(self.next_message_id),
            content: content.to_string(),
            sender,
            timestamp: self.tick(),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeApi {
    state: Mutex<ServerState>,
    gates: Mutex<HashMap<Endpoint, Arc<Gate>>>,
    held: Mutex<HashMap<Endpoint, Arc<Gate>>>,
    calls: Mutex<HashMap<Endpoint, usize>>,
    sends_in_flight: AtomicUsize,
    max_sends_in_flight: AtomicUsize,
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Store a conversation started `minutes` after the base time.
    pub fn seed(&self, title: &str, minutes: i64, messages: &[(&str, Sender)]) -> ConversationId {
        let mut state = self.state();
        state.next_conversation_id += 1;
        let id = state.next_conversation_id;
        let messages = messages
            .iter()
            .map(|(content, sender)| state.message(content, *sender))
            .collect();
        state.conversations.insert(
            id,
            Conversation {
                id: ConversationId::new(id),
                title: title.to_string(),
                status: ConversationStatus::Active,
                start_time: base_time() + Duration::minutes(minutes),
                messages,
                summary: None,
            },
        );
        ConversationId::new(id)
    }

    pub fn stored(&self, id: ConversationId) -> Option<Conversation> {
        self.state().conversations.get(&id.get()).cloned()
    }

    pub fn fail(&self, endpoint: Endpoint) {
        self.state().failing.insert(endpoint);
    }

    pub fn recover(&self, endpoint: Endpoint) {
        self.state().failing.remove(&endpoint);
    }

    pub fn set_summary(&self, summary: Option<&str>) {
        self.state().summary = summary.map(str::to_string);
    }

    /// Hold the next request to `endpoint` until released.
    pub fn gate(&self, endpoint: Endpoint) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.gates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(endpoint, Arc::clone(&gate));
        gate
    }

    /// Let the next request to `endpoint` read server state as usual, then
    /// hold its response until released. Only reads support this.
    pub fn hold_response(&self, endpoint: Endpoint) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        self.held
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(endpoint, Arc::clone(&gate));
        gate
    }

    async fn deliver<T>(&self, endpoint: Endpoint, response: T) -> T {
        let gate = self
            .held
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&endpoint);
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        response
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(&endpoint)
            .copied()
            .unwrap_or(0)
    }

    pub fn max_sends_in_flight(&self) -> usize {
        self.max_sends_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, endpoint: Endpoint) -> anyhow::Result<()> {
        *self
            .calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .entry(endpoint)
            .or_insert(0) += 1;

        let gate = self
            .gates
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(&endpoint);
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if self.state().failing.contains(&endpoint) {
            anyhow::bail!("connection reset by peer");
        }
        Ok(())
    }
}

#[async_trait]
impl ConversationApi for FakeApi {
    async fn list_conversations(&self) -> anyhow::Result<Vec<ConversationSummary>> {
        self.enter(Endpoint::List).await?;
        let listing: Vec<_> = self
            .state()
            .conversations
            .values()
            .map(Conversation::summary_entry)
            .collect();
        Ok(self.deliver(Endpoint::List, listing).await)
    }

    async fn create_conversation(&self, title: &str) -> anyhow::Result<Conversation> {
        self.enter(Endpoint::Create).await?;
        let minutes = self.state().next_conversation_id * 10;
        let id = self.seed(title, minutes, &[]);
        self.stored(id)
            .ok_or_else(|| anyhow::anyhow!("conversation vanished"))
    }

    async fn get_conversation(&self, id: ConversationId) -> anyhow::Result<Conversation> {
        self.enter(Endpoint::Get).await?;
        let stored = self
            .stored(id)
            .ok_or_else(|| anyhow::anyhow!("404 Not Found"))?;
        Ok(self.deliver(Endpoint::Get, stored).await)
    }

    async fn send_message(
        &self,
        id: ConversationId,
        content: &str,
    ) -> anyhow::Result<Conversation> {
        let now = self.sends_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_sends_in_flight.fetch_max(now, Ordering::SeqCst);
        let entered = self.enter(Endpoint::Send).await;
        self.sends_in_flight.fetch_sub(1, Ordering::SeqCst);
        entered?;

        let mut state = self.state();
        if !state.conversations.contains_key(&id.get()) {
            anyhow::bail!("404 Not Found");
        }
        let user = state.message(content, Sender::User);
        let reply = state.message(&format!("echo: {content}"), Sender::Assistant);
        let conversation = state
            .conversations
            .get_mut(&id.get())
            .ok_or_else(|| anyhow::anyhow!("404 Not Found"))?;
        conversation.messages.push(user);
        conversation.messages.push(reply);
        Ok(conversation.clone())
    }

    async fn end_conversation(&self, id: ConversationId) -> anyhow::Result<Conversation> {
        self.enter(Endpoint::End).await?;
        let mut state = self.state();
        let summary = state.summary.clone();
        let conversation = state
            .conversations
            .get_mut(&id.get())
            .ok_or_else(|| anyhow::anyhow!("404 Not Found"))?;
        conversation.status = ConversationStatus::Ended;
        conversation.summary = summary;
        Ok(conversation.clone())
    }

    async fn query(&self, query: &str) -> anyhow::Result<QueryResponse> {
        self.enter(Endpoint::Query).await?;
        Ok(QueryResponse {
            response: format!("answer to {query}"),
        })
    }
}
