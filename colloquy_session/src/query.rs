//! Free-text questions about past conversations.
//!
//! Queries are stateless on the server. The client keeps a short local list
//! of past query strings for re-submission; it never holds conversation data.

use colloquy_core::ConversationApi;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::SessionError;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Most-recent-first, de-duplicated, bounded list of past queries.
#[derive(Debug, Clone)]
pub struct QueryHistory {
    entries: Vec<String>,
    limit: usize,
    path: Option<PathBuf>,
}

impl QueryHistory {
    /// History that lives only as long as the process.
    #[must_use]
    pub const fn in_memory(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
            path: None,
        }
    }

    /// Load the history stored at `path`. A missing file yields an empty
    /// history that will be written there on the next save.
    pub fn load(path: impl Into<PathBuf>, limit: usize) -> Result<Self, SessionError> {
        let path = path.into();
        let stored: Vec<String> = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut history = Self {
            entries: Vec::with_capacity(limit),
            limit,
            path: Some(path),
        };
        // Oldest first so the stored order is preserved.
        for query in stored.iter().rev() {
            history.record(query);
        }
        Ok(history)
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Past query by its 1-based position, as listed most recent first.
    #[must_use]
    pub fn get(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map(String::as_str)
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Put `query` at the front, dropping an older copy and anything past
    /// the limit. Blank queries are ignored.
    pub fn record(&mut self, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        self.entries.retain(|q| q != query);
        self.entries.insert(0, query.to_string());
        self.entries.truncate(self.limit);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Write the history to its file, if it has one.
    pub fn save(&self) -> Result<(), SessionError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

/// Ask the service a question about past conversations.
///
/// The query is recorded in `history` only if the request succeeds. Blank
/// queries are a no-op and return `None`.
pub async fn run_query<A>(
    api: &A,
    history: &mut QueryHistory,
    query: &str,
) -> Result<Option<String>, SessionError>
where
    A: ConversationApi + ?Sized,
{
    let query = query.trim();
    if query.is_empty() {
        return Ok(None);
    }

    let response = api.query(query).await.map_err(SessionError::QueryFailed)?;
    info!("Query answered ({} chars)", response.response.len());

    history.record(query);
    if let Err(e) = history.save() {
        warn!("Failed to persist query history: {e}");
    }

    Ok(Some(response.response))
}
