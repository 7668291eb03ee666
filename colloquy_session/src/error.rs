use colloquy_core::ConversationId;
use thiserror::Error;

/// Failures surfaced to the caller that initiated an action.
///
/// All of them are recoverable: the catalog and the active session stay
/// usable after any of these.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to fetch conversations: {0}")]
    Fetch(#[source] anyhow::Error),

    #[error("failed to create conversation: {0}")]
    Create(#[source] anyhow::Error),

    #[error("failed to load conversation {id}: {source}")]
    Load {
        id: ConversationId,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to send message to conversation {id}: {source}")]
    SendFailed {
        id: ConversationId,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to end conversation {id}: {source}")]
    EndFailed {
        id: ConversationId,
        #[source]
        source: anyhow::Error,
    },

    #[error("query failed: {0}")]
    QueryFailed(#[source] anyhow::Error),

    #[error("query history IO error: {0}")]
    HistoryIo(#[from] std::io::Error),

    #[error("query history is malformed: {0}")]
    HistoryFormat(#[from] serde_json::Error),
}
