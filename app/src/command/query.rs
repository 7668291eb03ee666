use anyhow::Context;
use colloquy_config::Config;
use colloquy_session::QueryHistory;
use tracing::warn;

use super::Connection;

#[derive(Debug, Clone)]
pub struct QueryInput {
    pub connection: Connection,
    pub text: Option<String>,
    /// 1-based position in the query history to ask again.
    pub from_history: Option<usize>,
}

/// Strategy for asking the service a question about past conversations.
///
/// Successful queries are remembered in the local query history and can be
/// asked again by their listed number.
#[derive(Debug, Clone, Copy)]
pub struct QueryStrategy;

impl super::CommandStrategy for QueryStrategy {
    type Input = QueryInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = input.connection.config()?;
        let controller = super::build_controller(&config)?;

        let path = Config::query_history_path()?;
        let mut history = match QueryHistory::load(&path, config.query.history_limit) {
            Ok(history) => history,
            Err(e) => {
                warn!("Ignoring unreadable query history at {}: {e}", path.display());
                QueryHistory::in_memory(config.query.history_limit)
            }
        };

        let text = resolve_query(&history, input.text, input.from_history)?;
        match controller.query(&mut history, &text).await? {
            Some(answer) => println!("{answer}"),
            None => println!("Nothing to ask."),
        }
        Ok(())
    }
}

fn resolve_query(
    history: &QueryHistory,
    text: Option<String>,
    from_history: Option<usize>,
) -> anyhow::Result<String> {
    match (text, from_history) {
        (_, Some(number)) => history.get(number).map(str::to_string).with_context(|| {
            format!("no past query number {number}, see 'colloquy history'")
        }),
        (Some(text), None) => Ok(text),
        (None, None) => anyhow::bail!("give a query or --from-history N"),
    }
}
