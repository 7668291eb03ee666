use colloquy_config::Config;
use colloquy_session::QueryHistory;

/// Strategy for showing, or clearing, the local list of past queries.
#[derive(Debug, Clone, Copy)]
pub struct HistoryStrategy;

impl super::CommandStrategy for HistoryStrategy {
    /// Whether to clear the history.
    type Input = bool;

    async fn execute(&self, clear: Self::Input) -> anyhow::Result<()> {
        let config = Config::load_or_default()?;
        let mut history =
            QueryHistory::load(Config::query_history_path()?, config.query.history_limit)?;

        if clear {
            history.clear();
            history.save()?;
            println!("Query history cleared.");
            return Ok(());
        }

        if history.entries().is_empty() {
            println!("No past queries.");
            return Ok(());
        }
        for (i, query) in history.entries().iter().enumerate() {
            println!("{:>2}. {query}", i + 1);
        }
        println!("\nAsk one again with 'colloquy query --from-history N'.");
        Ok(())
    }
}
