//! Static strategy pattern for CLI commands.
//!
//! Each subcommand is a separate strategy type with its own input, dispatched
//! statically from `main`.

use colloquy_client::{HttpConversationApi, RetryPolicy};
use colloquy_config::Config;
use colloquy_session::SessionController;
use std::io::Write;
use std::time::Duration;
use tracing::info;

mod chat;
mod end;
mod history;
mod info;
mod init;
mod list;
mod new;
mod query;
mod send;
mod show;
mod version;

pub use chat::ChatStrategy;
pub use end::{EndInput, EndStrategy};
pub use history::HistoryStrategy;
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use list::ListStrategy;
pub use new::NewStrategy;
pub use query::{QueryInput, QueryStrategy};
pub use send::{SendInput, SendStrategy};
pub use show::ShowStrategy;
pub use version::VersionStrategy;

/// Core trait defining the contract for all command strategies.
///
/// Each strategy declares its own input type, so parameters are passed
/// without runtime casting or boxing.
pub trait CommandStrategy: Send + Sync + 'static {
    type Input;

    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Connection settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Connection {
    pub base_url: Option<String>,
}

impl Connection {
    /// Configuration with command-line overrides applied.
    pub fn config(&self) -> anyhow::Result<Config> {
        let mut config = Config::load_or_default()?;
        if let Some(base_url) = &self.base_url {
            config.server.base_url.clone_from(base_url);
        }
        Ok(config)
    }

    pub fn controller(&self) -> anyhow::Result<SessionController<HttpConversationApi>> {
        let config = self.config()?;
        build_controller(&config)
    }
}

fn build_controller(config: &Config) -> anyhow::Result<SessionController<HttpConversationApi>> {
    info!("Connecting to {}", config.server.base_url);
    let api = HttpConversationApi::new(
        config.server.base_url.clone(),
        Duration::from_secs(config.server.timeout_secs),
    )?
    .with_retry(RetryPolicy::from_secs(config.retry.effective_delays()));

    Ok(SessionController::new(api))
}

/// Ask a yes/no question on stdout. Anything but `y`/`yes` is a no.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}
