use colloquy_config::Config;

use super::Connection;

/// Strategy for displaying the effective configuration, with command-line
/// overrides applied.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = Connection;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = input.config()?;
        let config_path = Config::config_path()?;

        println!("=== colloquy Configuration ===\n");

        println!("Config File:");
        if config_path.exists() {
            println!("  Path: {}", config_path.display());
        } else {
            println!("  Path: {} (not found, using defaults)", config_path.display());
        }
        println!();

        println!("Server:");
        println!("  Base URL: {}", config.server.base_url);
        if input.base_url.is_some() {
            println!("    (overridden by --base-url)");
        }
        println!("  Timeout: {}s", config.server.timeout_secs);
        println!();

        println!("Retry (reads only):");
        if config.retry.enabled {
            let delays: Vec<String> = config
                .retry
                .base_delays_secs
                .iter()
                .map(|d| format!("{d}s"))
                .collect();
            println!("  Delays: {}", delays.join(", "));
        } else {
            println!("  Disabled");
        }
        println!();

        println!("Query:");
        println!("  History Limit: {}", config.query.history_limit);
        println!(
            "  History File: {}",
            Config::query_history_path()?.display()
        );

        Ok(())
    }
}
