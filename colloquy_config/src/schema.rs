use colloquy_core::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ServerConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

impl ServerConfig {
    fn default_base_url() -> String {
        DEFAULT_BASE_URL.to_string()
    }

    const fn default_timeout_secs() -> u64 {
        30
    }
}

/// Retry of idempotent reads. Writes are never retried.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    #[serde(default = "RetryConfig::default_enabled")]
    pub enabled: bool,
    #[serde(default = "RetryConfig::default_base_delays_secs")]
    pub base_delays_secs: Vec<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: Self::default_enabled(),
            base_delays_secs: Self::default_base_delays_secs(),
        }
    }
}

impl RetryConfig {
    const fn default_enabled() -> bool {
        true
    }

    fn default_base_delays_secs() -> Vec<u64> {
        vec![1, 2]
    }

    /// Delays to use, empty when retry is disabled.
    #[must_use]
    pub fn effective_delays(&self) -> &[u64] {
        if self.enabled {
            &self.base_delays_secs
        } else {
            &[]
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    #[serde(default = "QueryConfig::default_history_limit")]
    pub history_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            history_limit: Self::default_history_limit(),
        }
    }
}

impl QueryConfig {
    const fn default_history_limit() -> usize {
        10
    }
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("colloquy"))
    }

    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Where past intelligence queries are kept.
    pub fn query_history_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("query_history.json"))
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'colloquy init' to create config.",
                config_path.display()
            );
        }

        Self::load_from(&config_path)
    }

    /// Load the config file if there is one, otherwise use defaults.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!(
                "No config at {}, using defaults",
                config_path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");
        Self::write_template(&config_path)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Point server.base_url at your conversation service");
        println!("   2. Run 'colloquy list' to check the connection");
        println!("   3. Run 'colloquy chat' to start talking");
        println!();
        println!("🔧 Configuration options:");
        println!("   - server.timeout_secs: per-request timeout");
        println!("   - retry.base_delays_secs: delays between retries of reads");
        println!("   - query.history_limit: number of past queries to remember");
        println!();
        Ok(())
    }

    /// The defaults, as written by `colloquy init`.
    pub fn template() -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(&Self::default())?)
    }

    /// Write the default template to `path`, refusing to overwrite.
    pub fn write_template(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                path.display()
            );
        }
        std::fs::write(path, Self::template()?)?;
        Ok(())
    }
}
