#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

use clap::{Parser, Subcommand};
use colloquy_core::ConversationId;
use tracing_subscriber::EnvFilter;

mod command;
mod display;

use command::{
    ChatStrategy, CommandStrategy, Connection, EndInput, EndStrategy, HistoryStrategy,
    InfoStrategy, InitStrategy, ListStrategy, NewStrategy, QueryInput, QueryStrategy, SendInput,
    SendStrategy, ShowStrategy, VersionStrategy,
};

#[derive(Parser)]
#[command(name = "colloquy")]
#[command(about = "Client for a conversational AI service", long_about = None)]
struct Cli {
    /// Override the configured server base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Log at debug level (`RUST_LOG` takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Init,
    /// Show the effective configuration
    Info,
    /// Show version
    Version,
    /// List conversations, most recent first
    List,
    /// Start a new conversation
    New {
        /// Title; defaults to the current date and time
        title: Option<String>,
    },
    /// Show a conversation with its messages
    Show { id: ConversationId },
    /// Send one message to a conversation
    Send {
        id: ConversationId,
        /// Message text
        message: String,
    },
    /// End a conversation and print its summary
    End {
        id: ConversationId,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Interactive session
    Chat,
    /// Ask a question about past conversations
    Query {
        #[arg(required_unless_present = "from_history")]
        text: Option<String>,
        /// Ask again the N-th query listed by `colloquy history`
        #[arg(long, value_name = "N", conflicts_with = "text")]
        from_history: Option<usize>,
    },
    /// Show past queries
    History {
        /// Forget all past queries
        #[arg(long)]
        clear: bool,
    },
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let connection = Connection {
        base_url: cli.base_url,
    };

    match cli.command {
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Info => InfoStrategy.execute(connection).await,
        Commands::Version => VersionStrategy.execute(()).await,
        Commands::List => ListStrategy.execute(connection).await,
        Commands::New { title } => NewStrategy.execute((connection, title)).await,
        Commands::Show { id } => ShowStrategy.execute((connection, id)).await,
        Commands::Send { id, message } => {
            SendStrategy
                .execute(SendInput {
                    connection,
                    id,
                    message,
                })
                .await
        }
        Commands::End { id, yes } => {
            EndStrategy
                .execute(EndInput {
                    connection,
                    id,
                    assume_yes: yes,
                })
                .await
        }
        Commands::Chat => ChatStrategy.execute(connection).await,
        Commands::Query { text, from_history } => {
            QueryStrategy
                .execute(QueryInput {
                    connection,
                    text,
                    from_history,
                })
                .await
        }
        Commands::History { clear } => HistoryStrategy.execute(clear).await,
    }
}
