//! Interactive session on top of the session controller.
//!
//! Plain input is sent to the active conversation; lines starting with `/`
//! are commands.

use colloquy_client::HttpConversationApi;
use colloquy_core::ConversationId;
use colloquy_session::{EndOutcome, SendOutcome, SessionController, SessionError};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

use super::Connection;
use crate::display::{message_line, print_catalog, print_conversation, print_summary, replies};

const HELP: &str = "\
Commands:
  /list          list conversations
  /new [title]   start a new conversation
  /open <id>     switch to a conversation
  /end           end the active conversation
  /help          show this help
  /quit          leave
Anything else is sent as a message.";

#[derive(Debug, PartialEq, Eq)]
enum ChatCommand<'a> {
    Empty,
    Say(&'a str),
    List,
    New(&'a str),
    Open(ConversationId),
    End,
    Help,
    Quit,
    Invalid(String),
}

fn parse_line(line: &str) -> ChatCommand<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ChatCommand::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ChatCommand::Say(line);
    };

    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, rest)| (name, rest.trim()));

    match name {
        "list" | "ls" => ChatCommand::List,
        "new" => ChatCommand::New(rest),
        "open" => rest.parse::<ConversationId>().map_or_else(
            |_| ChatCommand::Invalid(format!("'{rest}' is not a conversation id")),
            ChatCommand::Open,
        ),
        "end" => ChatCommand::End,
        "help" | "?" => ChatCommand::Help,
        "quit" | "exit" | "q" => ChatCommand::Quit,
        other => ChatCommand::Invalid(format!("unknown command '/{other}', try /help")),
    }
}

/// Strategy for the interactive chat session.
#[derive(Debug, Clone, Copy)]
pub struct ChatStrategy;

impl super::CommandStrategy for ChatStrategy {
    type Input = Connection;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let controller = input.controller()?;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("=== colloquy ===");
        println!("Type /help for commands, /quit to leave.\n");

        match controller.refresh().await {
            Ok(entries) => print_catalog(&entries),
            Err(e) => eprintln!("Error: {e}"),
        }
        show_active(&controller);

        loop {
            prompt(&controller)?;
            let Some(line) = lines.next_line().await? else {
                break;
            };

            match parse_line(&line) {
                ChatCommand::Empty => {}
                ChatCommand::Quit => break,
                ChatCommand::Help => println!("{HELP}"),
                ChatCommand::Invalid(message) => eprintln!("{message}"),
                ChatCommand::List => match controller.refresh().await {
                    Ok(entries) => print_catalog(&entries),
                    Err(e) => eprintln!("Error: {e}"),
                },
                ChatCommand::New(title) => match controller.create_conversation(title).await {
                    Ok(conversation) => {
                        println!("Started #{}: {}", conversation.id, conversation.title);
                    }
                    Err(e) => eprintln!("Error: {e}"),
                },
                ChatCommand::Open(id) => match controller.select(id).await {
                    Ok(_) => show_active(&controller),
                    Err(e) => eprintln!("Error: {e}"),
                },
                ChatCommand::End => end_active(&controller, &mut lines).await?,
                ChatCommand::Say(text) => say(&controller, text).await,
            }
        }

        info!("Chat session closed");
        Ok(())
    }
}

fn prompt(controller: &SessionController<HttpConversationApi>) -> anyhow::Result<()> {
    match controller.session().active_id() {
        Some(id) => print!("#{id}> "),
        None => print!("> "),
    }
    std::io::stdout().flush()?;
    Ok(())
}

fn show_active(controller: &SessionController<HttpConversationApi>) {
    let view = controller.session().snapshot();
    match view.conversation() {
        Some(conversation) => print_conversation(conversation),
        None => println!("No active conversation. Use /new to start one."),
    }
}

async fn say(controller: &SessionController<HttpConversationApi>, text: &str) {
    match controller.send_message(text).await {
        Ok(SendOutcome::Confirmed { .. }) => {
            let view = controller.session().snapshot();
            if let Some(conversation) = view.conversation() {
                for reply in replies(conversation) {
                    println!("{}", message_line(reply));
                }
            }
        }
        Ok(SendOutcome::Skipped) => {
            println!("No active conversation accepts messages. Use /new or /open.");
        }
        Ok(SendOutcome::Detached) => {}
        Err(e @ SessionError::SendFailed { .. }) => {
            eprintln!("Error: {e}. Your message was not kept.");
        }
        Err(e) => eprintln!("Error: {e}"),
    }
}

async fn end_active(
    controller: &SessionController<HttpConversationApi>,
    lines: &mut Lines<BufReader<Stdin>>,
) -> anyhow::Result<()> {
    let view = controller.session().snapshot();
    let Some(conversation) = view.conversation().filter(|c| c.is_active()) else {
        println!("No active conversation to end.");
        return Ok(());
    };

    print!("End conversation \"{}\"? [y/N] ", conversation.title);
    std::io::stdout().flush()?;
    let answer = lines.next_line().await?.unwrap_or_default();
    let confirmed = matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes");

    if confirmed {
        println!("Generating summary...");
    }
    match controller.end_conversation(|_| confirmed).await {
        Ok(EndOutcome::Ended { summary } | EndOutcome::Detached { summary }) => {
            print_summary(summary.as_deref());
        }
        Ok(EndOutcome::Declined) => println!("Cancelled."),
        Ok(EndOutcome::Skipped) => println!("The conversation has already ended."),
        Err(e) => {
            warn!("Ending conversation failed: {e}");
            eprintln!("Error: {e}. Use /open to reload the conversation.");
        }
    }
    Ok(())
}
