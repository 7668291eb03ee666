use chrono::Local;
use colloquy_core::{Conversation, ConversationStatus, ConversationSummary, Message, Sender};

const fn status_label(status: ConversationStatus) -> &'static str {
    match status {
        ConversationStatus::Active => "active",
        ConversationStatus::Ended => "ended",
    }
}

pub fn catalog_line(entry: &ConversationSummary) -> String {
    format!(
        "{:>5}  {:<7} {}  {}",
        entry.id,
        status_label(entry.status),
        entry.start_time.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
        entry.title
    )
}

pub fn print_catalog(entries: &[ConversationSummary]) {
    if entries.is_empty() {
        println!("No conversations yet. Start one with 'colloquy new'.");
        return;
    }
    for entry in entries {
        println!("{}", catalog_line(entry));
    }
}

pub fn message_line(message: &Message) -> String {
    let who = match message.sender {
        Sender::User => "you",
        Sender::Assistant => "ai",
    };
    let pending = if message.is_provisional() {
        " (sending)"
    } else {
        ""
    };
    format!(
        "[{}] {who}{pending}: {}",
        message.timestamp.with_timezone(&Local).format("%H:%M"),
        message.content
    )
}

pub fn print_summary(summary: Option<&str>) {
    match summary {
        Some(summary) => println!("\nSummary:\n{summary}"),
        None => println!("\nNo summary was produced."),
    }
}

pub fn print_conversation(conversation: &Conversation) {
    println!(
        "=== #{} {} ({}) ===",
        conversation.id,
        conversation.title,
        status_label(conversation.status)
    );
    if conversation.messages.is_empty() {
        println!("(no messages)");
    }
    for message in &conversation.messages {
        println!("{}", message_line(message));
    }
    if conversation.status.is_ended() {
        print_summary(conversation.summary.as_deref());
    }
}

/// Messages the service added after the last message sent by the user.
pub fn replies(conversation: &Conversation) -> impl Iterator<Item = &Message> {
    let start = conversation
        .messages
        .iter()
        .rposition(|m| m.sender == Sender::User)
        .map_or(0, |i| i + 1);
    conversation.messages[start..].iter()
}
