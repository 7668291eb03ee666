use colloquy_core::ConversationId;
use colloquy_session::SendOutcome;

use super::Connection;
use crate::display::{message_line, replies};

#[derive(Debug, Clone)]
pub struct SendInput {
    pub connection: Connection,
    pub id: ConversationId,
    pub message: String,
}

/// Strategy for sending a single message to a conversation and printing
/// the reply.
#[derive(Debug, Clone, Copy)]
pub struct SendStrategy;

impl super::CommandStrategy for SendStrategy {
    type Input = SendInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let controller = input.connection.controller()?;
        controller.select(input.id).await?;

        match controller.send_message(&input.message).await? {
            SendOutcome::Confirmed { .. } => {
                let view = controller.session().snapshot();
                if let Some(conversation) = view.conversation() {
                    for reply in replies(conversation) {
                        println!("{}", message_line(reply));
                    }
                }
            }
            SendOutcome::Skipped => {
                println!(
                    "Nothing sent: the message is empty or conversation #{} has ended.",
                    input.id
                );
            }
            SendOutcome::Detached => {
                println!("Message delivered to conversation #{}.", input.id);
            }
        }
        Ok(())
    }
}
