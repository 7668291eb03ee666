use colloquy_core::ConversationId;
use colloquy_session::EndOutcome;
use tracing::warn;

use super::{Connection, confirm};
use crate::display::print_summary;

#[derive(Debug, Clone)]
pub struct EndInput {
    pub connection: Connection,
    pub id: ConversationId,
    /// Skip the confirmation prompt.
    pub assume_yes: bool,
}

/// Strategy for ending a conversation and printing the summary the service
/// produces.
#[derive(Debug, Clone, Copy)]
pub struct EndStrategy;

impl super::CommandStrategy for EndStrategy {
    type Input = EndInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let controller = input.connection.controller()?;
        controller.select(input.id).await?;

        let outcome = controller
            .end_conversation(|conversation| {
                input.assume_yes
                    || confirm(&format!("End conversation \"{}\"?", conversation.title))
                        .unwrap_or_else(|e| {
                            warn!("Could not read confirmation: {e}");
                            false
                        })
            })
            .await?;

        match outcome {
            EndOutcome::Ended { summary } | EndOutcome::Detached { summary } => {
                println!("Conversation #{} ended.", input.id);
                print_summary(summary.as_deref());
            }
            EndOutcome::Declined => println!("Cancelled."),
            EndOutcome::Skipped => println!("Conversation #{} has already ended.", input.id),
        }
        Ok(())
    }
}
