use anyhow::Context;
use colloquy_core::ConversationId;

use super::Connection;
use crate::display::print_conversation;

/// Strategy for printing one conversation with its messages and summary.
#[derive(Debug, Clone, Copy)]
pub struct ShowStrategy;

impl super::CommandStrategy for ShowStrategy {
    type Input = (Connection, ConversationId);

    async fn execute(&self, (connection, id): Self::Input) -> anyhow::Result<()> {
        let controller = connection.controller()?;
        controller.select(id).await?;

        let view = controller.session().snapshot();
        let conversation = view
            .conversation()
            .with_context(|| format!("conversation {id} is not loaded"))?;
        print_conversation(conversation);
        Ok(())
    }
}
