use super::Connection;

/// Strategy for starting a conversation. Without a title, one is derived
/// from the current date and time.
#[derive(Debug, Clone, Copy)]
pub struct NewStrategy;

impl super::CommandStrategy for NewStrategy {
    type Input = (Connection, Option<String>);

    async fn execute(&self, (connection, title): Self::Input) -> anyhow::Result<()> {
        let controller = connection.controller()?;
        let conversation = controller
            .create_conversation(title.as_deref().unwrap_or_default())
            .await?;

        println!("Created conversation #{}: {}", conversation.id, conversation.title);
        Ok(())
    }
}
