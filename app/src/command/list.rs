use super::Connection;
use crate::display::print_catalog;

/// Strategy for listing known conversations, most recent first.
#[derive(Debug, Clone, Copy)]
pub struct ListStrategy;

impl super::CommandStrategy for ListStrategy {
    type Input = Connection;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let controller = input.controller()?;
        let listing = controller.catalog().list(controller.api()).await?;
        print_catalog(&listing.entries);
        Ok(())
    }
}
