//! Owner-only commands for bot administration.

use poise::Command;

use crate::bot::Data;
use crate::bot::commands::Cog;
use crate::bot::commands::Context;
use crate::bot::commands::Error;

/// Cog of bot owners-only commands.
pub struct OwnerCog;

impl OwnerCog {
    /// Register application commands (owner only)
    ///
    /// Opens a dialog to register global or guild application commands.
    #[poise::command(prefix_command, owners_only, hide_in_help)]
    pub async fn register_owner(ctx: Context<'_>) -> Result<(), Error> {
        poise::builtins::register_application_commands_buttons(ctx).await?;
        Ok(())
    }
}

impl Cog for OwnerCog {
    fn commands(&self) -> Vec<Command<Data, Error>> {
        vec![Self::register_owner()]
    }
}
