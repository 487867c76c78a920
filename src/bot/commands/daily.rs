//! Per-user daily reminders.

use poise::Command;
use poise::CreateReply;

use crate::bot::Data;
use crate::bot::commands::Cog;
use crate::bot::commands::Context;
use crate::bot::commands::Error;

pub struct DailyCog;

impl DailyCog {
    /// Commands to manage your daily reminder.
    #[poise::command(slash_command, subcommands("Self::create", "Self::delete"))]
    pub async fn daily(_ctx: Context<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Add a daily counter
    ///
    /// Pings you every 24 hours, starting from when this command is ran.
    #[poise::command(slash_command)]
    pub async fn create(
        ctx: Context<'_>,
        #[description = "Message to include in each reminder"] message: Option<String>,
    ) -> Result<(), Error> {
        ctx.data()
            .services
            .daily
            .create(ctx.author().id.get(), message)
            .await?;
        ctx.send(
            CreateReply::default()
                .content("Daily counter added.")
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Remove your daily counter.
    #[poise::command(slash_command)]
    pub async fn delete(ctx: Context<'_>) -> Result<(), Error> {
        ctx.data()
            .services
            .daily
            .delete(ctx.author().id.get())
            .await?;
        ctx.send(
            CreateReply::default()
                .content("Daily counter removed.")
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }
}

impl Cog for DailyCog {
    fn commands(&self) -> Vec<Command<Data, Error>> {
        vec![Self::daily()]
    }
}
