//! Guild wide countdowns.

use poise::Command;
use poise::CreateReply;
use serenity::all::CreateEmbed;

use crate::bot::Data;
use crate::bot::checks;
use crate::bot::commands::Cog;
use crate::bot::commands::Context;
use crate::bot::commands::Error;
use crate::service::countdown_service::TIMESTAMP_HELPER_URL;
use crate::service::countdown_service::format_countdown_list;
use crate::subscriber::message_builder::GREEN;

pub struct CountdownCog;

impl CountdownCog {
    /// Commands to manage guild wide countdowns.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands(
            "Self::timestamp",
            "Self::add",
            "Self::remove",
            "Self::lookup",
            "Self::list",
            "Self::image_add",
            "Self::image_remove"
        )
    )]
    pub async fn countdown(_ctx: Context<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Get the website to get a timestamp.
    #[poise::command(slash_command)]
    pub async fn timestamp(ctx: Context<'_>) -> Result<(), Error> {
        ctx.say(TIMESTAMP_HELPER_URL).await?;
        Ok(())
    }

    /// Add a countdown to the server.
    #[poise::command(slash_command, guild_only)]
    pub async fn add(
        ctx: Context<'_>,
        #[description = "The name of the countdown."] name: String,
        #[description = "The date and time of the countdown as a Unix timestamp."]
        timestamp: i64,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let name = ctx
            .data()
            .services
            .countdown
            .add(&caller, &name, timestamp)
            .await?;
        ctx.send(
            CreateReply::default()
                .content(format!("Countdown `{name}` added."))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Remove a countdown from the server.
    #[poise::command(slash_command, guild_only)]
    pub async fn remove(
        ctx: Context<'_>,
        #[description = "The name of the countdown."] name: String,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let name = ctx.data().services.countdown.remove(&caller, &name).await?;
        ctx.send(
            CreateReply::default()
                .content(format!("Countdown `{name}` removed."))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Post a particular countdown.
    #[poise::command(slash_command, guild_only)]
    pub async fn lookup(
        ctx: Context<'_>,
        #[description = "The name of the countdown."] name: String,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let view = ctx
            .data()
            .services
            .countdown
            .lookup(caller.guild_id, &name)
            .await?;

        let mut embed = CreateEmbed::new()
            .title(view.title)
            .description(view.description)
            .colour(GREEN);
        if let Some(image) = view.image {
            embed = embed.image(image);
        }
        ctx.send(CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// List all countdowns.
    #[poise::command(slash_command, guild_only)]
    pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let countdowns = ctx.data().services.countdown.list(caller.guild_id).await?;

        let reply = match format_countdown_list(&countdowns) {
            Some(description) => CreateReply::default().embed(
                CreateEmbed::new()
                    .title("Countdowns")
                    .description(description)
                    .colour(GREEN),
            ),
            None => CreateReply::default()
                .content("There are no countdowns for this server.")
                .ephemeral(true),
        };
        ctx.send(reply).await?;
        Ok(())
    }

    /// Add an image to a countdown.
    #[poise::command(slash_command, guild_only)]
    pub async fn image_add(
        ctx: Context<'_>,
        #[description = "The name of the countdown."] name: String,
        #[description = "The URL of the image to add."] url: String,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let name = ctx
            .data()
            .services
            .countdown
            .add_image(&caller, &name, &url)
            .await?;
        ctx.send(
            CreateReply::default()
                .content(format!("Image {url} added to countdown `{name}`."))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }

    /// Remove an image from a countdown.
    #[poise::command(slash_command, guild_only)]
    pub async fn image_remove(
        ctx: Context<'_>,
        #[description = "The name of the countdown."] name: String,
        #[description = "The URL of the image to remove."] url: String,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let name = ctx
            .data()
            .services
            .countdown
            .remove_image(&caller, &name, &url)
            .await?;
        ctx.send(
            CreateReply::default()
                .content(format!("Image {url} removed from countdown `{name}`."))
                .ephemeral(true),
        )
        .await?;
        Ok(())
    }
}

impl Cog for CountdownCog {
    fn commands(&self) -> Vec<Command<Data, Error>> {
        vec![Self::countdown()]
    }
}
