//! Weekly countdowns and their success/failure gifs.

use poise::Command;
use poise::CreateReply;
use serenity::all::CreateEmbed;

use crate::bot::Data;
use crate::bot::checks;
use crate::bot::commands::Cog;
use crate::bot::commands::Context;
use crate::bot::commands::Error;
use crate::model::GifKind;
use crate::service::weekly_service::format_gif_list;
use crate::service::weekly_service::format_weekly_list;
use crate::subscriber::message_builder::GREEN;
use crate::subscriber::message_builder::RED;

pub struct WeeklyCog;

impl WeeklyCog {
    /// Handles weekly countdowns.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands(
            "Self::create",
            "Self::delete",
            "Self::lookup",
            "Self::list",
            "Self::success",
            "Self::failure"
        )
    )]
    pub async fn weekly(_ctx: Context<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Create a weekly countdown.
    #[poise::command(slash_command, guild_only)]
    pub async fn create(
        ctx: Context<'_>,
        #[description = "The lookup that will be provided to get this weekly countdown."]
        lookup: String,
        #[description = "The timestamp to count down to. (use /countdown timestamp to get one)"]
        timestamp: i64,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let lookup = ctx
            .data()
            .services
            .weekly
            .create(&caller, &lookup, timestamp)
            .await?;
        ctx.say(format!(
            "Weekly created. Lookup: `{lookup}`, Timestamp: <t:{timestamp}>"
        ))
        .await?;
        Ok(())
    }

    /// Delete a weekly countdown.
    #[poise::command(slash_command, guild_only)]
    pub async fn delete(
        ctx: Context<'_>,
        #[description = "The lookup for the weekly countdown."] lookup: String,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let lookup = ctx.data().services.weekly.delete(&caller, &lookup).await?;
        ctx.say(format!("Weekly countdown {lookup} deleted.")).await?;
        Ok(())
    }

    /// Get a weekly countdown.
    #[poise::command(slash_command, guild_only)]
    pub async fn lookup(
        ctx: Context<'_>,
        #[description = "The lookup for the weekly countdown."] lookup: String,
    ) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let view = ctx
            .data()
            .services
            .weekly
            .lookup(caller.guild_id, &lookup)
            .await?;

        let mut embed = CreateEmbed::new()
            .title(view.title)
            .description(view.description)
            .colour(if view.on_day { GREEN } else { RED });
        if let Some(gif) = view.gif {
            embed = embed.image(gif);
        }
        ctx.send(CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// List all the weekly countdowns for this server.
    #[poise::command(slash_command, guild_only)]
    pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
        let caller = checks::caller(ctx).await?;
        let weeklies = ctx.data().services.weekly.list(caller.guild_id).await?;

        match format_weekly_list(&weeklies) {
            Some(description) => {
                let embed = CreateEmbed::new()
                    .title("Weekly Countdowns")
                    .description(description)
                    .colour(GREEN);
                ctx.send(CreateReply::default().embed(embed)).await?;
            }
            None => {
                ctx.say("No countdowns for this server.").await?;
            }
        }
        Ok(())
    }

    /// Handles success gifs for a weekly countdown.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands("Self::success_add", "Self::success_list", "Self::success_remove")
    )]
    pub async fn success(_ctx: Context<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Add a success gif to a countdown.
    #[poise::command(slash_command, guild_only, rename = "add")]
    pub async fn success_add(
        ctx: Context<'_>,
        #[description = "The lookup for the weekly countdown."] lookup: String,
        #[description = "The URL of the success gif."] url: String,
    ) -> Result<(), Error> {
        add_gif(ctx, GifKind::Success, lookup, url).await
    }

    /// List success gifs for a countdown.
    #[poise::command(slash_command, guild_only, rename = "list")]
    pub async fn success_list(
        ctx: Context<'_>,
        #[description = "The lookup for the weekly countdown."] lookup: String,
    ) -> Result<(), Error> {
        list_gifs(ctx, GifKind::Success, lookup).await
    }

    /// Remove a success gif from a countdown.
    #[poise::command(slash_command, guild_only, rename = "remove")]
    pub async fn success_remove(
        ctx: Context<'_>,
        #[description = "The lookup for the weekly countdown."] lookup: String,
        #[description = "The URL of the success gif."] url: String,
    ) -> Result<(), Error> {
        remove_gif(ctx, GifKind::Success, lookup, url).await
    }

    /// Handles failure gifs for a weekly countdown.
    #[poise::command(
        slash_command,
        guild_only,
        subcommands("Self::failure_add", "Self::failure_list", "Self::failure_remove")
    )]
    pub async fn failure(_ctx: Context<'_>) -> Result<(), Error> {
        Ok(())
    }

    /// Add a failure gif to a countdown.
    #[poise::command(slash_command, guild_only, rename = "add")]
    pub async fn failure_add(
        ctx: Context<'_>,
        #[description = "The lookup for the weekly countdown."] lookup: String,
        #[description = "The URL of the failure gif."] url: String,
    ) -> Result<(), Error> {
        add_gif(ctx, GifKind::Failure, lookup, url).await
    }

    /// List failure gifs for a countdown.
    #[poise::command(slash_command, guild_only, rename = "list")]
    pub async fn failure_list(
        ctx: Context<'_>,
        #[description = "The lookup for the weekly countdown."] lookup: String,
    ) -> Result<(), Error> {
        list_gifs(ctx, GifKind::Failure, lookup).await
    }

    /// Remove a failure gif from a countdown.
    #[poise::command(slash_command, guild_only, rename = "remove")]
    pub async fn failure_remove(
        ctx: Context<'_>,
        #[description = "The lookup for the weekly countdown."] lookup: String,
        #[description = "The URL of the failure gif."] url: String,
    ) -> Result<(), Error> {
        remove_gif(ctx, GifKind::Failure, lookup, url).await
    }
}

async fn add_gif(ctx: Context<'_>, kind: GifKind, lookup: String, url: String) -> Result<(), Error> {
    let caller = checks::caller(ctx).await?;
    let lookup = ctx
        .data()
        .services
        .weekly
        .add_gif(&caller, &lookup, kind, &url)
        .await?;
    ctx.say(format!("{} gif added to countdown `{lookup}`.", kind.label()))
        .await?;
    Ok(())
}

async fn list_gifs(ctx: Context<'_>, kind: GifKind, lookup: String) -> Result<(), Error> {
    let caller = checks::caller(ctx).await?;
    let urls = ctx
        .data()
        .services
        .weekly
        .list_gifs(caller.guild_id, &lookup, kind)
        .await?;
    ctx.say(format_gif_list(kind, &urls)).await?;
    Ok(())
}

async fn remove_gif(
    ctx: Context<'_>,
    kind: GifKind,
    lookup: String,
    url: String,
) -> Result<(), Error> {
    let caller = checks::caller(ctx).await?;
    let lookup = ctx
        .data()
        .services
        .weekly
        .remove_gif(&caller, &lookup, kind, &url)
        .await?;
    ctx.say(format!(
        "{} gif removed from countdown `{lookup}`.",
        kind.label()
    ))
    .await?;
    Ok(())
}

impl Cog for WeeklyCog {
    fn commands(&self) -> Vec<Command<Data, Error>> {
        vec![Self::weekly()]
    }
}
