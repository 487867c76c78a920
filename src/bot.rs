//! Discord bot implementation and command handling.

pub mod checks;
pub mod commands;
pub mod error;
pub mod error_handler;
pub mod views;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use anyhow::anyhow;
use futures::lock::Mutex;
use log::error;
use log::info;
use log::warn;
use poise::Framework;
use poise::FrameworkOptions;
use poise::serenity_prelude as serenity;
use serenity::ClientBuilder;
use serenity::ComponentInteraction;
use serenity::CreateInteractionResponse;
use serenity::CreateInteractionResponseMessage;
use serenity::FullEvent;
use serenity::GatewayIntents;
use serenity::GuildId;
use serenity::Interaction;
use serenity::ShardManager;
use serenity::UserId;

use crate::bot::commands::Cog;
use crate::bot::commands::Cogs;
use crate::bot::error_handler::ErrorHandler;
use crate::config::Config;
use crate::service::Services;
use crate::subscriber::message_builder::DAILY_CANCEL_PREFIX;
use crate::subscriber::message_builder::DAILY_DONE_PREFIX;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Data shared across bot commands and contexts.
pub struct Data {
    pub config: Arc<Config>,
    pub services: Arc<Services>,
}

/// Discord bot client and framework.
pub struct Bot {
    client_builder: Option<ClientBuilder>,
    shard_manager: Arc<Mutex<Option<Arc<ShardManager>>>>,
}

impl Bot {
    /// Creates a new bot instance with all required components.
    pub fn new(config: Arc<Config>, services: Arc<Services>) -> Self {
        info!("Initializing bot...");

        let intents = GatewayIntents::non_privileged()
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::MESSAGE_CONTENT;
        let data = Data {
            config: config.clone(),
            services,
        };
        let framework = Self::create_framework(&config, data);
        let client_builder = ClientBuilder::new(&config.discord_token, intents).framework(framework);

        Self {
            client_builder: Some(client_builder),
            shard_manager: Arc::new(Mutex::new(None)),
        }
    }

    /// Starts the bot client in a background task.
    pub fn start(&mut self) -> Result<()> {
        info!("Starting bot client...");
        let client_builder = self
            .client_builder
            .take()
            .ok_or_else(|| anyhow!("Bot client already started"))?;
        let shard_manager = self.shard_manager.clone();

        tokio::spawn(async move {
            info!("Connecting bot to Discord...");
            let mut client = match client_builder.await {
                Ok(client) => client,
                Err(e) => {
                    error!("Failed to build Discord client: {}", e);
                    return;
                }
            };

            *shard_manager.lock().await = Some(client.shard_manager.clone());
            info!("Bot connected to Discord.");

            if let Err(e) = client.start().await {
                error!("Bot client stopped: {}", e);
            }
        });

        Ok(())
    }

    /// Disconnects every shard.
    pub async fn shutdown(&self) {
        if let Some(shard_manager) = self.shard_manager.lock().await.as_ref() {
            shard_manager.shutdown_all().await;
        }
    }

    /// Creates the Poise framework with commands and configuration.
    fn create_framework(config: &Config, data: Data) -> Framework<Data, Error> {
        let options = FrameworkOptions::<Data, Error> {
            commands: Cogs(&config.features).commands(),
            on_error: |error| Box::pin(ErrorHandler::handle(error)),
            event_handler: |ctx, event, _framework, data| {
                Box::pin(Self::handle_event(ctx, event, data))
            },
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("!".into()),
                edit_tracker: Some(Arc::new(poise::EditTracker::for_timespan(
                    Duration::from_secs(3600),
                ))),
                ..Default::default()
            },
            owners: config.admin_id.map(UserId::new).into_iter().collect::<HashSet<_>>(),
            ..Default::default()
        };

        let test_guild_id = config.test_guild_id;
        poise::Framework::builder()
            .options(options)
            .setup(move |ctx, ready, framework| {
                Box::pin(async move {
                    info!("Logged in as {}", ready.user.name);
                    let commands = &framework.options().commands;
                    match test_guild_id {
                        Some(guild_id) => {
                            info!("Registering commands in test guild {}", guild_id);
                            poise::builtins::register_in_guild(ctx, commands, GuildId::new(guild_id))
                                .await?;
                        }
                        None => poise::builtins::register_globally(ctx, commands).await?,
                    }
                    Ok(data)
                })
            })
            .build()
    }

    async fn handle_event(
        ctx: &serenity::Context,
        event: &FullEvent,
        data: &Data,
    ) -> Result<(), Error> {
        match event {
            FullEvent::Ready { data_about_bot } => {
                info!(
                    "Bot is ready in {} guilds.",
                    data_about_bot.guilds.len()
                );
            }
            FullEvent::InteractionCreate {
                interaction: Interaction::Component(component),
            } => {
                if let Some(button) = DailyButton::parse(&component.data.custom_id)
                    && data.config.features.daily
                {
                    Self::handle_daily_button(ctx, component, button, data).await?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Answers the Done/Cancel buttons of a daily reminder DM. These outlive
    /// any collector, so they are dispatched from the gateway event.
    async fn handle_daily_button(
        ctx: &serenity::Context,
        component: &ComponentInteraction,
        button: DailyButton,
        data: &Data,
    ) -> Result<(), Error> {
        let content = if component.user.id.get() != button.user_id() {
            "This reminder is not yours.".to_string()
        } else {
            let daily = &data.services.daily;
            let outcome = match button {
                DailyButton::Done(user_id) => daily
                    .acknowledge(user_id)
                    .await
                    .map(|_| "You will receive another daily reminder in 24 hours"),
                DailyButton::Cancel(user_id) => daily
                    .cancel(user_id)
                    .await
                    .map(|_| "Daily counter has been cancelled."),
            };
            match outcome {
                Ok(content) => content.to_string(),
                Err(e) if e.is_validation() => e.to_string(),
                Err(e) => {
                    warn!("Failed to handle daily button {:?}: {}", button, e);
                    "Something went wrong, please try again later.".to_string()
                }
            }
        };

        component
            .create_response(
                &ctx.http,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new().content(content),
                ),
            )
            .await?;
        Ok(())
    }
}

/// A daily reminder button, keyed by the reminder's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyButton {
    Done(u64),
    Cancel(u64),
}

impl DailyButton {
    pub fn parse(custom_id: &str) -> Option<Self> {
        if let Some(user_id) = custom_id.strip_prefix(DAILY_DONE_PREFIX) {
            return user_id.parse().ok().map(DailyButton::Done);
        }
        if let Some(user_id) = custom_id.strip_prefix(DAILY_CANCEL_PREFIX) {
            return user_id.parse().ok().map(DailyButton::Cancel);
        }
        None
    }

    pub fn user_id(&self) -> u64 {
        match self {
            DailyButton::Done(user_id) | DailyButton::Cancel(user_id) => *user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_button_parse() {
        assert_eq!(DailyButton::parse("daily:done:42"), Some(DailyButton::Done(42)));
        assert_eq!(
            DailyButton::parse("daily:cancel:7"),
            Some(DailyButton::Cancel(7))
        );
        assert_eq!(DailyButton::parse("daily:done:abc"), None);
        assert_eq!(DailyButton::parse("notifications:next"), None);
    }

    #[test]
    fn test_daily_button_user_id() {
        assert_eq!(DailyButton::Cancel(9).user_id(), 9);
    }
}
