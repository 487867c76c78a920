//! Discord implementation of [`Notifier`] over the REST API.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serenity::all::ButtonStyle;
use serenity::all::Channel;
use serenity::all::ChannelId;
use serenity::all::ChannelType;
use serenity::all::CreateActionRow;
use serenity::all::CreateAttachment;
use serenity::all::CreateButton;
use serenity::all::CreateEmbed;
use serenity::all::CreateEmbedAuthor;
use serenity::all::CreateMessage;
use serenity::all::EditRole;
use serenity::all::GuildId;
use serenity::all::Http;
use serenity::all::RoleId;
use serenity::all::UserId;
use tokio::sync::OnceCell;

use crate::subscriber::ButtonKind;
use crate::subscriber::Embed;
use crate::subscriber::Notifier;
use crate::subscriber::NotifyError;
use crate::subscriber::OutgoingMessage;

const MEMBERS_PAGE: u64 = 1000;
const AUDIT_REASON: &str = "Feed notification role sync";

pub struct DiscordNotifier {
    http: Arc<Http>,
    bot_id: OnceCell<u64>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self {
            http,
            bot_id: OnceCell::new(),
        }
    }
}

/// Deleted targets and targets the bot lost access to.
fn is_missing(error: &serenity::Error) -> bool {
    match error {
        serenity::Error::Http(http_error) => matches!(
            http_error.status_code().map(|s| s.as_u16()),
            Some(403) | Some(404)
        ),
        _ => false,
    }
}

fn build_embed(embed: &Embed) -> CreateEmbed {
    let mut builder = CreateEmbed::new();
    if let Some(title) = &embed.title {
        builder = builder.title(title.clone());
    }
    if let Some(url) = &embed.url {
        builder = builder.url(url.clone());
    }
    if let Some(description) = &embed.description {
        builder = builder.description(description.clone());
    }
    if let Some(color) = embed.color {
        builder = builder.colour(color);
    }
    if let Some(image_url) = &embed.image_url {
        builder = builder.image(image_url.clone());
    }
    if let Some(name) = &embed.author_name {
        let mut author = CreateEmbedAuthor::new(name.clone());
        if let Some(url) = &embed.author_url {
            author = author.url(url.clone());
        }
        builder = builder.author(author);
    }
    builder
}

fn build_message(message: &OutgoingMessage) -> CreateMessage {
    let mut builder = CreateMessage::new();
    if let Some(content) = &message.content {
        builder = builder.content(content.clone());
    }
    if let Some(embed) = &message.embed {
        builder = builder.embed(build_embed(embed));
    }
    if let Some(attachment) = &message.attachment {
        builder = builder.add_file(CreateAttachment::bytes(
            attachment.bytes.clone(),
            attachment.filename.clone(),
        ));
    }
    if !message.buttons.is_empty() {
        let buttons = message
            .buttons
            .iter()
            .map(|b| {
                let style = match b.kind {
                    ButtonKind::Primary => ButtonStyle::Primary,
                    ButtonKind::Danger => ButtonStyle::Danger,
                };
                CreateButton::new(b.custom_id.clone())
                    .label(b.label.clone())
                    .style(style)
            })
            .collect();
        builder = builder.components(vec![CreateActionRow::Buttons(buttons)]);
    }
    builder
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn bot_user_id(&self) -> Result<u64, NotifyError> {
        let id = self
            .bot_id
            .get_or_try_init(|| async {
                let user = self.http.get_current_user().await?;
                Ok::<_, NotifyError>(user.id.get())
            })
            .await?;
        Ok(*id)
    }

    async fn resolve_channel(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<Option<u64>, NotifyError> {
        let guild_id = GuildId::new(guild_id);
        match guild_id.to_partial_guild(&self.http).await {
            Ok(_) => {}
            Err(e) if is_missing(&e) => {
                debug!("Guild {guild_id} is unreachable: {e}");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }

        let channel = match ChannelId::new(channel_id).to_channel(&self.http).await {
            Ok(channel) => channel,
            Err(e) if is_missing(&e) => {
                debug!("Channel {channel_id} is unreachable: {e}");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let Channel::Guild(channel) = channel else {
            return Ok(None);
        };
        if channel.guild_id != guild_id {
            return Ok(None);
        }
        match channel.kind {
            ChannelType::Text
            | ChannelType::News
            | ChannelType::PublicThread
            | ChannelType::PrivateThread
            | ChannelType::NewsThread => Ok(Some(channel.id.get())),
            _ => Ok(None),
        }
    }

    async fn ensure_role(&self, guild_id: u64, name: &str) -> Result<u64, NotifyError> {
        let guild_id = GuildId::new(guild_id);
        let roles = guild_id.roles(&self.http).await?;
        if let Some(role) = roles.values().find(|r| r.name == name) {
            return Ok(role.id.get());
        }

        debug!("Creating role `{name}` in guild {guild_id}");
        let role = guild_id
            .create_role(&self.http, EditRole::new().name(name).mentionable(true))
            .await?;
        Ok(role.id.get())
    }

    async fn role_members(&self, guild_id: u64, role_id: u64) -> Result<Vec<u64>, NotifyError> {
        let guild_id = GuildId::new(guild_id);
        let role_id = RoleId::new(role_id);
        let mut holders = Vec::new();
        let mut after: Option<UserId> = None;

        loop {
            let page = guild_id
                .members(&self.http, Some(MEMBERS_PAGE), after)
                .await?;
            let page_len = page.len() as u64;
            after = page.last().map(|m| m.user.id);
            holders.extend(
                page.iter()
                    .filter(|m| m.roles.contains(&role_id))
                    .map(|m| m.user.id.get()),
            );
            if page_len < MEMBERS_PAGE {
                return Ok(holders);
            }
        }
    }

    async fn add_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), NotifyError> {
        self.http
            .add_member_role(
                GuildId::new(guild_id),
                UserId::new(user_id),
                RoleId::new(role_id),
                Some(AUDIT_REASON),
            )
            .await?;
        Ok(())
    }

    async fn remove_role(
        &self,
        guild_id: u64,
        user_id: u64,
        role_id: u64,
    ) -> Result<(), NotifyError> {
        self.http
            .remove_member_role(
                GuildId::new(guild_id),
                UserId::new(user_id),
                RoleId::new(role_id),
                Some(AUDIT_REASON),
            )
            .await?;
        Ok(())
    }

    async fn send_message(
        &self,
        channel_id: u64,
        message: &OutgoingMessage,
    ) -> Result<(), NotifyError> {
        ChannelId::new(channel_id)
            .send_message(&self.http, build_message(message))
            .await?;
        Ok(())
    }

    async fn user_exists(&self, user_id: u64) -> Result<bool, NotifyError> {
        match UserId::new(user_id).to_user(&self.http).await {
            Ok(_) => Ok(true),
            Err(e) if is_missing(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn send_dm(&self, user_id: u64, message: &OutgoingMessage) -> Result<(), NotifyError> {
        let channel = UserId::new(user_id).create_dm_channel(&self.http).await?;
        channel
            .id
            .send_message(&self.http, build_message(message))
            .await?;
        Ok(())
    }
}
