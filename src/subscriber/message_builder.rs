//! Renders feed items and reminders into [`OutgoingMessage`]s.

use crate::feed::mangadex_platform::Chapter;
use crate::feed::mangadex_platform::MangaDexPlatform;
use crate::feed::nyaa_platform::TorrentItem;
use crate::feed::syndication::SyndicationEntry;
use crate::model::MangaModel;
use crate::subscriber::Attachment;
use crate::subscriber::Button;
use crate::subscriber::ButtonKind;
use crate::subscriber::EmbedBuilder;
use crate::subscriber::NotifyError;
use crate::subscriber::OutgoingMessage;

pub const BLURPLE: u32 = 0x5865F2;
pub const GREEN: u32 = 0x2ECC71;
pub const RED: u32 = 0xE74C3C;
pub const COVER_FILENAME: &str = "cover.png";

pub const DAILY_DONE_PREFIX: &str = "daily:done:";
pub const DAILY_CANCEL_PREFIX: &str = "daily:cancel:";

fn with_mention(mention: &str, text: String) -> String {
    if mention.is_empty() {
        text
    } else {
        format!("{mention} {text}")
    }
}

pub fn torrent_message(
    mention: &str,
    name: &str,
    item: &TorrentItem,
) -> Result<OutgoingMessage, NotifyError> {
    let description = format!(
        "[Download Torrent]({})\nMagnet Link (Copy paste):\n{}\n\n**Name:** {}\n**Category:** {}\n**Size:** {}",
        item.link,
        item.magnet_link(),
        name,
        item.category,
        item.size
    );
    let embed = EmbedBuilder::default()
        .title(item.title.clone())
        .url(item.id.clone())
        .description(description)
        .build()?;

    Ok(OutgoingMessage {
        content: Some(with_mention(
            mention,
            format!("New seed has been posted for {name}"),
        )),
        embed: Some(embed),
        ..Default::default()
    })
}

/// `"{title} [Volume v][Chapter c]"`, falling back to the manga title when
/// the chapter is untitled.
pub fn chapter_title(manga_title: &str, chapter: &Chapter) -> String {
    let mut title = chapter.title.as_deref().unwrap_or(manga_title).to_string();
    title.push(' ');
    if let Some(volume) = &chapter.volume {
        title.push_str(&format!("[Volume {volume}]"));
    }
    if let Some(number) = &chapter.chapter {
        title.push_str(&format!("[Chapter {number}]"));
    }
    title.trim_end().to_string()
}

/// The cover, when present, is attached and shown as the embed image.
pub fn chapter_message(
    mention: &str,
    manga: &MangaModel,
    chapter: &Chapter,
    cover: Option<&[u8]>,
) -> Result<OutgoingMessage, NotifyError> {
    let mut embed = EmbedBuilder::default();
    embed
        .title(chapter_title(&manga.title, chapter))
        .description(manga.description.clone())
        .url(MangaDexPlatform::chapter_url(&chapter.id))
        .author_name(manga.title.clone())
        .author_url(MangaDexPlatform::title_url(&manga.mangadex_id));

    let attachment = cover.map(|bytes| {
        embed.image_url(format!("attachment://{COVER_FILENAME}"));
        Attachment {
            filename: COVER_FILENAME.to_string(),
            bytes: bytes.to_vec(),
        }
    });

    Ok(OutgoingMessage {
        content: Some(with_mention(
            mention,
            format!("New chapter of {} is out!", manga.title),
        )),
        embed: Some(embed.build()?),
        attachment,
        ..Default::default()
    })
}

pub fn novel_message(
    mention: &str,
    series_title: &str,
    entry: &SyndicationEntry,
) -> Result<OutgoingMessage, NotifyError> {
    let mut embed = EmbedBuilder::default();
    embed
        .title(entry.title.clone())
        .url(entry.link.clone())
        .color(BLURPLE);
    if let Some(cover) = &entry.enclosure {
        embed.image_url(cover.clone());
    }

    Ok(OutgoingMessage {
        content: Some(with_mention(
            mention,
            format!("New part of {series_title} is out!"),
        )),
        embed: Some(embed.build()?),
        ..Default::default()
    })
}

/// Direct message carrying the acknowledge and cancel buttons.
pub fn daily_reminder_message(user_id: u64, message: Option<&str>) -> OutgoingMessage {
    let content = format!(
        "Daily reminder! {}\n\nPress Done once you have completed your daily tasks, and are ready to be notified again in 24 hours.\nIf you wish to cancel your daily counter, press Cancel.",
        message.unwrap_or_default()
    );
    OutgoingMessage {
        content: Some(content),
        buttons: vec![
            Button {
                custom_id: format!("{DAILY_DONE_PREFIX}{user_id}"),
                label: "Done".to_string(),
                kind: ButtonKind::Primary,
            },
            Button {
                custom_id: format!("{DAILY_CANCEL_PREFIX}{user_id}"),
                label: "Cancel".to_string(),
                kind: ButtonKind::Danger,
            },
        ],
        ..Default::default()
    }
}
