//! Slash command cogs.

use poise::Command;

use crate::bot::Data;
use crate::bot::commands::club::ClubCog;
use crate::bot::commands::countdown::CountdownCog;
use crate::bot::commands::daily::DailyCog;
use crate::bot::commands::jnovel::JNovelCog;
use crate::bot::commands::mangadex::MangaDexCog;
use crate::bot::commands::nyaa::NyaaCog;
use crate::bot::commands::owner::OwnerCog;
use crate::bot::commands::weekly::WeeklyCog;
use crate::config::Features;

pub mod club;
pub mod countdown;
pub mod daily;
pub mod jnovel;
pub mod mangadex;
pub mod nyaa;
pub mod owner;
pub mod weekly;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// A group of commands registered together.
pub trait Cog {
    fn commands(&self) -> Vec<Command<Data, Error>>;
}

/// Every cog enabled by the configured features.
pub struct Cogs<'a>(pub &'a Features);

impl Cog for Cogs<'_> {
    fn commands(&self) -> Vec<Command<Data, Error>> {
        let daily = if self.0.daily {
            DailyCog.commands()
        } else {
            Vec::new()
        };
        ClubCog
            .commands()
            .into_iter()
            .chain(CountdownCog.commands())
            .chain(WeeklyCog.commands())
            .chain(daily)
            .chain(NyaaCog.commands())
            .chain(MangaDexCog.commands())
            .chain(JNovelCog.commands())
            .chain(OwnerCog.commands())
            .collect()
    }
}
