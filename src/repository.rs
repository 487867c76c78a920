//! Record store backed by SQLite through SQLx.

use std::str::FromStr;

use log::debug;
use log::info;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;

use crate::repository::table::ClubMemberTable;
use crate::repository::table::ClubTable;
use crate::repository::table::CountdownImageTable;
use crate::repository::table::CountdownTable;
use crate::repository::table::DailyTable;
use crate::repository::table::FollowerTable;
use crate::repository::table::JNovelTable;
use crate::repository::table::MangaTable;
use crate::repository::table::NyaaTable;
use crate::repository::table::TableBase;
use crate::repository::table::WeeklyGifTable;
use crate::repository::table::WeeklyTable;

pub mod error;
pub mod table;

/// Main repository struct containing all table handlers.
pub struct Repository {
    pool: SqlitePool,
    pub club: ClubTable,
    pub club_member: ClubMemberTable,
    pub countdown: CountdownTable,
    pub countdown_image: CountdownImageTable,
    pub weekly: WeeklyTable,
    pub weekly_gif: WeeklyGifTable,
    pub daily: DailyTable,
    pub nyaa: NyaaTable,
    pub nyaa_follower: FollowerTable,
    pub manga: MangaTable,
    pub manga_follower: FollowerTable,
    pub jnovel: JNovelTable,
    pub jnovel_follower: FollowerTable,
}

impl Repository {
    /// Opens the database file, creating it if missing.
    pub async fn new(db_url: &str, db_path: &str) -> anyhow::Result<Self> {
        let path = std::path::Path::new(db_path);
        if !path.exists() {
            debug!("Database path {db_path} does not exist. Creating...");
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, "")?;
            info!("Created {db_path}");
        }

        debug!("Connecting to db...");
        let opts = SqliteConnectOptions::from_str(db_url)?.foreign_keys(true);
        let pool = SqlitePool::connect_with(opts).await?;
        info!("Connected to db.");

        Ok(Self {
            club: ClubTable::new(pool.clone()),
            club_member: ClubMemberTable::new(pool.clone()),
            countdown: CountdownTable::new(pool.clone()),
            countdown_image: CountdownImageTable::new(pool.clone()),
            weekly: WeeklyTable::new(pool.clone()),
            weekly_gif: WeeklyGifTable::new(pool.clone()),
            daily: DailyTable::new(pool.clone()),
            nyaa: NyaaTable::new(pool.clone()),
            nyaa_follower: FollowerTable::new(pool.clone(), "nyaa_followers"),
            manga: MangaTable::new(pool.clone()),
            manga_follower: FollowerTable::new(pool.clone(), "manga_followers"),
            jnovel: JNovelTable::new(pool.clone()),
            jnovel_follower: FollowerTable::new(pool.clone(), "jnovel_followers"),
            pool,
        })
    }

    /// Runs database migrations from the migrations directory.
    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Deletes all data from all tables. Use with caution!
    pub async fn delete_all_tables(&self) -> anyhow::Result<()> {
        self.nyaa_follower.delete_all().await?;
        self.manga_follower.delete_all().await?;
        self.jnovel_follower.delete_all().await?;
        self.club_member.delete_all().await?;
        self.countdown_image.delete_all().await?;
        self.weekly_gif.delete_all().await?;
        self.club.delete_all().await?;
        self.countdown.delete_all().await?;
        self.weekly.delete_all().await?;
        self.daily.delete_all().await?;
        self.nyaa.delete_all().await?;
        self.manga.delete_all().await?;
        self.jnovel.delete_all().await?;
        Ok(())
    }
}
