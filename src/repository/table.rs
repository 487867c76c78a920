//! Table handlers over the SQLite pool.

use sqlx::SqlitePool;
use sqlx::sqlite::SqliteArguments;

use crate::model::ClubMemberModel;
use crate::model::ClubModel;
use crate::model::ClubSummary;
use crate::model::CountdownImageModel;
use crate::model::CountdownModel;
use crate::model::DailyModel;
use crate::model::GifKind;
use crate::model::JNovelModel;
use crate::model::MangaModel;
use crate::model::NyaaModel;
use crate::model::WeeklyGifModel;
use crate::model::WeeklyModel;
use crate::repository::error::DatabaseError;

/// Base table struct providing database pool access.
#[derive(Clone)]
pub struct BaseTable {
    pub pool: SqlitePool,
}

impl BaseTable {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Base trait for table operations.
#[async_trait::async_trait]
pub trait TableBase {
    /// Deletes all rows from the table.
    async fn delete_all(&self) -> Result<(), DatabaseError>;
}

/// Trait for tables with CRUD operations.
#[async_trait::async_trait]
pub trait Table<T, ID>: TableBase {
    async fn select_all(&self) -> Result<Vec<T>, DatabaseError>;
    async fn insert(&self, model: &T) -> Result<ID, DatabaseError>;
    async fn select(&self, id: &ID) -> Result<Option<T>, DatabaseError>;
    async fn update(&self, model: &T) -> Result<(), DatabaseError>;
    async fn delete(&self, id: &ID) -> Result<(), DatabaseError>;
}

/// Tables holding feed subscriptions with a watermark column named `latest`.
#[async_trait::async_trait]
pub trait SubscriptionTable<T>: Table<T, i64> {
    /// Moves the watermark from `expected` to `latest` in a single statement.
    ///
    /// Returns `false` when the row was deleted or its watermark changed
    /// since it was read.
    async fn compare_and_set_latest(
        &self,
        id: i64,
        expected: Option<&str>,
        latest: &str,
    ) -> Result<bool, DatabaseError>;

    async fn select_all_by_guild(&self, guild_id: u64) -> Result<Vec<T>, DatabaseError>;
}

/// Helper trait to handle binding parameters, especially for casting u64 to i64 for SQLite.
pub trait BindParam<'q> {
    fn bind_param<O>(
        self,
        query: sqlx::query::QueryAs<'q, sqlx::Sqlite, O, SqliteArguments<'q>>,
    ) -> sqlx::query::QueryAs<'q, sqlx::Sqlite, O, SqliteArguments<'q>>;
    fn bind_param_q(
        self,
        query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>;
}

macro_rules! impl_bind_param {
    ($t:ty) => {
        impl<'q> BindParam<'q> for $t {
            fn bind_param<O>(
                self,
                query: sqlx::query::QueryAs<'q, sqlx::Sqlite, O, SqliteArguments<'q>>,
            ) -> sqlx::query::QueryAs<'q, sqlx::Sqlite, O, SqliteArguments<'q>> {
                query.bind(self)
            }
            fn bind_param_q(
                self,
                query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
            ) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
                query.bind(self)
            }
        }
    };
}

impl_bind_param!(&'q i64);
impl_bind_param!(&'q String);
impl_bind_param!(&'q Option<String>);
impl_bind_param!(&'q GifKind);

// Snowflakes are stored as i64
impl<'q> BindParam<'q> for &'q u64 {
    fn bind_param<O>(
        self,
        query: sqlx::query::QueryAs<'q, sqlx::Sqlite, O, SqliteArguments<'q>>,
    ) -> sqlx::query::QueryAs<'q, sqlx::Sqlite, O, SqliteArguments<'q>> {
        query.bind(*self as i64)
    }
    fn bind_param_q(
        self,
        query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
    ) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
        query.bind(*self as i64)
    }
}

macro_rules! impl_table {
    (
        $struct_name:ident,
        $model:ty,
        $table:expr,
        $pk:ident,
        $cols:expr,
        $vals:expr,
        $update_set:expr,
        [ $( $field:ident ),+ ]
    ) => {
        #[derive(Clone)]
        pub struct $struct_name {
            base: BaseTable,
        }

        impl $struct_name {
            pub fn new(pool: SqlitePool) -> Self {
                Self {
                    base: BaseTable::new(pool),
                }
            }
        }

        #[async_trait::async_trait]
        impl TableBase for $struct_name {
            async fn delete_all(&self) -> Result<(), DatabaseError> {
                sqlx::query(concat!("DELETE FROM ", $table))
                    .execute(&self.base.pool)
                    .await?;
                Ok(())
            }
        }

        #[async_trait::async_trait]
        impl Table<$model, i64> for $struct_name {
            async fn select_all(&self) -> Result<Vec<$model>, DatabaseError> {
                Ok(sqlx::query_as::<_, $model>(concat!("SELECT * FROM ", $table, " ORDER BY id"))
                    .fetch_all(&self.base.pool)
                    .await?)
            }

            async fn select(&self, id: &i64) -> Result<Option<$model>, DatabaseError> {
                let query = sqlx::query_as::<_, $model>(concat!("SELECT * FROM ", $table, " WHERE ", stringify!($pk), " = ?"));
                let query = BindParam::bind_param(id, query);
                Ok(query.fetch_optional(&self.base.pool).await?)
            }

            async fn insert(&self, model: &$model) -> Result<i64, DatabaseError> {
                let mut query = sqlx::query_as(concat!(
                        "INSERT INTO ", $table, " (", $cols, ") VALUES (", $vals, ") RETURNING ", stringify!($pk)
                    ));

                $(
                    query = BindParam::bind_param(&model.$field, query);
                )+

                let row: (i64,) = query.fetch_one(&self.base.pool).await?;
                Ok(row.0)
            }

            async fn update(&self, model: &$model) -> Result<(), DatabaseError> {
                let mut query = sqlx::query(concat!(
                        "UPDATE ", $table, " SET ", $update_set, " WHERE ", stringify!($pk), " = ?"
                    ));

                $(
                    query = BindParam::bind_param_q(&model.$field, query);
                )+
                query = BindParam::bind_param_q(&model.$pk, query);

                query.execute(&self.base.pool).await?;
                Ok(())
            }

            async fn delete(&self, id: &i64) -> Result<(), DatabaseError> {
                let query = sqlx::query(concat!("DELETE FROM ", $table, " WHERE ", stringify!($pk), " = ?"));
                let query = BindParam::bind_param_q(id, query);
                query.execute(&self.base.pool).await?;
                Ok(())
            }
        }
    };
}

macro_rules! impl_subscription_table {
    ($struct_name:ident, $model:ty, $table:expr) => {
        #[async_trait::async_trait]
        impl SubscriptionTable<$model> for $struct_name {
            async fn compare_and_set_latest(
                &self,
                id: i64,
                expected: Option<&str>,
                latest: &str,
            ) -> Result<bool, DatabaseError> {
                let result = sqlx::query(concat!(
                    "UPDATE ", $table, " SET latest = ? WHERE id = ? AND latest IS ?"
                ))
                .bind(latest)
                .bind(id)
                .bind(expected)
                .execute(&self.base.pool)
                .await?;
                Ok(result.rows_affected() == 1)
            }

            async fn select_all_by_guild(&self, guild_id: u64) -> Result<Vec<$model>, DatabaseError> {
                Ok(sqlx::query_as::<_, $model>(concat!(
                    "SELECT * FROM ", $table, " WHERE guild_id = ? ORDER BY id"
                ))
                .bind(guild_id as i64)
                .fetch_all(&self.base.pool)
                .await?)
            }
        }
    };
}

// ============================================================================
// ClubTable
// ============================================================================

impl_table!(
    ClubTable,
    ClubModel,
    "clubs",
    id,
    "name, guild_id, creator_id",
    "?, ?, ?",
    "name = ?, guild_id = ?, creator_id = ?",
    [name, guild_id, creator_id]
);

impl ClubTable {
    pub async fn select_by_name(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<ClubModel>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, ClubModel>("SELECT * FROM clubs WHERE guild_id = ? AND name = ?")
                .bind(guild_id as i64)
                .bind(name)
                .fetch_optional(&self.base.pool)
                .await?,
        )
    }

    pub async fn select_summaries_by_guild(
        &self,
        guild_id: u64,
    ) -> Result<Vec<ClubSummary>, DatabaseError> {
        Ok(sqlx::query_as::<_, ClubSummary>(
            r#"
            SELECT c.name AS name, COUNT(m.id) AS members
            FROM clubs c
            LEFT JOIN club_members m ON m.club_id = c.id
            WHERE c.guild_id = ?
            GROUP BY c.id
            ORDER BY c.name
            "#,
        )
        .bind(guild_id as i64)
        .fetch_all(&self.base.pool)
        .await?)
    }
}

// ============================================================================
// ClubMemberTable
// ============================================================================

impl_table!(
    ClubMemberTable,
    ClubMemberModel,
    "club_members",
    id,
    "club_id, user_id",
    "?, ?",
    "club_id = ?, user_id = ?",
    [club_id, user_id]
);

impl ClubMemberTable {
    pub async fn select_by_club_and_user(
        &self,
        club_id: i64,
        user_id: u64,
    ) -> Result<Option<ClubMemberModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, ClubMemberModel>(
            "SELECT * FROM club_members WHERE club_id = ? AND user_id = ?",
        )
        .bind(club_id)
        .bind(user_id as i64)
        .fetch_optional(&self.base.pool)
        .await?)
    }

    pub async fn select_user_ids_by_club(&self, club_id: i64) -> Result<Vec<u64>, DatabaseError> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT user_id FROM club_members WHERE club_id = ? ORDER BY id",
        )
        .bind(club_id)
        .fetch_all(&self.base.pool)
        .await?;
        Ok(ids.into_iter().map(|id| id as u64).collect())
    }

    /// Returns `true` if a membership row was removed.
    pub async fn delete_by_club_and_user(
        &self,
        club_id: i64,
        user_id: u64,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM club_members WHERE club_id = ? AND user_id = ?")
            .bind(club_id)
            .bind(user_id as i64)
            .execute(&self.base.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// CountdownTable
// ============================================================================

impl_table!(
    CountdownTable,
    CountdownModel,
    "countdowns",
    id,
    "guild_id, creator_id, timestamp, lookup",
    "?, ?, ?, ?",
    "guild_id = ?, creator_id = ?, timestamp = ?, lookup = ?",
    [guild_id, creator_id, timestamp, lookup]
);

impl CountdownTable {
    pub async fn select_by_lookup(
        &self,
        guild_id: u64,
        lookup: &str,
    ) -> Result<Option<CountdownModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, CountdownModel>(
            "SELECT * FROM countdowns WHERE guild_id = ? AND lookup = ?",
        )
        .bind(guild_id as i64)
        .bind(lookup)
        .fetch_optional(&self.base.pool)
        .await?)
    }

    /// Soonest first.
    pub async fn select_all_by_guild(
        &self,
        guild_id: u64,
    ) -> Result<Vec<CountdownModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, CountdownModel>(
            "SELECT * FROM countdowns WHERE guild_id = ? ORDER BY timestamp",
        )
        .bind(guild_id as i64)
        .fetch_all(&self.base.pool)
        .await?)
    }
}

// ============================================================================
// CountdownImageTable
// ============================================================================

impl_table!(
    CountdownImageTable,
    CountdownImageModel,
    "countdown_images",
    id,
    "countdown_id, url",
    "?, ?",
    "countdown_id = ?, url = ?",
    [countdown_id, url]
);

impl CountdownImageTable {
    pub async fn select_all_by_countdown(
        &self,
        countdown_id: i64,
    ) -> Result<Vec<CountdownImageModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, CountdownImageModel>(
            "SELECT * FROM countdown_images WHERE countdown_id = ? ORDER BY id",
        )
        .bind(countdown_id)
        .fetch_all(&self.base.pool)
        .await?)
    }

    pub async fn select_by_url(
        &self,
        countdown_id: i64,
        url: &str,
    ) -> Result<Option<CountdownImageModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, CountdownImageModel>(
            "SELECT * FROM countdown_images WHERE countdown_id = ? AND url = ?",
        )
        .bind(countdown_id)
        .bind(url)
        .fetch_optional(&self.base.pool)
        .await?)
    }
}

// ============================================================================
// WeeklyTable
// ============================================================================

impl_table!(
    WeeklyTable,
    WeeklyModel,
    "weeklies",
    id,
    "guild_id, creator_id, timestamp, lookup",
    "?, ?, ?, ?",
    "guild_id = ?, creator_id = ?, timestamp = ?, lookup = ?",
    [guild_id, creator_id, timestamp, lookup]
);

impl WeeklyTable {
    pub async fn select_by_lookup(
        &self,
        guild_id: u64,
        lookup: &str,
    ) -> Result<Option<WeeklyModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, WeeklyModel>(
            "SELECT * FROM weeklies WHERE guild_id = ? AND lookup = ?",
        )
        .bind(guild_id as i64)
        .bind(lookup)
        .fetch_optional(&self.base.pool)
        .await?)
    }

    pub async fn select_all_by_guild(
        &self,
        guild_id: u64,
    ) -> Result<Vec<WeeklyModel>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, WeeklyModel>("SELECT * FROM weeklies WHERE guild_id = ? ORDER BY id")
                .bind(guild_id as i64)
                .fetch_all(&self.base.pool)
                .await?,
        )
    }
}

// ============================================================================
// WeeklyGifTable
// ============================================================================

impl_table!(
    WeeklyGifTable,
    WeeklyGifModel,
    "weekly_gifs",
    id,
    "weekly_id, kind, url",
    "?, ?, ?",
    "weekly_id = ?, kind = ?, url = ?",
    [weekly_id, kind, url]
);

impl WeeklyGifTable {
    pub async fn select_all_by_kind(
        &self,
        weekly_id: i64,
        kind: GifKind,
    ) -> Result<Vec<WeeklyGifModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, WeeklyGifModel>(
            "SELECT * FROM weekly_gifs WHERE weekly_id = ? AND kind = ? ORDER BY id",
        )
        .bind(weekly_id)
        .bind(kind)
        .fetch_all(&self.base.pool)
        .await?)
    }

    pub async fn select_by_url(
        &self,
        weekly_id: i64,
        kind: GifKind,
        url: &str,
    ) -> Result<Option<WeeklyGifModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, WeeklyGifModel>(
            "SELECT * FROM weekly_gifs WHERE weekly_id = ? AND kind = ? AND url = ?",
        )
        .bind(weekly_id)
        .bind(kind)
        .bind(url)
        .fetch_optional(&self.base.pool)
        .await?)
    }
}

// ============================================================================
// DailyTable
// ============================================================================

impl_table!(
    DailyTable,
    DailyModel,
    "dailies",
    id,
    "creator_id, timestamp, message",
    "?, ?, ?",
    "creator_id = ?, timestamp = ?, message = ?",
    [creator_id, timestamp, message]
);

impl DailyTable {
    pub async fn select_by_creator(
        &self,
        creator_id: u64,
    ) -> Result<Option<DailyModel>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, DailyModel>("SELECT * FROM dailies WHERE creator_id = ?")
                .bind(creator_id as i64)
                .fetch_optional(&self.base.pool)
                .await?,
        )
    }

    /// Returns `false` if the user has no reminder.
    pub async fn update_timestamp_by_creator(
        &self,
        creator_id: u64,
        timestamp: i64,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE dailies SET timestamp = ? WHERE creator_id = ?")
            .bind(timestamp)
            .bind(creator_id as i64)
            .execute(&self.base.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `true` if a reminder was removed.
    pub async fn delete_by_creator(&self, creator_id: u64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM dailies WHERE creator_id = ?")
            .bind(creator_id as i64)
            .execute(&self.base.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// NyaaTable
// ============================================================================

impl_table!(
    NyaaTable,
    NyaaModel,
    "nyaa",
    id,
    "name, query, latest, guild_id, channel_id, creator_id",
    "?, ?, ?, ?, ?, ?",
    "name = ?, query = ?, latest = ?, guild_id = ?, channel_id = ?, creator_id = ?",
    [name, query, latest, guild_id, channel_id, creator_id]
);

impl_subscription_table!(NyaaTable, NyaaModel, "nyaa");

impl NyaaTable {
    pub async fn select_by_name(
        &self,
        guild_id: u64,
        name: &str,
    ) -> Result<Option<NyaaModel>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, NyaaModel>("SELECT * FROM nyaa WHERE guild_id = ? AND name = ?")
                .bind(guild_id as i64)
                .bind(name)
                .fetch_optional(&self.base.pool)
                .await?,
        )
    }

    pub async fn select_by_query(
        &self,
        guild_id: u64,
        query: &str,
    ) -> Result<Option<NyaaModel>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, NyaaModel>("SELECT * FROM nyaa WHERE guild_id = ? AND query = ?")
                .bind(guild_id as i64)
                .bind(query)
                .fetch_optional(&self.base.pool)
                .await?,
        )
    }
}

// ============================================================================
// MangaTable
// ============================================================================

impl_table!(
    MangaTable,
    MangaModel,
    "manga",
    id,
    "title, description, mangadex_id, cover, latest, guild_id, channel_id, creator_id",
    "?, ?, ?, ?, ?, ?, ?, ?",
    "title = ?, description = ?, mangadex_id = ?, cover = ?, latest = ?, guild_id = ?, channel_id = ?, creator_id = ?",
    [
        title,
        description,
        mangadex_id,
        cover,
        latest,
        guild_id,
        channel_id,
        creator_id
    ]
);

impl_subscription_table!(MangaTable, MangaModel, "manga");

impl MangaTable {
    pub async fn select_by_mangadex_id(
        &self,
        guild_id: u64,
        mangadex_id: &str,
    ) -> Result<Option<MangaModel>, DatabaseError> {
        Ok(sqlx::query_as::<_, MangaModel>(
            "SELECT * FROM manga WHERE guild_id = ? AND mangadex_id = ?",
        )
        .bind(guild_id as i64)
        .bind(mangadex_id)
        .fetch_optional(&self.base.pool)
        .await?)
    }

    /// Distinct catalog ids across all guilds, one upstream fetch each.
    pub async fn select_distinct_mangadex_ids(&self) -> Result<Vec<String>, DatabaseError> {
        Ok(sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT mangadex_id FROM manga ORDER BY mangadex_id",
        )
        .fetch_all(&self.base.pool)
        .await?)
    }

    pub async fn select_all_by_mangadex_id(
        &self,
        mangadex_id: &str,
    ) -> Result<Vec<MangaModel>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, MangaModel>("SELECT * FROM manga WHERE mangadex_id = ? ORDER BY id")
                .bind(mangadex_id)
                .fetch_all(&self.base.pool)
                .await?,
        )
    }
}

// ============================================================================
// JNovelTable
// ============================================================================

impl_table!(
    JNovelTable,
    JNovelModel,
    "jnovel",
    id,
    "series, title, cover, latest, guild_id, channel_id, creator_id",
    "?, ?, ?, ?, ?, ?, ?",
    "series = ?, title = ?, cover = ?, latest = ?, guild_id = ?, channel_id = ?, creator_id = ?",
    [series, title, cover, latest, guild_id, channel_id, creator_id]
);

impl_subscription_table!(JNovelTable, JNovelModel, "jnovel");

impl JNovelTable {
    pub async fn select_by_series(
        &self,
        guild_id: u64,
        series: &str,
    ) -> Result<Option<JNovelModel>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, JNovelModel>("SELECT * FROM jnovel WHERE guild_id = ? AND series = ?")
                .bind(guild_id as i64)
                .bind(series)
                .fetch_optional(&self.base.pool)
                .await?,
        )
    }

    pub async fn select_distinct_series(&self) -> Result<Vec<String>, DatabaseError> {
        Ok(
            sqlx::query_scalar::<_, String>("SELECT DISTINCT series FROM jnovel ORDER BY series")
                .fetch_all(&self.base.pool)
                .await?,
        )
    }

    pub async fn select_all_by_series(
        &self,
        series: &str,
    ) -> Result<Vec<JNovelModel>, DatabaseError> {
        Ok(
            sqlx::query_as::<_, JNovelModel>("SELECT * FROM jnovel WHERE series = ? ORDER BY id")
                .bind(series)
                .fetch_all(&self.base.pool)
                .await?,
        )
    }
}

// ============================================================================
// FollowerTable
// ============================================================================

/// Opt-in rows for one subscription kind.
///
/// The three follower tables share a layout, so a single handler is
/// parameterized by table name instead of being generated per table.
#[derive(Clone)]
pub struct FollowerTable {
    base: BaseTable,
    table: &'static str,
}

impl FollowerTable {
    pub fn new(pool: SqlitePool, table: &'static str) -> Self {
        Self {
            base: BaseTable::new(pool),
            table,
        }
    }

    /// Returns `false` if the user was already following.
    pub async fn insert(&self, subscription_id: i64, user_id: u64) -> Result<bool, DatabaseError> {
        let sql = format!(
            "INSERT OR IGNORE INTO {} (subscription_id, user_id) VALUES (?, ?)",
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(subscription_id)
            .bind(user_id as i64)
            .execute(&self.base.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns `true` if a follower row was removed.
    pub async fn delete(&self, subscription_id: i64, user_id: u64) -> Result<bool, DatabaseError> {
        let sql = format!(
            "DELETE FROM {} WHERE subscription_id = ? AND user_id = ?",
            self.table
        );
        let result = sqlx::query(&sql)
            .bind(subscription_id)
            .bind(user_id as i64)
            .execute(&self.base.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn select_user_ids(&self, subscription_id: i64) -> Result<Vec<u64>, DatabaseError> {
        let sql = format!(
            "SELECT user_id FROM {} WHERE subscription_id = ? ORDER BY id",
            self.table
        );
        let ids = sqlx::query_scalar::<_, i64>(&sql)
            .bind(subscription_id)
            .fetch_all(&self.base.pool)
            .await?;
        Ok(ids.into_iter().map(|id| id as u64).collect())
    }

    pub async fn select_subscription_ids_by_user(
        &self,
        user_id: u64,
    ) -> Result<Vec<i64>, DatabaseError> {
        let sql = format!(
            "SELECT subscription_id FROM {} WHERE user_id = ? ORDER BY subscription_id",
            self.table
        );
        Ok(sqlx::query_scalar::<_, i64>(&sql)
            .bind(user_id as i64)
            .fetch_all(&self.base.pool)
            .await?)
    }

    /// Makes the user follow exactly `selected` out of `shown` in one transaction.
    ///
    /// Subscriptions outside `shown` are left untouched, so one page of a
    /// paged menu never clears choices made on another page.
    pub async fn apply_selection(
        &self,
        user_id: u64,
        shown: &[i64],
        selected: &[i64],
    ) -> Result<(), DatabaseError> {
        let insert = format!(
            "INSERT OR IGNORE INTO {} (subscription_id, user_id) VALUES (?, ?)",
            self.table
        );
        let delete = format!(
            "DELETE FROM {} WHERE subscription_id = ? AND user_id = ?",
            self.table
        );

        let mut tx = self.base.pool.begin().await?;
        for subscription_id in shown {
            let sql = if selected.contains(subscription_id) {
                &insert
            } else {
                &delete
            };
            sqlx::query(sql)
                .bind(subscription_id)
                .bind(user_id as i64)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn delete_all(&self) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM {}", self.table);
        sqlx::query(&sql).execute(&self.base.pool).await?;
        Ok(())
    }
}
