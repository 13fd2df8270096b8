pub mod channel;
pub mod checkin;
pub mod pool;
pub mod radio;

use async_trait::async_trait;
use serenity::model::id::{
    ChannelId as DiscordChannelId,
    GuildId as DiscordGuildId,
    UserId as DiscordUserId
};
use sqlx::SqlitePool;
use crate::{
    error::{MusicResult, StoreResult},
    radio::RadioStore,
};

/// Handle to the bot's SQLite database. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

fn key(id: u64) -> i64 {
    id as i64
}

impl Store {
    /// Opens the database and brings its schema up to date.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = pool::create_pool(database_url).await?;
        pool::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn checkin(&self, guild_id: DiscordGuildId, user_id: DiscordUserId, date: &str, month: &str) -> StoreResult<()> {
        checkin::insert(&self.pool, key(guild_id.get()), key(user_id.get()), date, month).await
    }

    pub async fn leaderboard(&self, guild_id: DiscordGuildId, month: &str, limit: i64) -> StoreResult<Vec<(DiscordUserId, i64)>> {
        let rows = checkin::top_for_month(&self.pool, key(guild_id.get()), month, limit).await?;

        Ok(rows
            .into_iter()
            .map(|(user, count)| (DiscordUserId::new(user as u64), count))
            .collect())
    }

    pub async fn music_channel(&self, guild_id: DiscordGuildId) -> StoreResult<Option<DiscordChannelId>> {
        let channel = channel::get_music_channel(&self.pool, key(guild_id.get())).await?;

        Ok(channel.map(|id| DiscordChannelId::new(id as u64)))
    }

    pub async fn set_music_channel(&self, guild_id: DiscordGuildId, channel_id: DiscordChannelId) -> StoreResult<()> {
        channel::set_music_channel(&self.pool, key(guild_id.get()), key(channel_id.get())).await
    }
}

#[async_trait]
impl RadioStore for Store {
    async fn append(&self, guild_id: DiscordGuildId, query: &str) -> MusicResult<i64> {
        Ok(radio::append(&self.pool, key(guild_id.get()), query).await?)
    }

    async fn list(&self, guild_id: DiscordGuildId) -> MusicResult<Vec<String>> {
        Ok(radio::list(&self.pool, key(guild_id.get())).await?)
    }

    async fn clear(&self, guild_id: DiscordGuildId) -> MusicResult<()> {
        radio::clear(&self.pool, key(guild_id.get())).await?;
        Ok(())
    }
}

impl typemap_rev::TypeMapKey for Store {
    type Value = Store;
}
