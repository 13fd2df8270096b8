use sqlx::SqlitePool;
use crate::error::StoreResult;

pub async fn get_music_channel(pool: &SqlitePool, guild_id: i64) -> StoreResult<Option<i64>> {
    let channel = sqlx::query_scalar("SELECT channel_id FROM music_channels WHERE guild_id = ?")
        .bind(guild_id)
        .fetch_optional(pool)
        .await?;

    Ok(channel)
}

pub async fn set_music_channel(pool: &SqlitePool, guild_id: i64, channel_id: i64) -> StoreResult<()> {
    sqlx::query(
        "INSERT INTO music_channels (guild_id, channel_id) VALUES (?, ?) \
         ON CONFLICT(guild_id) DO UPDATE SET channel_id = excluded.channel_id",
    )
    .bind(guild_id)
    .bind(channel_id)
    .execute(pool)
    .await?;

    Ok(())
}
