use sqlx::SqlitePool;
use crate::error::StoreResult;

/// Appends at `MAX(idx) + 1` in a single statement and returns the new index.
pub async fn append(pool: &SqlitePool, guild_id: i64, query: &str) -> StoreResult<i64> {
    let idx = sqlx::query_scalar(
        "INSERT INTO radio (guild_id, idx, query) \
         SELECT ?, COALESCE(MAX(idx), -1) + 1, ? FROM radio WHERE guild_id = ? \
         RETURNING idx",
    )
    .bind(guild_id)
    .bind(query)
    .bind(guild_id)
    .fetch_one(pool)
    .await?;

    Ok(idx)
}

pub async fn list(pool: &SqlitePool, guild_id: i64) -> StoreResult<Vec<String>> {
    let queries = sqlx::query_scalar("SELECT query FROM radio WHERE guild_id = ? ORDER BY idx ASC")
        .bind(guild_id)
        .fetch_all(pool)
        .await?;

    Ok(queries)
}

pub async fn clear(pool: &SqlitePool, guild_id: i64) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM radio WHERE guild_id = ?")
        .bind(guild_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
