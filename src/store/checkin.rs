use sqlx::SqlitePool;
use crate::error::{StoreError, StoreResult};

/// Records a check-in. A second one for the same member and day is `DuplicateCheckin`.
pub async fn insert(pool: &SqlitePool, guild_id: i64, user_id: i64, date: &str, month: &str) -> StoreResult<()> {
    let result = sqlx::query("INSERT INTO checkins (guild_id, user_id, date, month) VALUES (?, ?, ?, ?)")
        .bind(guild_id)
        .bind(user_id)
        .bind(date)
        .bind(month)
        .execute(pool)
        .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(StoreError::DuplicateCheckin),
        Err(e) => Err(e.into()),
    }
}

/// `(user_id, count)` pairs for the month, most check-ins first, ties by user id.
pub async fn top_for_month(pool: &SqlitePool, guild_id: i64, month: &str, limit: i64) -> StoreResult<Vec<(i64, i64)>> {
    let rows = sqlx::query_as::<_, (i64, i64)>(
        "SELECT user_id, COUNT(*) AS total FROM checkins \
         WHERE guild_id = ? AND month = ? \
         GROUP BY user_id ORDER BY total DESC, user_id ASC LIMIT ?",
    )
    .bind(guild_id)
    .bind(month)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
