use chrono::{DateTime, Utc};
use serenity::{
    builder::CreateEmbed,
    model::id::{GuildId, UserId},
};
use tracing::warn;
use crate::{error::StoreError, store::Store};
use super::Reply;

pub const LEADERBOARD_SIZE: i64 = 3;
const LEADERBOARD_COLOUR: u32 = 0x2ECC71;

/// UTC `(YYYY-MM-DD, YYYY-MM)` keys for a check-in made at `now`.
pub fn checkin_keys(now: DateTime<Utc>) -> (String, String) {
    (now.format("%Y-%m-%d").to_string(), now.format("%Y-%m").to_string())
}

pub fn leaderboard_lines(rows: &[(UserId, i64)]) -> Vec<String> {
    rows.iter()
        .enumerate()
        .map(|(rank, (user, count))| {
            let days = if *count == 1 { "day" } else { "days" };
            format!("**#{}** <@{}> with **{}** {}", rank + 1, user, count, days)
        })
        .collect()
}

pub async fn checkin(store: &Store, guild_id: GuildId, user_id: UserId) -> Reply {
    let (date, month) = checkin_keys(Utc::now());

    match store.checkin(guild_id, user_id, &date, &month).await {
        Ok(()) => Reply::text(format!("✅ Checked in for {}.", date)),
        Err(StoreError::DuplicateCheckin) => Reply::text("You already checked in today."),
        Err(why) => {
            warn!("Failed storing check-in of {} on guild {}: {}", user_id, guild_id, why);
            Reply::text("❌ Could not save your check-in, try again later.")
        }
    }
}

pub async fn leaderboard(store: &Store, guild_id: GuildId) -> Reply {
    let (_, month) = checkin_keys(Utc::now());

    let rows = match store.leaderboard(guild_id, &month, LEADERBOARD_SIZE).await {
        Ok(rows) => rows,
        Err(why) => {
            warn!("Failed loading leaderboard for guild {}: {}", guild_id, why);
            return Reply::text("❌ Could not load the leaderboard, try again later.");
        }
    };

    if rows.is_empty() {
        return Reply::text(format!("No check-ins yet for {}.", month));
    }

    Reply::Embed(
        CreateEmbed::new()
            .title(format!("🏆 Top {} check-ins for {}", LEADERBOARD_SIZE, month))
            .description(leaderboard_lines(&rows).join("\n"))
            .colour(LEADERBOARD_COLOUR),
    )
}
